use chrono::Utc;

use crate::{
    error, info,
    management::{FileStore, ListeningTimeManager},
    success, utils,
};

async fn open_listening() -> ListeningTimeManager<FileStore> {
    match ListeningTimeManager::open(FileStore::default_location()).await {
        Ok(mgr) => mgr,
        Err(e) => error!("Cannot load listening time. Err: {}", e),
    }
}

pub async fn show() {
    let mgr = open_listening().await;
    let now = Utc::now();

    info!(
        "Total listening time: {}",
        utils::format_duration(mgr.total_seconds(now))
    );
    if let Some(at) = mgr.log().baseline_at {
        info!(
            "Station reported {} on {}.",
            utils::format_duration(mgr.log().baseline_seconds),
            utils::format_timestamp(at)
        );
    }
    if mgr.is_listening() {
        info!("A listening session is in progress.");
    }
}

pub async fn start() {
    let mut mgr = open_listening().await;
    match mgr.start_session(Utc::now()).await {
        Ok(true) => success!("Listening session started."),
        Ok(false) => info!("A listening session is already in progress."),
        Err(e) => error!("Cannot save listening session. Err: {}", e),
    }
}

pub async fn stop() {
    let mut mgr = open_listening().await;
    let now = Utc::now();
    match mgr.end_session(now).await {
        Ok(true) => success!(
            "Listening session stopped. Total: {}",
            utils::format_duration(mgr.total_seconds(now))
        ),
        Ok(false) => info!("No listening session in progress."),
        Err(e) => error!("Cannot save listening session. Err: {}", e),
    }
}

pub async fn baseline(seconds: i64) {
    let mut mgr = open_listening().await;
    match mgr.set_baseline(seconds, Utc::now()).await {
        Ok(()) => success!(
            "Baseline set to {}.",
            utils::format_duration(seconds)
        ),
        Err(e) => error!("Cannot save baseline. Err: {}", e),
    }
}
