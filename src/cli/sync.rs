use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::likes::open_likes,
    config, error, info,
    management::TokenManager,
    radio::HttpLikesApi,
    success,
    sync::{DropReason, SyncWorker},
    warning,
};

pub async fn sync() {
    let api_url = match config::api_url() {
        Ok(url) => url,
        Err(e) => error!("{}", e),
    };

    let tokens = match TokenManager::load().await {
        Ok(t) => t,
        Err(e) => {
            error!(
                "Failed to load token. Please run likesync auth\n Error: {}",
                e
            );
        }
    };

    let mut likes = open_likes().await;
    let total = likes.pending_operations().len();
    if total == 0 {
        success!("Nothing to sync.");
        return;
    }

    let api = HttpLikesApi::new(api_url, tokens);

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Syncing {} operation(s)...", total));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let progress = pb.clone();
    let worker = SyncWorker::new(&api).on_progress(move |op| {
        progress.set_message(format!(
            "Sending {} for {} - {}...",
            op.kind, op.audio_block.artist, op.audio_block.title
        ));
    });

    let report = match worker.run(&mut likes).await {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            error!("Sync interrupted, queue could not be saved. Err: {}", e);
        }
    };
    pb.finish_and_clear();

    if let Some(reason) = &report.aborted {
        warning!(
            "Sync stopped, the station refused the sign-in: {}\nPlease run likesync auth.",
            reason
        );
    }

    for dropped in &report.dropped {
        let label = format!(
            "{} {} - {}",
            dropped.operation.kind, dropped.operation.audio_block.artist, dropped.operation.audio_block.title
        );
        match &dropped.reason {
            DropReason::Expired => info!("Gave up on {}: older than 7 days.", label),
            DropReason::Rejected(msg) => warning!("Station rejected {}: {}", label, msg),
            DropReason::RetriesExhausted(msg) => {
                warning!("Gave up on {} after repeated failures: {}", label, msg)
            }
        }
    }

    if report.retried > 0 || report.deferred > 0 {
        info!(
            "{} operation(s) will be retried on the next sync.",
            report.retried + report.deferred
        );
    }

    if report.is_clean() {
        success!("Synced {} operation(s).", report.synced);
    } else {
        info!(
            "Synced {}, retrying {}, deferred {}, dropped {}.",
            report.synced,
            report.retried,
            report.deferred,
            report.dropped.len()
        );
    }
}
