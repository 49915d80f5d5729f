use chrono::Utc;
use tabled::Table;

use crate::{cli::likes::open_likes, error, info, success, utils};

pub async fn list_queue() {
    let likes = open_likes().await;
    let pending = likes.pending_operations();

    if pending.is_empty() {
        success!("Nothing waiting to sync.");
        return;
    }

    let rows = utils::build_pending_rows(pending, Utc::now());
    println!("{}", Table::new(rows));
    info!("{} operation(s) waiting to sync.", pending.len());
}

pub async fn cleanup() {
    let mut likes = open_likes().await;

    match likes.cleanup_expired_operations().await {
        Ok(0) => info!("No expired operations."),
        Ok(removed) => success!("Removed {} expired operation(s).", removed),
        Err(e) => error!("Cannot clean up queue. Err: {}", e),
    }
}
