use std::cmp::Ordering;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Local, Utc};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::{AudioBlock, LikeOperation, LikedItemTableRow, PendingOperationTableRow};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Accepts a bare or hyphenated UUID, surrounding whitespace allowed.
pub fn parse_audio_block_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|e| format!("`{}` is not an audio block id: {}", raw, e))
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Renders seconds as `1h 02m 03s`, dropping leading zero units.
pub fn format_duration(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Most recent likes first; items without a known like time go last,
/// ordered by artist then title.
pub fn build_liked_rows(
    mut items: Vec<(AudioBlock, Option<DateTime<Utc>>)>,
) -> Vec<LikedItemTableRow> {
    items.sort_by(|(a, a_ts), (b, b_ts)| match b_ts.cmp(a_ts) {
        Ordering::Equal => a
            .artist
            .to_lowercase()
            .cmp(&b.artist.to_lowercase())
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
        other => other,
    });

    items
        .into_iter()
        .map(|(item, ts)| LikedItemTableRow {
            title: item.title,
            artist: item.artist,
            liked_at: ts.map(format_timestamp).unwrap_or_else(|| "-".to_string()),
            id: item.id.to_string(),
        })
        .collect()
}

pub fn build_pending_rows(operations: &[LikeOperation], now: DateTime<Utc>) -> Vec<PendingOperationTableRow> {
    operations
        .iter()
        .map(|op| PendingOperationTableRow {
            queued_at: format_timestamp(op.timestamp),
            kind: op.kind.to_string(),
            title: format!("{} - {}", op.audio_block.artist, op.audio_block.title),
            retries: op.retry_count,
            state: if op.is_expired_at(now) {
                "expired".to_string()
            } else if !op.should_retry() {
                "exhausted".to_string()
            } else {
                "pending".to_string()
            },
        })
        .collect()
}
