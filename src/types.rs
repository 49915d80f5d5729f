use std::{
    fmt,
    hash::{Hash, Hasher},
};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

/// Number of failed sync attempts after which an operation is given up.
pub const MAX_RETRIES: u32 = 3;

/// Age in seconds after which a queued operation is no longer worth sending.
pub const OPERATION_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone)]
pub struct PkceToken {
    pub code_verifier: String,
    pub token: Option<Token>,
}

/// A piece of station content (song, jingle, spot) as delivered by the
/// backend. Two blocks are the same block when their ids match, regardless
/// of metadata drift between fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioBlock {
    #[serde(rename = "endOfMessageMS")]
    pub end_of_message_ms: i64,
    #[serde(rename = "beginningOfOutroMS")]
    pub beginning_of_outro_ms: i64,
    #[serde(rename = "endOfIntroMS")]
    pub end_of_intro_ms: i64,
    #[serde(rename = "lengthOfOutroMS")]
    pub length_of_outro_ms: i64,
    pub download_url: String,
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    #[serde(rename = "durationMS")]
    pub duration_ms: i64,
    pub popularity: Option<i64>,
    pub you_tube_id: Option<i64>,
    pub s3_key: String,
    pub s3_bucket_name: String,
    pub isrc: Option<String>,
    pub spotify_id: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AudioBlock {
    /// Builds a song block carrying only identity and display metadata.
    pub fn new(id: Uuid, title: impl Into<String>, artist: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            end_of_message_ms: 0,
            beginning_of_outro_ms: 0,
            end_of_intro_ms: 0,
            length_of_outro_ms: 0,
            download_url: String::new(),
            id,
            kind: "song".to_string(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration_ms: 0,
            popularity: None,
            you_tube_id: None,
            s3_key: String::new(),
            s3_bucket_name: String::new(),
            isrc: None,
            spotify_id: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Key used for the liked index.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

impl PartialEq for AudioBlock {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AudioBlock {}

impl Hash for AudioBlock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Like,
    Unlike,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Like => write!(f, "like"),
            OperationKind::Unlike => write!(f, "unlike"),
        }
    }
}

/// A like or unlike waiting to be delivered to the backend.
///
/// Operations are values: a failed delivery produces a new copy through
/// [`LikeOperation::incrementing_retry_count`] instead of mutating the queued
/// entry. Freshness and retry budget are derived from the fields, there is no
/// stored state flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOperation {
    pub id: Uuid,
    pub audio_block: AudioBlock,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    #[serde(with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
    pub spin_id: Option<String>,
}

impl LikeOperation {
    pub fn new(audio_block: AudioBlock, kind: OperationKind, spin_id: Option<String>) -> Self {
        Self::with_timestamp(audio_block, kind, Utc::now(), spin_id)
    }

    /// `timestamp` is truncated to whole milliseconds, the resolution of the
    /// persisted form, so a reloaded operation compares equal to the original.
    /// Expiry checks truncate `now` the same way.
    pub fn with_timestamp(
        audio_block: AudioBlock,
        kind: OperationKind,
        timestamp: DateTime<Utc>,
        spin_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            audio_block,
            kind,
            timestamp: timestamp.trunc_subsecs(3),
            retry_count: 0,
            spin_id,
        }
    }

    pub fn incrementing_retry_count(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    pub fn should_retry(&self) -> bool {
        self.retry_count < MAX_RETRIES
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.trunc_subsecs(3) - self.timestamp > Duration::seconds(OPERATION_EXPIRY_SECS)
    }

    pub fn item_key(&self) -> String {
        self.audio_block.key()
    }
}

impl PartialEq for LikeOperation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.audio_block.id == other.audio_block.id
            && self.kind == other.kind
            && self.timestamp == other.timestamp
            && self.retry_count == other.retry_count
    }
}

impl Eq for LikeOperation {}

/// Serializes timestamps as ISO-8601 UTC with millisecond precision.
pub mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLikeRequest {
    pub audio_block_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spin_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningSession {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningLog {
    pub baseline_seconds: i64,
    pub baseline_at: Option<DateTime<Utc>>,
    pub sessions: Vec<ListeningSession>,
}

#[derive(Tabled)]
pub struct LikedItemTableRow {
    pub title: String,
    pub artist: String,
    pub liked_at: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct PendingOperationTableRow {
    pub queued_at: String,
    #[tabled(rename = "type")]
    pub kind: String,
    pub title: String,
    pub retries: u32,
    pub state: String,
}
