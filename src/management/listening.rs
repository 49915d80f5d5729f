use chrono::{DateTime, Utc};

use crate::{
    management::store::{KEY_LISTENING_TIME, Persistence, StoreError, load_json, save_json},
    types::{ListeningLog, ListeningSession},
};

/// Tracks listening time as the server-reported total plus locally recorded
/// sessions that the server has not accounted for yet.
pub struct ListeningTimeManager<P: Persistence> {
    store: P,
    log: ListeningLog,
}

impl<P: Persistence> ListeningTimeManager<P> {
    pub async fn open(store: P) -> Result<Self, StoreError> {
        let log = load_json(&store, KEY_LISTENING_TIME)
            .await?
            .unwrap_or_default();
        Ok(Self { store, log })
    }

    pub fn log(&self) -> &ListeningLog {
        &self.log
    }

    pub fn is_listening(&self) -> bool {
        self.open_session().is_some()
    }

    /// Opens a session at `now`. Returns `false` if one is already open.
    pub async fn start_session(&mut self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if self.is_listening() {
            return Ok(false);
        }
        self.log.sessions.push(ListeningSession {
            started_at: now,
            ended_at: None,
        });
        self.persist().await?;
        Ok(true)
    }

    /// Closes the open session at `now`. Returns `false` if none was open.
    pub async fn end_session(&mut self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(session) = self
            .log
            .sessions
            .iter_mut()
            .find(|s| s.ended_at.is_none())
        else {
            return Ok(false);
        };

        // a clock going backwards must not produce a negative session
        session.ended_at = Some(now.max(session.started_at));
        self.persist().await?;
        Ok(true)
    }

    /// Replaces the server total. Sessions that ended before `at` are
    /// already part of it and are discarded.
    pub async fn set_baseline(
        &mut self,
        seconds: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.log.baseline_seconds = seconds.max(0);
        self.log.baseline_at = Some(at);
        self.log
            .sessions
            .retain(|s| s.ended_at.is_none_or(|ended| ended > at));
        self.persist().await
    }

    /// Baseline plus local session time after the baseline. A session that
    /// spans the baseline only counts from `baseline_at` on.
    pub fn total_seconds(&self, now: DateTime<Utc>) -> i64 {
        let local: i64 = self
            .log
            .sessions
            .iter()
            .map(|s| {
                let start = match self.log.baseline_at {
                    Some(baseline_at) => s.started_at.max(baseline_at),
                    None => s.started_at,
                };
                let end = s.ended_at.unwrap_or(now);
                (end - start).num_seconds().max(0)
            })
            .sum();
        self.log.baseline_seconds + local
    }

    fn open_session(&self) -> Option<&ListeningSession> {
        self.log.sessions.iter().find(|s| s.ended_at.is_none())
    }

    async fn persist(&self) -> Result<(), StoreError> {
        save_json(&self.store, KEY_LISTENING_TIME, &self.log).await
    }
}
