use chrono::{DateTime, Duration, TimeZone, Utc};
use likesync::management::{FileStore, ListeningTimeManager, MemoryStore};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, hour, minute, 0).unwrap()
}

#[tokio::test]
async fn test_total_is_baseline_plus_sessions() {
    let mut mgr = ListeningTimeManager::open(MemoryStore::new()).await.unwrap();
    mgr.set_baseline(3600, at(8, 0)).await.unwrap();

    assert!(mgr.start_session(at(9, 0)).await.unwrap());
    assert!(mgr.end_session(at(9, 30)).await.unwrap());
    assert!(mgr.start_session(at(10, 0)).await.unwrap());

    // open session counts up to `now`
    assert_eq!(mgr.total_seconds(at(10, 15)), 3600 + 30 * 60 + 15 * 60);
    assert!(mgr.is_listening());
}

#[tokio::test]
async fn test_start_and_end_guards() {
    let mut mgr = ListeningTimeManager::open(MemoryStore::new()).await.unwrap();

    assert!(!mgr.end_session(at(9, 0)).await.unwrap());
    assert!(mgr.start_session(at(9, 0)).await.unwrap());
    assert!(!mgr.start_session(at(9, 5)).await.unwrap());
    assert_eq!(mgr.log().sessions.len(), 1);
}

#[tokio::test]
async fn test_end_before_start_counts_zero() {
    let mut mgr = ListeningTimeManager::open(MemoryStore::new()).await.unwrap();
    mgr.start_session(at(9, 0)).await.unwrap();
    mgr.end_session(at(8, 0)).await.unwrap();

    assert_eq!(mgr.total_seconds(at(12, 0)), 0);
}

#[tokio::test]
async fn test_baseline_absorbs_finished_sessions() {
    let mut mgr = ListeningTimeManager::open(MemoryStore::new()).await.unwrap();
    mgr.start_session(at(9, 0)).await.unwrap();
    mgr.end_session(at(9, 30)).await.unwrap();
    mgr.start_session(at(10, 0)).await.unwrap();

    // the station now reports the first session as part of its total
    mgr.set_baseline(1800, at(9, 45)).await.unwrap();

    assert_eq!(mgr.log().sessions.len(), 1);
    assert_eq!(mgr.total_seconds(at(10, 0) + Duration::minutes(10)), 1800 + 600);
}

#[tokio::test]
async fn test_session_spanning_baseline_counts_only_after_it() {
    let mut mgr = ListeningTimeManager::open(MemoryStore::new()).await.unwrap();
    mgr.start_session(at(9, 0)).await.unwrap();

    // the station total already covers 09:00 to 10:00
    mgr.set_baseline(3600, at(10, 0)).await.unwrap();

    assert_eq!(mgr.log().sessions.len(), 1);
    assert_eq!(mgr.total_seconds(at(10, 30)), 3600 + 30 * 60);

    mgr.end_session(at(10, 45)).await.unwrap();
    assert_eq!(mgr.total_seconds(at(12, 0)), 3600 + 45 * 60);
}

#[tokio::test]
async fn test_listening_log_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut mgr = ListeningTimeManager::open(FileStore::new(dir.path().to_path_buf()))
            .await
            .unwrap();
        mgr.set_baseline(120, at(7, 0)).await.unwrap();
        mgr.start_session(at(9, 0)).await.unwrap();
    }

    let mut mgr = ListeningTimeManager::open(FileStore::new(dir.path().to_path_buf()))
        .await
        .unwrap();
    assert!(mgr.is_listening());
    mgr.end_session(at(9, 1)).await.unwrap();
    assert_eq!(mgr.total_seconds(at(12, 0)), 180);
}
