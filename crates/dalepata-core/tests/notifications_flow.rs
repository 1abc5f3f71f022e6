use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dalepata_core::{
    AdoptionRequest, AdoptionRequestSource, DeviceReadStateStore, FixedClock, Notifier, PetRef,
    RequestStatus, Session,
};
use dalepata_store::DeviceStorage;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct StaticSource {
    requests: Vec<AdoptionRequest>,
}

#[async_trait]
impl AdoptionRequestSource for StaticSource {
    async fn list_my_requests(&self) -> dalepata_core::Result<Vec<AdoptionRequest>> {
        Ok(self.requests.clone())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn request(id: i64, status: RequestStatus, days_ago: i64) -> AdoptionRequest {
    AdoptionRequest {
        id,
        status,
        pet: PetRef {
            id: Some(100 + id),
            name: format!("Pet {}", id),
            species: None,
            breed: None,
            image_url: Some(format!("https://img.example.com/{}.jpg", id)),
        },
        created_at: now() - Duration::days(days_ago),
        comment: None,
    }
}

fn scenario_requests() -> Vec<AdoptionRequest> {
    vec![
        request(1, RequestStatus::Aprobada, 10),
        request(2, RequestStatus::Rechazada, 40),
        request(3, RequestStatus::Pendiente, 1),
    ]
}

fn notifier_on(db_path: &Path) -> (Arc<DeviceStorage>, Notifier) {
    let storage = Arc::new(DeviceStorage::open(db_path).unwrap());
    let store = Arc::new(DeviceReadStateStore::new(storage.clone()));
    let notifier = Notifier::new(
        Box::new(StaticSource {
            requests: scenario_requests(),
        }),
        store,
    )
    .with_clock(Arc::new(FixedClock::new(now())));

    (storage, notifier)
}

#[tokio::test]
async fn test_read_markers_survive_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("storage.db");

    {
        let (_, notifier) = notifier_on(&db_path);

        let feed = notifier.derive_notifications().await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].request_id, 1);
        assert_eq!(feed[0].pet_image.as_deref(), Some("https://img.example.com/1.jpg"));
        assert!(!feed[0].read);
        assert_eq!(notifier.unread_count().await.unwrap(), 1);

        notifier.mark_as_read(1).await.unwrap();
    }

    // "App restart": fresh handles over the same file
    let (_, notifier) = notifier_on(&db_path);
    let feed = notifier.derive_notifications().await.unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed[0].read);
    assert_eq!(notifier.unread_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_logout_resets_everything_to_unread() {
    let dir = TempDir::new().unwrap();
    let (storage, notifier) = notifier_on(&dir.path().join("storage.db"));
    let session = Session::new(storage);

    session.save("jwt-token", None).unwrap();
    notifier.mark_all_as_read(&[1, 2, 3]).await.unwrap();
    assert_eq!(notifier.unread_count().await.unwrap(), 0);

    session.logout().unwrap();

    assert!(!session.is_logged_in().unwrap());
    assert_eq!(notifier.unread_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_marks_from_two_notifiers_share_storage() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("storage.db");
    let (storage, first) = notifier_on(&db_path);

    // Second notifier over the same storage handle, with its own mutation lock
    let second = Notifier::new(
        Box::new(StaticSource { requests: vec![] }),
        Arc::new(DeviceReadStateStore::new(storage.clone())),
    );

    let (a, b) = tokio::join!(first.mark_as_read(10), second.mark_as_read(20));
    a.unwrap();
    b.unwrap();

    let raw = storage
        .get_item(dalepata_store::keys::READ_NOTIFICATIONS)
        .unwrap()
        .unwrap();
    assert_eq!(raw, "[10,20]");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mark_all_races_with_mark_from_another_notifier() {
    let storage = Arc::new(DeviceStorage::open_in_memory().unwrap());
    let first = Arc::new(Notifier::new(
        Box::new(StaticSource { requests: vec![] }),
        Arc::new(DeviceReadStateStore::new(storage.clone())),
    ));
    let second = Arc::new(Notifier::new(
        Box::new(StaticSource { requests: vec![] }),
        Arc::new(DeviceReadStateStore::new(storage.clone())),
    ));

    for round in 0..500 {
        let base = round * 10;

        let a = {
            let first = first.clone();
            tokio::spawn(async move { first.mark_all_as_read(&[base, base + 1]).await })
        };
        let b = {
            let second = second.clone();
            tokio::spawn(async move { second.mark_as_read(base + 5).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
    }

    let ids: BTreeSet<i64> = storage
        .get_json(dalepata_store::keys::READ_NOTIFICATIONS)
        .unwrap()
        .unwrap();
    let expected: BTreeSet<i64> = (0..500)
        .flat_map(|round| {
            let base = round * 10;
            [base, base + 1, base + 5]
        })
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_corrupt_read_markers_are_repaired_by_marking() {
    let dir = TempDir::new().unwrap();
    let (storage, notifier) = notifier_on(&dir.path().join("storage.db"));
    storage
        .set_item(dalepata_store::keys::READ_NOTIFICATIONS, "not a list")
        .unwrap();

    // Unreadable markers mean everything is unread, not a failure
    assert_eq!(notifier.unread_count().await.unwrap(), 1);

    notifier.mark_as_read(1).await.unwrap();
    assert_eq!(notifier.unread_count().await.unwrap(), 0);
    assert_eq!(
        storage
            .get_item(dalepata_store::keys::READ_NOTIFICATIONS)
            .unwrap()
            .as_deref(),
        Some("[1]")
    );
}
