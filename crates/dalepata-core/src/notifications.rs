//! Virtual notifications
//!
//! The backend has no notification store. Notifications are synthesized
//! here from the user's adoption requests: every request the shelter
//! approved or rejected within the last 30 days becomes an entry, and its
//! read flag comes from a set of IDs kept on the device.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    clock::{Clock, SystemClock},
    models::{AdoptionRequest, RequestStatus},
    read_state::{ReadIds, ReadStateStore},
    source::AdoptionRequestSource,
    Result,
};

/// How far back decisions still show up
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Notification categories. Only adoption decisions exist for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AdoptionDecision,
}

/// One entry of the notification feed
///
/// Rebuilt on every derivation and never persisted. Field names on the wire
/// follow what the mobile screens consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    /// `solicitud-{request id}`, stable across derivations
    pub id: String,
    #[serde(rename = "solicitudId")]
    pub request_id: i64,
    #[serde(rename = "tipo")]
    pub kind: NotificationKind,
    #[serde(rename = "estado")]
    pub status: RequestStatus,
    #[serde(rename = "mascota")]
    pub pet_name: String,
    #[serde(rename = "mascotaImagen", default, skip_serializing_if = "Option::is_none")]
    pub pet_image: Option<String>,
    #[serde(rename = "mascotaId", default, skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<i64>,
    #[serde(rename = "fecha")]
    pub date: DateTime<Utc>,
    #[serde(rename = "comentario", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "leida")]
    pub read: bool,
}

impl NotificationEntry {
    fn from_request(request: AdoptionRequest, read_ids: &ReadIds) -> Self {
        Self {
            id: notification_id(request.id),
            request_id: request.id,
            kind: NotificationKind::AdoptionDecision,
            status: request.status,
            pet_name: request.pet.name,
            pet_image: request.pet.image_url,
            pet_id: request.pet.id,
            date: request.created_at,
            comment: request.comment,
            read: read_ids.contains(&request.id),
        }
    }

    /// Headline shown to the user
    pub fn title(&self) -> String {
        match self.status {
            RequestStatus::Aprobada => format!("¡Solicitud para {} aprobada!", self.pet_name),
            _ => format!("Solicitud para {} rechazada", self.pet_name),
        }
    }
}

pub fn notification_id(request_id: i64) -> String {
    format!("solicitud-{}", request_id)
}

/// Decided (approved/rejected) and created no earlier than `now - window`
pub fn is_eligible(request: &AdoptionRequest, now: DateTime<Utc>, window: Duration) -> bool {
    request.status.is_decision() && request.created_at >= now - window
}

/// Derives the notification feed and owns the local read markers
///
/// Mutations never reach the backend. They are serialized through one
/// async mutex so concurrent mark-as-read calls can't lose each other's
/// writes, even against a store that only does whole-value get/set.
pub struct Notifier {
    source: Box<dyn AdoptionRequestSource>,
    store: Arc<dyn ReadStateStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    mutation_lock: Mutex<()>,
}

impl Notifier {
    pub fn new(source: Box<dyn AdoptionRequestSource>, store: Arc<dyn ReadStateStore>) -> Self {
        Self {
            source,
            store,
            clock: Arc::new(SystemClock),
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window = Duration::days(days);
        self
    }

    /// Fetch, filter to eligible requests, drop repeated IDs (first one wins)
    async fn eligible_requests(&self) -> Result<Vec<AdoptionRequest>> {
        let requests = self.source.list_my_requests().await?;
        let now = self.clock.now();
        let total = requests.len();

        let mut seen = HashSet::new();
        let eligible: Vec<AdoptionRequest> = requests
            .into_iter()
            .filter(|request| is_eligible(request, now, self.window))
            .filter(|request| seen.insert(request.id))
            .collect();

        debug!("{} of {} adoption requests are notifiable", eligible.len(), total);
        Ok(eligible)
    }

    /// Unreadable read-state counts as empty
    async fn read_ids_or_empty(&self) -> ReadIds {
        match self.store.get().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Treating all notifications as unread: {}", e);
                ReadIds::new()
            }
        }
    }

    /// The notification feed, newest first
    ///
    /// Source failures propagate untouched. Entries with the same date keep
    /// the order the source returned them in.
    pub async fn derive_notifications(&self) -> Result<Vec<NotificationEntry>> {
        let requests = self.eligible_requests().await?;
        let read_ids = self.read_ids_or_empty().await;

        let mut entries: Vec<NotificationEntry> = requests
            .into_iter()
            .map(|request| NotificationEntry::from_request(request, &read_ids))
            .collect();

        // sort_by is stable
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    /// How many entries of the feed are unread, without building the entries
    pub async fn unread_count(&self) -> Result<usize> {
        let requests = self.eligible_requests().await?;
        let read_ids = self.read_ids_or_empty().await;

        Ok(requests
            .iter()
            .filter(|request| !read_ids.contains(&request.id))
            .count())
    }

    /// Mark one request's notification as read. Unknown IDs are accepted.
    pub async fn mark_as_read(&self, request_id: i64) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;
        self.store.add(request_id).await?;
        debug!("Marked notification for request {} as read", request_id);
        Ok(())
    }

    /// Union `request_ids` into the read set with a single write
    pub async fn mark_all_as_read(&self, request_ids: &[i64]) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;
        self.store.add_all(request_ids).await?;

        debug!("Marked {} notifications as read", request_ids.len());
        Ok(())
    }

    /// Forget every read marker
    pub async fn clear_read_state(&self) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;
        self.store.clear().await
    }
}
