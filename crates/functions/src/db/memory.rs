//! In-process store used by tests and local demos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use skybox_core::api::{DeliveryReport, EventUpsert, RegistrationSummary};
use skybox_core::{
    BroadcastSegment, ConfirmationId, CustomerId, EventId, EventStatus, Phone, delivery_status,
};

use super::{
    ConfirmationRepository, EventRepository, ProfileRepository, RepositoryError, Store,
};
use crate::models::{
    Audience, Confirmation, Event, LoyaltyBalance, NewConfirmation, Profile, Recipient,
    UpsertOutcome, with_loyalty_points,
};

#[derive(Default)]
struct Tables {
    // Vectors keep insertion order, matching `ORDER BY created_at`
    profiles: Vec<Profile>,
    events: HashMap<EventId, Event>,
    confirmations: Vec<Confirmation>,
}

/// Repositories held in memory behind a single lock.
///
/// Every operation takes the lock for its whole duration, so loyalty
/// updates are serialized the same way the row lock serializes them in
/// `PostgreSQL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub async fn insert_profile(&self, profile: Profile) {
        let mut tables = self.tables.lock().await;
        tables.profiles.retain(|p| p.id != profile.id);
        tables.profiles.push(profile);
    }

    /// Insert or replace an event.
    pub async fn insert_event(&self, event: Event) {
        self.tables.lock().await.events.insert(event.id, event);
    }

    /// Insert a confirmation row as-is.
    pub async fn insert_confirmation(&self, confirmation: Confirmation) {
        self.tables.lock().await.confirmations.push(confirmation);
    }

    /// A copy of a profile.
    pub async fn profile(&self, id: CustomerId) -> Option<Profile> {
        self.tables
            .lock()
            .await
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// A copy of an event.
    pub async fn event(&self, id: EventId) -> Option<Event> {
        self.tables.lock().await.events.get(&id).cloned()
    }

    /// Copies of every confirmation, in insertion order.
    pub async fn confirmations(&self) -> Vec<Confirmation> {
        self.tables.lock().await.confirmations.clone()
    }
}

fn in_segment(profile: &Profile, segment: BroadcastSegment, now: DateTime<Utc>) -> bool {
    match segment {
        BroadcastSegment::Vip => profile.role == "vip",
        BroadcastSegment::Recent => {
            let since = now - Duration::days(BroadcastSegment::RECENT_DAYS);
            profile.last_seen_at.is_some_and(|seen| seen >= since)
        }
        BroadcastSegment::All => true,
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn add_loyalty_points(
        &self,
        customer: CustomerId,
        points: i64,
    ) -> Result<LoyaltyBalance, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == customer)
            .ok_or(RepositoryError::NotFound)?;

        let previous = profile.loyalty_points();
        let new_total = previous
            .checked_add(points)
            .ok_or(RepositoryError::BalanceOverflow)?;
        profile.metadata = with_loyalty_points(profile.metadata.take(), new_total);
        profile.updated_at = Utc::now();

        Ok(LoyaltyBalance {
            customer_name: profile.full_name.clone(),
            previous,
            new_total,
        })
    }

    async fn broadcast_recipients(
        &self,
        segment: BroadcastSegment,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Audience, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .iter()
            .filter(|p| in_segment(p, segment, now))
            .filter_map(|p| {
                p.phone.clone().map(|phone| Recipient {
                    name: p.full_name.clone(),
                    phone,
                })
            })
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl ConfirmationRepository for MemoryStore {
    async fn find_registration(
        &self,
        event: EventId,
        phone: &Phone,
    ) -> Result<Option<RegistrationSummary>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .confirmations
            .iter()
            .find(|c| c.event_id == event && &c.phone == phone)
            .map(|c| RegistrationSummary {
                id: c.id,
                status: c.status.clone(),
            }))
    }

    async fn record_confirmation(
        &self,
        confirmation: NewConfirmation,
    ) -> Result<ConfirmationId, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        if let Some(existing) = tables
            .confirmations
            .iter_mut()
            .find(|c| c.event_id == confirmation.event_id && c.phone == confirmation.phone)
        {
            existing.name = Some(confirmation.name);
            existing.status = delivery_status::SENT.to_string();
            existing.message_id = Some(confirmation.message_id);
            existing.delivered_at = None;
            existing.error_message = None;
            existing.updated_at = now;
            return Ok(existing.id);
        }

        let id = ConfirmationId::generate();
        tables.confirmations.push(Confirmation {
            id,
            event_id: confirmation.event_id,
            phone: confirmation.phone,
            name: Some(confirmation.name),
            status: delivery_status::SENT.to_string(),
            message_id: Some(confirmation.message_id),
            delivered_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn feedback_recipients(&self, event: EventId) -> Result<Audience, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .confirmations
            .iter()
            .filter(|c| {
                c.event_id == event
                    && delivery_status::FEEDBACK_ELIGIBLE.contains(&c.status.as_str())
            })
            .map(|c| Recipient {
                name: c.name.clone(),
                phone: c.phone.clone(),
            })
            .collect())
    }

    async fn apply_delivery_report(
        &self,
        report: &DeliveryReport,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfirmationId>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .confirmations
            .iter_mut()
            .find(|c| c.message_id.as_deref() == Some(report.message_sid.as_str()))
        else {
            return Ok(None);
        };

        row.status.clone_from(&report.status);
        if report.status == delivery_status::DELIVERED {
            row.delivered_at = Some(at);
        }
        if let Some(description) = report.failure_description() {
            row.error_message = Some(description);
        }
        row.updated_at = at;
        Ok(Some(row.id))
    }

    async fn count_registrations(
        &self,
        event: EventId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let tables = self.tables.lock().await;
        let count = tables
            .confirmations
            .iter()
            .filter(|c| c.event_id == event && c.created_at >= from && c.created_at < until)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn mark_past_events(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for event in tables.events.values_mut() {
            if event.status == EventStatus::Published && event.event_date < now {
                event.status = EventStatus::Past;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn upsert_event(&self, event: &EventUpsert) -> Result<UpsertOutcome, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .events
            .values_mut()
            .find(|e| e.slug.as_deref() == Some(event.slug.as_str()))
        {
            existing.title.clone_from(&event.title);
            existing.description.clone_from(&event.description);
            existing.event_date = event.event_date;
            existing.status = EventStatus::Published;
            return Ok(UpsertOutcome::Updated);
        }

        let id = EventId::generate();
        tables.events.insert(
            id,
            Event {
                id,
                slug: Some(event.slug.clone()),
                title: event.title.clone(),
                description: event.description.clone(),
                event_date: event.event_date,
                status: EventStatus::Published,
            },
        );
        Ok(UpsertOutcome::Created)
    }

    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        let mut events: Vec<Event> = self.tables.lock().await.events.values().cloned().collect();
        events.sort_by_key(|e| e.event_date);
        Ok(events)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn profile(role: &str, phone: Option<&str>, last_seen_days: Option<i64>) -> Profile {
        let now = Utc::now();
        Profile {
            id: CustomerId::generate(),
            full_name: Some(format!("{role} customer")),
            phone: phone.map(|p| Phone::parse(p).unwrap()),
            role: role.to_string(),
            metadata: serde_json::json!({}),
            last_seen_at: last_seen_days.map(|d| now - Duration::days(d)),
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_add_loyalty_points_unknown_customer() {
        let store = MemoryStore::new();
        let result = store.add_loyalty_points(CustomerId::generate(), 10).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_add_loyalty_points_overflow_leaves_balance() {
        let store = MemoryStore::new();
        let mut customer = profile("customer", None, None);
        customer.metadata = with_loyalty_points(serde_json::json!({}), i64::MAX - 1);
        let id = customer.id;
        store.insert_profile(customer).await;

        let result = store.add_loyalty_points(id, 5).await;
        assert!(matches!(result, Err(RepositoryError::BalanceOverflow)));
        assert_eq!(store.profile(id).await.unwrap().loyalty_points(), i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_concurrent_loyalty_updates_do_not_lose_points() {
        let store = Arc::new(MemoryStore::new());
        let customer = profile("customer", None, None);
        let id = customer.id;
        store.insert_profile(customer).await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_loyalty_points(id, 5).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.profile(id).await.unwrap().loyalty_points(), 100);
    }

    #[tokio::test]
    async fn test_broadcast_segments() {
        let store = MemoryStore::new();
        store.insert_profile(profile("vip", Some("+573001111111"), Some(90))).await;
        store.insert_profile(profile("customer", Some("+573002222222"), Some(3))).await;
        store.insert_profile(profile("vip", None, Some(1))).await;

        let now = Utc::now();
        let vip = store.broadcast_recipients(BroadcastSegment::Vip, now, 500).await.unwrap();
        assert_eq!(vip.recipients.len(), 1);
        assert_eq!(vip.recipients[0].phone.as_str(), "+573001111111");

        let recent = store.broadcast_recipients(BroadcastSegment::Recent, now, 500).await.unwrap();
        assert_eq!(recent.recipients.len(), 1);
        assert_eq!(recent.recipients[0].phone.as_str(), "+573002222222");

        let all = store.broadcast_recipients(BroadcastSegment::All, now, 1).await.unwrap();
        assert_eq!(all.recipients.len(), 1);
    }

    #[tokio::test]
    async fn test_record_confirmation_replaces_existing() {
        let store = MemoryStore::new();
        let event_id = EventId::generate();
        let phone = Phone::parse("+573001234567").unwrap();

        let first = store
            .record_confirmation(NewConfirmation {
                event_id,
                phone: phone.clone(),
                name: "Ana".to_string(),
                message_id: "SM1".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .record_confirmation(NewConfirmation {
                event_id,
                phone: phone.clone(),
                name: "Ana María".to_string(),
                message_id: "SM2".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        let rows = store.confirmations().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message_id.as_deref(), Some("SM2"));
    }

    #[tokio::test]
    async fn test_mark_past_events_only_touches_published() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut ids = Vec::new();
        for (status, days) in [
            (EventStatus::Published, -2),
            (EventStatus::Published, 2),
            (EventStatus::Draft, -2),
        ] {
            let event = Event {
                id: EventId::generate(),
                slug: None,
                title: "Partido".to_string(),
                description: None,
                event_date: now + Duration::days(days),
                status,
            };
            ids.push(event.id);
            store.insert_event(event).await;
        }

        assert_eq!(store.mark_past_events(now).await.unwrap(), 1);
        assert_eq!(store.event(ids[0]).await.unwrap().status, EventStatus::Past);
        assert_eq!(store.event(ids[1]).await.unwrap().status, EventStatus::Published);
        assert_eq!(store.event(ids[2]).await.unwrap().status, EventStatus::Draft);
    }

    #[tokio::test]
    async fn test_upsert_event_by_slug() {
        let store = MemoryStore::new();
        let mut event = EventUpsert {
            slug: "clasico-2025".to_string(),
            title: "Clásico".to_string(),
            description: None,
            event_date: Utc::now() + Duration::days(3),
        };

        assert_eq!(store.upsert_event(&event).await.unwrap(), UpsertOutcome::Created);
        event.title = "Clásico capitalino".to_string();
        assert_eq!(store.upsert_event(&event).await.unwrap(), UpsertOutcome::Updated);

        let events = store.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Clásico capitalino");
        assert_eq!(events[0].status, EventStatus::Published);
    }

    #[tokio::test]
    async fn test_count_registrations_window() {
        let store = MemoryStore::new();
        let event_id = EventId::generate();
        let now = Utc::now();
        for (phone, hours_ago) in [("+573001111111", 30), ("+573002222222", 2), ("+573003333333", 50)] {
            let created_at = now - Duration::hours(hours_ago);
            store
                .insert_confirmation(Confirmation {
                    id: ConfirmationId::generate(),
                    event_id,
                    phone: Phone::parse(phone).unwrap(),
                    name: None,
                    status: "sent".to_string(),
                    message_id: None,
                    delivered_at: None,
                    error_message: None,
                    created_at,
                    updated_at: created_at,
                })
                .await;
        }

        let count = store
            .count_registrations(event_id, now - Duration::hours(48), now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
