//! `PostgreSQL` implementation of the repositories.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skybox_core::api::{DeliveryReport, EventUpsert, RegistrationSummary};
use skybox_core::{
    BroadcastSegment, ConfirmationId, CustomerId, EventId, EventStatus, Phone, delivery_status,
};

use super::{
    ConfirmationRepository, EventRepository, ProfileRepository, RepositoryError, Store,
};
use crate::models::{
    Audience, Event, LoyaltyBalance, NewConfirmation, Recipient, UpsertOutcome, loyalty_points,
    with_loyalty_points,
};

/// Repositories backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct LoyaltyRow {
    full_name: Option<String>,
    metadata: serde_json::Value,
}

#[derive(sqlx::FromRow)]
struct RecipientRow {
    name: Option<String>,
    phone: String,
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: Uuid,
    status: String,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    slug: Option<String>,
    title: String,
    description: Option<String>,
    event_date: DateTime<Utc>,
    status: String,
}

impl TryFrom<EventRow> for Event {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::new(row.id),
            slug: row.slug,
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            status: parse_event_status(&row.status)?,
        })
    }
}

/// Rows with an unparseable phone are counted as skipped: they can never be messaged.
fn into_audience(rows: Vec<RecipientRow>) -> Audience {
    let mut audience = Audience::default();
    for row in rows {
        match Phone::parse(&row.phone) {
            Ok(phone) => audience.recipients.push(Recipient {
                name: row.name,
                phone,
            }),
            Err(e) => {
                tracing::warn!(phone = %row.phone, error = %e, "Skipping recipient with invalid phone");
                audience.skipped += 1;
            }
        }
    }
    audience
}

fn parse_event_status(value: &str) -> Result<EventStatus, RepositoryError> {
    match value {
        "draft" => Ok(EventStatus::Draft),
        "published" => Ok(EventStatus::Published),
        "past" => Ok(EventStatus::Past),
        "cancelled" => Ok(EventStatus::Cancelled),
        other => Err(RepositoryError::DataCorruption(format!(
            "invalid event status in database: {other}"
        ))),
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    #[tracing::instrument(skip(self))]
    async fn add_loyalty_points(
        &self,
        customer: CustomerId,
        points: i64,
    ) -> Result<LoyaltyBalance, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent updates for the same customer
        let row: Option<LoyaltyRow> = sqlx::query_as(
            r"
            SELECT full_name, metadata
            FROM profiles
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(customer.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        let previous = loyalty_points(&row.metadata);
        let new_total = previous
            .checked_add(points)
            .ok_or(RepositoryError::BalanceOverflow)?;

        sqlx::query(
            r"
            UPDATE profiles
            SET metadata = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(customer.as_uuid())
        .bind(with_loyalty_points(row.metadata, new_total))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LoyaltyBalance {
            customer_name: row.full_name,
            previous,
            new_total,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn broadcast_recipients(
        &self,
        segment: BroadcastSegment,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Audience, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<RecipientRow> = match segment {
            BroadcastSegment::Vip => {
                sqlx::query_as(
                    r"
                    SELECT full_name AS name, phone
                    FROM profiles
                    WHERE phone IS NOT NULL AND phone <> '' AND role = 'vip'
                    ORDER BY created_at
                    LIMIT $1
                    ",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            BroadcastSegment::Recent => {
                let since = now - Duration::days(BroadcastSegment::RECENT_DAYS);
                sqlx::query_as(
                    r"
                    SELECT full_name AS name, phone
                    FROM profiles
                    WHERE phone IS NOT NULL AND phone <> '' AND last_seen_at >= $2
                    ORDER BY created_at
                    LIMIT $1
                    ",
                )
                .bind(limit)
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
            BroadcastSegment::All => {
                sqlx::query_as(
                    r"
                    SELECT full_name AS name, phone
                    FROM profiles
                    WHERE phone IS NOT NULL AND phone <> ''
                    ORDER BY created_at
                    LIMIT $1
                    ",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(into_audience(rows))
    }
}

#[async_trait]
impl ConfirmationRepository for PgStore {
    async fn find_registration(
        &self,
        event: EventId,
        phone: &Phone,
    ) -> Result<Option<RegistrationSummary>, RepositoryError> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            r"
            SELECT id, status
            FROM event_confirmations
            WHERE event_id = $1 AND phone = $2
            ",
        )
        .bind(event.as_uuid())
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| RegistrationSummary {
            id: ConfirmationId::new(r.id),
            status: r.status,
        }))
    }

    #[tracing::instrument(skip(self), fields(event_id = %confirmation.event_id))]
    async fn record_confirmation(
        &self,
        confirmation: NewConfirmation,
    ) -> Result<ConfirmationId, RepositoryError> {
        let id: (Uuid,) = sqlx::query_as(
            r"
            INSERT INTO event_confirmations (id, event_id, phone, name, status, message_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id, phone) DO UPDATE
            SET name = EXCLUDED.name,
                status = EXCLUDED.status,
                message_id = EXCLUDED.message_id,
                delivered_at = NULL,
                error_message = NULL,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(ConfirmationId::generate().as_uuid())
        .bind(confirmation.event_id.as_uuid())
        .bind(confirmation.phone.as_str())
        .bind(&confirmation.name)
        .bind(delivery_status::SENT)
        .bind(&confirmation.message_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ConfirmationId::new(id.0))
    }

    async fn feedback_recipients(&self, event: EventId) -> Result<Audience, RepositoryError> {
        let rows: Vec<RecipientRow> = sqlx::query_as(
            r"
            SELECT name, phone
            FROM event_confirmations
            WHERE event_id = $1 AND status = ANY($2)
            ORDER BY created_at
            ",
        )
        .bind(event.as_uuid())
        .bind(delivery_status::FEEDBACK_ELIGIBLE.as_slice())
        .fetch_all(&self.pool)
        .await?;

        Ok(into_audience(rows))
    }

    #[tracing::instrument(skip(self), fields(sid = %report.message_sid, status = %report.status))]
    async fn apply_delivery_report(
        &self,
        report: &DeliveryReport,
        at: DateTime<Utc>,
    ) -> Result<Option<ConfirmationId>, RepositoryError> {
        let delivered_at = (report.status == delivery_status::DELIVERED).then_some(at);

        let id: Option<(Uuid,)> = sqlx::query_as(
            r"
            UPDATE event_confirmations
            SET status = $2,
                delivered_at = COALESCE($3, delivered_at),
                error_message = COALESCE($4, error_message),
                updated_at = $5
            WHERE message_id = $1
            RETURNING id
            ",
        )
        .bind(&report.message_sid)
        .bind(&report.status)
        .bind(delivered_at)
        .bind(report.failure_description())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map(|(id,)| ConfirmationId::new(id)))
    }

    async fn count_registrations(
        &self,
        event: EventId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*)
            FROM event_confirmations
            WHERE event_id = $1 AND created_at >= $2 AND created_at < $3
            ",
        )
        .bind(event.as_uuid())
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {count}")))
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn find_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, slug, title, description, event_date, status
            FROM events
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn mark_past_events(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE events
            SET status = $1, updated_at = NOW()
            WHERE status = $2 AND event_date < $3
            ",
        )
        .bind(EventStatus::Past.as_str())
        .bind(EventStatus::Published.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(slug = %event.slug))]
    async fn upsert_event(&self, event: &EventUpsert) -> Result<UpsertOutcome, RepositoryError> {
        // xmax is 0 only for a freshly inserted row version
        let (inserted,): (bool,) = sqlx::query_as(
            r"
            INSERT INTO events (id, slug, title, description, event_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                event_date = EXCLUDED.event_date,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&event.slug)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(EventStatus::Published.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, slug, title, description, event_date, status
            FROM events
            ORDER BY event_date
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_status() {
        assert_eq!(parse_event_status("past").ok(), Some(EventStatus::Past));
        assert!(matches!(
            parse_event_status("archived"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_into_audience_counts_invalid_phones() {
        let audience = into_audience(vec![
            RecipientRow {
                name: Some("Ana".to_string()),
                phone: "+57 300 123 4567".to_string(),
            },
            RecipientRow {
                name: None,
                phone: "n/a".to_string(),
            },
        ]);
        assert_eq!(audience.recipients.len(), 1);
        assert_eq!(audience.recipients[0].phone.as_str(), "+573001234567");
        assert_eq!(audience.skipped, 1);
        assert!(!audience.is_empty());
    }
}
