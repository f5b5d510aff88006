//! Broker backed by the `message_queue` table.
//!
//! Consumers claim one row at a time with `FOR UPDATE SKIP LOCKED` and hold
//! it under a lease (`locked_until`). Ack deletes the row, requeue clears the
//! lease after a backoff that grows with each delivery, reject moves the
//! row to `<queue>.dlq`. A consumer that dies without settling lets the
//! lease expire and the row is redelivered. A row claimed more than
//! `max_deliveries` times is dead-lettered instead of delivered.
//!
//! Replies live on per-process `reply.<uuid>` queues. Rows a call never
//! picked up (late replies, replies to a process that exited) are purged
//! once older than the reply TTL.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tokio::time::Instant;
use uuid::Uuid;

use crate::broker::{Acker, Broker, Delivery, Subscription};
use crate::envelope::{dead_letter_queue, Envelope, Headers, Settlement};
use crate::error::BusError;

/// Default time a claimed message stays invisible to other consumers.
const DEFAULT_LEASE: Duration = Duration::from_secs(300);

pub const DEFAULT_MAX_DELIVERIES: i32 = 5;

/// Requeue delay per delivery so far.
pub const DEFAULT_REQUEUE_BACKOFF: Duration = Duration::from_secs(1);

pub const DEFAULT_REPLY_TTL: Duration = Duration::from_secs(600);

const REPLY_QUEUE_PATTERN: &str = "reply.%";

const COLUMNS: &str = "id, queue, message_id, correlation_id, reply_to, body, delivery_count";

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i64,
    queue: String,
    message_id: Uuid,
    correlation_id: Option<String>,
    reply_to: Option<String>,
    body: serde_json::Value,
    delivery_count: i32,
}

impl MessageRow {
    fn into_envelope(self) -> (i64, Envelope) {
        let headers = Headers {
            message_id: self.message_id,
            correlation_id: self.correlation_id,
            reply_to: self.reply_to,
        };
        (self.id, Envelope::new(self.queue, headers, self.body))
    }
}

#[derive(Clone)]
pub struct PgBroker {
    pool: PgPool,
    poll_interval: Duration,
    lease: Duration,
    max_deliveries: i32,
    requeue_backoff: Duration,
    reply_ttl: Duration,
    reply_queue: String,
}

impl PgBroker {
    /// `poll_interval` paces both consumers and call reply polling.
    pub fn new(pool: PgPool, poll_interval: Duration) -> Self {
        Self {
            pool,
            poll_interval,
            lease: DEFAULT_LEASE,
            max_deliveries: DEFAULT_MAX_DELIVERIES,
            requeue_backoff: DEFAULT_REQUEUE_BACKOFF,
            reply_ttl: DEFAULT_REPLY_TTL,
            reply_queue: format!("reply.{}", Uuid::new_v4()),
        }
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_max_deliveries(mut self, max_deliveries: i32) -> Self {
        self.max_deliveries = max_deliveries;
        self
    }

    pub fn with_requeue_backoff(mut self, backoff: Duration) -> Self {
        self.requeue_backoff = backoff;
        self
    }

    /// Replies older than `ttl` are purged. A call waits at most its own
    /// timeout, so the effective TTL is never shorter than that.
    pub fn with_reply_ttl(mut self, ttl: Duration) -> Self {
        self.reply_ttl = ttl;
        self
    }

    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }

    /// Delete reply rows older than `ttl` on every reply queue.
    pub async fn purge_expired_replies(&self, ttl: Duration) -> Result<u64, BusError> {
        let result = sqlx::query(
            "DELETE FROM message_queue \
             WHERE queue LIKE $1 AND created_at < NOW() - make_interval(secs => $2)",
        )
        .bind(REPLY_QUEUE_PATTERN)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn dead_letter(&self, id: i64, queue: &str) -> Result<(), BusError> {
        sqlx::query("UPDATE message_queue SET queue = $2, locked_until = NULL WHERE id = $1")
            .bind(id)
            .bind(dead_letter_queue(queue))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn claim(&self, queue: &str) -> Result<Option<(i64, i32, Envelope)>, BusError> {
        let query = format!(
            "UPDATE message_queue \
             SET locked_until = NOW() + make_interval(secs => $2), \
                 delivery_count = delivery_count + 1 \
             WHERE id = ( \
                 SELECT id FROM message_queue \
                 WHERE queue = $1 AND (locked_until IS NULL OR locked_until < NOW()) \
                 ORDER BY id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(queue)
            .bind(self.lease.as_secs_f64())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| {
            let delivery_count = row.delivery_count;
            let (id, envelope) = row.into_envelope();
            (id, delivery_count, envelope)
        }))
    }

    /// Remove and return the reply correlated with `call_id`, if present.
    async fn take_reply(&self, call_id: Uuid) -> Result<Option<Envelope>, BusError> {
        let query = format!(
            "DELETE FROM message_queue \
             WHERE id = ( \
                 SELECT id FROM message_queue \
                 WHERE queue = $1 AND correlation_id = $2 \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(&self.reply_queue)
            .bind(call_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_envelope().1))
    }
}

#[async_trait]
impl Broker for PgBroker {
    async fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        sqlx::query(
            "INSERT INTO message_queue (queue, message_id, correlation_id, reply_to, body) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&envelope.queue)
        .bind(envelope.headers.message_id)
        .bind(&envelope.headers.correlation_id)
        .bind(&envelope.headers.reply_to)
        .bind(&envelope.body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn call(
        &self,
        queue: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<Envelope, BusError> {
        let headers = Headers::new().with_reply_to(self.reply_queue.clone());
        let call_id = headers.message_id;
        let purged = self.purge_expired_replies(self.reply_ttl.max(timeout)).await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired replies");
        }
        self.publish(Envelope::new(queue, headers, body)).await?;

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(reply) = self.take_reply(call_id).await? {
                return Ok(reply);
            }
            if Instant::now() >= deadline {
                tracing::warn!(queue, call_id = %call_id, "Call timed out waiting for reply");
                return Err(BusError::Timeout {
                    queue: queue.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep_until((Instant::now() + self.poll_interval).min(deadline)).await;
        }
    }

    async fn consume(&self, queue: &str) -> Result<Box<dyn Subscription>, BusError> {
        Ok(Box::new(PgSubscription {
            broker: self.clone(),
            queue: queue.to_string(),
        }))
    }
}

struct PgSubscription {
    broker: PgBroker,
    queue: String,
}

#[async_trait]
impl Subscription for PgSubscription {
    async fn next(&mut self) -> Result<Delivery, BusError> {
        let mut ticker = tokio::time::interval(self.broker.poll_interval);
        loop {
            ticker.tick().await;
            let Some((id, delivery_count, envelope)) = self.broker.claim(&self.queue).await? else {
                continue;
            };
            if delivery_count > self.broker.max_deliveries {
                tracing::warn!(
                    queue = %self.queue,
                    message_id = %envelope.headers.message_id,
                    delivery_count,
                    "Delivery limit exceeded, dead-lettering message",
                );
                self.broker.dead_letter(id, &self.queue).await?;
                continue;
            }
            let acker = PgAcker {
                broker: self.broker.clone(),
                id,
            };
            return Ok(Delivery::new(envelope, Box::new(acker)));
        }
    }
}

struct PgAcker {
    broker: PgBroker,
    id: i64,
}

#[async_trait]
impl Acker for PgAcker {
    async fn settle(
        self: Box<Self>,
        envelope: &Envelope,
        settlement: Settlement,
    ) -> Result<(), BusError> {
        match settlement {
            Settlement::Ack => {
                sqlx::query("DELETE FROM message_queue WHERE id = $1")
                    .bind(self.id)
                    .execute(&self.broker.pool)
                    .await?;
            }
            Settlement::Requeue => {
                sqlx::query(
                    "UPDATE message_queue \
                     SET locked_until = NOW() + make_interval(secs => $2 * delivery_count) \
                     WHERE id = $1",
                )
                .bind(self.id)
                .bind(self.broker.requeue_backoff.as_secs_f64())
                .execute(&self.broker.pool)
                .await?;
            }
            Settlement::Reject => {
                self.broker.dead_letter(self.id, &envelope.queue).await?;
            }
        }
        Ok(())
    }
}
