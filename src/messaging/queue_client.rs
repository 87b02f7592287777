//! # Queue Client
//!
//! pgmq-backed implementation of the worker's queue operations. One client
//! owns the connection and both queue names; it is built once at startup
//! (with bounded-backoff retries) and passed explicitly to the consumer.
//!
//! The [`JobQueue`] trait is the seam between the consumer loop and the
//! transport; tests drive the loop through an in-memory double.

use async_trait::async_trait;
use pgmq::PGMQueue;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{BrokerSettings, ConsumerTuning};
use crate::messaging::MessagingError;

/// One message as handed to the consumer.
#[derive(Debug, Clone)]
pub struct QueueDelivery {
    pub msg_id: i64,
    /// How many times the broker has delivered this message, this read
    /// included.
    pub read_count: i32,
    pub body: Value,
}

/// Queue operations the consumer loop needs. `ack` removes a message for
/// good; `reject` dead-letters it (archive); `publish` appends to the
/// finished queue. Durability is the transport's responsibility.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn fetch_one(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: i32,
    ) -> Result<Option<QueueDelivery>, MessagingError>;

    async fn ack(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError>;

    async fn reject(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError>;

    async fn publish(&self, queue_name: &str, body: &Value) -> Result<i64, MessagingError>;
}

/// pgmq client wrapper.
#[derive(Debug, Clone)]
pub struct QueueClient {
    pgmq: PGMQueue,
}

impl QueueClient {
    /// Connect to the queue database.
    pub async fn connect(database_url: &str) -> Result<Self, MessagingError> {
        let pgmq = PGMQueue::new(database_url.to_string())
            .await
            .map_err(|e| MessagingError::connection(e.to_string()))?;
        Ok(Self { pgmq })
    }

    /// Connect with bounded exponential backoff, then declare the given
    /// queues. Used at startup; queues are (re)declared after every
    /// successful connection so a fresh database is usable immediately.
    pub async fn connect_with_backoff(
        broker: &BrokerSettings,
        tuning: &ConsumerTuning,
        queues: &[&str],
    ) -> Result<Self, MessagingError> {
        let url = broker.database_url();
        let mut delay = tuning.connect_backoff;
        let mut last_error = String::new();

        for attempt in 1..=tuning.max_connect_attempts {
            match Self::connect(&url).await {
                Ok(client) => {
                    info!(
                        host = %broker.host,
                        port = broker.port,
                        attempt = attempt,
                        "Connected to queue database"
                    );
                    for queue in queues {
                        client.declare_queue(queue).await?;
                    }
                    return Ok(client);
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        attempt = attempt,
                        max_attempts = tuning.max_connect_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "Queue connection failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(tuning.max_connect_backoff);
                }
            }
        }

        Err(MessagingError::connection(format!(
            "exhausted {} connection attempts: {last_error}",
            tuning.max_connect_attempts
        )))
    }

    /// Create the queue if it does not exist. Idempotent.
    pub async fn declare_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        debug!(queue = %queue_name, "Declaring queue");
        self.pgmq.create(queue_name).await.map_err(|e| {
            MessagingError::queue_operation(queue_name, "create", e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for QueueClient {
    async fn fetch_one(
        &self,
        queue_name: &str,
        visibility_timeout_seconds: i32,
    ) -> Result<Option<QueueDelivery>, MessagingError> {
        let message = self
            .pgmq
            .read::<Value>(queue_name, Some(visibility_timeout_seconds))
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "read", e.to_string()))?;

        Ok(message.map(|m| QueueDelivery {
            msg_id: m.msg_id,
            read_count: m.read_ct,
            body: m.message,
        }))
    }

    async fn ack(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        debug!(queue = %queue_name, msg_id = msg_id, "Acknowledging message");
        self.pgmq.delete(queue_name, msg_id).await.map_err(|e| {
            MessagingError::queue_operation(queue_name, "delete", e.to_string())
        })?;
        Ok(())
    }

    async fn reject(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        warn!(queue = %queue_name, msg_id = msg_id, "Dead-lettering message");
        self.pgmq.archive(queue_name, msg_id).await.map_err(|e| {
            MessagingError::queue_operation(queue_name, "archive", e.to_string())
        })?;
        Ok(())
    }

    async fn publish(&self, queue_name: &str, body: &Value) -> Result<i64, MessagingError> {
        let msg_id = self
            .pgmq
            .send(queue_name, body)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "send", e.to_string()))?;
        debug!(queue = %queue_name, msg_id = msg_id, "Published message");
        Ok(msg_id)
    }
}
