//! # Messaging Module
//!
//! PostgreSQL message queue (pgmq) based messaging for the calculation
//! worker: inbound job and outbound result structures, the queue client,
//! and the `JobQueue` seam the consumer loop is written against.

pub mod errors;
pub mod message;
pub mod queue_client;

pub use errors::MessagingError;
pub use message::{CalculationJob, CalculationResult};
pub use queue_client::{JobQueue, QueueClient, QueueDelivery};
