//! # flopy-worker
//!
//! Queue-driven worker for groundwater-flow calculation jobs. It consumes
//! `CalculationJob` messages from a durable input queue, stages each job's
//! configuration in a per-calculation workspace directory, delegates the
//! numerical simulation to an external engine, and publishes a structured
//! `CalculationResult` onto a durable output queue.
//!
//! ## Architecture
//!
//! A single consumer task drives everything. The queue never hands the
//! worker a second message while one is in flight (prefetch-of-one); this
//! is the only backpressure mechanism. To scale, run more worker processes
//! against the same queue.
//!
//! ## Module Organization
//!
//! - [`config`] - environment-only configuration loading
//! - [`messaging`] - message shapes, queue client, and the `JobQueue` seam
//! - [`simulation`] - the external engine contract and subprocess adapter
//! - [`worker`] - workspace staging, job processing, the consume loop
//! - [`error`] - crate-level error rollup
//! - [`logging`] - tracing subscriber setup
//!
//! ## Delivery semantics
//!
//! By default a message is acknowledged right after it decodes, before any
//! staging or simulation work (at-most-once: a crash mid-job loses the
//! job). `WORKER_ACK_MODE=after-completion` opts into acknowledging only
//! after the result is published, with redelivery bounded by a delivery
//! limit (at-least-once with bounded duplication).

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod simulation;
pub mod worker;

pub use config::{AckMode, WorkerConfig};
pub use error::{Result, WorkerError};
pub use messaging::{CalculationJob, CalculationResult, JobQueue, QueueClient};
pub use simulation::{SimulationAdapter, SimulationError, SimulationOutput, SimulationRequest};
pub use worker::{CalculationConsumer, JobProcessor, WorkspaceManager};
