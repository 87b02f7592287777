//! # Worker Module
//!
//! The job-consumption core: workspace staging, per-job processing, and the
//! prefetch-of-one consume loop.

pub mod consumer;
pub mod processor;
pub mod workspace;

pub use consumer::CalculationConsumer;
pub use processor::{derive_engine_config, AckDisposition, Handled, JobProcessor};
pub use workspace::{WorkspaceError, WorkspaceManager};
