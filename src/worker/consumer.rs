//! # Calculation Consumer
//!
//! The consume loop. One logical worker drives it; at most one message is
//! ever outstanding because the next fetch only happens after the current
//! message has been acknowledged or dead-lettered. This prefetch-of-one is
//! the only backpressure mechanism. Throughput scales by running more
//! worker processes against the same queue, not by concurrency inside one.

use tracing::{error, info, instrument, warn};

use crate::config::{AckMode, WorkerConfig};
use crate::error::Result;
use crate::messaging::{CalculationResult, JobQueue};
use crate::simulation::SimulationAdapter;
use crate::worker::processor::JobProcessor;

/// Consumes calculation jobs and publishes their results.
pub struct CalculationConsumer<Q, S> {
    queue: Q,
    processor: JobProcessor<S>,
    config: WorkerConfig,
}

impl<Q: JobQueue, S: SimulationAdapter> CalculationConsumer<Q, S> {
    pub fn new(queue: Q, processor: JobProcessor<S>, config: WorkerConfig) -> Self {
        Self {
            queue,
            processor,
            config,
        }
    }

    /// Run the consume loop until the task is cancelled. Queue errors are
    /// logged and retried after the poll interval; they never terminate
    /// the loop.
    pub async fn run(&self) -> Result<()> {
        info!(
            input_queue = %self.config.calculation_queue,
            output_queue = %self.config.finished_queue,
            ack_mode = ?self.config.ack_mode,
            "Starting calculation consume loop"
        );

        loop {
            match self.process_next().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::time::sleep(self.config.tuning.poll_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "Consume iteration failed");
                    tokio::time::sleep(self.config.tuning.poll_interval).await;
                }
            }
        }
    }

    /// One consume iteration. Returns `Ok(true)` when a message was taken
    /// off the queue, `Ok(false)` when the queue was empty.
    #[instrument(skip(self))]
    pub async fn process_next(&self) -> Result<bool> {
        let visibility_timeout = match self.config.ack_mode {
            // Early mode deletes right away; the timeout only needs to
            // cover the gap between read and delete.
            AckMode::Early => 60,
            AckMode::AfterCompletion => self.config.tuning.visibility_timeout_seconds,
        };

        let Some(delivery) = self
            .queue
            .fetch_one(&self.config.calculation_queue, visibility_timeout)
            .await?
        else {
            return Ok(false);
        };

        if self.config.ack_mode == AckMode::AfterCompletion
            && delivery.read_count > self.config.tuning.max_deliveries
        {
            warn!(
                msg_id = delivery.msg_id,
                read_count = delivery.read_count,
                max_deliveries = self.config.tuning.max_deliveries,
                "Message exceeded delivery limit, dead-lettering"
            );
            self.queue
                .reject(&self.config.calculation_queue, delivery.msg_id)
                .await?;
            return Ok(true);
        }

        let job = match self.processor.decode(&delivery.body) {
            Ok(job) => job,
            Err(e) => {
                warn!(msg_id = delivery.msg_id, error = %e, "Undecodable job body, dead-lettering");
                self.queue
                    .reject(&self.config.calculation_queue, delivery.msg_id)
                    .await?;
                return Ok(true);
            }
        };

        // At-most-once default: the message is gone before any staging or
        // simulation work starts.
        if self.config.ack_mode == AckMode::Early {
            self.queue
                .ack(&self.config.calculation_queue, delivery.msg_id)
                .await?;
        }

        let result = self.processor.process(&job, &delivery.body).await;
        self.publish_result(&result).await;

        if self.config.ack_mode == AckMode::AfterCompletion {
            self.queue
                .ack(&self.config.calculation_queue, delivery.msg_id)
                .await?;
        }

        Ok(true)
    }

    /// Publish a result to the finished queue. A publish failure does not
    /// fail the job: it is logged and the result is parked on disk for
    /// manual recovery.
    async fn publish_result(&self, result: &CalculationResult) {
        let body = match serde_json::to_value(result) {
            Ok(body) => body,
            Err(e) => {
                error!(
                    calculation_id = %result.calculation_id,
                    error = %e,
                    "Result serialization failed"
                );
                return;
            }
        };

        match self.queue.publish(&self.config.finished_queue, &body).await {
            Ok(msg_id) => {
                if result.is_success() {
                    info!(
                        calculation_id = %result.calculation_id,
                        msg_id = msg_id,
                        "Published calculation result"
                    );
                } else {
                    warn!(
                        calculation_id = %result.calculation_id,
                        status_code = %result.status_code,
                        msg_id = msg_id,
                        "Published failure result"
                    );
                }
            }
            Err(e) => {
                error!(
                    calculation_id = %result.calculation_id,
                    error = %e,
                    "Failed to publish calculation result"
                );
                match self.processor.workspace().persist_undeliverable(result) {
                    Ok(path) => {
                        warn!(
                            calculation_id = %result.calculation_id,
                            path = %path.display(),
                            "Parked undeliverable result on disk"
                        );
                    }
                    Err(persist_err) => {
                        error!(
                            calculation_id = %result.calculation_id,
                            error = %persist_err,
                            "Could not park undeliverable result"
                        );
                    }
                }
            }
        }
    }
}
