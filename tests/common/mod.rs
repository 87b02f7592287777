//! Shared test doubles: a recording simulation adapter and an in-memory
//! queue that tracks outstanding deliveries so tests can verify the
//! prefetch-of-one bound and acknowledgment ordering.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use flopy_worker::messaging::{JobQueue, MessagingError, QueueDelivery};
use flopy_worker::simulation::{
    SimulationAdapter, SimulationError, SimulationOutput, SimulationRequest,
};

/// What the fake engine should do for every invocation.
#[derive(Debug, Clone)]
pub enum AdapterOutcome {
    Succeed { data: Value, message: String },
    Fail { message: String },
}

/// Simulation adapter double that records every request it sees.
pub struct RecordingAdapter {
    outcome: AdapterOutcome,
    requests: Mutex<Vec<SimulationRequest>>,
}

impl RecordingAdapter {
    pub fn succeeding(data: Value, message: &str) -> Self {
        Self {
            outcome: AdapterOutcome::Succeed {
                data,
                message: message.to_string(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: AdapterOutcome::Fail {
                message: message.to_string(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SimulationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SimulationAdapter for RecordingAdapter {
    async fn run(&self, request: SimulationRequest) -> Result<SimulationOutput, SimulationError> {
        self.requests.lock().unwrap().push(request);
        match &self.outcome {
            AdapterOutcome::Succeed { data, message } => Ok(SimulationOutput {
                data: data.clone(),
                message: message.clone(),
            }),
            AdapterOutcome::Fail { message } => {
                Err(SimulationError::engine_failure(message.clone()))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct StoredMessage {
    msg_id: i64,
    read_count: i32,
    body: Value,
}

#[derive(Debug, Default)]
struct QueueState {
    queues: HashMap<String, VecDeque<StoredMessage>>,
    outstanding: HashMap<String, Vec<i64>>,
    archived: HashMap<String, Vec<i64>>,
    next_id: i64,
    max_outstanding_seen: usize,
    fail_publish: bool,
}

/// In-memory `JobQueue` double. Clones share state, so a test can keep a
/// handle for assertions while the consumer owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a message onto a queue as if a producer had sent it.
    pub fn push_message(&self, queue_name: &str, body: Value) -> i64 {
        self.push_message_with_read_count(queue_name, body, 0)
    }

    /// Seed a message the broker has already delivered `read_count` times,
    /// for redelivery-limit tests.
    pub fn push_message_with_read_count(
        &self,
        queue_name: &str,
        body: Value,
        read_count: i32,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let msg_id = state.next_id;
        state
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .push_back(StoredMessage {
                msg_id,
                read_count,
                body,
            });
        msg_id
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.state.lock().unwrap().fail_publish = fail;
    }

    /// Bodies currently sitting on a queue (published results included).
    pub fn queued_bodies(&self, queue_name: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .queues
            .get(queue_name)
            .map(|q| q.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn archived_count(&self, queue_name: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.archived.get(queue_name).map(Vec::len).unwrap_or(0)
    }

    pub fn outstanding_count(&self, queue_name: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .outstanding
            .get(queue_name)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Highest number of simultaneously unacknowledged deliveries observed
    /// across all queues.
    pub fn max_outstanding_seen(&self) -> usize {
        self.state.lock().unwrap().max_outstanding_seen
    }

    fn take_outstanding(state: &mut QueueState, queue_name: &str, msg_id: i64) -> Option<()> {
        let outstanding = state.outstanding.get_mut(queue_name)?;
        let position = outstanding.iter().position(|id| *id == msg_id)?;
        outstanding.remove(position);
        Some(())
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn fetch_one(
        &self,
        queue_name: &str,
        _visibility_timeout_seconds: i32,
    ) -> Result<Option<QueueDelivery>, MessagingError> {
        let mut state = self.state.lock().unwrap();
        let Some(message) = state
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .pop_front()
        else {
            return Ok(None);
        };

        let delivery = QueueDelivery {
            msg_id: message.msg_id,
            read_count: message.read_count + 1,
            body: message.body,
        };

        state
            .outstanding
            .entry(queue_name.to_string())
            .or_default()
            .push(message.msg_id);
        let outstanding_now: usize = state.outstanding.values().map(Vec::len).sum();
        state.max_outstanding_seen = state.max_outstanding_seen.max(outstanding_now);

        Ok(Some(delivery))
    }

    async fn ack(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        let mut state = self.state.lock().unwrap();
        Self::take_outstanding(&mut state, queue_name, msg_id).ok_or_else(|| {
            MessagingError::queue_operation(queue_name, "delete", "message not outstanding")
        })
    }

    async fn reject(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        let mut state = self.state.lock().unwrap();
        Self::take_outstanding(&mut state, queue_name, msg_id).ok_or_else(|| {
            MessagingError::queue_operation(queue_name, "archive", "message not outstanding")
        })?;
        state
            .archived
            .entry(queue_name.to_string())
            .or_default()
            .push(msg_id);
        Ok(())
    }

    async fn publish(&self, queue_name: &str, body: &Value) -> Result<i64, MessagingError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_publish {
            return Err(MessagingError::queue_operation(
                queue_name,
                "send",
                "simulated publish failure",
            ));
        }
        state.next_id += 1;
        let msg_id = state.next_id;
        state
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .push_back(StoredMessage {
                msg_id,
                read_count: 0,
                body: body.clone(),
            });
        Ok(msg_id)
    }
}
