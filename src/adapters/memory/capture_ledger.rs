//! In-memory capture ledger for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{CaptureAck, CaptureLedger};

/// Capture ledger backed by a mutex-guarded map keyed by payment id.
pub struct InMemoryCaptureLedger {
    acks: Mutex<HashMap<String, CaptureAck>>,
}

impl InMemoryCaptureLedger {
    pub fn new() -> Self {
        Self {
            acks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a stored acknowledgement by payment id.
    pub fn get(&self, payment_id: &str) -> Option<CaptureAck> {
        self.acks.lock().unwrap().get(payment_id).cloned()
    }
}

impl Default for InMemoryCaptureLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureLedger for InMemoryCaptureLedger {
    async fn acknowledge(&self, ack: &CaptureAck) -> Result<(), DomainError> {
        self.acks
            .lock()
            .unwrap()
            .entry(ack.payment_id.clone())
            .or_insert_with(|| ack.clone());
        Ok(())
    }

    async fn mark_recorded(&self, payment_id: &str) -> Result<(), DomainError> {
        if let Some(ack) = self.acks.lock().unwrap().get_mut(payment_id) {
            if ack.recorded_at.is_none() {
                ack.recorded_at = Some(Timestamp::now());
            }
        }
        Ok(())
    }

    async fn list_unrecorded(&self) -> Result<Vec<CaptureAck>, DomainError> {
        let mut acks: Vec<CaptureAck> = self
            .acks
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.recorded_at.is_none())
            .cloned()
            .collect();
        acks.sort_by(|a, b| a.acknowledged_at.cmp(&b.acknowledged_at));
        Ok(acks)
    }
}
