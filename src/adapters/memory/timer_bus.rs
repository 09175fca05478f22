//! In-process timer bus: every subscriber sees every published signal.
//!
//! Stands in for Redis when several engines share one process, as the
//! multi-instance tests do.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::foundation::DomainError;
use crate::domain::timer::TimerSignal;
use crate::ports::TimerBus;

const CAPACITY: usize = 256;

pub struct InMemoryTimerBus {
    sender: broadcast::Sender<TimerSignal>,
}

impl InMemoryTimerBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerSignal> {
        self.sender.subscribe()
    }
}

impl Default for InMemoryTimerBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimerBus for InMemoryTimerBus {
    async fn publish(&self, signal: &TimerSignal) -> Result<(), DomainError> {
        // No subscribers is not an error
        let _ = self.sender.send(*signal);
        Ok(())
    }
}
