//! Timer bus port - carries countdown commands to every engine instance.
//!
//! Delivery is best-effort and may reorder; receivers order signals by
//! their floor version.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::timer::TimerSignal;

#[async_trait]
pub trait TimerBus: Send + Sync {
    /// Sends a signal to every other instance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` with `CacheError` if the transport is down.
    async fn publish(&self, signal: &TimerSignal) -> Result<(), DomainError>;
}
