//! The seam between the bridge's use cases and the physical serial link.
//!
//! Everything that talks to the camera (the bridge loop's client turns,
//! command submission, unsolicited-data polling) goes through this trait.
//! The production implementation is `infrastructure::serial_worker::SerialHandle`,
//! which forwards each call to the single thread that owns the device, so two
//! callers can never interleave their write/response cycles.  Tests substitute
//! recording implementations.

use std::time::Duration;

use async_trait::async_trait;
use visca_core::BridgeError;

/// Mutually-exclusive access to the one serial transport.
#[async_trait]
pub trait SerialLink: Send + Sync {
    /// Writes `request`, then collects the reply frame.
    ///
    /// The write and the reply wait form one critical section: no other
    /// exchange or drain runs on the link until this one finishes.  Returns
    /// `Ok(None)` when nothing arrived within `wait`.
    async fn exchange(&self, request: Vec<u8>, wait: Duration)
        -> Result<Option<Vec<u8>>, BridgeError>;

    /// Returns bytes the device sent on its own (not in reply to a request),
    /// or `Ok(None)` if there are none.  Never waits for new data.
    async fn drain(&self) -> Result<Option<Vec<u8>>, BridgeError>;
}
