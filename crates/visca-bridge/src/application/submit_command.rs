//! CommandService: inject a command into the serial link outside the TCP path.
//!
//! The admin UI uses this for manual hex commands and preset buttons.  From the
//! link's point of view the admin API is just one more client: it competes
//! for the same [`SerialLink`] as the bridge loop's client turns and is
//! served under the same mutual exclusion.

use std::sync::Arc;
use std::time::Duration;

use visca_core::{encode_hex, parse_hex_command, BridgeError, StatsSink};

use crate::application::serial_link::SerialLink;

/// Submits hex commands to the camera and returns its reply.
pub struct CommandService {
    link: Arc<dyn SerialLink>,
    sink: Arc<StatsSink>,
    response_timeout: Duration,
}

impl CommandService {
    pub fn new(link: Arc<dyn SerialLink>, sink: Arc<StatsSink>, response_timeout: Duration) -> Self {
        Self {
            link,
            sink,
            response_timeout,
        }
    }

    /// Parses `hex`, sends it to the camera and waits for the reply frame.
    ///
    /// Returns the reply as lowercase hex, or `None` if the camera did not
    /// answer within the response timeout.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidInput`] if `hex` is malformed.  The link is not
    ///   touched and no counter changes.
    /// - Any transport error from the link (`WriteTimeout`, `ReadTimeout`,
    ///   `TransportIo`, `LinkClosed`).
    pub async fn submit(&self, hex: &str) -> Result<Option<String>, BridgeError> {
        let request = parse_hex_command(hex)?;

        match self.link.exchange(request, self.response_timeout).await {
            Ok(reply) => {
                self.sink.info(format!("CMD: {}", hex.trim()));
                Ok(reply.map(|bytes| encode_hex(&bytes)))
            }
            Err(e) => {
                self.sink.warn(format!("CMD {} failed: {e}", hex.trim()));
                Err(e)
            }
        }
    }
}
