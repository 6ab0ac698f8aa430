//! # Inbound Ports
//!
//! API the message center drives the verifier through.

use crate::domain::{BmvError, BmvStatus};

/// Block message verifier API - inbound port.
///
/// Calls against one link must be serialised by the host; `&mut self` on
/// [`BmvApi::handle_relay_message`] makes that exclusivity explicit.
pub trait BmvApi {
    /// Verify a relay message and return the extracted messages in order.
    ///
    /// `caller` is the account invoking the verifier, `bmc` the BTP address
    /// of this side's message center, `prev` the BTP address of the source
    /// message center and `seq` the sequence the caller expects next. A
    /// failure leaves persisted state untouched.
    fn handle_relay_message(
        &mut self,
        caller: &str,
        bmc: &str,
        prev: &str,
        seq: u64,
        msg: &[u8],
    ) -> Result<Vec<Vec<u8>>, BmvError>;

    /// Height and resume information for relays.
    fn get_status(&self) -> Result<BmvStatus, BmvError>;
}
