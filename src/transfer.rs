//! # Value Transfer Seam
//!
//! The ledger never holds or moves real funds itself — it consumes a
//! transfer primitive supplied by the surrounding host (a chain runtime,
//! a payment rail, a test harness). That primitive is modeled as the
//! [`ValueTransfer`] trait: "deliver `amount` to `to`, or tell me you
//! couldn't."
//!
//! A failed delivery aborts the calling ledger operation wholesale. The
//! ledger guarantees this by staging all of its arithmetic first, invoking
//! the outlet, and mutating state only after the outlet reports success —
//! so a [`TransferError`] bubbling up always leaves the books untouched.
//!
//! [`Payouts`] is the reference implementation: an in-memory recorder that
//! accepts every transfer and remembers who got what. Tests use it to
//! assert the conservation invariant (every accepted unit is either
//! refunded, retained, or tipped).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors the underlying value-transfer primitive can report.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The recipient refused or could not receive the value.
    #[error("transfer to {recipient} was rejected")]
    Rejected {
        /// The identity the delivery was addressed to.
        recipient: String,
    },

    /// The outlet itself is unable to process transfers right now.
    #[error("transfer outlet unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// ValueTransfer
// ---------------------------------------------------------------------------

/// Outbound value delivery, as seen by the ledger.
///
/// Implementations must be atomic per call: either the full `amount`
/// reaches `to`, or an error is returned and nothing moved. The ledger
/// never calls this with `amount == 0`.
pub trait ValueTransfer {
    /// Deliver `amount` (smallest units) to the identity `to`.
    fn transfer(&mut self, to: &str, amount: u64) -> Result<(), TransferError>;
}

// ---------------------------------------------------------------------------
// Payouts
// ---------------------------------------------------------------------------

/// In-memory transfer outlet that records every delivery.
///
/// Useful for tests and for hosts that settle payouts in a separate step:
/// run the ledger operation against a `Payouts`, then drain the recorded
/// amounts into the real payment rail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payouts {
    /// Cumulative amount delivered per recipient.
    paid: HashMap<String, u64>,
    /// Sum of all deliveries ever recorded.
    total_paid: u64,
}

impl Payouts {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cumulative amount delivered to `who`, or 0 if they never received
    /// anything.
    pub fn paid_to(&self, who: &str) -> u64 {
        self.paid.get(who).copied().unwrap_or(0)
    }

    /// Sum of all deliveries recorded so far.
    pub fn total_paid(&self) -> u64 {
        self.total_paid
    }

    /// Number of distinct recipients.
    pub fn recipient_count(&self) -> usize {
        self.paid.len()
    }
}

impl ValueTransfer for Payouts {
    fn transfer(&mut self, to: &str, amount: u64) -> Result<(), TransferError> {
        let entry = self.paid.entry(to.to_string()).or_insert(0);
        let new_balance = entry.checked_add(amount).ok_or_else(|| {
            TransferError::Unavailable("payout counter overflow".to_string())
        })?;
        let new_total = self.total_paid.checked_add(amount).ok_or_else(|| {
            TransferError::Unavailable("payout counter overflow".to_string())
        })?;
        *entry = new_balance;
        self.total_paid = new_total;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payouts_accumulate_per_recipient() {
        let mut p = Payouts::new();
        p.transfer("alice", 100).unwrap();
        p.transfer("alice", 250).unwrap();
        p.transfer("bob", 40).unwrap();

        assert_eq!(p.paid_to("alice"), 350);
        assert_eq!(p.paid_to("bob"), 40);
        assert_eq!(p.paid_to("carol"), 0);
        assert_eq!(p.total_paid(), 390);
        assert_eq!(p.recipient_count(), 2);
    }

    #[test]
    fn payout_overflow_rejected() {
        let mut p = Payouts::new();
        p.transfer("alice", u64::MAX).unwrap();
        let result = p.transfer("alice", 1);
        assert!(matches!(result, Err(TransferError::Unavailable(_))));
        // The failed call must not have moved anything.
        assert_eq!(p.paid_to("alice"), u64::MAX);
        assert_eq!(p.total_paid(), u64::MAX);
    }

    #[test]
    fn payouts_serialization_roundtrip() {
        let mut p = Payouts::new();
        p.transfer("alice", 123).unwrap();

        let json = serde_json::to_string(&p).expect("serialize");
        let recovered: Payouts = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.paid_to("alice"), 123);
        assert_eq!(recovered.total_paid(), 123);
    }
}
