//! # Password Entries
//!
//! A [`PasswordEntry`] is the unit of storage in the vault: a named,
//! owner-scoped record holding an opaque commitment to an encrypted secret
//! plus the access-control counters that drive the penalty engine.
//!
//! The ledger never sees plaintext. Encryption, decryption, and off-ledger
//! storage of the real payload are the client's business — all that lands
//! here is a fixed-size [`Commitment`] which the ledger compares for
//! equality and otherwise refuses to interpret.
//!
//! ## Lock State Is Derived, Not Stored
//!
//! There is no `locked: bool` anywhere. An entry is locked iff
//! `now < lock_until`, evaluated lazily against the clock value passed into
//! each call. Locks therefore expire on their own, with no scheduled
//! unlock job and no stale flag to forget to clear.

use std::fmt;

use chrono::{DateTime, Utc};
use hex::FromHex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Commitment
// ---------------------------------------------------------------------------

/// An opaque 32-byte commitment to an encrypted secret.
///
/// Produced client-side (typically a hash of the encrypted payload) and
/// stored verbatim. The ledger compares commitments for equality during
/// retrieval attempts and does nothing else with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Wraps raw commitment bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex string into a commitment.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(<[u8; 32]>::from_hex(s)?))
    }

    /// The raw commitment bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// PasswordEntry
// ---------------------------------------------------------------------------

/// A named vault entry owned by exactly one principal.
///
/// Names are unique only within their owner's namespace — two principals
/// can both have a "Gmail" entry without colliding. Re-storing under an
/// existing name replaces the entry wholesale and zeroes its counters; no
/// merge with prior history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordEntry {
    /// Entry name, unique per owner.
    pub name: String,
    /// Free-form account label (e.g. an email address). Not secret.
    pub account: String,
    /// Commitment to the encrypted secret. Never interpreted.
    pub commitment: Commitment,
    /// Whether the secret has an associated verification code. Metadata
    /// only — nothing in the ledger branches on it.
    pub has_code: bool,
    /// Value that must be attached to a retrieval attempt, smallest units.
    pub cost: u64,
    /// Failed attempts since the last explicit reset.
    pub attempt_count: u32,
    /// Successful attempts since the last explicit reset.
    pub open_count: u32,
    /// If set, the entry is locked until this instant. `None` means the
    /// entry has never locked (or was reset).
    pub lock_until: Option<DateTime<Utc>>,
}

impl PasswordEntry {
    /// Creates a fresh entry with zeroed counters and no lock.
    pub fn new(
        name: &str,
        account: &str,
        commitment: Commitment,
        has_code: bool,
        cost: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            account: account.to_string(),
            commitment,
            has_code,
            cost,
            attempt_count: 0,
            open_count: 0,
            lock_until: None,
        }
    }

    /// `true` iff the entry is locked at the given instant.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.lock_until {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Seconds until the lock expires, or 0 if the entry is not locked.
    pub fn time_until_unlock(&self, now: DateTime<Utc>) -> u64 {
        match self.lock_until {
            Some(until) if now < until => (until - now).num_seconds().max(0) as u64,
            _ => 0,
        }
    }

    /// Zeroes both counters and clears the lock, from any state.
    ///
    /// This is the designated unlock-and-clear mechanic: it works even
    /// while the entry is locked, independent of elapsed time.
    pub fn reset(&mut self) {
        self.attempt_count = 0;
        self.open_count = 0;
        self.lock_until = None;
    }

    /// Builds the read-only view returned by detail queries, with the
    /// lock state derived against `now`.
    pub fn details(&self, now: DateTime<Utc>) -> EntryDetails {
        EntryDetails {
            name: self.name.clone(),
            account: self.account.clone(),
            commitment: self.commitment,
            has_code: self.has_code,
            cost: self.cost,
            attempt_count: self.attempt_count,
            open_count: self.open_count,
            is_locked: self.is_locked(now),
            time_until_unlock_secs: self.time_until_unlock(now),
        }
    }
}

// ---------------------------------------------------------------------------
// EntryDetails
// ---------------------------------------------------------------------------

/// Snapshot of an entry plus its derived lock state, as returned by
/// [`get_password_details`](crate::ledger::VaultLedger::get_password_details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    /// Entry name.
    pub name: String,
    /// Free-form account label.
    pub account: String,
    /// Stored commitment.
    pub commitment: Commitment,
    /// Verification-code metadata flag.
    pub has_code: bool,
    /// Required attached value for a retrieval attempt.
    pub cost: u64,
    /// Failed attempts since the last reset.
    pub attempt_count: u32,
    /// Successful attempts since the last reset.
    pub open_count: u32,
    /// Whether the entry was locked at the queried instant.
    pub is_locked: bool,
    /// Seconds remaining until unlock at the queried instant (0 if unlocked).
    pub time_until_unlock_secs: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
