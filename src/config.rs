//! # Ledger Constants
//!
//! Every economic parameter of the vault ledger lives here. If you're
//! hardcoding one of these numbers somewhere else, you're doing it wrong.
//!
//! All value amounts are denominated in the smallest unit of the native
//! currency — integers only, no decimals, no floating point. The attached
//! value arrives as an integer from the value-transfer collaborator and
//! stays an integer all the way through the books.

use chrono::Duration;

// ---------------------------------------------------------------------------
// Penalty Economics
// ---------------------------------------------------------------------------

/// Base penalty retained from a failed retrieval attempt, in smallest units.
///
/// The actual penalty scales with the attempt tier: the n-th failed attempt
/// (since the last reset) costs `MIN_PENALTY * ceil(n / LOCK_THRESHOLD)`,
/// capped at the value attached to the call.
pub const MIN_PENALTY: u64 = 100_000;

/// Minimum value accepted by [`give_tip`](crate::ledger::VaultLedger::give_tip).
///
/// Keeps dust out of the operator pool. One tenth of the base penalty.
pub const MIN_TIP: u64 = 10_000;

/// Floor on an entry's retrieval cost, enforced at creation and on every
/// cost update.
///
/// Twice the base penalty, so that even a tier-1 failure always leaves the
/// caller a partial refund and the retained penalty never swallows the
/// whole stake.
pub const MIN_ENTRY_COST: u64 = MIN_PENALTY * 2;

// ---------------------------------------------------------------------------
// Lock Schedule
// ---------------------------------------------------------------------------

/// Number of failed attempts that completes a tier and locks the entry.
pub const LOCK_THRESHOLD: u32 = 3;

/// How long an entry stays locked after a tier is completed, in seconds.
/// Three days. Long enough to frustrate a brute-force loop, short enough
/// that a forgetful owner isn't locked out of their own entry forever.
pub const LOCK_PERIOD_SECS: i64 = 3 * 24 * 60 * 60;

/// The lock period as a [`chrono::Duration`], for timestamp arithmetic.
///
/// `Duration::seconds` isn't const, so this is a function rather than a
/// constant. Keep it in sync with [`LOCK_PERIOD_SECS`].
pub fn lock_period() -> Duration {
    Duration::seconds(LOCK_PERIOD_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
