//! # Penalty & Lock Engine
//!
//! Pure decision logic for retrieval attempts. Given the stored and
//! candidate commitments, the entry's failure history, and the attached
//! value, [`judge`] produces an [`AttemptVerdict`] describing exactly what
//! should happen — who gets refunded how much, what penalty is retained,
//! and whether the entry locks. Nothing in this module mutates state; the
//! ledger applies the verdict under its transactional boundary.
//!
//! ## Tiering
//!
//! Failures escalate in tiers of [`LOCK_THRESHOLD`] attempts: the n-th
//! failed attempt since the last reset sits in tier `ceil(n / 3)` and
//! forfeits `MIN_PENALTY * tier`, capped at the attached value. Completing
//! a tier (every 3rd failure) locks the entry for the lock period.
//!
//! Tiers do **not** reset when a lock passively expires — only an explicit
//! vault reset clears the counter. A persistently failing caller therefore
//! pays strictly more each cycle: tier 1, lock, tier 2 on the 4th failure,
//! lock again on the 6th, and so on.

use serde::{Deserialize, Serialize};

use crate::config::{LOCK_THRESHOLD, MIN_PENALTY};
use crate::entry::Commitment;

// ---------------------------------------------------------------------------
// Tier Math
// ---------------------------------------------------------------------------

/// Penalty tier of the n-th failed attempt (1-based): `ceil(n / 3)`.
///
/// `tier(0)` is 0 by convention — an entry with no failures has no tier.
pub fn tier(failed_attempts: u32) -> u32 {
    failed_attempts.div_ceil(LOCK_THRESHOLD)
}

/// Penalty charged for the n-th failed attempt, capped at the attached
/// value so a failure can never forfeit more than was staked.
pub fn penalty_for(failed_attempts: u32, attached: u64) -> u64 {
    MIN_PENALTY
        .saturating_mul(u64::from(tier(failed_attempts)))
        .min(attached)
}

/// `true` iff the n-th failure completes a tier and triggers a lock.
pub fn completes_tier(failed_attempts: u32) -> bool {
    failed_attempts > 0 && failed_attempts % LOCK_THRESHOLD == 0
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// The decided outcome of a retrieval attempt, before any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptVerdict {
    /// Candidate matched the stored commitment. The full attached value
    /// is refunded; `open_count` increments; nothing else moves.
    Success {
        /// Full attached value, returned to the caller.
        refund: u64,
    },
    /// Candidate did not match. A tiered penalty is retained for the
    /// entry's owner and the remainder refunded.
    Failure {
        /// Value retained as penalty (credited to the owner).
        penalty: u64,
        /// Attached value minus the penalty, returned to the caller.
        refund: u64,
        /// Whether this failure completed a tier and locks the entry.
        locks: bool,
    },
}

/// Decides the outcome of an attempt against an unlocked entry.
///
/// `prior_failures` is the entry's failure count *before* this attempt;
/// on a mismatch the verdict is computed for failure number
/// `prior_failures + 1`. The caller has already verified the lock state
/// and that `attached` covers the entry's cost.
pub fn judge(
    stored: &Commitment,
    candidate: &Commitment,
    prior_failures: u32,
    attached: u64,
) -> AttemptVerdict {
    if candidate == stored {
        return AttemptVerdict::Success { refund: attached };
    }

    let failures = prior_failures.saturating_add(1);
    let penalty = penalty_for(failures, attached);
    AttemptVerdict::Failure {
        penalty,
        // penalty is capped at `attached`, so this cannot underflow.
        refund: attached - penalty,
        locks: completes_tier(failures),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn commitment(fill: u8) -> Commitment {
        Commitment::from_bytes([fill; 32])
    }

    #[test]
    fn tier_advances_every_three_failures() {
        let tiers: Vec<u32> = (1..=9).map(tier).collect();
        assert_eq!(tiers, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert_eq!(tier(0), 0);
    }

    #[test]
    fn penalty_scales_with_tier() {
        let attached = u64::MAX;
        assert_eq!(penalty_for(1, attached), MIN_PENALTY);
        assert_eq!(penalty_for(3, attached), MIN_PENALTY);
        assert_eq!(penalty_for(4, attached), 2 * MIN_PENALTY);
        assert_eq!(penalty_for(7, attached), 3 * MIN_PENALTY);
    }

    #[test]
    fn penalty_capped_at_attached_value() {
        // Tier 2 wants 2 * MIN_PENALTY but only MIN_PENALTY + 1 was staked.
        assert_eq!(penalty_for(4, MIN_PENALTY + 1), MIN_PENALTY + 1);
        assert_eq!(penalty_for(1, 0), 0);
    }

    #[test]
    fn tier_completion_at_multiples_of_three() {
        assert!(!completes_tier(0));
        assert!(!completes_tier(1));
        assert!(!completes_tier(2));
        assert!(completes_tier(3));
        assert!(!completes_tier(4));
        assert!(completes_tier(6));
        assert!(completes_tier(9));
    }

    #[test]
    fn matching_candidate_refunds_everything() {
        let stored = commitment(0x11);
        let verdict = judge(&stored, &stored, 5, 2_000_000);
        assert_eq!(verdict, AttemptVerdict::Success { refund: 2_000_000 });
    }

    #[test]
    fn first_failure_charges_base_penalty_without_lock() {
        let verdict = judge(&commitment(0x11), &commitment(0x22), 0, 2_000_000);
        assert_eq!(
            verdict,
            AttemptVerdict::Failure {
                penalty: MIN_PENALTY,
                refund: 2_000_000 - MIN_PENALTY,
                locks: false,
            }
        );
    }

    #[test]
    fn third_failure_locks() {
        let verdict = judge(&commitment(0x11), &commitment(0x22), 2, 2_000_000);
        assert!(matches!(
            verdict,
            AttemptVerdict::Failure { locks: true, .. }
        ));
    }

    #[test]
    fn fourth_failure_charges_second_tier() {
        let verdict = judge(&commitment(0x11), &commitment(0x22), 3, 2_000_000);
        assert_eq!(
            verdict,
            AttemptVerdict::Failure {
                penalty: 2 * MIN_PENALTY,
                refund: 2_000_000 - 2 * MIN_PENALTY,
                locks: false,
            }
        );
    }

    #[test]
    fn tiering_monotonicity_over_a_long_run() {
        // penalty(n) == MIN_PENALTY * ceil(n / 3) for the n-th failure.
        let attached = u64::MAX;
        let mut last = 0;
        for n in 1..=30 {
            let p = penalty_for(n, attached);
            assert_eq!(p, MIN_PENALTY * u64::from(n.div_ceil(3)));
            assert!(p >= last);
            last = p;
        }
    }
}
