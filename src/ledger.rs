//! # Vault Ledger
//!
//! The shared store behind every public operation: the principal registry,
//! the per-principal entry store, the balance books, and the operator tip
//! pool, composed into a single [`VaultLedger`].
//!
//! ## Transactional Boundary
//!
//! Every operation executes as one indivisible unit. The discipline is:
//!
//! 1. Validate every precondition against immutable state.
//! 2. Stage all arithmetic with checked operations — overflow is an error,
//!    never a wrap.
//! 3. Perform the outgoing value transfer (refund/withdrawal), if any.
//! 4. Only then apply state mutations, which at that point cannot fail.
//!
//! A rejection at any step — including a [`TransferError`] from the
//! outlet — leaves the ledger byte-for-byte unchanged. There are no
//! partial effects and no internal retries.
//!
//! ## Accounting
//!
//! `total_held` tracks the value currently retained by the ledger. Every
//! unit attached to a call is either refunded through the outlet in the
//! same operation, credited to a principal's secured balance, or credited
//! to the tip pool; the solvency invariant
//! `total_held == sum(secured_balance) + tip_balance` holds after every
//! completed operation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{self, MIN_ENTRY_COST, MIN_TIP};
use crate::entry::{Commitment, EntryDetails, PasswordEntry};
use crate::penalty::{self, AttemptVerdict};
use crate::transfer::{TransferError, ValueTransfer};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejections the vault ledger can produce. Every variant leaves state
/// unchanged — a failed call has no effect.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The caller already has a principal record.
    #[error("caller is already registered")]
    AlreadyRegistered,

    /// The caller has no principal record. Registration is a precondition
    /// for every caller-scoped operation.
    #[error("caller is not registered")]
    NotRegistered,

    /// An entry cost below the floor was supplied at creation or update.
    #[error("entry cost {cost} is below the minimum of {minimum}")]
    CostTooLow {
        /// The cost the caller supplied.
        cost: u64,
        /// The enforced floor (`2 * MIN_PENALTY`).
        minimum: u64,
    },

    /// No entry with this name exists in the caller's namespace.
    #[error("no entry named '{0}'")]
    EntryNotFound(String),

    /// An owner-restricted operation was called by someone else. Raised
    /// by the operator-only tip withdrawal.
    #[error("caller does not own this resource")]
    NotOwner,

    /// A retrieval attempt was made while the entry is time-locked. The
    /// attached value is never accepted; the call fails before any value
    /// movement.
    #[error("vault is locked for another {unlocks_in_secs}s")]
    VaultLocked {
        /// Seconds until the lock expires.
        unlocks_in_secs: u64,
    },

    /// The attached value is below what the operation requires — the
    /// entry's cost for a retrieval attempt, `MIN_TIP` for a tip.
    #[error("attached value {attached} is below the required {required}")]
    InsufficientValue {
        /// What the caller attached.
        attached: u64,
        /// What the operation requires.
        required: u64,
    },

    /// A withdrawal was requested against a zero balance. The ledger
    /// never performs a zero-value transfer.
    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// Checked arithmetic failed while staging an operation. Ledger
    /// balances live nowhere near `u64::MAX`, so hitting this means a
    /// bug or an attack — either way, fail loudly, mutate nothing.
    #[error("amount overflow while staging the operation")]
    AmountOverflow,

    /// The value-transfer primitive could not deliver a refund or
    /// withdrawal. The entire operation is aborted.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// A registered identity: its balance record and its entries.
///
/// Created once by registration, never deleted. Presence in the ledger's
/// principal map *is* the registration flag — there is no separate
/// boolean to fall out of sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Principal {
    /// Value retained from failed attempts, withdrawable by this principal.
    secured_balance: u64,
    /// Lifetime sum of penalties ever retained for this principal's
    /// entries. Monotonically non-decreasing; survives withdrawal. An
    /// audit counter, not a balance.
    penalty_total: u64,
    /// Entry names in insertion order, for stable listing.
    entry_names: Vec<String>,
    /// Entries keyed by name. Names are unique within this principal only.
    entries: HashMap<String, PasswordEntry>,
}

/// Balance snapshot returned by
/// [`get_user_balances`](VaultLedger::get_user_balances).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalances {
    /// Currently withdrawable retained value.
    pub secured_balance: u64,
    /// Lifetime penalty audit counter.
    pub penalty_total: u64,
}

// ---------------------------------------------------------------------------
// VaultLedger
// ---------------------------------------------------------------------------

/// The vault ledger: registry, entry store, penalty bookkeeping, and the
/// operator tip pool behind one transactional boundary.
///
/// Callers are identified by externally supplied, unforgeable address
/// strings; the ledger only keys and compares them. Time likewise arrives
/// from outside: every time-sensitive operation takes `now` as a
/// parameter and the ledger owns no clock of its own.
///
/// The whole struct is serializable, so a host can snapshot and restore
/// ledger state as a single blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultLedger {
    /// The deploying operator — sole beneficiary of the tip pool.
    operator: String,
    /// Principal records keyed by address.
    principals: HashMap<String, Principal>,
    /// Voluntary contributions, withdrawable only by the operator.
    tip_balance: u64,
    /// Total value currently retained by the ledger. Equals
    /// `sum(secured_balance) + tip_balance` at all times.
    total_held: u64,
}

impl VaultLedger {
    /// Creates an empty ledger with the given operator identity.
    pub fn new(operator: &str) -> Self {
        Self {
            operator: operator.to_string(),
            principals: HashMap::new(),
            tip_balance: 0,
            total_held: 0,
        }
    }

    /// The operator identity fixed at construction.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// `true` if the address has a principal record.
    pub fn is_registered(&self, address: &str) -> bool {
        self.principals.contains_key(address)
    }

    /// Current tip pool balance.
    pub fn tip_balance(&self) -> u64 {
        self.tip_balance
    }

    /// Total value currently retained by the ledger.
    pub fn total_held(&self) -> u64 {
        self.total_held
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Registers the caller as a principal with an empty entry set and
    /// zero balances. No value transfer.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AlreadyRegistered`] if a record exists.
    pub fn register_user(&mut self, caller: &str) -> Result<(), VaultError> {
        if self.principals.contains_key(caller) {
            return Err(VaultError::AlreadyRegistered);
        }
        self.principals.insert(caller.to_string(), Principal::default());
        info!(caller, "principal registered");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Entry Store
    // -----------------------------------------------------------------------

    /// Creates or replaces the entry `(caller, name)`.
    ///
    /// Replacement is wholesale: counters and lock state are reinitialized
    /// to zero/unset regardless of prior history, and all stored fields
    /// are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`] if the caller has no record.
    /// Returns [`VaultError::CostTooLow`] if `cost < 2 * MIN_PENALTY`.
    pub fn store_password(
        &mut self,
        caller: &str,
        name: &str,
        account: &str,
        commitment: Commitment,
        has_code: bool,
        cost: u64,
    ) -> Result<(), VaultError> {
        let principal = self
            .principals
            .get_mut(caller)
            .ok_or(VaultError::NotRegistered)?;
        if cost < MIN_ENTRY_COST {
            return Err(VaultError::CostTooLow {
                cost,
                minimum: MIN_ENTRY_COST,
            });
        }

        if !principal.entries.contains_key(name) {
            principal.entry_names.push(name.to_string());
        }
        principal.entries.insert(
            name.to_string(),
            PasswordEntry::new(name, account, commitment, has_code, cost),
        );
        debug!(caller, name, cost, "entry stored");
        Ok(())
    }

    /// Lists the caller's entry names in insertion order.
    ///
    /// Doubles as a registration probe: the call fails with
    /// [`VaultError::NotRegistered`] for an unknown caller, which is how
    /// front-ends detect "not yet registered" before offering to register.
    pub fn get_password_names(&self, caller: &str) -> Result<Vec<String>, VaultError> {
        Ok(self.principal(caller)?.entry_names.clone())
    }

    /// Returns the full detail view of the caller's entry `name`, with
    /// the lock state derived against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`] or [`VaultError::EntryNotFound`].
    pub fn get_password_details(
        &self,
        caller: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<EntryDetails, VaultError> {
        let entry = self
            .principal(caller)?
            .entries
            .get(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))?;
        Ok(entry.details(now))
    }

    /// Zeroes the entry's counters and clears its lock, from any state —
    /// the designated unlock-and-clear mechanic. Works even while locked.
    /// No value transfer.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`] or [`VaultError::EntryNotFound`].
    pub fn reset_vault(&mut self, caller: &str, name: &str) -> Result<(), VaultError> {
        let entry = self
            .principals
            .get_mut(caller)
            .ok_or(VaultError::NotRegistered)?
            .entries
            .get_mut(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))?;
        entry.reset();
        debug!(caller, name, "vault reset");
        Ok(())
    }

    /// Replaces the entry's retrieval cost.
    ///
    /// The creation floor applies here too: a cost below `2 * MIN_PENALTY`
    /// is rejected, for consistency with [`store_password`](Self::store_password).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`], [`VaultError::EntryNotFound`],
    /// or [`VaultError::CostTooLow`].
    pub fn update_cost(
        &mut self,
        caller: &str,
        name: &str,
        new_cost: u64,
    ) -> Result<(), VaultError> {
        if new_cost < MIN_ENTRY_COST {
            return Err(VaultError::CostTooLow {
                cost: new_cost,
                minimum: MIN_ENTRY_COST,
            });
        }
        let entry = self
            .principals
            .get_mut(caller)
            .ok_or(VaultError::NotRegistered)?
            .entries
            .get_mut(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))?;
        entry.cost = new_cost;
        debug!(caller, name, new_cost, "entry cost updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Retrieval Attempts
    // -----------------------------------------------------------------------

    /// Stakes `attached` on an attempt to retrieve the caller's entry
    /// `name` by presenting `candidate` against the stored commitment.
    ///
    /// On a match, the full attached value is refunded through `outlet`
    /// and only `open_count` advances. On a mismatch, a tiered penalty is
    /// retained — credited to the caller's secured balance and lifetime
    /// penalty total — and the remainder refunded; every
    /// [`LOCK_THRESHOLD`](crate::config::LOCK_THRESHOLD)-th failure locks
    /// the entry for the lock period. Tiers survive passive lock expiry;
    /// only [`reset_vault`](Self::reset_vault) clears them.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`], [`VaultError::EntryNotFound`],
    /// [`VaultError::VaultLocked`] (checked before any value movement),
    /// [`VaultError::InsufficientValue`] if `attached < cost`,
    /// [`VaultError::AmountOverflow`], or [`VaultError::TransferFailed`]
    /// if the refund could not be delivered — in every case with no
    /// effect on state.
    pub fn attempt_password_retrieval(
        &mut self,
        caller: &str,
        name: &str,
        candidate: Commitment,
        attached: u64,
        now: DateTime<Utc>,
        outlet: &mut impl ValueTransfer,
    ) -> Result<AttemptVerdict, VaultError> {
        let principal = self.principal(caller)?;
        let entry = principal
            .entries
            .get(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))?;

        if entry.is_locked(now) {
            return Err(VaultError::VaultLocked {
                unlocks_in_secs: entry.time_until_unlock(now),
            });
        }
        if attached < entry.cost {
            return Err(VaultError::InsufficientValue {
                attached,
                required: entry.cost,
            });
        }

        let verdict = penalty::judge(&entry.commitment, &candidate, entry.attempt_count, attached);

        match verdict {
            AttemptVerdict::Success { refund } => {
                // Refund first: if delivery fails, nothing has been mutated.
                outlet.transfer(caller, refund)?;

                let entry = self.entry_mut(caller, name)?;
                entry.open_count = entry.open_count.saturating_add(1);
                info!(caller, name, refund, "retrieval succeeded");
                Ok(verdict)
            }
            AttemptVerdict::Failure {
                penalty,
                refund,
                locks,
            } => {
                // Stage every sum before touching anything.
                let new_secured = principal
                    .secured_balance
                    .checked_add(penalty)
                    .ok_or(VaultError::AmountOverflow)?;
                let new_penalty_total = principal
                    .penalty_total
                    .checked_add(penalty)
                    .ok_or(VaultError::AmountOverflow)?;
                let new_total_held = self
                    .total_held
                    .checked_add(penalty)
                    .ok_or(VaultError::AmountOverflow)?;

                if refund > 0 {
                    outlet.transfer(caller, refund)?;
                }

                let principal = self
                    .principals
                    .get_mut(caller)
                    .ok_or(VaultError::NotRegistered)?;
                let entry = principal
                    .entries
                    .get_mut(name)
                    .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))?;
                entry.attempt_count = entry.attempt_count.saturating_add(1);
                if locks {
                    entry.lock_until = Some(now + config::lock_period());
                }
                principal.secured_balance = new_secured;
                principal.penalty_total = new_penalty_total;
                self.total_held = new_total_held;

                warn!(
                    caller,
                    name, penalty, refund, locks, "retrieval failed, penalty retained"
                );
                Ok(verdict)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Balance Ledger
    // -----------------------------------------------------------------------

    /// Returns the caller's secured balance and lifetime penalty total.
    pub fn get_user_balances(&self, caller: &str) -> Result<UserBalances, VaultError> {
        let principal = self.principal(caller)?;
        Ok(UserBalances {
            secured_balance: principal.secured_balance,
            penalty_total: principal.penalty_total,
        })
    }

    /// Transfers the caller's entire secured balance to them through
    /// `outlet` and zeroes it. `penalty_total` is untouched — it is a
    /// lifetime counter, not a balance.
    ///
    /// Returns the amount withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotRegistered`],
    /// [`VaultError::NothingToWithdraw`] on a zero balance, or
    /// [`VaultError::TransferFailed`] — in which case the balance remains
    /// credited.
    pub fn withdraw_secured_balance(
        &mut self,
        caller: &str,
        outlet: &mut impl ValueTransfer,
    ) -> Result<u64, VaultError> {
        let amount = self.principal(caller)?.secured_balance;
        if amount == 0 {
            return Err(VaultError::NothingToWithdraw);
        }
        let new_total_held = self
            .total_held
            .checked_sub(amount)
            .ok_or(VaultError::AmountOverflow)?;

        outlet.transfer(caller, amount)?;

        // Infallible from here: the lookup succeeded above.
        if let Some(principal) = self.principals.get_mut(caller) {
            principal.secured_balance = 0;
        }
        self.total_held = new_total_held;
        info!(caller, amount, "secured balance withdrawn");
        Ok(amount)
    }

    /// Credits `value` to the operator tip pool. Open to anyone —
    /// registration is not required.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientValue`] if `value < MIN_TIP`,
    /// or [`VaultError::AmountOverflow`].
    pub fn give_tip(&mut self, caller: &str, value: u64) -> Result<(), VaultError> {
        if value < MIN_TIP {
            return Err(VaultError::InsufficientValue {
                attached: value,
                required: MIN_TIP,
            });
        }
        let new_tip_balance = self
            .tip_balance
            .checked_add(value)
            .ok_or(VaultError::AmountOverflow)?;
        let new_total_held = self
            .total_held
            .checked_add(value)
            .ok_or(VaultError::AmountOverflow)?;

        self.tip_balance = new_tip_balance;
        self.total_held = new_total_held;
        debug!(caller, value, "tip received");
        Ok(())
    }

    /// Transfers the entire tip pool to the operator and zeroes it.
    ///
    /// Returns the amount withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotOwner`] for any caller other than the
    /// deploying operator, [`VaultError::NothingToWithdraw`] on an empty
    /// pool, or [`VaultError::TransferFailed`].
    pub fn withdraw_tips(
        &mut self,
        caller: &str,
        outlet: &mut impl ValueTransfer,
    ) -> Result<u64, VaultError> {
        if caller != self.operator {
            return Err(VaultError::NotOwner);
        }
        let amount = self.tip_balance;
        if amount == 0 {
            return Err(VaultError::NothingToWithdraw);
        }
        let new_total_held = self
            .total_held
            .checked_sub(amount)
            .ok_or(VaultError::AmountOverflow)?;

        outlet.transfer(caller, amount)?;

        self.tip_balance = 0;
        self.total_held = new_total_held;
        info!(operator = caller, amount, "tip pool withdrawn");
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn principal(&self, caller: &str) -> Result<&Principal, VaultError> {
        self.principals.get(caller).ok_or(VaultError::NotRegistered)
    }

    fn entry_mut(&mut self, caller: &str, name: &str) -> Result<&mut PasswordEntry, VaultError> {
        self.principals
            .get_mut(caller)
            .ok_or(VaultError::NotRegistered)?
            .entries
            .get_mut(name)
            .ok_or_else(|| VaultError::EntryNotFound(name.to_string()))
    }

    /// Sum of all secured balances plus the tip pool. Exposed so hosts
    /// and tests can assert solvency against [`total_held`](Self::total_held).
    pub fn accounted_value(&self) -> u64 {
        self.principals
            .values()
            .map(|p| p.secured_balance)
            .fold(self.tip_balance, u64::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
