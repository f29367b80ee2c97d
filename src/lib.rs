//! # Vault Ledger
//!
//! Economic access control for named encrypted secrets. A registered
//! principal stores a password entry as an opaque commitment; retrieving
//! it requires staking value. Wrong attempts forfeit an escalating
//! penalty to the entry's owner, and every third consecutive failure
//! time-locks the entry for three days. The ledger keeps the books: who
//! is owed what, which entries are locked, and where every attached unit
//! of value went.
//!
//! The crate is deliberately narrow. It is the state machine and nothing
//! else — no encryption (the commitment is never interpreted), no UI, no
//! identity scheme, no clock. Caller addresses, attached value, and the
//! current time all arrive as inputs from the surrounding host, and
//! outbound value leaves through the [`ValueTransfer`] seam.
//!
//! ## Modules
//!
//! - **config** — Economic constants: penalty floor, tip floor, lock
//!   schedule.
//! - **entry** — Password entries, commitments, and lazily derived lock
//!   state.
//! - **penalty** — Pure tier math and attempt verdicts.
//! - **ledger** — The shared store and the full operation surface.
//! - **transfer** — The outbound value-transfer seam and an in-memory
//!   payout recorder.
//!
//! ## Design Principles
//!
//! 1. All monetary arithmetic is checked — wrapping arithmetic and money
//!    do not mix.
//! 2. Every operation is atomic: all of its state changes and transfers,
//!    or none of them. A failed refund delivery aborts the whole call.
//! 3. Lock state is derived from a timestamp, never stored as a flag.
//! 4. Every public type is serializable, so hosts can snapshot and
//!    restore ledger state as a single blob.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use vault_ledger::{Commitment, Payouts, VaultLedger};
//!
//! let mut ledger = VaultLedger::new("operator");
//! let mut payouts = Payouts::new();
//! let secret = Commitment::from_bytes([0xAB; 32]);
//!
//! ledger.register_user("alice").unwrap();
//! ledger
//!     .store_password("alice", "Gmail", "u@x.com", secret, false, 2_000_000)
//!     .unwrap();
//!
//! // A correct attempt refunds the full stake.
//! let verdict = ledger
//!     .attempt_password_retrieval("alice", "Gmail", secret, 2_000_000, Utc::now(), &mut payouts)
//!     .unwrap();
//! assert_eq!(payouts.paid_to("alice"), 2_000_000);
//! # let _ = verdict;
//! ```

pub mod config;
pub mod entry;
pub mod ledger;
pub mod penalty;
pub mod transfer;

pub use entry::{Commitment, EntryDetails, PasswordEntry};
pub use ledger::{UserBalances, VaultError, VaultLedger};
pub use penalty::AttemptVerdict;
pub use transfer::{Payouts, TransferError, ValueTransfer};
