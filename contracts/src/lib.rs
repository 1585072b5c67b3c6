//! # Basket Governance Contracts
//!
//! Governance for basket funds. A fund is deployed with its deployer as
//! admin; once the admin role is handed to the fund's governor, every
//! re-weight, basket change, role change, and recovery has to be proposed,
//! voted on by shareholders, and executed.
//!
//! - **Proposal** — the action, the weight snapshot, the tally, and the
//!   time-derived status machine.
//! - **Governor** — propose, vote, tally, execute, cancel.
//! - **Governed Fund** — the engine and governor behind a single lock,
//!   with an injected clock.
//!
//! ## Design Principles
//!
//! 1. Proposal status is derived from time and tally, never cached.
//! 2. Executing a proposal is an ordinary admin call made by the
//!    governor's identity; the fund applies it all-or-nothing.
//! 3. Every public type is serializable (serde) for persistent storage.

pub mod governed_fund;
pub mod governor;
pub mod proposal;

pub use governed_fund::{FundCell, GovernedFund};
pub use governor::{GovernanceError, Governor};
pub use proposal::{Ballot, Proposal, ProposalStatus, Support, Tally};
