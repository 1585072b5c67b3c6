//! # Vault Module — Weighted Basket Accounting
//!
//! The vault is where money lives. A fund accepts one base currency, swaps
//! every deposit into a weighted basket through an external aggregator,
//! and hands the depositor shares proportional to the value that actually
//! arrived. Redemption goes the other way without swapping back: the
//! holder receives their slice of every asset.
//!
//! ## Architecture
//!
//! ```text
//! registry.rs — ordered basket, target weights, deposit split policy
//! ledger.rs   — holder -> shares, mint/burn, share pricing
//! swap.rs     — SwapExecutor boundary plus bundled executors
//! access.rs   — roles and the deployer -> governance admin handoff
//! action.rs   — administrative actions applied atomically
//! fund.rs     — the engine: deposit, withdraw, recovery, read views
//! error.rs    — the error taxonomy shared by all of the above
//! ```
//!
//! ## Design Principles
//!
//! 1. **All amounts are `u128` in smallest-unit denomination.** No floating
//!    point. Every multiplication is checked before it is divided.
//!
//! 2. **Compute, then commit.** A mutating entry point works out every
//!    number first and touches state only after nothing else can fail.
//!
//! 3. **Round toward the pool.** Mints and payouts truncate; the dust stays
//!    with the remaining holders.
//!
//! 4. **Serializable state.** [`FundState`] derives `Serialize` and
//!    `Deserialize` so the host can persist it as-is.

pub mod access;
pub mod action;
pub mod error;
pub mod fund;
pub mod ledger;
pub mod registry;
pub mod swap;

/// Identity of a holder, deployer, governor, venue or router.
pub type Address = String;

/// Identity of a token.
pub type TokenId = String;

/// Token and share quantities in smallest units.
pub type Amount = u128;

pub use access::{AccessControl, AdminState, Role};
pub use action::{AdminAction, WeightUpdate};
pub use error::VaultError;
pub use fund::{
    AssetView, DepositReceipt, FundOverview, FundState, Transfer, UserInfo, VaultEngine,
    WithdrawReceipt,
};
pub use ledger::ShareLedger;
pub use registry::{Asset, AssetRegistry};
pub use swap::{FixedRateExecutor, ScriptedExecutor, SwapError, SwapExecutor, SwapFill, SwapRequest};
