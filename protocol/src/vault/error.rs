//! Error taxonomy for fund operations.
//!
//! Every variant aborts the enclosing operation with no state change. The
//! engine never retries; re-quoting a failed swap is the caller's job.

use thiserror::Error;

use super::{Address, Amount, TokenId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// A registry mutation or construction would break the weight sum.
    #[error("invalid weight: basket weights would sum to {total}, expected {expected}")]
    InvalidWeight {
        /// The sum the rejected mutation would have produced.
        total: u64,
        /// The fixed weight denominator.
        expected: u32,
    },

    /// Deposits, withdrawals and transfers must move a positive amount.
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// A holder tried to burn more shares than they own.
    #[error("insufficient balance: {holder} holds {balance} shares, requested {requested}")]
    InsufficientBalance {
        holder: Address,
        balance: Amount,
        requested: Amount,
    },

    /// The external swap reverted or produced nothing.
    #[error("swap into {token} failed: {reason}")]
    SwapFailed { token: TokenId, reason: String },

    /// The caller lacks the role the entry point requires.
    #[error("unauthorized: {caller} may not {operation}")]
    Unauthorized { caller: Address, operation: String },

    #[error("asset {0} is already part of the basket")]
    DuplicateAsset(TokenId),

    #[error("asset {0} is not part of the basket")]
    UnknownAsset(TokenId),

    /// Raw transfers of an actively weighted asset would silently rebalance
    /// the basket; they require decommissioning the asset first.
    #[error("asset {0} is actively weighted; decommission it before moving it out")]
    TrackedAsset(TokenId),

    /// The fund's custody of a token is smaller than the requested transfer.
    #[error("insufficient holdings of {token}: held {held}, requested {requested}")]
    InsufficientHoldings {
        token: TokenId,
        held: Amount,
        requested: Amount,
    },

    /// Shares are outstanding but nothing backs them, so no share price exists.
    #[error("fund has {total_shares} shares outstanding against zero holdings")]
    EmptyPool { total_shares: Amount },

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
