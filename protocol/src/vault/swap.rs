//! # Swap Execution Boundary
//!
//! The fund never routes trades itself. Before a deposit, the operator asks
//! the aggregator for an executable instruction per asset; during the
//! deposit the engine hands each instruction to a [`SwapExecutor`] and
//! records whatever actually arrived. One opaque call per asset, no
//! negotiation, no retries.
//!
//! The realized `amount_out` is authoritative. Slippage and fees make it
//! diverge from the quote, and share pricing must see the real number.
//!
//! Two executors ship with the library:
//!
//! - [`FixedRateExecutor`] — converts at a per-token rate in basis points.
//!   Used for simulations and benchmarks.
//! - [`ScriptedExecutor`] — replays a queue of pre-recorded fills and
//!   failures, and remembers every request it saw. Used by tests.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Address, Amount, TokenId};
use crate::config::BPS_DENOMINATOR;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by an executor. The engine folds all of them into
/// [`super::VaultError::SwapFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// The external call reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The executor has no route for this pair.
    #[error("no route from {from} to {to}")]
    NoRoute { from: TokenId, to: TokenId },

    /// A scripted executor ran out of recorded fills.
    #[error("no scripted fill left for {0}")]
    Exhausted(TokenId),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One swap the engine wants executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// The fund's base asset.
    pub from_token: TokenId,
    /// The basket asset being bought.
    pub to_token: TokenId,
    /// Venue registered for `to_token`.
    pub venue: Address,
    /// Router the instruction targets.
    pub router: Address,
    /// Notional of base asset to sell.
    pub amount_in: Amount,
    /// Address that receives the output (the fund).
    pub recipient: Address,
    /// Pre-fetched aggregator calldata, if the operator supplied one.
    pub instruction: Option<Vec<u8>>,
}

/// The realized result of one swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapFill {
    pub token: TokenId,
    pub amount_in: Amount,
    pub amount_out: Amount,
}

/// Applies a pre-built swap instruction and reports what arrived.
///
/// Implementations must be atomic per call: either the output landed and
/// a fill is returned, or nothing happened and an error is returned.
pub trait SwapExecutor {
    fn swap(&mut self, request: &SwapRequest) -> Result<SwapFill, SwapError>;
}

impl<E: SwapExecutor + ?Sized> SwapExecutor for Box<E> {
    fn swap(&mut self, request: &SwapRequest) -> Result<SwapFill, SwapError> {
        (**self).swap(request)
    }
}

// ---------------------------------------------------------------------------
// FixedRateExecutor
// ---------------------------------------------------------------------------

/// Converts every request at a fixed rate, expressed in basis points of the
/// input. A rate of 9_950 models 0.5% slippage on a 1:1 quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRateExecutor {
    default_rate_bps: u128,
    rates: BTreeMap<TokenId, u128>,
}

impl FixedRateExecutor {
    /// Every token converts 1:1.
    pub fn new() -> Self {
        Self {
            default_rate_bps: BPS_DENOMINATOR,
            rates: BTreeMap::new(),
        }
    }

    /// Every token converts 1:1 minus `slippage_bps`.
    pub fn with_slippage_bps(slippage_bps: u128) -> Self {
        Self {
            default_rate_bps: BPS_DENOMINATOR.saturating_sub(slippage_bps),
            rates: BTreeMap::new(),
        }
    }

    /// Overrides the rate for a single token.
    pub fn with_rate(mut self, token: &str, rate_bps: u128) -> Self {
        self.rates.insert(token.to_string(), rate_bps);
        self
    }
}

impl Default for FixedRateExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapExecutor for FixedRateExecutor {
    fn swap(&mut self, request: &SwapRequest) -> Result<SwapFill, SwapError> {
        let rate = self
            .rates
            .get(&request.to_token)
            .copied()
            .unwrap_or(self.default_rate_bps);
        let amount_out = request
            .amount_in
            .checked_mul(rate)
            .ok_or_else(|| SwapError::Reverted("output overflow".into()))?
            / BPS_DENOMINATOR;

        Ok(SwapFill {
            token: request.to_token.clone(),
            amount_in: request.amount_in,
            amount_out,
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedExecutor
// ---------------------------------------------------------------------------

/// Replays pre-recorded outcomes in order, one per swap call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: VecDeque<Result<Amount, SwapError>>,
    requests: Vec<SwapRequest>,
}

impl ScriptedExecutor {
    /// Queues one successful fill per entry of `outputs`.
    pub fn new(outputs: impl IntoIterator<Item = Amount>) -> Self {
        Self {
            script: outputs.into_iter().map(Ok).collect(),
            requests: Vec::new(),
        }
    }

    /// Appends more successful fills.
    pub fn push_fills(&mut self, outputs: impl IntoIterator<Item = Amount>) {
        self.script.extend(outputs.into_iter().map(Ok));
    }

    /// Appends a reverting call.
    pub fn push_failure(&mut self, reason: &str) {
        self.script.push_back(Err(SwapError::Reverted(reason.to_string())));
    }

    /// Every request received so far, including failed ones.
    pub fn requests(&self) -> &[SwapRequest] {
        &self.requests
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SwapExecutor for ScriptedExecutor {
    fn swap(&mut self, request: &SwapRequest) -> Result<SwapFill, SwapError> {
        self.requests.push(request.clone());
        let amount_out = self
            .script
            .pop_front()
            .ok_or_else(|| SwapError::Exhausted(request.to_token.clone()))??;
        Ok(SwapFill {
            token: request.to_token.clone(),
            amount_in: request.amount_in,
            amount_out,
        })
    }
}
