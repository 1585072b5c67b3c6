//! # Vault Engine
//!
//! The fund itself: deposit, withdraw, recovery, administration, and the
//! read views operators poll. State lives in [`FundState`], which is plain
//! serializable data; [`VaultEngine`] pairs it with the injected
//! [`SwapExecutor`].
//!
//! ## Deposit
//!
//! ```text
//! amount ──split by weight──▶ slice_i ──executor──▶ out_i
//! value  = Σ out_i
//! nav    = Σ amount_held_i            (before the deposit)
//! shares = total == 0 ? value : value * total / nav
//! ```
//!
//! Every swap runs before any state is touched. If one fails, the deposit
//! fails and the fund is exactly as it was.
//!
//! ## Withdraw
//!
//! A holder burning `s` of `S` shares receives `amount_held_i * s / S` of
//! every asset, truncated. Nothing is swapped back to the base asset.
//!
//! ## Administration
//!
//! Privileged operations are all funnelled through
//! [`VaultEngine::apply_admin`], which applies an [`AdminAction`] to a
//! staged copy of the state and commits only if every step succeeded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::access::{AccessControl, AdminState, Role};
use super::action::{AdminAction, WeightUpdate};
use super::error::VaultError;
use super::ledger::ShareLedger;
use super::registry::AssetRegistry;
use super::swap::{SwapExecutor, SwapFill, SwapRequest};
use super::{Address, Amount, TokenId};
use crate::config::{FundConfig, BPS_DENOMINATOR};

// ---------------------------------------------------------------------------
// Receipts & Views
// ---------------------------------------------------------------------------

/// A token movement out of the fund. The host ledger executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub token: TokenId,
    pub amount: Amount,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub depositor: Address,
    pub amount_in: Amount,
    /// Sum of realized swap outputs.
    pub value_contributed: Amount,
    pub shares_minted: Amount,
    pub fills: Vec<SwapFill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub holder: Address,
    pub shares_burned: Amount,
    pub payouts: Vec<Transfer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetView {
    pub token: TokenId,
    pub venue: Address,
    pub weight: u32,
    pub amount_held: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundOverview {
    pub name: String,
    pub base_asset: TokenId,
    pub router: Address,
    pub admin: AdminState,
    /// Realized holdings summed across the basket.
    pub total_value: Amount,
    pub total_shares: Amount,
    pub holders: usize,
    pub assets: Vec<AssetView>,
    /// Stray balances awaiting recovery.
    pub untracked: Vec<(TokenId, Amount)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub holder: Address,
    pub shares: Amount,
    pub total_shares: Amount,
    /// Ownership of the fund in basis points, truncated.
    pub ownership_bps: Amount,
    /// What a full withdrawal would pay out right now.
    pub claims: Vec<Transfer>,
    /// Sum of `claims`.
    pub value: Amount,
}

// ---------------------------------------------------------------------------
// FundState
// ---------------------------------------------------------------------------

/// Everything a fund persists. Assets and shares live here; the swap
/// executor does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundState {
    name: String,
    base_asset: TokenId,
    router: Address,
    registry: AssetRegistry,
    ledger: ShareLedger,
    access: AccessControl,
    untracked: BTreeMap<TokenId, Amount>,
    /// Count of committed mutations.
    sequence: u64,
}

impl FundState {
    /// Builds a fresh fund from its deployment config, with `deployer` as
    /// the sole admin.
    pub fn new(config: &FundConfig, deployer: &str) -> Result<Self, VaultError> {
        Ok(Self {
            name: config.name.clone(),
            base_asset: config.base_asset.clone(),
            router: config.router.clone(),
            registry: AssetRegistry::from_config(&config.assets)?,
            ledger: ShareLedger::new(),
            access: AccessControl::new(deployer),
            untracked: BTreeMap::new(),
            sequence: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    pub fn router(&self) -> &str {
        &self.router
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn untracked_balance(&self, token: &str) -> Amount {
        self.untracked.get(token).copied().unwrap_or(0)
    }

    fn apply(
        &mut self,
        caller: &str,
        action: &AdminAction,
        transfers: &mut Vec<Transfer>,
    ) -> Result<(), VaultError> {
        match action {
            AdminAction::AddAsset {
                token,
                venue,
                weight,
            } => {
                self.access
                    .require_any(&[Role::DefaultAdmin], caller, "add assets")?;
                self.registry.add_asset(token, venue, *weight)
            }
            AdminAction::SetWeights { weights } => {
                self.access
                    .require_any(&[Role::DefaultAdmin], caller, "re-weight")?;
                self.registry.set_weights(weights)
            }
            AdminAction::GrantRole { role, account } => {
                self.access.grant_role(caller, *role, account)
            }
            AdminAction::RevokeRole { role, account } => {
                self.access.revoke_role(caller, *role, account)
            }
            AdminAction::WithdrawToken {
                token,
                amount,
                recipient,
            } => {
                let transfer = self.withdraw_token(caller, token, *amount, recipient)?;
                transfers.push(transfer);
                Ok(())
            }
            AdminAction::DecommissionAsset {
                token,
                weights,
                recipient,
            } => {
                self.access
                    .require_any(&[Role::DefaultAdmin], caller, "decommission assets")?;
                if !self.registry.contains(token) {
                    return Err(VaultError::UnknownAsset(token.clone()));
                }
                let mut updates = weights.clone();
                updates.push(WeightUpdate::new(token, 0));
                self.registry.set_weights(&updates)?;

                let held = self
                    .registry
                    .get(token)
                    .map(|a| a.amount_held)
                    .unwrap_or(0);
                if held > 0 {
                    let transfer = self.withdraw_token(caller, token, held, recipient)?;
                    transfers.push(transfer);
                }
                Ok(())
            }
            AdminAction::TransferAdmin { new_admin } => {
                self.access.transfer_admin(caller, new_admin)
            }
            AdminAction::Batch { actions } => {
                for inner in actions {
                    self.apply(caller, inner, transfers)?;
                }
                Ok(())
            }
        }
    }

    fn withdraw_token(
        &mut self,
        caller: &str,
        token: &str,
        amount: Amount,
        recipient: &str,
    ) -> Result<Transfer, VaultError> {
        self.access
            .require_any(&[Role::DefaultAdmin, Role::Recovery], caller, "withdraw tokens")?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }

        // Recovery only reaches stray tokens. A retired basket asset still
        // backs shares until an admin moves it out.
        let held = match self.registry.get(token) {
            Some(asset) if asset.is_active() => {
                return Err(VaultError::TrackedAsset(token.to_string()));
            }
            Some(asset) => {
                self.access
                    .require_any(&[Role::DefaultAdmin], caller, "withdraw basket assets")?;
                asset.amount_held
            }
            None => self.untracked_balance(token),
        };
        if held < amount {
            return Err(VaultError::InsufficientHoldings {
                token: token.to_string(),
                held,
                requested: amount,
            });
        }

        let remaining = held - amount;
        match self.registry.get_mut(token) {
            Some(asset) => asset.amount_held = remaining,
            None if remaining == 0 => {
                self.untracked.remove(token);
            }
            None => {
                self.untracked.insert(token.to_string(), remaining);
            }
        }

        tracing::info!(fund = %self.name, caller, token, amount = %amount, recipient, "token withdrawn");
        Ok(Transfer {
            token: token.to_string(),
            amount,
            recipient: recipient.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// VaultEngine
// ---------------------------------------------------------------------------

/// A fund plus the swap capability it was constructed with.
#[derive(Debug)]
pub struct VaultEngine<S> {
    state: FundState,
    executor: S,
}

impl<S: SwapExecutor> VaultEngine<S> {
    /// Deploys a new fund.
    pub fn new(config: &FundConfig, deployer: &str, executor: S) -> Result<Self, VaultError> {
        let state = FundState::new(config, deployer)?;
        tracing::info!(
            fund = %state.name,
            deployer,
            assets = state.registry.len(),
            "fund deployed"
        );
        Ok(Self { state, executor })
    }

    /// Rebuilds an engine around persisted state.
    pub fn from_state(state: FundState, executor: S) -> Self {
        Self { state, executor }
    }

    pub fn state(&self) -> &FundState {
        &self.state
    }

    pub fn executor(&self) -> &S {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut S {
        &mut self.executor
    }

    pub fn into_parts(self) -> (FundState, S) {
        (self.state, self.executor)
    }

    // -- Deposit / Withdraw -------------------------------------------------

    /// Deposits `amount` of base asset without pre-fetched instructions.
    pub fn deposit(&mut self, depositor: &str, amount: Amount) -> Result<DepositReceipt, VaultError> {
        self.deposit_with_instructions(depositor, amount, &[])
    }

    /// Deposits `amount` of base asset, converting it into the basket.
    ///
    /// `instructions[i]` is the aggregator payload for the i-th active
    /// asset in registry order; missing entries are passed as `None`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::ZeroAmount`] if `amount` is zero or buys no shares.
    /// - [`VaultError::SwapFailed`] if any swap reverts or returns nothing.
    /// - [`VaultError::EmptyPool`] if shares exist against zero holdings.
    /// - [`VaultError::Overflow`] on arithmetic overflow.
    ///
    /// On any error the fund is unchanged.
    pub fn deposit_with_instructions(
        &mut self,
        depositor: &str,
        amount: Amount,
        instructions: &[Vec<u8>],
    ) -> Result<DepositReceipt, VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }

        let state = &self.state;
        let executor = &mut self.executor;
        let slices = state.registry.split(amount)?;
        let mut fills = Vec::with_capacity(slices.len());
        let mut active_index = 0;

        for (asset, slice) in state.registry.assets().iter().zip(&slices) {
            if !asset.is_active() || *slice == 0 {
                fills.push(None);
                continue;
            }
            let instruction = instructions.get(active_index).cloned();
            active_index += 1;

            // Base-asset slices are already held in the right currency.
            let fill = if asset.token == state.base_asset {
                SwapFill {
                    token: asset.token.clone(),
                    amount_in: *slice,
                    amount_out: *slice,
                }
            } else {
                let request = SwapRequest {
                    from_token: state.base_asset.clone(),
                    to_token: asset.token.clone(),
                    venue: asset.venue.clone(),
                    router: state.router.clone(),
                    amount_in: *slice,
                    recipient: state.name.clone(),
                    instruction,
                };
                executor.swap(&request).map_err(|e| {
                    tracing::warn!(fund = %state.name, token = %asset.token, error = %e, "swap failed");
                    VaultError::SwapFailed {
                        token: asset.token.clone(),
                        reason: e.to_string(),
                    }
                })?
            };

            if fill.amount_out == 0 {
                tracing::warn!(fund = %state.name, token = %asset.token, "swap returned zero output");
                return Err(VaultError::SwapFailed {
                    token: asset.token.clone(),
                    reason: "zero output".into(),
                });
            }
            tracing::debug!(
                token = %asset.token,
                amount_in = %fill.amount_in,
                amount_out = %fill.amount_out,
                "basket slice filled"
            );
            fills.push(Some(fill));
        }

        let value = fills
            .iter()
            .flatten()
            .try_fold(0 as Amount, |acc, f| acc.checked_add(f.amount_out))
            .ok_or(VaultError::Overflow("deposit value"))?;
        let nav = self.state.registry.total_held()?;
        let shares = self.state.ledger.shares_for_deposit(value, nav)?;

        let mut new_holdings = Vec::with_capacity(fills.len());
        for (asset, fill) in self.state.registry.assets().iter().zip(&fills) {
            let added = fill.as_ref().map(|f| f.amount_out).unwrap_or(0);
            new_holdings.push(
                asset
                    .amount_held
                    .checked_add(added)
                    .ok_or(VaultError::Overflow("asset holdings"))?,
            );
        }

        // Commit. The mint is the only step left that can fail, and it
        // leaves the ledger untouched when it does.
        self.state.ledger.mint(depositor, shares)?;
        for (asset, held) in self.state.registry.assets_mut().iter_mut().zip(new_holdings) {
            asset.amount_held = held;
        }
        self.state.sequence += 1;

        tracing::info!(
            fund = %self.state.name,
            depositor,
            amount = %amount,
            value = %value,
            shares = %shares,
            total_shares = %self.state.ledger.total_shares(),
            "deposit settled"
        );

        Ok(DepositReceipt {
            depositor: depositor.to_string(),
            amount_in: amount,
            value_contributed: value,
            shares_minted: shares,
            fills: fills.into_iter().flatten().collect(),
        })
    }

    /// Burns `shares` of `holder` and pays out the proportional slice of
    /// every asset.
    ///
    /// # Errors
    ///
    /// - [`VaultError::ZeroAmount`] if `shares` is zero.
    /// - [`VaultError::InsufficientBalance`] if the holder owns fewer shares.
    pub fn withdraw(&mut self, holder: &str, shares: Amount) -> Result<WithdrawReceipt, VaultError> {
        if shares == 0 {
            return Err(VaultError::ZeroAmount);
        }
        let balance = self.state.ledger.balance_of(holder);
        if balance < shares {
            return Err(VaultError::InsufficientBalance {
                holder: holder.to_string(),
                balance,
                requested: shares,
            });
        }

        let mut amounts = Vec::with_capacity(self.state.registry.len());
        for asset in self.state.registry.assets() {
            amounts.push(self.state.ledger.pro_rata(asset.amount_held, shares)?);
        }

        self.state.ledger.burn(holder, shares)?;
        let mut payouts = Vec::new();
        for (asset, amount) in self.state.registry.assets_mut().iter_mut().zip(amounts) {
            // amount <= amount_held by construction of pro_rata.
            asset.amount_held -= amount;
            if amount > 0 {
                payouts.push(Transfer {
                    token: asset.token.clone(),
                    amount,
                    recipient: holder.to_string(),
                });
            }
        }
        self.state.sequence += 1;

        tracing::info!(
            fund = %self.state.name,
            holder,
            shares = %shares,
            payouts = payouts.len(),
            total_shares = %self.state.ledger.total_shares(),
            "withdrawal settled"
        );

        Ok(WithdrawReceipt {
            holder: holder.to_string(),
            shares_burned: shares,
            payouts,
        })
    }

    // -- Recovery -----------------------------------------------------------

    /// Records an inbound transfer of a token the basket does not track,
    /// e.g. an airdrop, so it can be recovered later.
    pub fn credit_untracked(&mut self, token: &str, amount: Amount) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if self.state.registry.contains(token) {
            return Err(VaultError::TrackedAsset(token.to_string()));
        }
        let entry = self.state.untracked.entry(token.to_string()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(VaultError::Overflow("untracked balance"))?;
        self.state.sequence += 1;
        Ok(())
    }

    /// Privileged raw transfer out of the fund's custody. Never touches
    /// shares. Requires [`Role::DefaultAdmin`] or [`Role::Recovery`].
    pub fn withdraw_token(
        &mut self,
        caller: &str,
        token: &str,
        amount: Amount,
        recipient: &str,
    ) -> Result<Transfer, VaultError> {
        let transfer = self.state.withdraw_token(caller, token, amount, recipient)?;
        self.state.sequence += 1;
        Ok(transfer)
    }

    // -- Administration -----------------------------------------------------

    /// Applies an administrative action as `caller`, all-or-nothing.
    ///
    /// Returns the token transfers the action produced (recoveries and
    /// decommissions); empty for pure registry or role changes.
    pub fn apply_admin(
        &mut self,
        caller: &str,
        action: &AdminAction,
    ) -> Result<Vec<Transfer>, VaultError> {
        let mut staged = self.state.clone();
        let mut transfers = Vec::new();
        staged.apply(caller, action, &mut transfers)?;
        staged.sequence += 1;
        self.state = staged;

        tracing::info!(
            fund = %self.state.name,
            caller,
            action = action.kind(),
            transfers = transfers.len(),
            "admin action applied"
        );
        Ok(transfers)
    }

    pub fn add_asset(
        &mut self,
        caller: &str,
        token: &str,
        venue: &str,
        weight: u32,
    ) -> Result<(), VaultError> {
        self.apply_admin(
            caller,
            &AdminAction::AddAsset {
                token: token.to_string(),
                venue: venue.to_string(),
                weight,
            },
        )
        .map(|_| ())
    }

    pub fn set_weights(&mut self, caller: &str, weights: Vec<WeightUpdate>) -> Result<(), VaultError> {
        self.apply_admin(caller, &AdminAction::SetWeights { weights })
            .map(|_| ())
    }

    pub fn grant_role(&mut self, caller: &str, role: Role, account: &str) -> Result<(), VaultError> {
        self.apply_admin(
            caller,
            &AdminAction::GrantRole {
                role,
                account: account.to_string(),
            },
        )
        .map(|_| ())
    }

    pub fn revoke_role(&mut self, caller: &str, role: Role, account: &str) -> Result<(), VaultError> {
        self.apply_admin(
            caller,
            &AdminAction::RevokeRole {
                role,
                account: account.to_string(),
            },
        )
        .map(|_| ())
    }

    /// Installs `governor` as the sole admin. See
    /// [`AccessControl::transfer_admin`] for who may call this when.
    pub fn transfer_admin_role(&mut self, caller: &str, governor: &str) -> Result<(), VaultError> {
        self.apply_admin(
            caller,
            &AdminAction::TransferAdmin {
                new_admin: governor.to_string(),
            },
        )
        .map(|_| ())
    }

    // -- Views --------------------------------------------------------------

    pub fn has_role(&self, role: Role, account: &str) -> bool {
        self.state.access.has_role(role, account)
    }

    pub fn balance_of(&self, holder: &str) -> Amount {
        self.state.ledger.balance_of(holder)
    }

    pub fn total_shares(&self) -> Amount {
        self.state.ledger.total_shares()
    }

    /// Fund-level summary.
    pub fn overview(&self) -> FundOverview {
        let assets: Vec<AssetView> = self
            .state
            .registry
            .assets()
            .iter()
            .map(|a| AssetView {
                token: a.token.clone(),
                venue: a.venue.clone(),
                weight: a.weight,
                amount_held: a.amount_held,
            })
            .collect();
        let total_value = assets
            .iter()
            .fold(0 as Amount, |acc, a| acc.saturating_add(a.amount_held));

        FundOverview {
            name: self.state.name.clone(),
            base_asset: self.state.base_asset.clone(),
            router: self.state.router.clone(),
            admin: self.state.access.state().clone(),
            total_value,
            total_shares: self.state.ledger.total_shares(),
            holders: self.state.ledger.holder_count(),
            assets,
            untracked: self
                .state
                .untracked
                .iter()
                .map(|(t, a)| (t.clone(), *a))
                .collect(),
        }
    }

    /// Holder-level summary: balance, ownership, and current claims.
    pub fn user_info(&self, holder: &str) -> Result<UserInfo, VaultError> {
        let ledger = &self.state.ledger;
        let shares = ledger.balance_of(holder);
        let total_shares = ledger.total_shares();

        let mut claims = Vec::new();
        let mut value: Amount = 0;
        if shares > 0 {
            for asset in self.state.registry.assets() {
                let amount = ledger.pro_rata(asset.amount_held, shares)?;
                if amount > 0 {
                    value = value
                        .checked_add(amount)
                        .ok_or(VaultError::Overflow("claim value"))?;
                    claims.push(Transfer {
                        token: asset.token.clone(),
                        amount,
                        recipient: holder.to_string(),
                    });
                }
            }
        }

        let ownership_bps = if total_shares == 0 {
            0
        } else {
            shares
                .checked_mul(BPS_DENOMINATOR)
                .ok_or(VaultError::Overflow("ownership"))?
                / total_shares
        };

        Ok(UserInfo {
            holder: holder.to_string(),
            shares,
            total_shares,
            ownership_bps,
            claims,
            value,
        })
    }
}
