//! # Share Ledger
//!
//! Holder balances plus the total-shares counter. The ledger maintains
//! `sum(balances) == total_shares` on every path: both sides are updated
//! together, and a holder whose balance reaches zero is dropped from the
//! map instead of lingering as a zero entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::VaultError;
use super::{Address, Amount};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: BTreeMap<Address, Amount>,
    total_shares: Amount,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` new shares to `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Overflow`] if either the holder balance or the
    /// total would exceed `u128::MAX`. Nothing changes in that case.
    pub fn mint(&mut self, holder: &str, amount: Amount) -> Result<(), VaultError> {
        let total = self
            .total_shares
            .checked_add(amount)
            .ok_or(VaultError::Overflow("share supply"))?;
        let balance = self
            .balance_of(holder)
            .checked_add(amount)
            .ok_or(VaultError::Overflow("holder balance"))?;

        if balance > 0 {
            self.balances.insert(holder.to_string(), balance);
        }
        self.total_shares = total;
        Ok(())
    }

    /// Destroys `amount` of `holder`'s shares.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if the holder owns fewer
    /// than `amount` shares.
    pub fn burn(&mut self, holder: &str, amount: Amount) -> Result<(), VaultError> {
        let balance = self.balance_of(holder);
        if balance < amount {
            return Err(VaultError::InsufficientBalance {
                holder: holder.to_string(),
                balance,
                requested: amount,
            });
        }

        let remaining = balance - amount;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.to_string(), remaining);
        }
        // Cannot underflow: total_shares >= balance >= amount.
        self.total_shares -= amount;
        Ok(())
    }

    pub fn balance_of(&self, holder: &str) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Holders with a non-zero balance, in address order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// A frozen copy of every balance, used as governance vote weight.
    pub fn snapshot(&self) -> BTreeMap<Address, Amount> {
        self.balances.clone()
    }

    /// Shares owed for a deposit worth `value` into a fund whose realized
    /// holdings are worth `nav`.
    ///
    /// The first depositor gets shares 1:1 with value. Later depositors get
    /// `value * total_shares / nav`, truncated so the pool never gives away
    /// more than it receives.
    ///
    /// # Errors
    ///
    /// - [`VaultError::EmptyPool`] if shares exist but `nav` is zero.
    /// - [`VaultError::ZeroAmount`] if the deposit is too small to earn a share.
    /// - [`VaultError::Overflow`] on multiplication overflow.
    pub fn shares_for_deposit(&self, value: Amount, nav: Amount) -> Result<Amount, VaultError> {
        let shares = if self.total_shares == 0 {
            value
        } else {
            if nav == 0 {
                return Err(VaultError::EmptyPool {
                    total_shares: self.total_shares,
                });
            }
            value
                .checked_mul(self.total_shares)
                .ok_or(VaultError::Overflow("share pricing"))?
                / nav
        };

        if shares == 0 {
            return Err(VaultError::ZeroAmount);
        }
        Ok(shares)
    }

    /// `holding * shares / total_shares`, truncated toward zero.
    pub fn pro_rata(&self, holding: Amount, shares: Amount) -> Result<Amount, VaultError> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        if shares == self.total_shares {
            return Ok(holding);
        }
        Ok(holding
            .checked_mul(shares)
            .ok_or(VaultError::Overflow("pro-rata claim"))?
            / self.total_shares)
    }
}
