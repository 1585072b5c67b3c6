//! # Asset Registry
//!
//! The ordered list of basket assets and their target weights. Order is
//! significant: deposits swap in registry order, and the rounding
//! remainder of a deposit split lands on the first active asset.
//!
//! ## Weight Invariant
//!
//! The weights of all assets sum to exactly [`WEIGHT_DENOMINATOR`] after
//! construction and after every mutation. A mutation that would break the
//! sum fails with [`VaultError::InvalidWeight`] and leaves the registry
//! untouched. Assets are never removed; an asset with weight 0 is inactive.

use serde::{Deserialize, Serialize};

use super::action::WeightUpdate;
use super::error::VaultError;
use super::{Address, Amount, TokenId};
use crate::config::{AssetConfig, MAX_ASSETS, WEIGHT_DENOMINATOR};

/// One basket entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Token the fund holds.
    pub token: TokenId,
    /// Venue the aggregator routes swaps through.
    pub venue: Address,
    /// Target weight out of [`WEIGHT_DENOMINATOR`]. Zero means inactive.
    pub weight: u32,
    /// Realized holdings, updated by deposits, withdrawals and recoveries.
    pub amount_held: Amount,
}

impl Asset {
    pub fn new(token: &str, venue: &str, weight: u32) -> Self {
        Self {
            token: token.to_string(),
            venue: venue.to_string(),
            weight,
            amount_held: 0,
        }
    }

    /// Returns `true` if deposits swap into this asset.
    pub fn is_active(&self) -> bool {
        self.weight > 0
    }
}

impl From<&AssetConfig> for Asset {
    fn from(config: &AssetConfig) -> Self {
        Asset::new(&config.token, &config.venue, config.weight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    /// Builds a registry from the initial basket.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::DuplicateAsset`] if a token appears twice and
    /// [`VaultError::InvalidWeight`] if the basket is empty, too large, or
    /// its weights do not sum to the denominator.
    pub fn new(assets: Vec<Asset>) -> Result<Self, VaultError> {
        for (i, asset) in assets.iter().enumerate() {
            if assets[..i].iter().any(|a| a.token == asset.token) {
                return Err(VaultError::DuplicateAsset(asset.token.clone()));
            }
        }
        let total = weight_sum(assets.iter().map(|a| a.weight));
        if assets.is_empty() || assets.len() > MAX_ASSETS {
            return Err(VaultError::InvalidWeight {
                total,
                expected: WEIGHT_DENOMINATOR,
            });
        }
        check_total(total)?;
        Ok(Self { assets })
    }

    pub fn from_config(configs: &[AssetConfig]) -> Result<Self, VaultError> {
        Self::new(configs.iter().map(Asset::from).collect())
    }

    /// Appends an asset. The resulting weight sum must still equal the
    /// denominator, so on a live fund only a weight-0 asset is admitted;
    /// pair it with [`set_weights`](Self::set_weights) to activate it.
    pub fn add_asset(&mut self, token: &str, venue: &str, weight: u32) -> Result<(), VaultError> {
        if self.contains(token) {
            return Err(VaultError::DuplicateAsset(token.to_string()));
        }
        let total = self.total_weight() + u64::from(weight);
        if self.assets.len() >= MAX_ASSETS {
            return Err(VaultError::InvalidWeight {
                total,
                expected: WEIGHT_DENOMINATOR,
            });
        }
        check_total(total)?;
        self.assets.push(Asset::new(token, venue, weight));
        Ok(())
    }

    /// Re-weights one or more assets in a single step.
    ///
    /// Assets not named in `updates` keep their weight. The check runs
    /// against the complete post-update basket, so intermediate sums never
    /// matter and never become visible.
    pub fn set_weights(&mut self, updates: &[WeightUpdate]) -> Result<(), VaultError> {
        let mut weights: Vec<u32> = self.assets.iter().map(|a| a.weight).collect();
        for update in updates {
            let index = self
                .position(&update.token)
                .ok_or_else(|| VaultError::UnknownAsset(update.token.clone()))?;
            weights[index] = update.weight;
        }
        check_total(weight_sum(weights.iter().copied()))?;

        for (asset, weight) in self.assets.iter_mut().zip(weights) {
            asset.weight = weight;
        }
        Ok(())
    }

    /// Splits a deposit across the active assets.
    ///
    /// Each asset receives `amount * weight / DENOM`, truncated. The
    /// remainder goes to the first active asset so that the whole deposit
    /// is invested. Inactive assets receive zero. The result is aligned
    /// with [`assets`](Self::assets).
    pub fn split(&self, amount: Amount) -> Result<Vec<Amount>, VaultError> {
        let denominator = Amount::from(WEIGHT_DENOMINATOR);
        let mut slices = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let slice = amount
                .checked_mul(Amount::from(asset.weight))
                .ok_or(VaultError::Overflow("deposit split"))?
                / denominator;
            slices.push(slice);
        }

        let allocated: Amount = slices.iter().sum();
        let remainder = amount - allocated;
        if remainder > 0 {
            if let Some(first) = self.assets.iter().position(Asset::is_active) {
                slices[first] += remainder;
            }
        }
        Ok(slices)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub(crate) fn assets_mut(&mut self) -> &mut [Asset] {
        &mut self.assets
    }

    /// Ordered `(token, weight)` pairs.
    pub fn weights(&self) -> Vec<(TokenId, u32)> {
        self.assets
            .iter()
            .map(|a| (a.token.clone(), a.weight))
            .collect()
    }

    pub fn get(&self, token: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.token == token)
    }

    pub(crate) fn get_mut(&mut self, token: &str) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.token == token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.position(token).is_some()
    }

    pub fn total_weight(&self) -> u64 {
        weight_sum(self.assets.iter().map(|a| a.weight))
    }

    /// Sum of realized holdings across the basket.
    pub fn total_held(&self) -> Result<Amount, VaultError> {
        self.assets.iter().try_fold(0 as Amount, |acc, a| {
            acc.checked_add(a.amount_held)
                .ok_or(VaultError::Overflow("total holdings"))
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn position(&self, token: &str) -> Option<usize> {
        self.assets.iter().position(|a| a.token == token)
    }
}

fn weight_sum(weights: impl Iterator<Item = u32>) -> u64 {
    weights.map(u64::from).sum()
}

fn check_total(total: u64) -> Result<(), VaultError> {
    if total != u64::from(WEIGHT_DENOMINATOR) {
        return Err(VaultError::InvalidWeight {
            total,
            expected: WEIGHT_DENOMINATOR,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> AssetRegistry {
        AssetRegistry::new(vec![
            Asset::new("BTC", "v-btc", 25),
            Asset::new("ETH", "v-eth", 25),
            Asset::new("AVAX", "v-avax", 25),
            Asset::new("MATIC", "v-matic", 25),
        ])
        .unwrap()
    }

    #[test]
    fn new_registry_enforces_weight_sum() {
        let result = AssetRegistry::new(vec![
            Asset::new("BTC", "v", 50),
            Asset::new("ETH", "v", 40),
        ]);
        assert_eq!(
            result.unwrap_err(),
            VaultError::InvalidWeight {
                total: 90,
                expected: 100
            }
        );
    }

    #[test]
    fn empty_registry_rejected() {
        assert!(matches!(
            AssetRegistry::new(Vec::new()),
            Err(VaultError::InvalidWeight { total: 0, .. })
        ));
    }

    #[test]
    fn duplicate_token_rejected() {
        let result = AssetRegistry::new(vec![
            Asset::new("BTC", "v", 50),
            Asset::new("BTC", "w", 50),
        ]);
        assert_eq!(result.unwrap_err(), VaultError::DuplicateAsset("BTC".into()));
    }

    #[test]
    fn add_weighted_asset_to_full_basket_fails_and_leaves_registry() {
        let mut registry = quad();
        let before = registry.clone();
        let result = registry.add_asset("LINK", "v-link", 10);
        assert!(matches!(result, Err(VaultError::InvalidWeight { total: 110, .. })));
        assert_eq!(registry, before);
    }

    #[test]
    fn add_inactive_asset_then_reweight() {
        let mut registry = quad();
        registry.add_asset("LINK", "v-link", 0).unwrap();
        assert_eq!(registry.total_weight(), 100);

        registry
            .set_weights(&[
                WeightUpdate::new("BTC", 20),
                WeightUpdate::new("ETH", 20),
                WeightUpdate::new("LINK", 10),
            ])
            .unwrap();
        assert_eq!(registry.get("LINK").unwrap().weight, 10);
        assert_eq!(registry.total_weight(), 100);
    }

    #[test]
    fn set_weights_unknown_token_rejected() {
        let mut registry = quad();
        let result = registry.set_weights(&[WeightUpdate::new("DOGE", 25)]);
        assert_eq!(result.unwrap_err(), VaultError::UnknownAsset("DOGE".into()));
    }

    #[test]
    fn set_weights_bad_sum_leaves_registry() {
        let mut registry = quad();
        let before = registry.clone();
        let result = registry.set_weights(&[WeightUpdate::new("BTC", 30)]);
        assert!(matches!(result, Err(VaultError::InvalidWeight { total: 105, .. })));
        assert_eq!(registry, before);
    }

    #[test]
    fn split_even_weights() {
        let slices = quad().split(1_000_000).unwrap();
        assert_eq!(slices, vec![250_000, 250_000, 250_000, 250_000]);
    }

    #[test]
    fn split_remainder_goes_to_first_active_asset() {
        let mut registry = quad();
        registry
            .set_weights(&[WeightUpdate::new("BTC", 0), WeightUpdate::new("ETH", 50)])
            .unwrap();
        // 1003 * 50 / 100 = 501, 1003 * 25 / 100 = 250 twice; remainder 2.
        let slices = registry.split(1003).unwrap();
        assert_eq!(slices, vec![0, 503, 250, 250]);
        assert_eq!(slices.iter().sum::<u128>(), 1003);
    }

    #[test]
    fn split_overflow_is_reported() {
        let result = quad().split(u128::MAX);
        assert_eq!(result.unwrap_err(), VaultError::Overflow("deposit split"));
    }
}
