//! # Fund Configuration & Constants
//!
//! Every magic number the vault engine and its governor depend on lives
//! here, together with the serde types a deployment feeds in at
//! construction time. If a weight denominator or a voting period is
//! hardcoded anywhere else, it is a bug waiting for a re-weight.
//!
//! The presets at the bottom reproduce the funds that were actually
//! deployed: the two Polygon baskets and the Web3 basket with uneven
//! weights and a ten-minute governor.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vault::{Address, TokenId};

// ---------------------------------------------------------------------------
// Basket Parameters
// ---------------------------------------------------------------------------

/// Target weights of all assets in a fund sum to exactly this value.
/// Weights are whole percentage points.
pub const WEIGHT_DENOMINATOR: u32 = 100;

/// Upper bound on basket size. Every deposit performs one swap per active
/// asset, so the basket cannot grow without bound.
pub const MAX_ASSETS: usize = 16;

/// Basis-point denominator used for ownership ratios and swap rates.
pub const BPS_DENOMINATOR: u128 = 10_000;

// ---------------------------------------------------------------------------
// Governance Parameters
// ---------------------------------------------------------------------------

/// Share of the snapshotted voting weight that must vote in favour.
pub const DEFAULT_QUORUM_PERCENT: u8 = 20;

/// Ten-minute vote, used by the small Web3 basket.
pub const QUICK_VOTING_PERIOD_SECS: u64 = 600;

/// Voting period for funds that rebalance aggressively.
pub const FAST_VOTING_PERIOD_SECS: u64 = 3600;

/// Voting period for conservative funds.
pub const CONSERVATIVE_VOTING_PERIOD_SECS: u64 = 24 * 3600;

/// Delay between proposal creation and the opening of the vote.
pub const DEFAULT_VOTING_DELAY_SECS: u64 = 0;

/// How long a succeeded proposal stays executable after its deadline.
pub const DEFAULT_EXECUTION_GRACE_SECS: u64 = 14 * 24 * 3600;

/// Upper bound on any configured governance duration (100 years).
pub const MAX_GOVERNANCE_DURATION_SECS: u64 = 100 * 365 * 24 * 3600;

/// Minimum share balance required to create a proposal.
pub const DEFAULT_PROPOSAL_THRESHOLD: u128 = 1;

// ---------------------------------------------------------------------------
// Well-known Addresses (Polygon PoS)
// ---------------------------------------------------------------------------

/// 1inch aggregation router v5.
pub const ONEINCH_ROUTER: &str = "0x1111111254EEB25477B68fb85Ed929f73A960582";

/// Bridged USDC, the base asset of every deployed fund.
pub const POLYGON_USDC: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a fund configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

// ---------------------------------------------------------------------------
// Config Types
// ---------------------------------------------------------------------------

/// One basket entry as supplied by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Token held by the fund.
    pub token: TokenId,
    /// Venue (pool or feed) the aggregator should route through.
    pub venue: Address,
    /// Target weight out of [`WEIGHT_DENOMINATOR`].
    pub weight: u32,
}

impl AssetConfig {
    pub fn new(token: &str, venue: &str, weight: u32) -> Self {
        Self {
            token: token.to_string(),
            venue: venue.to_string(),
            weight,
        }
    }
}

/// Parameters of the governor bound to a fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Display name, also mixed into proposal identifiers.
    pub name: String,
    /// Seconds between proposal creation and the start of voting.
    #[serde(default)]
    pub voting_delay_secs: u64,
    /// Seconds the vote stays open.
    pub voting_period_secs: u64,
    /// Percentage of the snapshotted voting weight required in favour.
    pub quorum_percent: u8,
    /// Minimum share balance to create a proposal.
    #[serde(default = "default_proposal_threshold")]
    pub proposal_threshold: u128,
    /// Seconds after the deadline during which a succeeded proposal may run.
    #[serde(default = "default_execution_grace")]
    pub execution_grace_secs: u64,
}

fn default_proposal_threshold() -> u128 {
    DEFAULT_PROPOSAL_THRESHOLD
}

fn default_execution_grace() -> u64 {
    DEFAULT_EXECUTION_GRACE_SECS
}

impl GovernorConfig {
    /// A governor with the default quorum, threshold and grace window.
    pub fn new(name: &str, voting_period_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            voting_delay_secs: DEFAULT_VOTING_DELAY_SECS,
            voting_period_secs,
            quorum_percent: DEFAULT_QUORUM_PERCENT,
            proposal_threshold: DEFAULT_PROPOSAL_THRESHOLD,
            execution_grace_secs: DEFAULT_EXECUTION_GRACE_SECS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voting_period_secs == 0 {
            return Err(ConfigError::Invalid("voting period must be positive".into()));
        }
        for (label, secs) in [
            ("voting delay", self.voting_delay_secs),
            ("voting period", self.voting_period_secs),
            ("execution grace", self.execution_grace_secs),
        ] {
            if secs > MAX_GOVERNANCE_DURATION_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{label} of {secs}s exceeds {MAX_GOVERNANCE_DURATION_SECS}s"
                )));
            }
        }
        if self.quorum_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "quorum {}% exceeds 100%",
                self.quorum_percent
            )));
        }
        Ok(())
    }
}

/// Everything needed to construct a fund and its governor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundConfig {
    pub name: String,
    /// Currency accepted by `deposit`.
    pub base_asset: TokenId,
    /// Aggregator router the swap instructions target.
    pub router: Address,
    pub assets: Vec<AssetConfig>,
    pub governor: GovernorConfig,
}

impl FundConfig {
    /// Reads and validates a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: FundConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks. The weight invariant itself is enforced again by
    /// the registry when the fund is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("fund name is empty".into()));
        }
        if self.assets.is_empty() || self.assets.len() > MAX_ASSETS {
            return Err(ConfigError::Invalid(format!(
                "basket must hold between 1 and {} assets, got {}",
                MAX_ASSETS,
                self.assets.len()
            )));
        }
        let total: u64 = self.assets.iter().map(|a| u64::from(a.weight)).sum();
        if total != u64::from(WEIGHT_DENOMINATOR) {
            return Err(ConfigError::Invalid(format!(
                "asset weights sum to {}, expected {}",
                total, WEIGHT_DENOMINATOR
            )));
        }
        self.governor.validate()
    }

    /// Returns one of the deployed fund layouts by name.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.to_lowercase().as_str() {
            "polygon4" => Ok(polygon4()),
            "polygon5" => Ok(polygon5()),
            "web3" => Ok(web3()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }
}

/// Names accepted by [`FundConfig::preset`].
pub const PRESET_NAMES: [&str; 3] = ["polygon4", "polygon5", "web3"];

const WBTC: &str = "0x1BFD67037B42Cf73acF2047067bd4F2C47D9BfD6";
const WETH: &str = "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619";
const WAVAX: &str = "0x2C89bbc92BD86F8075d1DEcc58C7F4E0107f286b";
const WMATIC: &str = "0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270";

fn polygon_core(weight: u32, matic_venue: &str) -> Vec<AssetConfig> {
    vec![
        AssetConfig::new(WBTC, "0xc907E116054Ad103354f2D350FD2514433D57F6f", weight),
        AssetConfig::new(WETH, "0xF9680D99D6C9589e2a93a78A04A279e509205945", weight),
        AssetConfig::new(WAVAX, "0xe01eA2fbd8D76ee323FbEd03eB9a8625EC981A10", weight),
        AssetConfig::new(WMATIC, matic_venue, weight),
    ]
}

fn polygon4() -> FundConfig {
    FundConfig {
        name: "Inzen: Polygon4".into(),
        base_asset: POLYGON_USDC.into(),
        router: ONEINCH_ROUTER.into(),
        assets: polygon_core(25, "0xAB594600376Ec9fD91F8e885dADF0CE036862dE0"),
        governor: GovernorConfig::new("InzenGovernor: Polygon4", CONSERVATIVE_VOTING_PERIOD_SECS),
    }
}

fn polygon5() -> FundConfig {
    let mut assets = polygon_core(20, "0x327e23A4855b6F663a28c5161541d69Af8973302");
    assets.push(AssetConfig::new(
        POLYGON_USDC,
        "0xfE4A8cc5b5B2366C1B58Bea3858e81843581b2F7",
        20,
    ));
    FundConfig {
        name: "Inzen: Polygon5".into(),
        base_asset: POLYGON_USDC.into(),
        router: ONEINCH_ROUTER.into(),
        assets,
        governor: GovernorConfig::new("InzenGovernor: Polygon5", FAST_VOTING_PERIOD_SECS),
    }
}

fn web3() -> FundConfig {
    FundConfig {
        name: "Inzen: Web3".into(),
        base_asset: POLYGON_USDC.into(),
        router: ONEINCH_ROUTER.into(),
        assets: vec![
            // LINK, GRT, OCEAN
            AssetConfig::new(
                "0x53E0bca35eC356BD5ddDFebbD1Fc0fD03FaBad39",
                "0xd9FFdb71EbE7496cC440152d43986Aae0AB76665",
                50,
            ),
            AssetConfig::new(
                "0x5fe2B58c013d7601147DcdD68C143A77499f5531",
                "0x3FabBfb300B1e2D7c9B84512fe9D30aeDF24C410",
                25,
            ),
            AssetConfig::new(
                "0x282d8efCe846A88B159800bd4130ad77443Fa1A1",
                "0xdcda79097C44353Dee65684328793695bd34A629",
                25,
            ),
        ],
        governor: GovernorConfig::new("InzenGovernor: Web3", QUICK_VOTING_PERIOD_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for name in PRESET_NAMES {
            let config = FundConfig::preset(name).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        let config = FundConfig::preset("Polygon4").unwrap();
        assert_eq!(config.name, "Inzen: Polygon4");
        assert_eq!(config.governor.voting_period_secs, CONSERVATIVE_VOTING_PERIOD_SECS);
    }

    #[test]
    fn unknown_preset_rejected() {
        assert!(matches!(
            FundConfig::preset("solana9"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn json_roundtrip_applies_defaults() {
        let raw = r#"{
            "name": "Test Fund",
            "base_asset": "USDC",
            "router": "router",
            "assets": [
                { "token": "BTC", "venue": "v1", "weight": 60 },
                { "token": "ETH", "venue": "v2", "weight": 40 }
            ],
            "governor": { "name": "gov", "voting_period_secs": 3600, "quorum_percent": 20 }
        }"#;
        let config = FundConfig::from_json(raw).unwrap();
        assert_eq!(config.governor.voting_delay_secs, 0);
        assert_eq!(config.governor.proposal_threshold, DEFAULT_PROPOSAL_THRESHOLD);
        assert_eq!(config.governor.execution_grace_secs, DEFAULT_EXECUTION_GRACE_SECS);
    }

    #[test]
    fn weights_must_sum_to_denominator() {
        let mut config = FundConfig::preset("web3").unwrap();
        config.assets[0].weight = 49;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn quorum_above_hundred_rejected() {
        let mut config = FundConfig::preset("polygon5").unwrap();
        config.governor.quorum_percent = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn governance_durations_are_bounded() {
        let mut config = FundConfig::preset("web3").unwrap();
        config.governor.voting_period_secs = 10_000_000_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = FundConfig::preset("web3").unwrap();
        config.governor.voting_delay_secs = MAX_GOVERNANCE_DURATION_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = FundConfig::preset("web3").unwrap();
        config.governor.execution_grace_secs = MAX_GOVERNANCE_DURATION_SECS;
        config.validate().unwrap();
        config.governor.execution_grace_secs += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_constants_sanity() {
        assert!(QUICK_VOTING_PERIOD_SECS < FAST_VOTING_PERIOD_SECS);
        assert!(FAST_VOTING_PERIOD_SECS < CONSERVATIVE_VOTING_PERIOD_SECS);
        assert!(CONSERVATIVE_VOTING_PERIOD_SECS < DEFAULT_EXECUTION_GRACE_SECS);
    }
}
