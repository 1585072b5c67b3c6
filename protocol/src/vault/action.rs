//! Administrative actions.
//!
//! Everything that changes fund composition or permissions is expressed as
//! an [`AdminAction`] value so the same code path serves the deployer
//! before the handoff and the governor after it. Actions are plain data:
//! a proposal stores one, votes on it, and later hands it to
//! [`VaultEngine::apply_admin`](super::VaultEngine::apply_admin).

use serde::{Deserialize, Serialize};

use super::access::Role;
use super::{Address, Amount, TokenId};

/// New target weight for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightUpdate {
    pub token: TokenId,
    pub weight: u32,
}

impl WeightUpdate {
    pub fn new(token: &str, weight: u32) -> Self {
        Self {
            token: token.to_string(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    /// Append an asset to the basket. Only weight 0 keeps the invariant on
    /// its own; combine with `SetWeights` in a `Batch` to activate it.
    AddAsset {
        token: TokenId,
        venue: Address,
        weight: u32,
    },
    /// Atomic re-weight of the named assets.
    SetWeights { weights: Vec<WeightUpdate> },
    GrantRole { role: Role, account: Address },
    RevokeRole { role: Role, account: Address },
    /// Raw transfer of a stray or decommissioned token.
    WithdrawToken {
        token: TokenId,
        amount: Amount,
        recipient: Address,
    },
    /// Zero the asset's weight (redistributing per `weights`) and move its
    /// entire holding to `recipient`, as one step.
    DecommissionAsset {
        token: TokenId,
        weights: Vec<WeightUpdate>,
        recipient: Address,
    },
    /// Hand the admin role to a new governor.
    TransferAdmin { new_admin: Address },
    /// Several actions applied all-or-nothing, in order.
    Batch { actions: Vec<AdminAction> },
}

impl AdminAction {
    /// Short label for logs and listings.
    pub fn kind(&self) -> &'static str {
        match self {
            AdminAction::AddAsset { .. } => "add_asset",
            AdminAction::SetWeights { .. } => "set_weights",
            AdminAction::GrantRole { .. } => "grant_role",
            AdminAction::RevokeRole { .. } => "revoke_role",
            AdminAction::WithdrawToken { .. } => "withdraw_token",
            AdminAction::DecommissionAsset { .. } => "decommission_asset",
            AdminAction::TransferAdmin { .. } => "transfer_admin",
            AdminAction::Batch { .. } => "batch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_snake_case_externally_tagged() {
        let action = AdminAction::SetWeights {
            weights: vec![WeightUpdate::new("BTC", 50), WeightUpdate::new("ETH", 50)],
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.starts_with(r#"{"set_weights":"#));
        let parsed: AdminAction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }

    #[test]
    fn batch_kind() {
        let action = AdminAction::Batch { actions: vec![] };
        assert_eq!(action.kind(), "batch");
    }
}
