//! # Access Control
//!
//! Two roles guard the fund's privileged entry points:
//!
//! - [`Role::DefaultAdmin`] — re-weighting, basket changes, role
//!   management, recovery, admin handoff.
//! - [`Role::Recovery`] — recovery of untracked tokens only.
//!
//! ## Admin Handoff
//!
//! A fund starts [`AdminState::DeployerControlled`]: the deployer is the
//! sole admin and may act directly. [`AccessControl::transfer_admin`]
//! moves the admin role to a governor in one step, strips it from
//! everyone else and drops every Recovery grant the deployer made. From then on the fund is
//! [`AdminState::GovernanceControlled`] and only the governor can act as
//! admin, which in practice means only an executed proposal can. A later
//! re-transfer is itself an admin action, so it also has to pass a vote.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::VaultError;
use super::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    DefaultAdmin,
    Recovery,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::DefaultAdmin => write!(f, "DEFAULT_ADMIN"),
            Role::Recovery => write!(f, "RECOVERY"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "DEFAULT_ADMIN" | "ADMIN" => Ok(Role::DefaultAdmin),
            "RECOVERY" => Ok(Role::Recovery),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Who currently controls the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminState {
    DeployerControlled { deployer: Address },
    GovernanceControlled { governor: Address },
}

impl std::fmt::Display for AdminState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminState::DeployerControlled { deployer } => {
                write!(f, "DeployerControlled({})", deployer)
            }
            AdminState::GovernanceControlled { governor } => {
                write!(f, "GovernanceControlled({})", governor)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admins: BTreeSet<Address>,
    recoverers: BTreeSet<Address>,
    state: AdminState,
}

impl AccessControl {
    /// The deployer starts as the only admin.
    pub fn new(deployer: &str) -> Self {
        Self {
            admins: BTreeSet::from([deployer.to_string()]),
            recoverers: BTreeSet::new(),
            state: AdminState::DeployerControlled {
                deployer: deployer.to_string(),
            },
        }
    }

    pub fn has_role(&self, role: Role, account: &str) -> bool {
        self.members(role).contains(account)
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    pub fn is_governance_controlled(&self) -> bool {
        matches!(self.state, AdminState::GovernanceControlled { .. })
    }

    /// Accounts holding `role`, in address order.
    pub fn members(&self, role: Role) -> &BTreeSet<Address> {
        match role {
            Role::DefaultAdmin => &self.admins,
            Role::Recovery => &self.recoverers,
        }
    }

    /// Fails with [`VaultError::Unauthorized`] unless `caller` holds one of
    /// `roles`.
    pub fn require_any(
        &self,
        roles: &[Role],
        caller: &str,
        operation: &str,
    ) -> Result<(), VaultError> {
        if roles.iter().any(|role| self.has_role(*role, caller)) {
            return Ok(());
        }
        tracing::warn!(caller, operation, "rejected privileged call");
        Err(VaultError::Unauthorized {
            caller: caller.to_string(),
            operation: operation.to_string(),
        })
    }

    pub fn grant_role(&mut self, caller: &str, role: Role, account: &str) -> Result<(), VaultError> {
        self.require_any(&[Role::DefaultAdmin], caller, "grant roles")?;
        self.members_mut(role).insert(account.to_string());
        Ok(())
    }

    /// Revokes `role` from `account`. Removing the last admin is refused,
    /// since a fund without an admin can never be re-weighted again.
    pub fn revoke_role(&mut self, caller: &str, role: Role, account: &str) -> Result<(), VaultError> {
        self.require_any(&[Role::DefaultAdmin], caller, "revoke roles")?;
        if role == Role::DefaultAdmin && self.admins.len() == 1 && self.admins.contains(account) {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
                operation: "revoke the last admin".into(),
            });
        }
        self.members_mut(role).remove(account);
        Ok(())
    }

    /// Hands the admin role to `new_admin` exclusively.
    ///
    /// While deployer-controlled any admin may do this once. Afterwards
    /// only the installed governor may, i.e. through an executed proposal.
    pub fn transfer_admin(&mut self, caller: &str, new_admin: &str) -> Result<(), VaultError> {
        match &self.state {
            AdminState::DeployerControlled { .. } => {
                self.require_any(&[Role::DefaultAdmin], caller, "transfer admin")?;
            }
            AdminState::GovernanceControlled { governor } => {
                if caller != governor {
                    tracing::warn!(caller, "rejected admin transfer outside governance");
                    return Err(VaultError::Unauthorized {
                        caller: caller.to_string(),
                        operation: "transfer admin outside governance".into(),
                    });
                }
            }
        }

        if !self.is_governance_controlled() {
            // Roles granted by the deployer do not survive the handoff.
            self.recoverers.clear();
        }
        self.admins = BTreeSet::from([new_admin.to_string()]);
        self.state = AdminState::GovernanceControlled {
            governor: new_admin.to_string(),
        };
        tracing::info!(new_admin, "admin role transferred");
        Ok(())
    }

    fn members_mut(&mut self, role: Role) -> &mut BTreeSet<Address> {
        match role {
            Role::DefaultAdmin => &mut self.admins,
            Role::Recovery => &mut self.recoverers,
        }
    }
}
