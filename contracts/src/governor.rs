//! # Governor
//!
//! Share-weighted voting on administrative actions. Once a fund has handed
//! its admin role to a governor, an executed proposal is the only way to
//! re-weight it, change its basket, or touch its roles.
//!
//! ## Voting Weight
//!
//! Weight is the voter's share balance at the moment the proposal was
//! created. Shares minted, burned, or moved afterwards do not change the
//! outcome of a running vote.
//!
//! ## Quorum
//!
//! `quorum_votes = total_shares_at_snapshot * quorum_percent / 100`,
//! truncated. A proposal succeeds iff `for >= quorum_votes` and
//! `for > against`.

use basket_protocol::config::GovernorConfig;
use basket_protocol::vault::{
    Address, AdminAction, Amount, ShareLedger, SwapExecutor, Transfer, VaultEngine, VaultError,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proposal::{Ballot, Proposal, ProposalStatus, Support, Tally};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// The account's snapshot weight is below what the operation needs.
    #[error("insufficient voting weight: {account} has {weight}, needs {required}")]
    InsufficientWeight {
        account: Address,
        weight: Amount,
        required: Amount,
    },

    #[error("{voter} already voted on proposal {id}")]
    AlreadyVoted { id: String, voter: Address },

    /// Voting is not open: the proposal is pending or already decided.
    #[error("voting closed on proposal {id}: status is {status}")]
    VotingClosed { id: String, status: ProposalStatus },

    #[error("proposal {id} is not executable: status is {status}")]
    NotExecutable { id: String, status: ProposalStatus },

    #[error("unauthorized: {caller} may not {operation}")]
    Unauthorized { caller: Address, operation: String },

    #[error("proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("proposal {0} already exists")]
    DuplicateProposal(String),

    /// A configured duration pushes a proposal date past what a timestamp
    /// can hold.
    #[error("proposal {0} is out of range")]
    ScheduleOverflow(&'static str),

    #[error("proposal encoding failed: {0}")]
    Serialization(String),

    /// The executed action was rejected by the fund.
    #[error("vault: {0}")]
    Vault(#[from] VaultError),
}

// ---------------------------------------------------------------------------
// Governor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governor {
    /// Identity the fund sees as caller when a proposal executes.
    address: Address,
    config: GovernorConfig,
    /// In creation order.
    proposals: Vec<Proposal>,
}

impl Governor {
    pub fn new(address: &str, config: GovernorConfig) -> Self {
        Self {
            address: address.to_string(),
            config,
            proposals: Vec::new(),
        }
    }

    /// The conventional governor identity for a governor named `name`.
    pub fn address_for(name: &str) -> Address {
        format!("governor:{}", name)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn proposal(&self, id: &str) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    /// Deterministic identifier for a proposal of `action` with
    /// `description` under this governor.
    pub fn proposal_id(
        &self,
        action: &AdminAction,
        description: &str,
    ) -> Result<String, GovernanceError> {
        let encoded =
            serde_json::to_vec(action).map_err(|e| GovernanceError::Serialization(e.to_string()))?;

        let mut hasher = blake3::Hasher::new();
        for part in [self.config.name.as_bytes(), &encoded, description.as_bytes()] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }

    /// Opens a proposal, snapshotting every holder's weight from `ledger`.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::InsufficientWeight`] if the proposer holds fewer
    ///   shares than the threshold, or none at all.
    /// - [`GovernanceError::DuplicateProposal`] if the same action with the
    ///   same description was proposed before.
    pub fn propose(
        &mut self,
        proposer: &str,
        action: AdminAction,
        description: &str,
        ledger: &ShareLedger,
        now: DateTime<Utc>,
    ) -> Result<String, GovernanceError> {
        let weight = ledger.balance_of(proposer);
        let required = self.config.proposal_threshold.max(1);
        if weight < required {
            return Err(GovernanceError::InsufficientWeight {
                account: proposer.to_string(),
                weight,
                required,
            });
        }

        let id = self.proposal_id(&action, description)?;
        if self.proposal(&id).is_some() {
            return Err(GovernanceError::DuplicateProposal(id));
        }

        let total_weight = ledger.total_shares();
        let quorum_votes = total_weight
            .checked_mul(Amount::from(self.config.quorum_percent))
            .ok_or(VaultError::Overflow("quorum"))?
            / 100;

        let start = after(now, self.config.voting_delay_secs, "start")?;
        let deadline = after(start, self.config.voting_period_secs, "deadline")?;
        let execution_deadline =
            after(deadline, self.config.execution_grace_secs, "execution deadline")?;

        tracing::info!(
            governor = %self.config.name,
            id = %id,
            proposer,
            action = action.kind(),
            %deadline,
            "proposal created"
        );

        self.proposals.push(Proposal {
            id: id.clone(),
            proposer: proposer.to_string(),
            action,
            description: description.to_string(),
            created_at: now,
            start,
            deadline,
            execution_deadline,
            snapshot: ledger.snapshot(),
            tally: Tally {
                votes_for: 0,
                votes_against: 0,
                quorum_votes,
                total_weight,
            },
            ballots: Default::default(),
            executed_at: None,
            canceled_at: None,
        });
        Ok(id)
    }

    /// Casts `voter`'s snapshot weight on proposal `id`. Returns the weight
    /// counted.
    pub fn vote(
        &mut self,
        id: &str,
        voter: &str,
        support: Support,
        now: DateTime<Utc>,
    ) -> Result<Amount, GovernanceError> {
        let proposal = self.proposal_mut(id)?;
        let status = proposal.status(now);
        if status != ProposalStatus::Active {
            return Err(GovernanceError::VotingClosed {
                id: id.to_string(),
                status,
            });
        }
        if proposal.has_voted(voter) {
            return Err(GovernanceError::AlreadyVoted {
                id: id.to_string(),
                voter: voter.to_string(),
            });
        }
        let weight = proposal.weight_of(voter);
        if weight == 0 {
            return Err(GovernanceError::InsufficientWeight {
                account: voter.to_string(),
                weight,
                required: 1,
            });
        }

        let tally = &mut proposal.tally;
        // Cannot overflow: the snapshot sums to total_weight.
        match support {
            Support::For => tally.votes_for += weight,
            Support::Against => tally.votes_against += weight,
        }
        proposal.ballots.insert(
            voter.to_string(),
            Ballot {
                support,
                weight,
                cast_at: now,
            },
        );

        tracing::info!(id, voter, ?support, weight = %weight, "vote cast");
        Ok(weight)
    }

    /// Status of proposal `id` as of `now`.
    pub fn state(&self, id: &str, now: DateTime<Utc>) -> Result<ProposalStatus, GovernanceError> {
        self.proposal(id)
            .map(|p| p.status(now))
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    pub fn tally(&self, id: &str) -> Result<Tally, GovernanceError> {
        self.proposal(id)
            .map(|p| p.tally)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    /// Applies a succeeded proposal's action to `engine` as this governor.
    ///
    /// If the fund rejects the action, the error is returned, the fund is
    /// unchanged, and the proposal stays `Succeeded` so it can be retried
    /// once the cause is fixed.
    pub fn execute<S: SwapExecutor>(
        &mut self,
        id: &str,
        engine: &mut VaultEngine<S>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Transfer>, GovernanceError> {
        let address = self.address.clone();
        let proposal = self.proposal_mut(id)?;
        let status = proposal.status(now);
        if status != ProposalStatus::Succeeded {
            return Err(GovernanceError::NotExecutable {
                id: id.to_string(),
                status,
            });
        }

        let transfers = engine.apply_admin(&address, &proposal.action).map_err(|e| {
            tracing::warn!(id, error = %e, "proposal action rejected by fund");
            e
        })?;
        proposal.executed_at = Some(now);

        tracing::info!(id, action = proposal.action.kind(), "proposal executed");
        Ok(transfers)
    }

    /// Withdraws a proposal. Only its proposer may, and only before voting
    /// closes.
    pub fn cancel(&mut self, id: &str, caller: &str, now: DateTime<Utc>) -> Result<(), GovernanceError> {
        let proposal = self.proposal_mut(id)?;
        if proposal.proposer != caller {
            return Err(GovernanceError::Unauthorized {
                caller: caller.to_string(),
                operation: "cancel another account's proposal".into(),
            });
        }
        let status = proposal.status(now);
        if !matches!(status, ProposalStatus::Pending | ProposalStatus::Active) {
            return Err(GovernanceError::VotingClosed {
                id: id.to_string(),
                status,
            });
        }
        proposal.canceled_at = Some(now);
        tracing::info!(id, caller, "proposal canceled");
        Ok(())
    }

    fn proposal_mut(&mut self, id: &str) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }
}

fn after(
    at: DateTime<Utc>,
    secs: u64,
    what: &'static str,
) -> Result<DateTime<Utc>, GovernanceError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or(GovernanceError::ScheduleOverflow(what))
}
