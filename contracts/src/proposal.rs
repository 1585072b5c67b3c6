//! # Proposals
//!
//! A proposal carries one [`AdminAction`], the voting weight snapshot taken
//! when it was created, and the running tally. Its status is never stored;
//! it is derived from the tally, the recorded execution or cancellation,
//! and the time of the query.
//!
//! ## Lifecycle
//!
//! ```text
//!            start            deadline           deadline + grace
//! Pending ─────▶ Active ─────────▶ Succeeded ──────────▶ Expired
//!    │             │          │        │
//!    └──cancel─────┴─▶ Canceled        └──execute──▶ Executed
//!                             └──▶ Defeated
//! ```

use std::collections::BTreeMap;

use basket_protocol::vault::{Address, AdminAction, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Created, voting has not opened yet.
    Pending,
    /// Accepting votes.
    Active,
    /// Voting closed, quorum met and more votes for than against.
    Succeeded,
    /// Voting closed without success.
    Defeated,
    /// The action has been applied to the fund.
    Executed,
    /// Succeeded but not executed within the grace window.
    Expired,
    /// Withdrawn by its proposer before voting closed.
    Canceled,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "Pending"),
            ProposalStatus::Active => write!(f, "Active"),
            ProposalStatus::Succeeded => write!(f, "Succeeded"),
            ProposalStatus::Defeated => write!(f, "Defeated"),
            ProposalStatus::Executed => write!(f, "Executed"),
            ProposalStatus::Expired => write!(f, "Expired"),
            ProposalStatus::Canceled => write!(f, "Canceled"),
        }
    }
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    For,
    Against,
}

impl std::str::FromStr for Support {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "for" | "yes" | "1" => Ok(Support::For),
            "against" | "no" | "0" => Ok(Support::Against),
            other => Err(format!("unknown vote '{}', expected for/against", other)),
        }
    }
}

/// A recorded vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub support: Support,
    pub weight: Amount,
    pub cast_at: DateTime<Utc>,
}

/// Vote totals for one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub votes_for: Amount,
    pub votes_against: Amount,
    /// Votes in favour required for success.
    pub quorum_votes: Amount,
    /// Total share supply at the snapshot.
    pub total_weight: Amount,
}

impl Tally {
    /// Quorum reached and a strict majority in favour.
    pub fn succeeded(&self) -> bool {
        self.votes_for >= self.quorum_votes && self.votes_for > self.votes_against
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Hex BLAKE3 digest of governor name, action and description.
    pub id: String,
    pub proposer: Address,
    pub action: AdminAction,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Voting opens at this instant (inclusive).
    pub start: DateTime<Utc>,
    /// Voting closes at this instant (exclusive).
    pub deadline: DateTime<Utc>,
    /// Last instant a succeeded proposal may still be executed.
    pub execution_deadline: DateTime<Utc>,
    /// Share balances at creation; the only weights that count.
    pub snapshot: BTreeMap<Address, Amount>,
    pub tally: Tally,
    pub ballots: BTreeMap<Address, Ballot>,
    pub executed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Proposal {
    /// Status as of `now`.
    pub fn status(&self, now: DateTime<Utc>) -> ProposalStatus {
        if self.canceled_at.is_some() {
            return ProposalStatus::Canceled;
        }
        if self.executed_at.is_some() {
            return ProposalStatus::Executed;
        }
        if now < self.start {
            return ProposalStatus::Pending;
        }
        if now < self.deadline {
            return ProposalStatus::Active;
        }
        if !self.tally.succeeded() {
            return ProposalStatus::Defeated;
        }
        if now > self.execution_deadline {
            return ProposalStatus::Expired;
        }
        ProposalStatus::Succeeded
    }

    /// Snapshot weight of `account`, zero if it held no shares.
    pub fn weight_of(&self, account: &str) -> Amount {
        self.snapshot.get(account).copied().unwrap_or(0)
    }

    pub fn has_voted(&self, account: &str) -> bool {
        self.ballots.contains_key(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn proposal(votes_for: Amount, votes_against: Amount) -> Proposal {
        let t0 = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        Proposal {
            id: "id".into(),
            proposer: "alice".into(),
            action: AdminAction::Batch { actions: vec![] },
            description: String::new(),
            created_at: t0,
            start: t0,
            deadline: t0 + Duration::seconds(3600),
            execution_deadline: t0 + Duration::seconds(7200),
            snapshot: BTreeMap::new(),
            tally: Tally {
                votes_for,
                votes_against,
                quorum_votes: 20,
                total_weight: 100,
            },
            ballots: BTreeMap::new(),
            executed_at: None,
            canceled_at: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn status_follows_the_clock() {
        let p = proposal(30, 10);
        assert_eq!(p.status(at(999)), ProposalStatus::Pending);
        assert_eq!(p.status(at(1_000)), ProposalStatus::Active);
        assert_eq!(p.status(at(4_599)), ProposalStatus::Active);
        assert_eq!(p.status(at(4_600)), ProposalStatus::Succeeded);
        assert_eq!(p.status(at(8_200)), ProposalStatus::Succeeded);
        assert_eq!(p.status(at(8_201)), ProposalStatus::Expired);
    }

    #[test]
    fn majority_without_quorum_is_defeated() {
        let p = proposal(19, 0);
        assert!(!p.tally.succeeded());
        assert_eq!(p.status(at(5_000)), ProposalStatus::Defeated);
    }

    #[test]
    fn tie_is_defeated() {
        assert!(!proposal(40, 40).tally.succeeded());
    }

    #[test]
    fn support_parsing() {
        assert_eq!("FOR".parse::<Support>().unwrap(), Support::For);
        assert_eq!("no".parse::<Support>().unwrap(), Support::Against);
        assert!("abstain".parse::<Support>().is_err());
    }
}
