//! Integration tests for the governor.
//!
//! These tests run full proposal lifecycles against a real fund: propose,
//! vote, let the clock pass the deadline, execute, and check what the
//! fund looks like afterwards.

use std::sync::Arc;

use basket_contracts::{GovernanceError, GovernedFund, ProposalStatus, Support};
use basket_protocol::clock::ManualClock;
use basket_protocol::config::{AssetConfig, FundConfig, GovernorConfig};
use basket_protocol::vault::{AdminAction, FixedRateExecutor, Role, VaultError, WeightUpdate};

type Fund = GovernedFund<FixedRateExecutor, Arc<ManualClock>>;

/// Helper: a two-asset fund with alice 600, bob 300, carol 100 shares,
/// already under governance.
fn governed_fund(period_secs: u64) -> (Fund, Arc<ManualClock>) {
    let config = FundConfig {
        name: "Governed".into(),
        base_asset: "USDC".into(),
        router: "router".into(),
        assets: vec![
            AssetConfig::new("BTC", "v-btc", 50),
            AssetConfig::new("ETH", "v-eth", 50),
        ],
        governor: GovernorConfig::new("Governed Governor", period_secs),
    };
    let clock = Arc::new(ManualClock::at_secs(1_700_000_000));
    let fund = GovernedFund::deploy(&config, "deployer", FixedRateExecutor::new(), clock.clone())
        .unwrap();

    fund.deposit("alice", 600).unwrap();
    fund.deposit("bob", 300).unwrap();
    fund.deposit("carol", 100).unwrap();
    fund.install_governance("deployer").unwrap();
    (fund, clock)
}

fn reweight() -> AdminAction {
    AdminAction::SetWeights {
        weights: vec![WeightUpdate::new("BTC", 70), WeightUpdate::new("ETH", 30)],
    }
}

// ---------------------------------------------------------------------------
// Lifecycle Tests
// ---------------------------------------------------------------------------

#[test]
fn proposal_passes_and_reweights_fund() {
    let (fund, clock) = governed_fund(3600);
    let id = fund.propose("alice", reweight(), "tilt to BTC").unwrap();
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Active);

    fund.vote(&id, "alice", Support::For).unwrap();
    fund.vote(&id, "bob", Support::Against).unwrap();

    clock.advance_secs(3600);
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Succeeded);

    fund.execute(&id).unwrap();
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Executed);

    let weights: Vec<u32> = fund.overview().assets.iter().map(|a| a.weight).collect();
    assert_eq!(weights, vec![70, 30]);
}

#[test]
fn vote_after_deadline_is_closed() {
    let (fund, clock) = governed_fund(3600);
    let id = fund.propose("alice", reweight(), "late vote").unwrap();

    clock.advance_secs(3601);
    let err = fund.vote(&id, "bob", Support::For).unwrap_err();
    assert!(matches!(err, GovernanceError::VotingClosed { .. }));
}

#[test]
fn vote_exactly_at_deadline_is_closed() {
    let (fund, clock) = governed_fund(3600);
    let id = fund.propose("alice", reweight(), "boundary").unwrap();

    clock.advance_secs(3599);
    fund.vote(&id, "bob", Support::For).unwrap();
    clock.advance_secs(1);
    assert!(matches!(
        fund.vote(&id, "carol", Support::For),
        Err(GovernanceError::VotingClosed { .. })
    ));
}

#[test]
fn majority_below_quorum_is_defeated() {
    let (fund, clock) = governed_fund(3600);
    let id = fund.propose("carol", reweight(), "low turnout").unwrap();

    // Quorum is 20% of 1000 = 200; carol alone brings 100.
    fund.vote(&id, "carol", Support::For).unwrap();
    clock.advance_secs(3600);

    let tally = fund.tally(&id).unwrap();
    assert!(tally.votes_for > tally.votes_against);
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Defeated);
    assert!(matches!(
        fund.execute(&id),
        Err(GovernanceError::NotExecutable {
            status: ProposalStatus::Defeated,
            ..
        })
    ));
}

#[test]
fn quorum_met_but_outvoted_is_defeated() {
    let (fund, clock) = governed_fund(3600);
    let id = fund.propose("bob", reweight(), "contested").unwrap();
    fund.vote(&id, "bob", Support::For).unwrap();
    fund.vote(&id, "alice", Support::Against).unwrap();
    clock.advance_secs(3600);
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Defeated);
}

#[test]
fn active_proposal_cannot_execute() {
    let (fund, _clock) = governed_fund(3600);
    let id = fund.propose("alice", reweight(), "too early").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();
    assert!(matches!(
        fund.execute(&id),
        Err(GovernanceError::NotExecutable {
            status: ProposalStatus::Active,
            ..
        })
    ));
}

#[test]
fn succeeded_proposal_expires_after_grace() {
    let (fund, clock) = governed_fund(3600);
    let grace = fund.inspect(|_, gov| gov.config().execution_grace_secs) as i64;
    let id = fund.propose("alice", reweight(), "forgotten").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();

    clock.advance_secs(3600 + grace);
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Succeeded);
    clock.advance_secs(1);
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Expired);
    assert!(matches!(
        fund.execute(&id),
        Err(GovernanceError::NotExecutable {
            status: ProposalStatus::Expired,
            ..
        })
    ));
}

#[test]
fn executed_proposal_cannot_run_twice() {
    let (fund, clock) = governed_fund(600);
    let id = fund.propose("alice", reweight(), "once").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();
    clock.advance_secs(600);
    fund.execute(&id).unwrap();
    assert!(matches!(
        fund.execute(&id),
        Err(GovernanceError::NotExecutable {
            status: ProposalStatus::Executed,
            ..
        })
    ));
}

#[test]
fn rejected_action_leaves_proposal_succeeded_and_fund_unchanged() {
    let (fund, clock) = governed_fund(3600);
    let bad = AdminAction::SetWeights {
        weights: vec![WeightUpdate::new("BTC", 90)],
    };
    let id = fund.propose("alice", bad, "breaks the sum").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();
    clock.advance_secs(3600);

    let before = fund.inspect(|state, _| state.clone());
    let err = fund.execute(&id).unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Vault(VaultError::InvalidWeight { total: 140, .. })
    ));
    assert_eq!(fund.proposal_state(&id).unwrap(), ProposalStatus::Succeeded);
    fund.inspect(|state, _| assert_eq!(state, &before));
}

#[test]
fn batch_proposal_adds_and_activates_asset() {
    let (fund, clock) = governed_fund(3600);
    let action = AdminAction::Batch {
        actions: vec![
            AdminAction::AddAsset {
                token: "LINK".into(),
                venue: "v-link".into(),
                weight: 0,
            },
            AdminAction::SetWeights {
                weights: vec![
                    WeightUpdate::new("BTC", 40),
                    WeightUpdate::new("ETH", 40),
                    WeightUpdate::new("LINK", 20),
                ],
            },
        ],
    };
    let id = fund.propose("alice", action, "add LINK").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();
    clock.advance_secs(3600);
    fund.execute(&id).unwrap();

    let overview = fund.overview();
    assert_eq!(overview.assets.len(), 3);
    assert_eq!(overview.assets[2].token, "LINK");
    assert_eq!(overview.assets[2].weight, 20);

    // The next deposit now buys LINK too.
    let receipt = fund.deposit("dave", 1_000).unwrap();
    assert_eq!(receipt.fills.len(), 3);
}

#[test]
fn governance_grants_recovery_role() {
    let (fund, clock) = governed_fund(3600);
    let action = AdminAction::GrantRole {
        role: Role::Recovery,
        account: "rescuer".into(),
    };
    let id = fund.propose("alice", action, "appoint rescuer").unwrap();
    fund.vote(&id, "alice", Support::For).unwrap();
    clock.advance_secs(3600);
    fund.execute(&id).unwrap();

    assert!(fund.has_role(Role::Recovery, "rescuer"));
    fund.credit_untracked("AIRDROP", 42).unwrap();
    let transfer = fund.withdraw_token("rescuer", "AIRDROP", 42, "treasury").unwrap();
    assert_eq!(transfer.recipient, "treasury");
}

#[test]
fn proposals_listing_reports_status() {
    let (fund, clock) = governed_fund(3600);
    let first = fund.propose("alice", reweight(), "a").unwrap();
    let second = fund.propose("bob", reweight(), "b").unwrap();
    fund.cancel(&second, "bob").unwrap();
    clock.advance_secs(3600);

    let listed = fund.proposals();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].0.id, first);
    assert_eq!(listed[0].1, ProposalStatus::Defeated);
    assert_eq!(listed[1].1, ProposalStatus::Canceled);
}

#[test]
fn random_electorate_tally_matches_snapshot() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x60_7E);
    let (fund, clock) = governed_fund(3600);
    let voters: Vec<String> = (0..20).map(|i| format!("voter-{i}")).collect();
    for voter in &voters {
        fund.deposit(voter, rng.gen_range(10..10_000u128)).unwrap();
    }

    let id = fund.propose("alice", reweight(), "random electorate").unwrap();
    // Shares bought after the proposal carry no voting weight.
    fund.deposit("latecomer", 1_000_000).unwrap();
    assert_eq!(
        fund.vote(&id, "latecomer", Support::For).unwrap_err(),
        GovernanceError::InsufficientWeight {
            account: "latecomer".into(),
            weight: 0,
            required: 1,
        }
    );

    let (mut expected_for, mut expected_against) = (0u128, 0u128);
    for voter in &voters {
        if rng.gen_bool(0.3) {
            continue;
        }
        let support = if rng.gen_bool(0.5) { Support::For } else { Support::Against };
        let weight = fund.vote(&id, voter, support).unwrap();
        match support {
            Support::For => expected_for += weight,
            Support::Against => expected_against += weight,
        }
    }

    let tally = fund.tally(&id).unwrap();
    assert_eq!(tally.votes_for, expected_for);
    assert_eq!(tally.votes_against, expected_against);

    clock.advance_secs(3600);
    let expected = if tally.succeeded() {
        ProposalStatus::Succeeded
    } else {
        ProposalStatus::Defeated
    };
    assert_eq!(fund.proposal_state(&id).unwrap(), expected);
}
