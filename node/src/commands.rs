//! # Command Handlers
//!
//! Each invocation loads one fund and its governor from the store, runs a
//! single operation, and commits both back if the operation succeeded.
//! A failed operation never reaches the store.

use anyhow::{anyhow, bail, Context, Result};
use basket_contracts::{GovernedFund, Governor};
use basket_protocol::clock::SystemClock;
use basket_protocol::config::{FundConfig, PRESET_NAMES};
use basket_protocol::storage::FundStore;
use basket_protocol::vault::{AdminAction, FixedRateExecutor, VaultEngine};
use serde_json::{json, Value};

use crate::cli::{Commands, DeployArgs, FundArgs};

/// The node drives funds with simulated fills and the wall clock.
pub type NodeFund = GovernedFund<FixedRateExecutor, SystemClock>;

/// Runs `command` against `store` and returns its JSON result.
pub fn run(store: &FundStore, command: Commands) -> Result<Value> {
    match command {
        Commands::Deploy(args) => deploy(store, &args),
        Commands::Overview(args) => {
            let fund = open(store, &args, FixedRateExecutor::new())?;
            Ok(serde_json::to_value(fund.overview())?)
        }
        Commands::UserInfo(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            Ok(serde_json::to_value(fund.user_info(&args.holder)?)?)
        }
        Commands::Deposit(args) => {
            let executor = FixedRateExecutor::with_slippage_bps(args.slippage_bps);
            let fund = open(store, &args.fund, executor)?;
            let receipt = fund.deposit(&args.from, args.amount)?;
            save(store, fund)?;
            Ok(serde_json::to_value(receipt)?)
        }
        Commands::Withdraw(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let receipt = fund.withdraw(&args.from, args.shares)?;
            save(store, fund)?;
            Ok(serde_json::to_value(receipt)?)
        }
        Commands::CreditUntracked(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            fund.credit_untracked(&args.token, args.amount)?;
            save(store, fund)?;
            Ok(json!({ "token": args.token, "credited": args.amount.to_string() }))
        }
        Commands::Recover(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let transfer = fund.withdraw_token(&args.caller, &args.token, args.amount, &args.to)?;
            save(store, fund)?;
            Ok(serde_json::to_value(transfer)?)
        }
        Commands::Admin(args) => {
            let action = parse_action(&args.action)?;
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let transfers = serde_json::to_value(fund.apply_admin(&args.caller, &action)?)?;
            save(store, fund)?;
            Ok(json!({ "action": action.kind(), "transfers": transfers }))
        }
        Commands::SetGovernor(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            fund.install_governance(&args.caller)?;
            let admin = fund.overview().admin;
            save(store, fund)?;
            Ok(serde_json::to_value(admin)?)
        }
        Commands::GrantRole(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            fund.grant_role(&args.caller, args.role, &args.account)?;
            save(store, fund)?;
            Ok(json!({ "role": args.role.to_string(), "account": args.account, "granted": true }))
        }
        Commands::HasRole(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let has = fund.has_role(args.role, &args.account);
            Ok(json!({ "role": args.role.to_string(), "account": args.account, "has_role": has }))
        }
        Commands::Propose(args) => {
            let action = parse_action(&args.action)?;
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let id = fund.propose(&args.proposer, action, &args.description)?;
            let status = fund.proposal_state(&id)?;
            save(store, fund)?;
            Ok(json!({ "id": id, "status": status.to_string() }))
        }
        Commands::Vote(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let weight = fund.vote(&args.id, &args.voter, args.support)?;
            let tally = serde_json::to_value(fund.tally(&args.id)?)?;
            save(store, fund)?;
            Ok(json!({ "id": args.id, "weight": weight.to_string(), "tally": tally }))
        }
        Commands::Execute(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            let transfers = serde_json::to_value(fund.execute(&args.id)?)?;
            save(store, fund)?;
            Ok(json!({ "id": args.id, "status": "Executed", "transfers": transfers }))
        }
        Commands::Cancel(args) => {
            let fund = open(store, &args.fund, FixedRateExecutor::new())?;
            fund.cancel(&args.id, &args.caller)?;
            save(store, fund)?;
            Ok(json!({ "id": args.id, "status": "Canceled" }))
        }
        Commands::Proposals(args) => {
            let fund = open(store, &args, FixedRateExecutor::new())?;
            let mut listed = Vec::new();
            for (p, status) in fund.proposals() {
                listed.push(json!({
                    "id": p.id,
                    "proposer": p.proposer,
                    "action": serde_json::to_value(&p.action)?,
                    "description": p.description,
                    "deadline": p.deadline.to_rfc3339(),
                    "status": status.to_string(),
                    "tally": serde_json::to_value(p.tally)?,
                }));
            }
            Ok(Value::Array(listed))
        }
        Commands::Presets => {
            let mut presets = Vec::new();
            for name in PRESET_NAMES {
                let config = FundConfig::preset(name)?;
                presets.push(json!({ "preset": name, "config": serde_json::to_value(config)? }));
            }
            Ok(Value::Array(presets))
        }
    }
}

fn deploy(store: &FundStore, args: &DeployArgs) -> Result<Value> {
    let config = match (&args.preset, &args.config) {
        (Some(preset), _) => FundConfig::preset(preset)?,
        (None, Some(path)) => FundConfig::from_file(path)
            .with_context(|| format!("failed to load fund config {}", path.display()))?,
        (None, None) => bail!("pass --preset or --config"),
    };
    if store.get_fund(&config.name)?.is_some() {
        bail!("fund '{}' already exists", config.name);
    }

    let fund: NodeFund =
        GovernedFund::deploy(&config, &args.deployer, FixedRateExecutor::new(), SystemClock)?;
    let overview = fund.overview();
    let governor = fund.governor_address();
    save(store, fund)?;
    store.set_default_fund(&config.name)?;

    tracing::info!(fund = %config.name, deployer = %args.deployer, %governor, "fund stored");
    Ok(json!({ "fund": serde_json::to_value(overview)?, "governor": governor }))
}

fn fund_name(store: &FundStore, args: &FundArgs) -> Result<String> {
    match &args.fund {
        Some(name) => Ok(name.clone()),
        None => store
            .default_fund()?
            .ok_or_else(|| anyhow!("no fund selected; pass --fund or deploy one first")),
    }
}

fn open(store: &FundStore, args: &FundArgs, executor: FixedRateExecutor) -> Result<NodeFund> {
    let name = fund_name(store, args)?;
    let state = store
        .load_fund(&name)
        .with_context(|| format!("failed to load fund '{}'", name))?;
    let governor: Governor = store
        .get_governor(&name)?
        .ok_or_else(|| anyhow!("fund '{}' has no governor record", name))?;
    Ok(GovernedFund::from_parts(
        VaultEngine::from_state(state, executor),
        governor,
        SystemClock,
    ))
}

fn save(store: &FundStore, fund: NodeFund) -> Result<()> {
    let (engine, governor, _) = fund.into_parts();
    store
        .commit(engine.state(), &governor)
        .context("failed to commit fund")
}

fn parse_action(raw: &str) -> Result<AdminAction> {
    serde_json::from_str(raw).context("invalid --action JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{
        CallerArgs, DepositArgs, ProposeArgs, RecoverArgs, UserInfoArgs, VoteArgs, WithdrawArgs,
    };
    use basket_contracts::Support;

    fn no_fund() -> FundArgs {
        FundArgs { fund: None }
    }

    fn deploy_web3(store: &FundStore) {
        run(
            store,
            Commands::Deploy(DeployArgs {
                preset: Some("web3".into()),
                config: None,
                deployer: "deployer".into(),
            }),
        )
        .unwrap();
    }

    fn deposit(store: &FundStore, from: &str, amount: u128) -> Value {
        run(
            store,
            Commands::Deposit(DepositArgs {
                fund: no_fund(),
                from: from.into(),
                amount,
                slippage_bps: 0,
            }),
        )
        .unwrap()
    }

    #[test]
    fn deploy_sets_default_and_rejects_redeploy() {
        let store = FundStore::open_temporary().unwrap();
        deploy_web3(&store);
        assert_eq!(store.default_fund().unwrap().as_deref(), Some("Inzen: Web3"));

        let again = run(
            &store,
            Commands::Deploy(DeployArgs {
                preset: Some("web3".into()),
                config: None,
                deployer: "someone".into(),
            }),
        );
        assert!(again.is_err());
    }

    #[test]
    fn deposit_and_withdraw_persist_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FundStore::open(dir.path()).unwrap();
            deploy_web3(&store);
            let receipt = deposit(&store, "alice", 1_000_000);
            assert_eq!(receipt["shares_minted"], json!(1_000_000u64));
        }

        let store = FundStore::open(dir.path()).unwrap();
        run(
            &store,
            Commands::Withdraw(WithdrawArgs {
                fund: no_fund(),
                from: "alice".into(),
                shares: 400_000,
            }),
        )
        .unwrap();
        let info = run(
            &store,
            Commands::UserInfo(UserInfoArgs {
                fund: no_fund(),
                holder: "alice".into(),
            }),
        )
        .unwrap();
        assert_eq!(info["shares"], json!(600_000u64));
        assert_eq!(info["ownership_bps"], json!(10_000u64));
    }

    #[test]
    fn failed_operation_is_not_committed() {
        let store = FundStore::open_temporary().unwrap();
        deploy_web3(&store);
        deposit(&store, "alice", 1_000);

        let before = store.load_fund("Inzen: Web3").unwrap();
        let result = run(
            &store,
            Commands::Recover(RecoverArgs {
                fund: no_fund(),
                caller: "mallory".into(),
                token: "AIRDROP".into(),
                amount: 1,
                to: "mallory".into(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(store.load_fund("Inzen: Web3").unwrap(), before);
    }

    #[test]
    fn governance_flow_through_commands() {
        let store = FundStore::open_temporary().unwrap();
        deploy_web3(&store);
        deposit(&store, "alice", 1_000);
        run(
            &store,
            Commands::SetGovernor(CallerArgs {
                fund: no_fund(),
                caller: "deployer".into(),
            }),
        )
        .unwrap();

        let proposed = run(
            &store,
            Commands::Propose(ProposeArgs {
                fund: no_fund(),
                proposer: "alice".into(),
                action: r#"{"grant_role":{"role":"Recovery","account":"rescuer"}}"#.into(),
                description: "appoint rescuer".into(),
            }),
        )
        .unwrap();
        assert_eq!(proposed["status"], json!("Active"));
        let id = proposed["id"].as_str().unwrap().to_string();

        let voted = run(
            &store,
            Commands::Vote(VoteArgs {
                fund: no_fund(),
                id: id.clone(),
                voter: "alice".into(),
                support: Support::For,
            }),
        )
        .unwrap();
        assert_eq!(voted["weight"], json!("1000"));

        let listed = run(&store, Commands::Proposals(no_fund())).unwrap();
        assert_eq!(listed[0]["id"], json!(id));
    }

    #[test]
    fn bad_action_json_rejected() {
        assert!(parse_action("{\"explode\":{}}").is_err());
    }

    #[test]
    fn presets_listed() {
        let store = FundStore::open_temporary().unwrap();
        let presets = run(&store, Commands::Presets).unwrap();
        assert_eq!(presets.as_array().unwrap().len(), PRESET_NAMES.len());
    }
}
