//! # CLI Interface
//!
//! Defines the command-line argument structure for `basket-node` using
//! `clap` derive. Every subcommand operates on the fund store in
//! `--data-dir`; results are printed to stdout as JSON.

use basket_contracts::Support;
use basket_protocol::vault::{Amount, Role};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Basket vault operator.
///
/// Deploys weighted basket funds, runs deposits and withdrawals against
/// them, and drives their governors.
#[derive(Parser, Debug)]
#[command(
    name = "basket-node",
    about = "Basket vault operator",
    version,
    propagate_version = true
)]
pub struct BasketNodeCli {
    /// Directory holding the fund store. Created on first use.
    #[arg(
        long,
        short = 'd',
        env = "BASKET_DATA_DIR",
        default_value = "./basket-data",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Log output format.
    #[arg(
        long,
        env = "BASKET_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty,
        global = true
    )]
    pub log_format: LogFormat,

    /// Level for the basket crates when `RUST_LOG` is not set.
    #[arg(long, env = "BASKET_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the basket node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a new fund from a preset or a JSON config file.
    Deploy(DeployArgs),
    /// Print the fund overview.
    Overview(FundArgs),
    /// Print a holder's balance, ownership and claims.
    UserInfo(UserInfoArgs),
    /// Deposit base asset, simulating fills at a fixed rate.
    Deposit(DepositArgs),
    /// Burn shares for a pro-rata slice of every asset.
    Withdraw(WithdrawArgs),
    /// Record a stray inbound token transfer.
    CreditUntracked(CreditArgs),
    /// Privileged raw token transfer out of the fund.
    Recover(RecoverArgs),
    /// Apply an admin action directly (deployer phase only).
    Admin(AdminArgs),
    /// Hand the admin role to the fund's governor.
    SetGovernor(CallerArgs),
    /// Grant a role.
    GrantRole(GrantRoleArgs),
    /// Check whether an account holds a role.
    HasRole(HasRoleArgs),
    /// Open a governance proposal.
    Propose(ProposeArgs),
    /// Vote on a proposal.
    Vote(VoteArgs),
    /// Execute a succeeded proposal.
    Execute(ProposalArgs),
    /// Cancel your own open proposal.
    Cancel(CancelArgs),
    /// List proposals with their current status.
    Proposals(FundArgs),
    /// List built-in fund presets.
    Presets,
}

#[derive(Args, Debug, Clone)]
pub struct FundArgs {
    /// Fund name. Defaults to the most recently deployed fund.
    #[arg(long, env = "BASKET_FUND")]
    pub fund: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Built-in preset: polygon4, polygon5 or web3.
    #[arg(long, conflicts_with = "config", required_unless_present = "config")]
    pub preset: Option<String>,

    /// Path to a JSON fund config.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Initial admin of the fund.
    #[arg(long)]
    pub deployer: String,
}

#[derive(Args, Debug)]
pub struct UserInfoArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub holder: String,
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    /// Depositor address.
    #[arg(long)]
    pub from: String,

    /// Base asset amount in smallest units.
    #[arg(long)]
    pub amount: Amount,

    /// Simulated slippage applied to every swap.
    #[arg(long, default_value_t = 0)]
    pub slippage_bps: u128,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub from: String,

    /// Shares to burn.
    #[arg(long)]
    pub shares: Amount,
}

#[derive(Args, Debug)]
pub struct CreditArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub token: String,

    #[arg(long)]
    pub amount: Amount,
}

#[derive(Args, Debug)]
pub struct RecoverArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    /// Account holding DEFAULT_ADMIN or RECOVERY.
    #[arg(long)]
    pub caller: String,

    #[arg(long)]
    pub token: String,

    #[arg(long)]
    pub amount: Amount,

    /// Recipient of the recovered tokens.
    #[arg(long)]
    pub to: String,
}

#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub caller: String,

    /// Admin action as JSON, e.g. '{"set_weights":{"weights":[...]}}'.
    #[arg(long)]
    pub action: String,
}

#[derive(Args, Debug)]
pub struct CallerArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub caller: String,
}

#[derive(Args, Debug)]
pub struct GrantRoleArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub caller: String,

    /// default-admin or recovery.
    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub account: String,
}

#[derive(Args, Debug)]
pub struct HasRoleArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub account: String,
}

#[derive(Args, Debug)]
pub struct ProposeArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub proposer: String,

    /// Admin action as JSON.
    #[arg(long)]
    pub action: String,

    #[arg(long)]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct VoteArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub voter: String,

    /// for or against.
    #[arg(long)]
    pub support: Support,
}

#[derive(Args, Debug)]
pub struct ProposalArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    #[command(flatten)]
    pub fund: FundArgs,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub caller: String,
}
