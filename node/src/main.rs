// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Basket Node
//!
//! Entry point for the `basket-node` binary. Parses CLI arguments,
//! initializes logging, opens the fund store, runs one command, and prints
//! its result as JSON on stdout.
//!
//! ```text
//! basket-node deploy --preset polygon4 --deployer 0xabc
//! basket-node deposit --from 0xdef --amount 1000000 --slippage-bps 50
//! basket-node set-governor --caller 0xabc
//! basket-node propose --proposer 0xdef --action '{"set_weights":...}' --description "..."
//! ```

mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use basket_protocol::storage::FundStore;

use cli::BasketNodeCli;

fn main() -> Result<()> {
    let cli = BasketNodeCli::parse();

    logging::init_logging(cli.log_level, cli.log_format);

    let data_dir = &cli.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
    let store = FundStore::open(data_dir)
        .with_context(|| format!("failed to open fund store at {}", data_dir.display()))?;
    tracing::debug!(path = %data_dir.display(), funds = store.fund_count(), "store opened");

    let output = commands::run(&store, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
