// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Basket Protocol — Core Library
//!
//! A multi-asset index fund. Depositors hand in one base currency; the fund
//! spreads it across a weighted basket of tokens through an external swap
//! aggregator and mints shares proportional to the value that actually
//! arrived. Withdrawals pay out a pro-rata slice of every holding.
//!
//! ## Architecture
//!
//! - **vault** — Asset registry, share ledger, swap boundary, access
//!   control, and the engine that ties them together.
//! - **config** — Basket and governance constants, fund configs, presets.
//! - **clock** — Injectable time source for deadline checks.
//! - **storage** — sled-backed persistence for funds and governors.
//!
//! Governance lives one crate up, in `basket-contracts`. It drives the
//! engine exclusively through [`vault::AdminAction`] values.
//!
//! ## Ground Rules
//!
//! 1. Integer math only. Every multiply is checked, every divide truncates.
//! 2. An operation either commits entirely or leaves the fund untouched.
//! 3. Realized swap output, not the quote, prices shares.

pub mod clock;
pub mod config;
pub mod storage;
pub mod vault;
