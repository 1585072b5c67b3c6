//! # Storage Module
//!
//! Persistence for funds and their governors. JSON is for the operator
//! and for config files; bincode is what goes on disk.

pub mod db;

pub use db::{FundStore, StoreError, StoreResult};
