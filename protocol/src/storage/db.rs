//! # FundStore — Persistent Storage Engine
//!
//! Fund and governor state on disk, built on sled's embedded key-value
//! store. The node reloads a fund from here on every invocation and writes
//! it back after each mutation.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                | Value                  |
//! |-------------|--------------------|------------------------|
//! | `funds`     | fund name (UTF-8)  | `bincode(FundState)`   |
//! | `governors` | fund name (UTF-8)  | `bincode(governor)`    |
//! | `metadata`  | key (UTF-8)        | value (bytes)          |
//!
//! The governor type lives in a downstream crate, so its accessors are
//! generic over any serde type.
//!
//! ## Atomicity
//!
//! [`FundStore::commit`] writes a fund and its governor in one sled
//! transaction across both trees. An executed proposal changes both, and
//! a crash between the two writes must not leave them disagreeing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;

use crate::vault::FundState;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

/// Fund the node operates on when none is named explicitly.
const META_DEFAULT_FUND: &[u8] = b"default_fund";

// ---------------------------------------------------------------------------
// FundStore
// ---------------------------------------------------------------------------

/// Persistent storage for funds and their governors.
///
/// Cloning is cheap; sled handles are reference counted and safe to share
/// across threads.
#[derive(Debug, Clone)]
pub struct FundStore {
    db: Db,
    funds: Tree,
    governors: Tree,
    metadata: Tree,
}

impl FundStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A store that is discarded when dropped. Used by tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let funds = db.open_tree("funds")?;
        let governors = db.open_tree("governors")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            funds,
            governors,
            metadata,
        })
    }

    // -- Fund operations ----------------------------------------------------

    pub fn put_fund(&self, fund: &FundState) -> StoreResult<()> {
        self.funds.insert(fund.name().as_bytes(), encode(fund)?)?;
        Ok(())
    }

    /// Returns `None` if no fund with this name was ever stored.
    pub fn get_fund(&self, name: &str) -> StoreResult<Option<FundState>> {
        match self.funds.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Like [`get_fund`](Self::get_fund), but a missing fund is an error.
    pub fn load_fund(&self, name: &str) -> StoreResult<FundState> {
        self.get_fund(name)?
            .ok_or_else(|| StoreError::NotFound(format!("fund '{}'", name)))
    }

    /// Stored fund names in key order.
    pub fn fund_names(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.funds.iter() {
            let (key, _) = entry?;
            names.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(names)
    }

    // -- Governor operations ------------------------------------------------

    pub fn put_governor<G: Serialize>(&self, fund: &str, governor: &G) -> StoreResult<()> {
        self.governors.insert(fund.as_bytes(), encode(governor)?)?;
        Ok(())
    }

    pub fn get_governor<G: DeserializeOwned>(&self, fund: &str) -> StoreResult<Option<G>> {
        match self.governors.get(fund.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // -- Combined -----------------------------------------------------------

    /// Writes a fund and its governor atomically, then flushes.
    pub fn commit<G: Serialize>(&self, fund: &FundState, governor: &G) -> StoreResult<()> {
        let key = fund.name().as_bytes();
        let fund_bytes = encode(fund)?;
        let governor_bytes = encode(governor)?;

        (&self.funds, &self.governors)
            .transaction(|(funds, governors)| {
                funds.insert(key, fund_bytes.as_slice())?;
                governors.insert(key, governor_bytes.as_slice())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Storage(e) => StoreError::Sled(e),
                TransactionError::Abort(()) => {
                    StoreError::Serialization("commit aborted".to_string())
                }
            })?;

        self.db.flush()?;
        tracing::debug!(fund = %fund.name(), sequence = fund.sequence(), "fund committed");
        Ok(())
    }

    // -- Metadata operations ------------------------------------------------

    pub fn set_default_fund(&self, name: &str) -> StoreResult<()> {
        self.metadata.insert(META_DEFAULT_FUND, name.as_bytes())?;
        Ok(())
    }

    pub fn default_fund(&self) -> StoreResult<Option<String>> {
        Ok(self
            .metadata
            .get(META_DEFAULT_FUND)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    // -- Utility operations -------------------------------------------------

    pub fn fund_count(&self) -> usize {
        self.funds.len()
    }

    /// Blocks until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
