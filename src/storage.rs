/// Durable storage for markets and stake records
///
/// One record per market and one per (market, user). Financial entitlement
/// must survive restarts, so every committed mutation lands here before it
/// becomes visible in memory.

use crate::error::{MarketError, MarketResult};
use crate::models::{Market, MarketId, StakeRecord};
use std::path::Path;

const MARKET_PREFIX: &[u8] = b"m/";
const STAKE_PREFIX: &[u8] = b"s/";

/// Everything needed to rebuild the ledger at startup
#[derive(Debug, Default)]
pub struct Snapshot {
    pub markets: Vec<Market>,
    pub stakes: Vec<StakeRecord>,
}

pub trait LedgerStore: Send + Sync {
    fn load(&self) -> MarketResult<Snapshot>;

    /// Write a market and optionally one of its stake records atomically
    fn persist(&self, market: &Market, stake: Option<&StakeRecord>) -> MarketResult<()>;

    fn flush(&self) -> MarketResult<()>;
}

// ============================================================================
// SLED
// ============================================================================

pub struct SledStore {
    tree: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> MarketResult<Self> {
        let tree = sled::open(path)?;
        Ok(Self { tree })
    }

    /// Throwaway database, removed when dropped
    pub fn temporary() -> MarketResult<Self> {
        let tree = sled::Config::new().temporary(true).open()?;
        Ok(Self { tree })
    }

    fn market_key(id: MarketId) -> Vec<u8> {
        let mut key = MARKET_PREFIX.to_vec();
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    fn stake_key(market_id: MarketId, user_id: &str) -> Vec<u8> {
        let mut key = STAKE_PREFIX.to_vec();
        key.extend_from_slice(&market_id.to_be_bytes());
        key.push(b'/');
        key.extend_from_slice(user_id.as_bytes());
        key
    }
}

impl LedgerStore for SledStore {
    fn load(&self) -> MarketResult<Snapshot> {
        let mut snapshot = Snapshot::default();

        for item in self.tree.scan_prefix(MARKET_PREFIX) {
            let (_, value) = item?;
            snapshot.markets.push(serde_json::from_slice(&value)?);
        }
        for item in self.tree.scan_prefix(STAKE_PREFIX) {
            let (_, value) = item?;
            snapshot.stakes.push(serde_json::from_slice(&value)?);
        }

        Ok(snapshot)
    }

    fn persist(&self, market: &Market, stake: Option<&StakeRecord>) -> MarketResult<()> {
        let mut batch = sled::Batch::default();
        batch.insert(Self::market_key(market.id), serde_json::to_vec(market)?);
        if let Some(record) = stake {
            batch.insert(
                Self::stake_key(record.market_id, &record.user_id),
                serde_json::to_vec(record)?,
            );
        }
        self.tree.apply_batch(batch)?;
        Ok(())
    }

    fn flush(&self) -> MarketResult<()> {
        self.tree.flush()?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Keeps nothing; the in-memory books are the only copy
#[derive(Debug, Default)]
pub struct MemoryStore;

impl LedgerStore for MemoryStore {
    fn load(&self) -> MarketResult<Snapshot> {
        Ok(Snapshot::default())
    }

    fn persist(&self, _market: &Market, _stake: Option<&StakeRecord>) -> MarketResult<()> {
        Ok(())
    }

    fn flush(&self) -> MarketResult<()> {
        Ok(())
    }
}

/// Open the store named by the configured data directory
pub fn open_store(data_dir: Option<&Path>) -> MarketResult<Box<dyn LedgerStore>> {
    match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| MarketError::StorageError(format!("Failed to create {:?}: {}", dir, e)))?;
            Ok(Box::new(SledStore::open(dir)?))
        }
        None => Ok(Box::new(MemoryStore)),
    }
}
