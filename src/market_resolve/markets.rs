use crate::error::{MarketError, MarketResult};
use crate::models::{Market, MarketId, MarketOutcome, MarketState, MarketSummary, StakeRecord, UserId};
use crate::storage::LedgerStore;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

// Market registry
// Owns every market and its lifecycle state. Each market lives in its own
// book behind its own lock, so work on different markets never contends.

/// A market together with the stake records placed on it
#[derive(Debug, Clone)]
pub struct MarketBook {
    pub market: Market,
    pub stakes: HashMap<UserId, StakeRecord>,
}

/// Parameters for a new market
#[derive(Debug, Clone)]
pub struct NewMarket {
    pub question: String,
    pub description: String,
    pub duration_secs: i64,
    pub min_stake: Decimal,
    pub creator: UserId,
}

struct Books {
    by_id: HashMap<MarketId, Arc<Mutex<MarketBook>>>,
    next_id: MarketId,
}

pub struct MarketRegistry {
    books: RwLock<Books>,
    store: Arc<dyn LedgerStore>,
}

pub(crate) fn poisoned<T>(_: PoisonError<T>) -> MarketError {
    MarketError::StorageError("ledger lock poisoned".to_string())
}

/// Lock one market's book
pub(crate) fn lock_book(book: &Mutex<MarketBook>) -> MarketResult<MutexGuard<'_, MarketBook>> {
    book.lock().map_err(poisoned)
}

impl MarketRegistry {
    /// Empty registry writing through to `store`
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            books: RwLock::new(Books { by_id: HashMap::new(), next_id: 1 }),
            store,
        }
    }

    /// Rebuild the registry from everything the store holds
    pub fn restore(store: Arc<dyn LedgerStore>) -> MarketResult<Self> {
        let snapshot = store.load()?;

        let mut by_id: HashMap<MarketId, MarketBook> = snapshot
            .markets
            .into_iter()
            .map(|m| (m.id, MarketBook { market: m, stakes: HashMap::new() }))
            .collect();

        let stake_count = snapshot.stakes.len();
        for record in snapshot.stakes {
            let book = by_id.get_mut(&record.market_id).ok_or_else(|| {
                MarketError::StorageError(format!(
                    "Stake record for unknown market {}",
                    record.market_id
                ))
            })?;
            book.stakes.insert(record.user_id.clone(), record);
        }

        let next_id = by_id.keys().max().map(|id| id + 1).unwrap_or(1);
        info!("📒 Restored {} markets and {} stake records", by_id.len(), stake_count);

        Ok(Self {
            books: RwLock::new(Books {
                by_id: by_id
                    .into_iter()
                    .map(|(id, book)| (id, Arc::new(Mutex::new(book))))
                    .collect(),
                next_id,
            }),
            store,
        })
    }

    /// Create a new open market and return its id
    pub fn create_market(&self, request: NewMarket, now: u64) -> MarketResult<MarketId> {
        let end_time = u64::try_from(request.duration_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(MarketError::InvalidDuration)?;
        if request.min_stake <= Decimal::ZERO {
            return Err(MarketError::InvalidStake);
        }

        let mut books = self.books.write().map_err(poisoned)?;
        let id = books.next_id;

        let market = Market {
            id,
            question: request.question,
            description: request.description,
            creator: request.creator,
            created_at: now,
            end_time,
            state: MarketState::Open,
            outcome: MarketOutcome::Unset,
            total_yes_stake: Decimal::ZERO,
            total_no_stake: Decimal::ZERO,
            min_stake: request.min_stake,
            resolved_at: None,
            void_reason: None,
        };

        self.store.persist(&market, None)?;

        info!("📊 Market {} created by {}: {}", id, market.creator, market.question);
        books.by_id.insert(
            id,
            Arc::new(Mutex::new(MarketBook { market, stakes: HashMap::new() })),
        );
        books.next_id = id + 1;

        Ok(id)
    }

    /// Close staking and await an outcome: Open -> Resolving
    pub fn begin_resolution(&self, market_id: MarketId, now: u64) -> MarketResult<()> {
        let book = self.book(market_id)?;
        let mut book = lock_book(&book)?;

        if book.market.state != MarketState::Open {
            return Err(MarketError::AlreadyResolving(market_id));
        }
        if now < book.market.end_time {
            return Err(MarketError::NotYetEnded(market_id));
        }

        let mut market = book.market.clone();
        market.state = MarketState::Resolving;
        self.commit(&mut book, market, None)?;

        info!("⏳ Market {} awaiting resolution", market_id);
        Ok(())
    }

    pub fn get_market(&self, market_id: MarketId) -> MarketResult<Market> {
        let book = self.book(market_id)?;
        let book = lock_book(&book)?;
        Ok(book.market.clone())
    }

    /// Ids of every open market, ascending
    pub fn list_active_markets(&self) -> MarketResult<Vec<MarketId>> {
        let mut active = Vec::new();
        for (id, book) in self.all_books()? {
            if lock_book(&book)?.market.state == MarketState::Open {
                active.push(id);
            }
        }
        active.sort_unstable();
        debug!("{} active markets", active.len());
        Ok(active)
    }

    /// Market with its raw pool figures and participant count
    pub fn summary(&self, market_id: MarketId) -> MarketResult<MarketSummary> {
        let book = self.book(market_id)?;
        let book = lock_book(&book)?;
        Ok(MarketSummary {
            total_pool: book.market.total_pool(),
            participants: book.stakes.len(),
            market: book.market.clone(),
        })
    }

    pub(crate) fn book(&self, market_id: MarketId) -> MarketResult<Arc<Mutex<MarketBook>>> {
        let books = self.books.read().map_err(poisoned)?;
        books
            .by_id
            .get(&market_id)
            .cloned()
            .ok_or(MarketError::NotFound(market_id))
    }

    pub(crate) fn all_books(&self) -> MarketResult<Vec<(MarketId, Arc<Mutex<MarketBook>>)>> {
        let books = self.books.read().map_err(poisoned)?;
        Ok(books.by_id.iter().map(|(id, b)| (*id, b.clone())).collect())
    }

    /// Persist the new market (and stake record) then publish them into the
    /// locked book. Nothing changes in memory if the write fails.
    pub(crate) fn commit(
        &self,
        book: &mut MarketBook,
        market: Market,
        stake: Option<StakeRecord>,
    ) -> MarketResult<()> {
        self.store.persist(&market, stake.as_ref())?;
        book.market = market;
        if let Some(record) = stake {
            book.stakes.insert(record.user_id.clone(), record);
        }
        Ok(())
    }

    pub fn flush(&self) -> MarketResult<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SledStore};
    use rust_decimal_macros::dec;

    fn new_market(duration_secs: i64, min_stake: Decimal) -> NewMarket {
        NewMarket {
            question: "Will BTC hit new ATH in Q4?".to_string(),
            description: "Bitcoin all-time high prediction".to_string(),
            duration_secs,
            min_stake,
            creator: "L1CREATOR".to_string(),
        }
    }

    fn registry() -> MarketRegistry {
        MarketRegistry::new(Arc::new(MemoryStore))
    }

    #[test]
    fn test_create_market() {
        let registry = registry();
        let id = registry.create_market(new_market(3600, dec!(0.01)), 1000).unwrap();
        assert_eq!(id, 1);

        let market = registry.get_market(id).unwrap();
        assert_eq!(market.state, MarketState::Open);
        assert_eq!(market.outcome, MarketOutcome::Unset);
        assert_eq!(market.end_time, 4600);
        assert_eq!(market.total_pool(), Decimal::ZERO);

        let second = registry.create_market(new_market(60, dec!(1)), 1000).unwrap();
        assert_eq!(second, 2);
    }

    #[test]
    fn test_create_market_validation() {
        let registry = registry();
        assert_eq!(
            registry.create_market(new_market(0, dec!(0.01)), 1000),
            Err(MarketError::InvalidDuration)
        );
        assert_eq!(
            registry.create_market(new_market(-5, dec!(0.01)), 1000),
            Err(MarketError::InvalidDuration)
        );
        assert_eq!(
            registry.create_market(new_market(i64::MAX, dec!(0.01)), u64::MAX - 10),
            Err(MarketError::InvalidDuration)
        );
        assert_eq!(
            registry.create_market(new_market(3600, dec!(0)), 1000),
            Err(MarketError::InvalidStake)
        );
    }

    #[test]
    fn test_begin_resolution() {
        let registry = registry();
        let id = registry.create_market(new_market(3600, dec!(0.01)), 1000).unwrap();

        assert_eq!(registry.begin_resolution(id, 4599), Err(MarketError::NotYetEnded(id)));
        registry.begin_resolution(id, 4600).unwrap();
        assert_eq!(registry.get_market(id).unwrap().state, MarketState::Resolving);
        assert_eq!(registry.begin_resolution(id, 5000), Err(MarketError::AlreadyResolving(id)));
    }

    #[test]
    fn test_missing_market() {
        let registry = registry();
        assert_eq!(registry.get_market(42), Err(MarketError::NotFound(42)));
        assert_eq!(registry.begin_resolution(42, 0), Err(MarketError::NotFound(42)));
    }

    #[test]
    fn test_list_active_markets() {
        let registry = registry();
        let a = registry.create_market(new_market(100, dec!(1)), 0).unwrap();
        let b = registry.create_market(new_market(100, dec!(1)), 0).unwrap();
        let c = registry.create_market(new_market(100, dec!(1)), 0).unwrap();
        registry.begin_resolution(b, 100).unwrap();

        assert_eq!(registry.list_active_markets().unwrap(), vec![a, c]);
    }

    #[test]
    fn test_restore_continues_ids() {
        let store: Arc<dyn LedgerStore> = Arc::new(SledStore::temporary().unwrap());
        let registry = MarketRegistry::new(store.clone());
        registry.create_market(new_market(100, dec!(1)), 0).unwrap();
        registry.create_market(new_market(100, dec!(1)), 0).unwrap();

        let restored = MarketRegistry::restore(store).unwrap();
        assert_eq!(restored.list_active_markets().unwrap(), vec![1, 2]);
        assert_eq!(restored.create_market(new_market(100, dec!(1)), 0).unwrap(), 3);
    }
}
