/// Settlement scenarios and ledger properties, driven through the engine API
/// with caller-supplied timestamps.

use predict_earn_ledger::{
    ClaimKind, MarketError, MarketState, NewMarket, Outcome, PredictionEngine,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

// ============================================================================
// TEST ACCOUNTS
// ============================================================================

const ALICE: &str = "L1ALICE000000001";
const BOB: &str = "L1BOB00000000001";
const CREATOR: &str = "L1CREATOR0000001";

const CREATED_AT: u64 = 1_000;
const DURATION: i64 = 3600;
const END_TIME: u64 = CREATED_AT + DURATION as u64;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn engine(fee_rate: Decimal) -> PredictionEngine {
    PredictionEngine::in_memory(fee_rate).expect("engine")
}

fn create_market(engine: &PredictionEngine) -> u64 {
    engine
        .create_market(
            NewMarket {
                question: "Will ETH reach $3500 by September 1st, 2024?".to_string(),
                description: "Ethereum price prediction".to_string(),
                duration_secs: DURATION,
                min_stake: dec!(0.01),
                creator: CREATOR.to_string(),
            },
            CREATED_AT,
        )
        .expect("create market")
}

/// Alice YES 1.0, Bob NO 1.0
fn alice_vs_bob(engine: &PredictionEngine) -> u64 {
    let id = create_market(engine);
    engine.place_stake(id, ALICE, Outcome::Yes, dec!(1.0), CREATED_AT + 10).unwrap();
    engine.place_stake(id, BOB, Outcome::No, dec!(1.0), CREATED_AT + 20).unwrap();
    id
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_scenario_a_winner_takes_pool() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);

    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    assert_eq!(engine.claim(id, ALICE, END_TIME + 1).unwrap().amount, dec!(2.0));
    assert_eq!(engine.claim(id, BOB, END_TIME + 1).unwrap().amount, dec!(0));
}

#[test]
fn test_scenario_b_platform_fee() {
    let engine = engine(dec!(0.02));
    let id = alice_vs_bob(&engine);

    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    assert_eq!(engine.claim(id, ALICE, END_TIME + 1).unwrap().amount, dec!(1.98));
    assert_eq!(engine.platform_take(id).unwrap(), dec!(0.02));
}

#[test]
fn test_scenario_c_void_refunds_everyone() {
    let engine = engine(dec!(0.02));
    let id = alice_vs_bob(&engine);

    engine.void_market(id, "question turned out ambiguous", CREATED_AT + 100).unwrap();

    let alice = engine.claim(id, ALICE, CREATED_AT + 200).unwrap();
    let bob = engine.claim(id, BOB, CREATED_AT + 200).unwrap();
    assert_eq!(alice.amount, dec!(1.0));
    assert_eq!(bob.amount, dec!(1.0));
    assert_eq!(alice.kind, ClaimKind::Refund);
}

#[test]
fn test_scenario_d_no_side_switch() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);

    assert_eq!(
        engine.place_stake(id, ALICE, Outcome::No, dec!(0.5), CREATED_AT + 30),
        Err(MarketError::OutcomeMismatch(id))
    );
    assert_eq!(engine.get_market(id).unwrap().total_no_stake, dec!(1.0));
}

#[test]
fn test_scenario_e_double_claim() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    let first = engine.claim(id, ALICE, END_TIME + 1);
    let second = engine.claim(id, ALICE, END_TIME + 1);

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), MarketError::AlreadyClaimed(id));
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_conservation_with_uneven_pools() {
    let engine = engine(dec!(0.03));
    let id = create_market(&engine);

    let stakes = [
        ("U1", Outcome::Yes, dec!(0.7)),
        ("U2", Outcome::Yes, dec!(1.3)),
        ("U3", Outcome::Yes, dec!(0.01)),
        ("U4", Outcome::No, dec!(2.9)),
        ("U5", Outcome::No, dec!(0.33)),
    ];
    for (user, side, amount) in stakes {
        engine.place_stake(id, user, side, amount, CREATED_AT + 1).unwrap();
    }
    // Top-ups land on the same record
    engine.place_stake(id, "U3", Outcome::Yes, dec!(0.02), CREATED_AT + 2).unwrap();

    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    let market = engine.get_market(id).unwrap();
    let total_paid: Decimal = ["U1", "U2", "U3", "U4", "U5"]
        .iter()
        .map(|u| engine.claim(id, u, END_TIME + 1).unwrap().amount)
        .sum();

    assert!(total_paid <= market.total_pool());
    // Only the fee (and truncation dust) stays behind
    let retained = market.total_pool() - total_paid;
    assert!(retained >= engine.platform_take(id).unwrap());
    assert!(retained - engine.platform_take(id).unwrap() < dec!(0.000000000001));
}

#[test]
fn test_void_conserves_exactly() {
    let engine = engine(dec!(0.05));
    let id = create_market(&engine);
    engine.place_stake(id, "U1", Outcome::Yes, dec!(0.25), CREATED_AT + 1).unwrap();
    engine.place_stake(id, "U2", Outcome::No, dec!(4), CREATED_AT + 1).unwrap();
    engine.place_stake(id, "U2", Outcome::No, dec!(1), CREATED_AT + 2).unwrap();
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.void_market(id, "oracle unavailable", END_TIME + 86_400).unwrap();

    let paid = engine.claim(id, "U1", END_TIME + 90_000).unwrap().amount
        + engine.claim(id, "U2", END_TIME + 90_000).unwrap().amount;
    assert_eq!(paid, engine.get_market(id).unwrap().total_pool());
}

#[test]
fn test_pools_frozen_after_open() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);
    let before = engine.get_market(id).unwrap();

    engine.begin_resolution(id, END_TIME).unwrap();
    assert_eq!(
        engine.place_stake(id, ALICE, Outcome::Yes, dec!(1), END_TIME - 1),
        Err(MarketError::MarketNotOpen(id))
    );
    engine.resolve(id, Outcome::No, END_TIME).unwrap();

    let after = engine.get_market(id).unwrap();
    assert_eq!(after.total_yes_stake, before.total_yes_stake);
    assert_eq!(after.total_no_stake, before.total_no_stake);
}

#[test]
fn test_final_markets_reject_everything() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    assert!(engine.place_stake(id, "CAROL", Outcome::Yes, dec!(1), END_TIME).is_err());
    assert_eq!(engine.resolve(id, Outcome::No, END_TIME), Err(MarketError::NotResolving(id)));
    assert_eq!(engine.void_market(id, "late", END_TIME), Err(MarketError::AlreadyFinal(id)));
    assert_eq!(engine.get_market(id).unwrap().state, MarketState::Resolved);
}

#[test]
fn test_claim_requires_position() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    assert_eq!(
        engine.claim(id, "CAROL", END_TIME).unwrap_err(),
        MarketError::NoPosition(id)
    );
    assert_eq!(engine.claim(999, ALICE, END_TIME).unwrap_err(), MarketError::NotFound(999));
}

#[test]
fn test_profile_after_claims() {
    let engine = engine(dec!(0));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();
    engine.claim(id, ALICE, END_TIME + 1).unwrap();

    let alice = engine.user_stats(ALICE).unwrap();
    assert_eq!(alice.total_earnings, dec!(2));
    assert_eq!(alice.win_rate, dec!(1));
    assert_eq!(alice.current_streak, 1);

    let board = engine.leaderboard(10).unwrap();
    assert_eq!(board[0].stats.user_id, ALICE);
    assert_eq!(board[1].stats.user_id, BOB);
}

// ============================================================================
// WEI-SCALE AMOUNTS
// ============================================================================

/// One ether in wei
const ETHER: u64 = 1_000_000_000_000_000_000;

fn wei(amount: u64) -> Decimal {
    Decimal::from(amount)
}

#[test]
fn test_wei_scale_claims_settle() {
    let engine = engine(dec!(0));
    let id = create_market(&engine);
    let stake = wei(1_000_000_000_000_000);
    engine.place_stake(id, ALICE, Outcome::Yes, stake, CREATED_AT + 10).unwrap();
    engine.place_stake(id, BOB, Outcome::No, stake, CREATED_AT + 20).unwrap();
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    let alice = engine.claim(id, ALICE, END_TIME + 1).unwrap();
    let bob = engine.claim(id, BOB, END_TIME + 1).unwrap();

    assert!(alice.amount <= stake * dec!(2));
    assert!(stake * dec!(2) - alice.amount < wei(1));
    assert_eq!(bob.amount, dec!(0));
    assert_eq!(engine.get_market(id).unwrap().state, MarketState::Resolved);
}

#[test]
fn test_wei_scale_conservation() {
    let engine = engine(dec!(0.02));
    let id = create_market(&engine);

    let stakes = [
        ("U1", Outcome::Yes, wei(3 * ETHER / 2)),
        ("U2", Outcome::Yes, wei(9 * ETHER / 4)),
        ("U3", Outcome::Yes, wei(7)),
        ("U4", Outcome::No, wei(3 * ETHER)),
        ("U5", Outcome::No, wei(3 * ETHER / 4 + 1)),
    ];
    for (user, side, amount) in stakes {
        engine.place_stake(id, user, side, amount, CREATED_AT + 1).unwrap();
    }
    engine.place_stake(id, "U2", Outcome::Yes, wei(ETHER / 3), CREATED_AT + 2).unwrap();

    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    let market = engine.get_market(id).unwrap();
    let total_paid: Decimal = ["U1", "U2", "U3", "U4", "U5"]
        .iter()
        .map(|u| engine.claim(id, u, END_TIME + 1).unwrap().amount)
        .sum();
    let take = engine.platform_take(id).unwrap();

    assert!(total_paid + take <= market.total_pool());
    assert!(market.total_pool() - total_paid - take < wei(1));
}

#[test]
fn test_stake_beyond_range_keeps_market_usable() {
    let engine = engine(dec!(0));
    let id = create_market(&engine);
    engine.place_stake(id, ALICE, Outcome::Yes, Decimal::MAX, CREATED_AT + 10).unwrap();

    assert_eq!(
        engine.place_stake(id, BOB, Outcome::No, dec!(1), CREATED_AT + 20),
        Err(MarketError::AmountOverflow(id))
    );
    assert_eq!(engine.get_market(id).unwrap().total_no_stake, dec!(0));

    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();
    assert_eq!(engine.claim(id, ALICE, END_TIME + 1).unwrap().amount, Decimal::MAX);
    assert_eq!(engine.claim(id, BOB, END_TIME + 1).unwrap_err(), MarketError::NoPosition(id));
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_stakes_lose_no_updates() {
    let engine = Arc::new(engine(dec!(0)));
    let id = create_market(&engine);

    thread::scope(|scope| {
        for t in 0..8 {
            let engine = engine.clone();
            scope.spawn(move || {
                let user = format!("USER{}", t);
                let side = if t % 2 == 0 { Outcome::Yes } else { Outcome::No };
                for _ in 0..50 {
                    engine.place_stake(id, &user, side, dec!(0.01), CREATED_AT + 5).unwrap();
                }
            });
        }
    });

    let market = engine.get_market(id).unwrap();
    assert_eq!(market.total_yes_stake, dec!(2.0));
    assert_eq!(market.total_no_stake, dec!(2.0));
    assert_eq!(engine.position(id, "USER0").unwrap(), predict_earn_ledger::Position::Yes(dec!(0.5)));
}

#[test]
fn test_concurrent_claims_pay_once() {
    let engine = Arc::new(engine(dec!(0)));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();
    engine.resolve(id, Outcome::Yes, END_TIME).unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = engine.clone();
                scope.spawn(move || engine.claim(id, ALICE, END_TIME + 1))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(MarketError::AlreadyClaimed(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 15);
}

#[test]
fn test_concurrent_transitions_single_winner() {
    let engine = Arc::new(engine(dec!(0)));
    let id = alice_vs_bob(&engine);
    engine.begin_resolution(id, END_TIME).unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let resolver = {
            let engine = engine.clone();
            scope.spawn(move || engine.resolve(id, Outcome::Yes, END_TIME).is_ok())
        };
        let voider = {
            let engine = engine.clone();
            scope.spawn(move || engine.void_market(id, "race", END_TIME).is_ok())
        };
        vec![resolver.join().unwrap(), voider.join().unwrap()]
    });

    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    assert!(engine.get_market(id).unwrap().state.is_final());
}
