// ============================================================================
// Payout Calculator - Parimutuel Settlement
// ============================================================================
//
// Winners get their principal back plus a share of the losing pool
// proportional to their stake in the winning pool, after the platform fee is
// taken from the losing pool:
//
//   payout = amount + amount * losing_pool * (1 - fee_rate) / winning_pool
//
// Losers get 0. Invalid (voided) markets refund every stake in full, no fee.
// The share is truncated at AMOUNT_SCALE digits so payouts never exceed the
// pools. When `amount * losing_pool` does not fit in a Decimal the ratio
// `amount / winning_pool` is taken first instead; that path gives up a margin
// of 2e-27 of the distributable pool, which is more than the rounding error of
// its two inexact steps, so the share still never exceeds the exact value.
// Nothing here can panic: out-of-range results surface as AmountOverflow.
//
// Empty winning pool: the losing pool goes entirely to the fee sink and any
// stake on the winning side is refunded at principal.
//
// ============================================================================

use crate::error::{MarketError, MarketResult};
use crate::models::{Market, MarketState, StakeRecord, AMOUNT_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutCalculator {
    fee_rate: Decimal,
}

impl PayoutCalculator {
    /// `fee_rate` is the fraction of the losing pool kept by the platform
    pub fn new(fee_rate: Decimal) -> MarketResult<Self> {
        if fee_rate < Decimal::ZERO || fee_rate >= Decimal::ONE {
            return Err(MarketError::InvalidConfig(format!(
                "fee rate must be in [0, 1), got {}",
                fee_rate
            )));
        }
        Ok(Self { fee_rate })
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Amount owed to `stake` on a final market
    pub fn compute_payout(&self, market: &Market, stake: &StakeRecord) -> MarketResult<Decimal> {
        match market.state {
            MarketState::Open | MarketState::Resolving => Err(MarketError::MarketNotFinal(market.id)),
            MarketState::Invalid => Ok(stake.amount),
            MarketState::Resolved => {
                if !market.outcome.matches(stake.outcome) {
                    return Ok(Decimal::ZERO);
                }

                let winning_pool = market.pool(stake.outcome);
                let losing_pool = market.pool(stake.outcome.opposite());
                if winning_pool.is_zero() {
                    return Ok(stake.amount);
                }

                let overflow = MarketError::AmountOverflow(market.id);
                let distributable = losing_pool
                    .checked_mul(Decimal::ONE - self.fee_rate)
                    .ok_or_else(|| overflow.clone())?;
                let share = winner_share(stake.amount, distributable, winning_pool)
                    .ok_or_else(|| overflow.clone())?;

                stake.amount.checked_add(share).ok_or(overflow)
            }
        }
    }

    /// Amount the platform fee sink keeps from a final market
    pub fn platform_take(&self, market: &Market) -> MarketResult<Decimal> {
        match market.state {
            MarketState::Open | MarketState::Resolving => Err(MarketError::MarketNotFinal(market.id)),
            MarketState::Invalid => Ok(Decimal::ZERO),
            MarketState::Resolved => {
                let winning_side = market
                    .outcome
                    .winning_side()
                    .ok_or(MarketError::MarketNotFinal(market.id))?;
                let losing_pool = market.pool(winning_side.opposite());

                if market.pool(winning_side).is_zero() {
                    Ok(losing_pool)
                } else {
                    losing_pool
                        .checked_mul(self.fee_rate)
                        .ok_or(MarketError::AmountOverflow(market.id))
                }
            }
        }
    }
}

/// `amount`'s cut of `distributable`, rounded toward zero
fn winner_share(amount: Decimal, distributable: Decimal, winning_pool: Decimal) -> Option<Decimal> {
    let share = match amount.checked_mul(distributable) {
        Some(product) => product.checked_div(winning_pool)?,
        None => {
            let ratio = amount.checked_div(winning_pool)?;
            let margin = distributable.checked_mul(Decimal::new(2, 27))?;
            ratio.checked_mul(distributable)?.checked_sub(margin)?
        }
    };
    Some(
        share
            .max(Decimal::ZERO)
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero),
    )
}
