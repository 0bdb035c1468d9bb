// ============================================================================
// Market Resolve Module - Market Lifecycle & Settlement Math
// ============================================================================
//
// This module contains the market side of the ledger:
//   - markets: registry of markets, creation and the Open -> Resolving step
//   - resolution: Resolving -> Resolved and voiding to Invalid
//   - payout: parimutuel payout math over a final market's pools
//
// ============================================================================

pub mod markets;
pub mod payout;
pub mod resolution;

pub use markets::*;
pub use payout::*;
pub use resolution::*;
