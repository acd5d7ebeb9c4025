use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::time::Instant;

use crate::execution::error::SwapError;

/// Wrapped SOL mint, the native side of every swap.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapDirection {
    Buy,
    Sell,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Buy => write!(f, "BUY"),
            SwapDirection::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for SwapDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(SwapDirection::Buy),
            "sell" => Ok(SwapDirection::Sell),
            other => Err(format!("unknown swap direction '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwapRequest {
    pub direction: SwapDirection,
    /// Amount of the input asset in base units (lamports for buys).
    pub amount_lamports: u64,
    pub counter_token_address: String,
    pub slippage_bps: u16,
    pub max_attempts: u32,
}

impl SwapRequest {
    pub fn new(
        direction: SwapDirection,
        amount_lamports: u64,
        counter_token_address: impl Into<String>,
        slippage_bps: u16,
    ) -> Self {
        Self {
            direction,
            amount_lamports,
            counter_token_address: counter_token_address.into(),
            slippage_bps,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn buy(amount_lamports: u64, token: impl Into<String>, slippage_bps: u16) -> Self {
        Self::new(SwapDirection::Buy, amount_lamports, token, slippage_bps)
    }

    pub fn sell(amount: u64, token: impl Into<String>, slippage_bps: u16) -> Self {
        Self::new(SwapDirection::Sell, amount, token, slippage_bps)
    }

    /// Input and output mints for this request, in swap order.
    pub fn mints(&self) -> Result<(Pubkey, Pubkey), SwapError> {
        let token = Pubkey::from_str(self.counter_token_address.trim()).map_err(|e| {
            SwapError::InvalidRequest(format!(
                "invalid token address '{}': {}",
                self.counter_token_address, e
            ))
        })?;
        let sol = Pubkey::from_str(SOL_MINT)
            .map_err(|e| SwapError::InvalidRequest(e.to_string()))?;

        Ok(match self.direction {
            SwapDirection::Buy => (sol, token),
            SwapDirection::Sell => (token, sol),
        })
    }
}

#[derive(Clone, Debug)]
pub struct QuoteResult {
    /// Provider-specific route payload, handed back verbatim when building the swap.
    pub route: serde_json::Value,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    pub estimated_output_amount: u64,
    pub slippage_bps: u16,
    pub fetched_at: Instant,
}

impl QuoteResult {
    /// Worst-case output once the slippage tolerance is applied.
    pub fn minimum_output_amount(&self) -> u64 {
        use num_traits::ToPrimitive;

        let tolerance = Decimal::new(i64::from(self.slippage_bps), 4);
        let min_amount = Decimal::from(self.estimated_output_amount) * (Decimal::ONE - tolerance);
        min_amount.floor().to_u64().unwrap_or(0)
    }
}

/// Serialized, not yet signed swap transaction built for a quote.
#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedSwap {
    pub transaction: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfirmationStatus {
    Finalized,
    Failed(String),
    Pending,
}

#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
    pub signature: Signature,
    pub confirmed: bool,
    pub attempts: u32,
    pub slippage_bps: u16,
    pub estimated_output_amount: u64,
    pub confirmed_at: DateTime<Utc>,
}

/// Per-call retry bookkeeping, discarded when `execute_swap` returns.
#[derive(Debug)]
pub struct RetryState {
    pub attempt_number: u32,
    pub current_slippage_bps: u16,
    pub last_error: Option<SwapError>,
}

impl RetryState {
    pub fn new(slippage_bps: u16) -> Self {
        Self {
            attempt_number: 1,
            current_slippage_bps: slippage_bps,
            last_error: None,
        }
    }

    pub fn advance(&mut self, error: SwapError, next_slippage_bps: u16) {
        self.attempt_number += 1;
        self.current_slippage_bps = self.current_slippage_bps.max(next_slippage_bps);
        self.last_error = Some(error);
    }
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    #[test]
    fn buy_spends_sol_and_sell_returns_it() {
        let sol = Pubkey::from_str(SOL_MINT).unwrap();
        let bonk = Pubkey::from_str(BONK).unwrap();

        assert_eq!(SwapRequest::buy(1, BONK, 50).mints().unwrap(), (sol, bonk));
        assert_eq!(SwapRequest::sell(1, BONK, 50).mints().unwrap(), (bonk, sol));
    }

    #[test]
    fn malformed_token_is_invalid_request() {
        let err = SwapRequest::buy(1, "not-a-mint", 50).mints().unwrap_err();
        assert!(matches!(err, SwapError::InvalidRequest(_)));
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("Buy".parse::<SwapDirection>().unwrap(), SwapDirection::Buy);
        assert_eq!(" SELL ".parse::<SwapDirection>().unwrap(), SwapDirection::Sell);
        assert!("hold".parse::<SwapDirection>().is_err());
    }

    #[test]
    fn minimum_output_applies_slippage() {
        let quote = QuoteResult {
            route: serde_json::Value::Null,
            input_mint: Pubkey::new_unique(),
            output_mint: Pubkey::new_unique(),
            in_amount: 1_000,
            estimated_output_amount: 10_000,
            slippage_bps: 250,
            fetched_at: Instant::now(),
        };
        assert_eq!(quote.minimum_output_amount(), 9_750);
    }

    #[test]
    fn retry_state_never_lowers_slippage() {
        let mut state = RetryState::new(500);
        state.advance(SwapError::Network("timeout".into()), 300);
        assert_eq!(state.attempt_number, 2);
        assert_eq!(state.current_slippage_bps, 500);
        assert!(state.last_error.is_some());
    }

    #[test]
    fn lamports_convert_to_sol() {
        assert_eq!(lamports_to_sol(1_500_000_000), Decimal::new(15, 1));
    }
}
