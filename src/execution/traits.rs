use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

#[cfg(test)]
use mockall::automock;

use crate::execution::error::{QuoteError, SigningError, SubmitError};
use crate::execution::types::{ConfirmationStatus, QuoteResult, UnsignedSwap};

/// Price/route source, e.g. the Jupiter aggregator.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<QuoteResult, QuoteError>;

    /// Build the swap transaction for a quote, paid for and signed by `payer`.
    async fn swap_transaction(
        &self,
        quote: &QuoteResult,
        payer: &Pubkey,
    ) -> Result<UnsignedSwap, QuoteError>;
}

/// Network node access used to broadcast and track transactions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, SubmitError>;

    async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature, SubmitError>;

    /// Poll until the transaction is finalized, fails, or `timeout` elapses.
    /// A timeout is reported as `ConfirmationStatus::Pending`.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        timeout: Duration,
    ) -> Result<ConfirmationStatus, SubmitError>;

    async fn signature_status(&self, signature: &Signature)
        -> Result<ConfirmationStatus, SubmitError>;
}

#[cfg_attr(test, automock)]
pub trait SwapSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Re-stamp `transaction` with `blockhash` and sign it, returning wire bytes.
    fn sign(&self, transaction: &[u8], blockhash: Hash) -> Result<Vec<u8>, SigningError>;
}

/// Outbound status channel. Implementations must not block and must swallow
/// their own delivery failures.
pub trait Notifier: Send + Sync {
    fn send(&self, message: String);
}
