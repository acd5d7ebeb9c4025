use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::execution::config::ExecutorConfig;
use crate::execution::error::SwapError;
use crate::execution::retry::MAX_SLIPPAGE_BPS;
use crate::execution::traits::{Notifier, QuoteProvider, SwapSigner, TransactionSubmitter};
use crate::execution::types::{
    lamports_to_sol,
    ConfirmationStatus,
    RetryState,
    SubmissionOutcome,
    SwapDirection,
    SwapRequest,
};

/// Runs swaps end to end: quote, build, sign, submit, confirm, retrying
/// transient failures with escalating slippage.
///
/// Cloning is cheap; clones share the collaborators and the signing key.
#[derive(Clone)]
pub struct SwapExecutor {
    quotes: Arc<dyn QuoteProvider>,
    submitter: Arc<dyn TransactionSubmitter>,
    signer: Arc<dyn SwapSigner>,
    notifier: Arc<dyn Notifier>,
    config: ExecutorConfig,
}

impl SwapExecutor {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        submitter: Arc<dyn TransactionSubmitter>,
        signer: Arc<dyn SwapSigner>,
        notifier: Arc<dyn Notifier>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            quotes,
            submitter,
            signer,
            notifier,
            config,
        }
    }

    fn validate_request(&self, request: &SwapRequest) -> Result<(Pubkey, Pubkey), SwapError> {
        if request.amount_lamports == 0 {
            return Err(SwapError::InvalidRequest(
                "Swap amount must be greater than zero".to_string()
            ));
        }

        let ceiling = self.config.slippage.ceiling_bps.min(MAX_SLIPPAGE_BPS);
        if request.slippage_bps > ceiling {
            return Err(SwapError::InvalidRequest(format!(
                "Slippage {} bps exceeds the {} bps ceiling",
                request.slippage_bps, ceiling
            )));
        }

        if request.max_attempts == 0 {
            return Err(SwapError::InvalidRequest(
                "At least one attempt is required".to_string()
            ));
        }

        request.mints()
    }

    pub async fn execute_swap(&self, request: &SwapRequest) -> Result<SubmissionOutcome, SwapError> {
        let (input_mint, output_mint) = self.validate_request(request)?;
        let mut state = RetryState::new(request.slippage_bps);

        loop {
            info!(
                "{} {} attempt {}/{} at {} bps slippage",
                request.direction,
                request.counter_token_address,
                state.attempt_number,
                request.max_attempts,
                state.current_slippage_bps
            );
            self.notifier.send(format!(
                "🔄 {} {}\nAmount: {}\nAttempt: {}/{}\nSlippage: {} bps",
                request.direction,
                request.counter_token_address,
                format_amount(request),
                state.attempt_number,
                request.max_attempts,
                state.current_slippage_bps
            ));

            let result = self
                .attempt(request, &input_mint, &output_mint, state.current_slippage_bps)
                .await;

            match result {
                Ok(mut outcome) => {
                    outcome.attempts = state.attempt_number;
                    info!(
                        "{} {} confirmed: {} (attempt {})",
                        request.direction, request.counter_token_address, outcome.signature, outcome.attempts
                    );
                    self.notifier.send(format!(
                        "✅ {} {} confirmed\nSignature: {}\nAttempts: {}\nExpected output: {}",
                        request.direction,
                        request.counter_token_address,
                        outcome.signature,
                        outcome.attempts,
                        outcome.estimated_output_amount
                    ));
                    return Ok(outcome);
                }
                Err(err) if !err.is_retryable() => {
                    error!(
                        "{} {} failed without retry: {}",
                        request.direction, request.counter_token_address, err
                    );
                    self.notifier.send(format!(
                        "⛔ {} {} aborted: {}",
                        request.direction, request.counter_token_address, err
                    ));
                    return Err(err);
                }
                Err(err) if state.attempt_number >= request.max_attempts => {
                    error!(
                        "{} {} exhausted {} attempts: {}",
                        request.direction, request.counter_token_address, state.attempt_number, err
                    );
                    self.notifier.send(format!(
                        "❌ {} {} failed after {} attempts\nLast error: {}",
                        request.direction, request.counter_token_address, state.attempt_number, err
                    ));
                    return Err(SwapError::Exhausted {
                        attempts: state.attempt_number,
                        last_error: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.config.backoff.delay_for(state.attempt_number);
                    let next_slippage = self.config.slippage.escalate(state.current_slippage_bps);
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?} at {} bps...",
                        state.attempt_number, request.max_attempts, err, delay, next_slippage
                    );
                    state.advance(err, next_slippage);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Run independent swaps concurrently; results come back in request order.
    pub async fn execute_batch(
        &self,
        requests: &[SwapRequest],
    ) -> Vec<Result<SubmissionOutcome, SwapError>> {
        join_all(requests.iter().map(|request| self.execute_swap(request))).await
    }

    async fn attempt(
        &self,
        request: &SwapRequest,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        slippage_bps: u16,
    ) -> Result<SubmissionOutcome, SwapError> {
        let quote = self.quotes
            .get_quote(input_mint, output_mint, request.amount_lamports, slippage_bps)
            .await?;
        debug!(
            "Quote {} -> {}: {} in, ~{} out (min {})",
            input_mint,
            output_mint,
            quote.in_amount,
            quote.estimated_output_amount,
            quote.minimum_output_amount()
        );

        let unsigned = self.quotes.swap_transaction(&quote, &self.signer.pubkey()).await?;

        // Blockhash is fetched last so it is as fresh as possible at signing time.
        let blockhash = self.submitter.latest_blockhash().await?;
        let age = quote.fetched_at.elapsed();
        if age > self.config.quote_max_age {
            return Err(SwapError::StaleQuote { age });
        }

        let signed = self.signer.sign(&unsigned.transaction, blockhash)?;
        let signature = self.submitter.send_raw_transaction(&signed).await?;
        debug!("Submitted {} with blockhash {}", signature, blockhash);

        let status = match self.submitter
            .confirm_transaction(&signature, &blockhash, self.config.confirmation_timeout)
            .await
        {
            Ok(ConfirmationStatus::Pending) => {
                warn!("No confirmation for {} within {:?}, re-checking status", signature, self.config.confirmation_timeout);
                self.recheck_status(&signature).await
            }
            Ok(settled) => settled,
            Err(e) => {
                warn!("Confirmation of {} failed: {}, re-checking status", signature, e);
                self.recheck_status(&signature).await
            }
        };

        match status {
            ConfirmationStatus::Finalized => Ok(SubmissionOutcome {
                signature,
                confirmed: true,
                attempts: 0,
                slippage_bps,
                estimated_output_amount: quote.estimated_output_amount,
                confirmed_at: Utc::now(),
            }),
            ConfirmationStatus::Failed(reason) => Err(SwapError::SubmissionRejected(format!(
                "{} failed on-chain: {}",
                signature, reason
            ))),
            ConfirmationStatus::Pending => Err(SwapError::ConfirmationTimeout { signature }),
        }
    }

    async fn recheck_status(&self, signature: &Signature) -> ConfirmationStatus {
        match self.submitter.signature_status(signature).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Status re-check for {} failed: {}", signature, e);
                ConfirmationStatus::Pending
            }
        }
    }
}

fn format_amount(request: &SwapRequest) -> String {
    match request.direction {
        SwapDirection::Buy => format!("{} SOL", lamports_to_sol(request.amount_lamports)),
        SwapDirection::Sell => format!("{} tokens (base units)", request.amount_lamports),
    }
}
