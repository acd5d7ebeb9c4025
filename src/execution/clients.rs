use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionStatus;
use tokio::time::Instant;

use crate::execution::error::{QuoteError, SubmitError};
use crate::execution::traits::{QuoteProvider, TransactionSubmitter};
use crate::execution::types::{ConfirmationStatus, QuoteResult, UnsignedSwap};

pub const JUPITER_API_URL: &str = "https://lite-api.jup.ag/swap/v1";

pub struct JupiterApiClient {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteAmounts {
    in_amount: String,
    out_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

impl JupiterApiClient {
    pub fn new() -> Self {
        Self::with_base_url(JUPITER_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for JupiterApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a quote response body into a `QuoteResult`, treating any `error`
/// field or zero output as "no route".
fn parse_quote(
    body: Value,
    input_mint: &Pubkey,
    output_mint: &Pubkey,
    slippage_bps: u16,
) -> Result<QuoteResult, QuoteError> {
    let no_route = |reason: String| QuoteError::NoRoute {
        input: input_mint.to_string(),
        output: output_mint.to_string(),
        reason,
    };

    if let Some(error) = body.get("error") {
        let reason = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(no_route(reason));
    }

    let amounts: QuoteAmounts = serde_json::from_value(body.clone())
        .map_err(|e| QuoteError::InvalidResponse(e.to_string()))?;
    let parse_amount = |raw: &str| {
        raw.parse::<u64>()
            .map_err(|_| QuoteError::InvalidResponse(format!("non-numeric amount '{}'", raw)))
    };
    let in_amount = parse_amount(&amounts.in_amount)?;
    let estimated_output_amount = parse_amount(&amounts.out_amount)?;

    if estimated_output_amount == 0 {
        return Err(no_route("route yields zero output".to_string()));
    }

    Ok(QuoteResult {
        route: body,
        input_mint: *input_mint,
        output_mint: *output_mint,
        in_amount,
        estimated_output_amount,
        slippage_bps,
        fetched_at: Instant::now(),
    })
}

#[async_trait]
impl QuoteProvider for JupiterApiClient {
    async fn get_quote(
        &self,
        input_mint: &Pubkey,
        output_mint: &Pubkey,
        amount: u64,
        slippage_bps: u16,
    ) -> Result<QuoteResult, QuoteError> {
        let url = format!("{}/quote", self.base_url);

        // Jupiter answers "no route" with a 4xx and an `error` body, so read
        // the body regardless of status.
        let response = self.http_client
            .get(&url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("slippageBps", slippage_bps.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<Value>().await?;
        debug!("Jupiter quote {} -> {} ({}): {}", input_mint, output_mint, status, body);

        if status.is_server_error() {
            return Err(QuoteError::Transport(format!("quote API returned {}", status)));
        }

        parse_quote(body, input_mint, output_mint, slippage_bps)
    }

    async fn swap_transaction(
        &self,
        quote: &QuoteResult,
        payer: &Pubkey,
    ) -> Result<UnsignedSwap, QuoteError> {
        let url = format!("{}/swap", self.base_url);

        let response = self.http_client
            .post(&url)
            .json(&json!({
                "quoteResponse": quote.route,
                "userPublicKey": payer.to_string(),
                "wrapAndUnwrapSol": true,
                "dynamicComputeUnitLimit": true,
                "prioritizationFeeLamports": "auto",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                QuoteError::Transport(format!("swap API returned {}: {}", status, body))
            } else {
                QuoteError::NoRoute {
                    input: quote.input_mint.to_string(),
                    output: quote.output_mint.to_string(),
                    reason: body,
                }
            });
        }

        let swap = response.json::<SwapResponse>().await?;
        let transaction = STANDARD
            .decode(swap.swap_transaction.as_bytes())
            .map_err(|e| QuoteError::InvalidResponse(format!("swapTransaction is not base64: {}", e)))?;

        Ok(UnsignedSwap { transaction })
    }
}

/// `TransactionSubmitter` over the Solana JSON-RPC API.
pub struct RpcSubmitter {
    client: RpcClient,
    /// Level the blockhash is fetched and checked for expiry at. Must be the
    /// same for both, or a fresh blockhash reads as already expired.
    blockhash_commitment: CommitmentConfig,
    finality_commitment: CommitmentConfig,
    poll_interval: Duration,
}

impl RpcSubmitter {
    /// Blockhashes are fetched at the client's commitment; transactions are
    /// only reported settled once finalized.
    pub fn new(client: RpcClient) -> Self {
        Self {
            blockhash_commitment: client.commitment(),
            client,
            finality_commitment: CommitmentConfig::finalized(),
            poll_interval: Duration::from_millis(500),
        }
    }

    async fn fetch_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>, SubmitError> {
        let response = self.client.get_signature_statuses(&[*signature]).await?;
        Ok(response.value.into_iter().next().flatten())
    }
}

fn classify_status(status: Option<TransactionStatus>, finality: CommitmentConfig) -> ConfirmationStatus {
    match status {
        Some(status) => {
            if let Some(err) = status.err {
                ConfirmationStatus::Failed(err.to_string())
            } else if status.satisfies_commitment(finality) {
                ConfirmationStatus::Finalized
            } else {
                ConfirmationStatus::Pending
            }
        }
        None => ConfirmationStatus::Pending,
    }
}

#[async_trait]
impl TransactionSubmitter for RpcSubmitter {
    async fn latest_blockhash(&self) -> Result<Hash, SubmitError> {
        let (blockhash, _) = self.client
            .get_latest_blockhash_with_commitment(self.blockhash_commitment)
            .await?;
        Ok(blockhash)
    }

    async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature, SubmitError> {
        let transaction: VersionedTransaction = bincode::deserialize(transaction)
            .map_err(|e| SubmitError::Rejected(format!("malformed transaction: {}", e)))?;

        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.blockhash_commitment.commitment),
            max_retries: Some(0),
            ..RpcSendTransactionConfig::default()
        };

        self.client
            .send_transaction_with_config(&transaction, config)
            .await
            .map_err(|e| {
                // Preflight/simulation failures come back as RPC response errors.
                if e.get_transaction_error().is_some() {
                    SubmitError::Rejected(e.to_string())
                } else {
                    SubmitError::Rpc(e.to_string())
                }
            })
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        timeout: Duration,
    ) -> Result<ConfirmationStatus, SubmitError> {
        let deadline = Instant::now() + timeout;
        let mut landed = false;

        loop {
            match self.fetch_status(signature).await {
                Ok(status) => {
                    landed |= status.is_some();
                    match classify_status(status, self.finality_commitment) {
                        ConfirmationStatus::Pending => {}
                        settled => return Ok(settled),
                    }
                }
                Err(e) => warn!("Status poll for {} failed: {}", signature, e),
            }

            if Instant::now() >= deadline {
                return Ok(ConfirmationStatus::Pending);
            }

            // Once a transaction is in a block its blockhash no longer matters.
            if !landed {
                match self.client.is_blockhash_valid(blockhash, self.blockhash_commitment).await {
                    Ok(false) => {
                        debug!("Blockhash {} expired before {} landed", blockhash, signature);
                        return Ok(ConfirmationStatus::Pending);
                    }
                    Ok(true) => {}
                    Err(e) => warn!("Blockhash validity check failed: {}", e),
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn signature_status(&self, signature: &Signature) -> Result<ConfirmationStatus, SubmitError> {
        Ok(classify_status(self.fetch_status(signature).await?, self.finality_commitment))
    }
}
