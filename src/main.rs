use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info, warn};

use solana_swap_executor::{
    execution::{
        config::{env_or, env_parsed, env_required, ConfigError},
        JupiterApiClient,
        KeypairSigner,
        Notifier,
        RpcSubmitter,
    },
    ExecutorConfig,
    LogNotifier,
    SolanaConfig,
    SwapDirection,
    SwapExecutor,
    SwapRequest,
    TelegramConfig,
    TelegramNotifier,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let executor_config = ExecutorConfig::load_from_env()?;
    let solana_config = SolanaConfig::load_from_env()?;
    let requests = load_requests(&executor_config)?;

    let notifier: Arc<dyn Notifier> = match TelegramConfig::load_from_env() {
        Ok(config) => Arc::new(TelegramNotifier::new(config)),
        Err(e) => {
            warn!("Telegram notifications disabled ({}), logging status instead", e);
            Arc::new(LogNotifier)
        }
    };

    let quotes = match env::var("JUPITER_API_URL") {
        Ok(url) => JupiterApiClient::with_base_url(url),
        Err(_) => JupiterApiClient::new(),
    };

    let executor = SwapExecutor::new(
        Arc::new(quotes),
        Arc::new(RpcSubmitter::new(solana_config.create_rpc_client())),
        Arc::new(KeypairSigner::new(solana_config.keypair.clone())),
        notifier,
        executor_config,
    );

    info!("Executing {} swap(s) via {}", requests.len(), solana_config.rpc_url);
    let results = executor.execute_batch(&requests).await;

    let mut failures = 0;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(outcome) => info!(
                "{} {}: {} after {} attempt(s) at {} bps",
                request.direction,
                request.counter_token_address,
                outcome.signature,
                outcome.attempts,
                outcome.slippage_bps
            ),
            Err(e) => {
                failures += 1;
                error!("{} {}: {}", request.direction, request.counter_token_address, e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} swaps failed", failures, requests.len()).into());
    }
    Ok(())
}

/// One request per comma-separated token in `SWAP_TOKENS`.
fn load_requests(config: &ExecutorConfig) -> Result<Vec<SwapRequest>, ConfigError> {
    let direction: SwapDirection = env_or("SWAP_DIRECTION", SwapDirection::Buy)?;
    let amount: u64 = env_parsed("SWAP_AMOUNT_LAMPORTS")?;
    let slippage_bps: u16 = env_or("SWAP_SLIPPAGE_BPS", 50)?;

    let tokens = env_required("SWAP_TOKENS")?;
    let requests: Vec<SwapRequest> = tokens
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| SwapRequest {
            max_attempts: config.max_attempts,
            ..SwapRequest::new(direction, amount, token, slippage_bps)
        })
        .collect();

    if requests.is_empty() {
        return Err(ConfigError::Invalid { key: "SWAP_TOKENS", value: tokens });
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = [
        "SWAP_DIRECTION",
        "SWAP_AMOUNT_LAMPORTS",
        "SWAP_SLIPPAGE_BPS",
        "SWAP_TOKENS",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    // Single test so the runner's variables are never mutated concurrently.
    #[test]
    fn request_env_errors_name_the_variable() {
        let config = ExecutorConfig::default();
        clear();

        let err = load_requests(&config).unwrap_err();
        assert!(err.to_string().contains("SWAP_AMOUNT_LAMPORTS"), "{}", err);

        env::set_var("SWAP_AMOUNT_LAMPORTS", "ten");
        let err = load_requests(&config).unwrap_err();
        assert!(err.to_string().contains("SWAP_AMOUNT_LAMPORTS"), "{}", err);

        env::set_var("SWAP_AMOUNT_LAMPORTS", "1000000");
        let err = load_requests(&config).unwrap_err();
        assert!(err.to_string().contains("SWAP_TOKENS"), "{}", err);

        env::set_var("SWAP_TOKENS", " , ");
        let err = load_requests(&config).unwrap_err();
        assert!(err.to_string().contains("SWAP_TOKENS"), "{}", err);

        env::set_var("SWAP_DIRECTION", "hold");
        let err = load_requests(&config).unwrap_err();
        assert!(err.to_string().contains("SWAP_DIRECTION"), "{}", err);

        env::set_var("SWAP_DIRECTION", "sell");
        env::set_var("SWAP_TOKENS", "TokenA, TokenB");
        let requests = load_requests(&config);
        clear();

        let requests = requests.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].counter_token_address, "TokenB");
        assert_eq!(requests[0].direction, SwapDirection::Sell);
        assert_eq!(requests[0].slippage_bps, 50);
        assert_eq!(requests[0].max_attempts, config.max_attempts);
    }
}
