use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::Keypair,
};
use zeroize::Zeroize;

use crate::execution::config::{env_required, ConfigError};

pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

pub struct SolanaConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub keypair: Arc<Keypair>,
}

impl SolanaConfig {
    // Default mainnet configuration
    pub fn mainnet_default(keypair: Keypair) -> Self {
        Self {
            rpc_url: MAINNET_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
            keypair: Arc::new(keypair),
        }
    }

    pub fn custom(
        rpc_url: String,
        commitment: CommitmentConfig,
        keypair: Keypair
    ) -> Self {
        Self {
            rpc_url,
            commitment,
            keypair: Arc::new(keypair),
        }
    }

    /// Reads `SOLANA_RPC_URL` (defaults to mainnet) and the wallet from
    /// `SOLANA_KEYPAIR_PATH`.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let keypair_path = env_required("SOLANA_KEYPAIR_PATH")?;
        let keypair = load_keypair(Path::new(&keypair_path))?;

        Ok(match env::var("SOLANA_RPC_URL") {
            Ok(rpc_url) if !rpc_url.trim().is_empty() => {
                Self::custom(rpc_url.trim().to_string(), CommitmentConfig::confirmed(), keypair)
            }
            _ => Self::mainnet_default(keypair),
        })
    }

    pub fn create_rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }
}

/// Load a keypair file in the Solana CLI format (JSON array of 64 bytes).
pub fn load_keypair(path: &Path) -> Result<Keypair, ConfigError> {
    let mut contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Keypair(format!("{}: {}", path.display(), e)))?;
    let parsed: Result<Vec<u8>, _> = serde_json::from_str(&contents);
    contents.zeroize();

    let mut bytes = parsed
        .map_err(|e| ConfigError::Keypair(format!("{}: {}", path.display(), e)))?;
    let keypair = Keypair::from_bytes(&bytes)
        .map_err(|e| ConfigError::Keypair(format!("{}: {}", path.display(), e)));
    bytes.zeroize();

    keypair
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn loads_cli_keypair_file() {
        let keypair = Keypair::new();
        let path = temp_path("swap-executor-keypair");
        fs::write(&path, serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let loaded = load_keypair(&path);
        fs::remove_file(&path).ok();

        assert_eq!(loaded.unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn rejects_truncated_keypair() {
        let path = temp_path("swap-executor-short-keypair");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let loaded = load_keypair(&path);
        fs::remove_file(&path).ok();

        assert!(matches!(loaded, Err(ConfigError::Keypair(_))));
    }

    #[test]
    fn env_without_rpc_url_targets_mainnet() {
        let keypair = Keypair::new();
        let path = temp_path("swap-executor-env-keypair");
        fs::write(&path, serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        env::remove_var("SOLANA_RPC_URL");
        env::set_var("SOLANA_KEYPAIR_PATH", &path);
        let mainnet = SolanaConfig::load_from_env();

        env::set_var("SOLANA_RPC_URL", "http://127.0.0.1:8899");
        let local = SolanaConfig::load_from_env();

        env::remove_var("SOLANA_RPC_URL");
        env::remove_var("SOLANA_KEYPAIR_PATH");
        fs::remove_file(&path).ok();

        let mainnet = mainnet.unwrap();
        assert_eq!(mainnet.rpc_url, MAINNET_RPC_URL);
        assert_eq!(mainnet.commitment, CommitmentConfig::confirmed());
        assert_eq!(mainnet.keypair.pubkey(), keypair.pubkey());
        assert_eq!(local.unwrap().rpc_url, "http://127.0.0.1:8899");
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_keypair(Path::new("/nonexistent/wallet.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/wallet.json"));
    }
}
