pub mod bot;
pub mod execution;
mod solana_config;

pub use solana_config::{load_keypair, SolanaConfig};

// Re-export key types
pub use execution::{
    SwapExecutor,
    ExecutorConfig,
    SwapDirection,
    SwapRequest,
    SubmissionOutcome,
    SwapError,
    SwapErrorKind,
};

pub use bot::{
    LogNotifier,
    TelegramConfig,
    TelegramNotifier,
};
