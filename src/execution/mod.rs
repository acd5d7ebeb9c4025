mod executor;
mod clients;
mod signer;
mod traits;
pub mod types;
pub mod error;
pub mod retry;
pub mod config;

pub use executor::SwapExecutor;
pub use clients::{
    JupiterApiClient,
    RpcSubmitter,
};
pub use signer::KeypairSigner;
pub use traits::{
    Notifier,
    QuoteProvider,
    SwapSigner,
    TransactionSubmitter,
};
pub use types::{
    SwapDirection,
    SwapRequest,
    QuoteResult,
    SubmissionOutcome,
    ConfirmationStatus,
};
pub use error::{SwapError, SwapErrorKind};
pub use retry::{BackoffPolicy, SlippagePolicy};
pub use config::{ConfigError, ExecutorConfig};
