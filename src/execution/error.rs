use std::time::Duration;

use solana_sdk::signature::Signature;
use thiserror::Error;

/// Errors surfaced by `SwapExecutor::execute_swap`.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid swap request: {0}")]
    InvalidRequest(String),

    #[error("No route available: {0}")]
    NoRouteAvailable(String),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Confirmation timed out for transaction {signature}")]
    ConfirmationTimeout { signature: Signature },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Quote is stale: fetched {age:?} before the blockhash")]
    StaleQuote { age: Duration },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Swap failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        #[source]
        last_error: Box<SwapError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapErrorKind {
    InvalidRequest,
    NoRouteAvailable,
    SubmissionRejected,
    ConfirmationTimeout,
    SigningFailed,
    StaleQuote,
    Network,
    Exhausted,
}

impl SwapError {
    pub fn kind(&self) -> SwapErrorKind {
        match self {
            SwapError::InvalidRequest(_) => SwapErrorKind::InvalidRequest,
            SwapError::NoRouteAvailable(_) => SwapErrorKind::NoRouteAvailable,
            SwapError::SubmissionRejected(_) => SwapErrorKind::SubmissionRejected,
            SwapError::ConfirmationTimeout { .. } => SwapErrorKind::ConfirmationTimeout,
            SwapError::SigningFailed(_) => SwapErrorKind::SigningFailed,
            SwapError::StaleQuote { .. } => SwapErrorKind::StaleQuote,
            SwapError::Network(_) => SwapErrorKind::Network,
            SwapError::Exhausted { .. } => SwapErrorKind::Exhausted,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            SwapErrorKind::NoRouteAvailable
            | SwapErrorKind::SubmissionRejected
            | SwapErrorKind::ConfirmationTimeout
            | SwapErrorKind::StaleQuote
            | SwapErrorKind::Network => true,
            SwapErrorKind::InvalidRequest
            | SwapErrorKind::SigningFailed
            | SwapErrorKind::Exhausted => false,
        }
    }

    /// The error that ended the last attempt, for `Exhausted`; otherwise self.
    pub fn root_cause(&self) -> &SwapError {
        match self {
            SwapError::Exhausted { last_error, .. } => last_error.root_cause(),
            other => other,
        }
    }
}

/// Failures reported by a quote provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuoteError {
    #[error("no route for {input} -> {output}: {reason}")]
    NoRoute {
        input: String,
        output: String,
        reason: String,
    },

    #[error("quote request failed: {0}")]
    Transport(String),

    #[error("unexpected quote response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            QuoteError::InvalidResponse(err.to_string())
        } else {
            QuoteError::Transport(err.to_string())
        }
    }
}

/// Failures reported by a transaction submitter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("blockhash expired")]
    BlockhashExpired,

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl From<solana_client::client_error::ClientError> for SubmitError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        SubmitError::Rpc(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SigningError {
    #[error("cannot decode swap transaction: {0}")]
    InvalidTransaction(String),

    #[error("signer {0} is not a required signer of the transaction")]
    SignerMismatch(String),

    #[error("{0}")]
    Other(String),
}

impl From<QuoteError> for SwapError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::NoRoute { .. } => SwapError::NoRouteAvailable(err.to_string()),
            QuoteError::InvalidResponse(_) => SwapError::NoRouteAvailable(err.to_string()),
            QuoteError::Transport(_) => SwapError::Network(err.to_string()),
        }
    }
}

impl From<SubmitError> for SwapError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(_) | SubmitError::BlockhashExpired => {
                SwapError::SubmissionRejected(err.to_string())
            }
            SubmitError::Rpc(_) => SwapError::Network(err.to_string()),
        }
    }
}

impl From<SigningError> for SwapError {
    fn from(err: SigningError) -> Self {
        SwapError::SigningFailed(err.to_string())
    }
}
