//! Creates auctions on-chain. Every call results in at most one transaction;
//! nothing is retried.

use {
    crate::{
        auction::{self, ValidationError},
        contract::{AuctionContract, ChainError, TxOptions},
    },
    alloy::primitives::TxHash,
    gas_price_estimation::{FeeEstimator, FeeQueryFailed},
    std::{
        sync::Arc,
        time::{Duration, Instant},
    },
};

/// Number of blocks a transaction needs to be included in before the auction
/// counts as created.
pub const REQUIRED_CONFIRMATIONS: u64 = 1;

/// Node error messages indicating that the offered fees were too low. The
/// wording differs between node implementations.
const UNDERPRICED: &[&str] = &[
    "transaction underpriced",
    "replacement transaction underpriced",
    "max fee per gas less than block base fee",
    "max priority fee per gas higher than max fee per gas",
    "fee cap less than block base fee",
];

/// Revert message of the contract's own end time check.
const END_TIME_REVERT: &str = "End time must be in the future";

#[derive(Debug, Clone)]
pub struct Config {
    /// Gas limit of every auction creation transaction. It is not estimated.
    pub gas_limit: u64,
    /// How long to wait for the transaction to be mined.
    pub confirmation_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gas_limit: 1_000_000,
            confirmation_timeout: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Invalid data types provided.")]
    InvalidRequestShape,
    #[error("End time must be in the future.")]
    PastEndTime,
    #[error("Transaction underpriced. Please increase the gas fee.")]
    Underpriced,
    #[error("auction rejected by contract: {0}")]
    ContractRejected(String),
    #[error(transparent)]
    FeeQueryFailed(#[from] FeeQueryFailed),
    #[error("timed out waiting for confirmation of {tx_hash}")]
    ConfirmationTimeout { tx_hash: TxHash },
    #[error("{0}")]
    SubmissionFailed(String),
}

impl SubmissionError {
    fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequestShape => "invalid_request_shape",
            Self::PastEndTime => "past_end_time",
            Self::Underpriced => "underpriced",
            Self::ContractRejected(_) => "contract_rejected",
            Self::FeeQueryFailed(_) => "fee_query_failed",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::SubmissionFailed(_) => "submission_failed",
        }
    }
}

impl From<ValidationError> for SubmissionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidType => Self::InvalidRequestShape,
            ValidationError::PastEndTime => Self::PastEndTime,
        }
    }
}

impl From<ChainError> for SubmissionError {
    /// Structured revert data and error codes are trusted first, node
    /// messages are only matched as a fallback.
    fn from(err: ChainError) -> Self {
        let reason = match err.revert_reason {
            Some(reason) => Some(reason),
            None if err.code == Some(ChainError::EXECUTION_REVERTED) => Some(err.message.clone()),
            None => None,
        };
        if let Some(reason) = reason {
            return if reason.contains(END_TIME_REVERT) {
                Self::PastEndTime
            } else {
                Self::ContractRejected(reason)
            };
        }

        let message = err.message.to_lowercase();
        if UNDERPRICED.iter().any(|signature| message.contains(signature)) {
            return Self::Underpriced;
        }
        if err.message.contains(END_TIME_REVERT) {
            return Self::PastEndTime;
        }
        Self::SubmissionFailed(err.message)
    }
}

pub struct Submitter {
    contract: Arc<dyn AuctionContract>,
    fees: Arc<FeeEstimator>,
    config: Config,
    metrics: &'static Metrics,
}

impl Submitter {
    pub fn new(contract: Arc<dyn AuctionContract>, fees: Arc<FeeEstimator>, config: Config) -> Self {
        Self {
            contract,
            fees,
            config,
            metrics: Metrics::instance(observe::metrics::get_storage_registry()).unwrap(),
        }
    }

    /// Validates the raw request body and creates the auction it describes.
    /// Returns the hash of the mined transaction. `now` is the current Unix
    /// time in seconds.
    pub async fn create_auction(&self, body: &[u8], now: u64) -> Result<TxHash, SubmissionError> {
        let result = self.try_create_auction(body, now).await;
        let label = match &result {
            Ok(_) => "success",
            Err(err) => err.label(),
        };
        self.metrics.submissions.with_label_values(&[label]).inc();
        result
    }

    async fn try_create_auction(&self, body: &[u8], now: u64) -> Result<TxHash, SubmissionError> {
        let request = auction::validate(body, now)?;
        tracing::debug!(?request, "validated auction request");

        let fees = self.fees.estimate().await?;
        let options = TxOptions {
            gas_limit: self.config.gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        };
        tracing::debug!(?options, "estimated transaction fees");

        let pending = self
            .contract
            .create_auction(&request, options)
            .await
            .inspect_err(|err| tracing::warn!(?err, "failed to submit auction creation"))?;
        tracing::info!(tx_hash = ?pending.tx_hash, "submitted auction creation");

        let start = Instant::now();
        let confirmation = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.contract.wait_for_confirmation(&pending, REQUIRED_CONFIRMATIONS),
        )
        .await
        .map_err(|_| {
            tracing::warn!(tx_hash = ?pending.tx_hash, "timed out waiting for confirmation");
            SubmissionError::ConfirmationTimeout {
                tx_hash: pending.tx_hash,
            }
        })?;
        let tx_hash = confirmation.inspect_err(
            |err| tracing::warn!(tx_hash = ?pending.tx_hash, ?err, "auction creation failed"),
        )?;

        self.metrics
            .confirmation_seconds
            .observe(start.elapsed().as_secs_f64());
        tracing::info!(?tx_hash, "auction created");
        Ok(tx_hash)
    }
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "auction")]
struct Metrics {
    /// Auction creation requests by outcome.
    #[metric(labels("result"))]
    submissions: prometheus::IntCounterVec,

    /// Time it took for auction creations to get confirmed.
    #[metric(buckets(1, 2, 5, 10, 20, 30, 60, 120, 300))]
    confirmation_seconds: prometheus::Histogram,
}
