//! Computes the EIP-1559 fee parameters used for auction creation
//! transactions from what the connected node reports.

pub mod eth_node;
mod estimator;

pub use estimator::{
    DEFAULT_PRIORITY_FEE,
    FeeEstimator,
    FeeParameters,
    FeeQueryFailed,
    MAX_FEE_MULTIPLIER,
    PriorityFeePolicy,
};
use anyhow::Result;

/// Fee related queries against an Ethereum node. All values are in wei.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait FeeQuerying: Send + Sync {
    /// The node's current gas price (`eth_gasPrice`).
    async fn gas_price(&self) -> Result<u128>;

    /// The node's suggestion for the priority fee
    /// (`eth_maxPriorityFeePerGas`).
    async fn suggested_priority_fee(&self) -> Result<u128>;
}
