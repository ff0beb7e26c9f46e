use {crate::FeeQuerying, std::sync::Arc};

/// The max fee per gas is set to this multiple of the node's gas price so
/// that the transaction stays includable if the base fee rises for a few
/// blocks.
pub const MAX_FEE_MULTIPLIER: u128 = 2;

/// Priority fee tip that is paid when no other value is configured (=2 Gwei).
pub const DEFAULT_PRIORITY_FEE: u128 = 2_000_000_000;

/// How the priority fee (tip) of a transaction gets determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFeePolicy {
    /// Always tip the given amount of wei.
    Fixed(u128),
    /// Tip whatever the node suggests via `eth_maxPriorityFeePerGas`.
    Suggested,
}

impl Default for PriorityFeePolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_PRIORITY_FEE)
    }
}

/// EIP-1559 fee parameters in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to query network fees: {0:#}")]
pub struct FeeQueryFailed(#[source] pub anyhow::Error);

pub struct FeeEstimator {
    node: Arc<dyn FeeQuerying>,
    priority_fee: PriorityFeePolicy,
}

impl FeeEstimator {
    pub fn new(node: Arc<dyn FeeQuerying>, priority_fee: PriorityFeePolicy) -> Self {
        Self { node, priority_fee }
    }

    /// Queries the node once and derives the fee parameters for the next
    /// transaction.
    pub async fn estimate(&self) -> Result<FeeParameters, FeeQueryFailed> {
        let gas_price = self.node.gas_price().await.map_err(FeeQueryFailed)?;
        let max_fee_per_gas = gas_price.saturating_mul(MAX_FEE_MULTIPLIER);

        let priority_fee = match self.priority_fee {
            PriorityFeePolicy::Fixed(tip) => tip,
            PriorityFeePolicy::Suggested => self
                .node
                .suggested_priority_fee()
                .await
                .map_err(FeeQueryFailed)?,
        };
        tracing::debug!(gas_price, priority_fee, "queried network fees");

        // A tip above the fee cap gets rejected by the node.
        let max_priority_fee_per_gas = if priority_fee > max_fee_per_gas {
            tracing::warn!(
                priority_fee,
                max_fee_per_gas,
                "priority fee exceeds max fee per gas; capping it"
            );
            max_fee_per_gas
        } else {
            priority_fee
        };

        Ok(FeeParameters {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }
}
