//! Ethereum node `FeeQuerying` implementation.

use {
    crate::FeeQuerying,
    alloy::providers::Provider,
    anyhow::{Context, Result},
    ethrpc::AlloyProvider,
};

#[async_trait::async_trait]
impl FeeQuerying for AlloyProvider {
    async fn gas_price(&self) -> Result<u128> {
        self.get_gas_price()
            .await
            .context("failed to get node gas price")
    }

    async fn suggested_priority_fee(&self) -> Result<u128> {
        self.get_max_priority_fee_per_gas()
            .await
            .context("failed to get node priority fee suggestion")
    }
}
