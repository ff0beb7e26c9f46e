//! Access to the deployed auction contract.

use {
    crate::auction::AuctionCreationRequest,
    alloy::{
        network::ReceiptResponse,
        primitives::{Address, TxHash, U256},
        providers::{PendingTransactionBuilder, PendingTransactionError, Provider},
    },
    contracts::MultiAuction,
    ethrpc::alloy::errors::ContractErrorExt,
};

/// Transaction parameters used for the `createAuction` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A transaction that was accepted by the node but is not necessarily mined
/// yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub tx_hash: TxHash,
    /// The request the transaction was created for.
    pub request: AuctionCreationRequest,
}

/// Failure reported by the node or the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ChainError {
    /// JSON-RPC error code if the node answered with an error object.
    pub code: Option<i64>,
    pub message: String,
    /// Decoded revert reason if the node returned revert data.
    pub revert_reason: Option<String>,
}

impl ChainError {
    /// JSON-RPC error code nodes use for calls that reverted.
    pub const EXECUTION_REVERTED: i64 = 3;

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            revert_reason: None,
        }
    }

    fn from_rpc(err: &impl ContractErrorExt, message: String) -> Self {
        Self {
            code: err.error_payload().map(|payload| payload.code),
            message: err
                .error_payload()
                .map(|payload| payload.message.to_string())
                .unwrap_or(message),
            revert_reason: err.revert_reason(),
        }
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        let message = err.to_string();
        Self::from_rpc(&err, message)
    }
}

impl From<PendingTransactionError> for ChainError {
    fn from(err: PendingTransactionError) -> Self {
        let message = err.to_string();
        Self::from_rpc(&err, message)
    }
}

/// The auction contract operations needed to create auctions.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuctionContract: Send + Sync {
    /// Signs and sends a `createAuction` transaction. Returns as soon as the
    /// node accepted it.
    async fn create_auction(
        &self,
        request: &AuctionCreationRequest,
        options: TxOptions,
    ) -> Result<PendingTransaction, ChainError>;

    /// Waits until the transaction was mined and has the given number of
    /// confirmations. Fails if the transaction reverted.
    async fn wait_for_confirmation(
        &self,
        tx: &PendingTransaction,
        confirmations: u64,
    ) -> Result<TxHash, ChainError>;
}

/// [`AuctionContract`] backed by the deployed `MultiAuction` contract.
pub struct Onchain {
    instance: MultiAuction::Instance,
}

impl Onchain {
    pub fn new(instance: MultiAuction::Instance) -> Self {
        Self { instance }
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// Finds out why a mined transaction reverted by executing the same call
    /// from the same account on top of the block it was included in. Receipts
    /// carry no revert data.
    async fn replay_reverted(
        &self,
        request: &AuctionCreationRequest,
        from: Address,
        block: Option<u64>,
    ) -> ChainError {
        let mut call = self
            .instance
            .createAuction(
                request.auction_type,
                request.start_price,
                U256::from(request.end_time),
                request.price_decrement,
            )
            .from(from);
        if let Some(block) = block {
            call = call.block(block.into());
        }

        match call.call().await {
            Ok(_) => {
                tracing::warn!("reverted auction creation succeeds when replayed");
                ChainError::new("transaction reverted")
            }
            Err(err) => {
                let err = ChainError::from(err);
                if err.revert_reason.is_some() || err.code == Some(ChainError::EXECUTION_REVERTED) {
                    err
                } else {
                    tracing::warn!(?err, "failed to replay reverted auction creation");
                    ChainError::new("transaction reverted")
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl AuctionContract for Onchain {
    async fn create_auction(
        &self,
        request: &AuctionCreationRequest,
        options: TxOptions,
    ) -> Result<PendingTransaction, ChainError> {
        let pending = self
            .instance
            .createAuction(
                request.auction_type,
                request.start_price,
                U256::from(request.end_time),
                request.price_decrement,
            )
            .gas(options.gas_limit)
            .max_fee_per_gas(options.max_fee_per_gas)
            .max_priority_fee_per_gas(options.max_priority_fee_per_gas)
            .send()
            .await?;

        Ok(PendingTransaction {
            tx_hash: *pending.tx_hash(),
            request: *request,
        })
    }

    async fn wait_for_confirmation(
        &self,
        tx: &PendingTransaction,
        confirmations: u64,
    ) -> Result<TxHash, ChainError> {
        let receipt =
            PendingTransactionBuilder::new(self.instance.provider().root().clone(), tx.tx_hash)
                .with_required_confirmations(confirmations)
                .get_receipt()
                .await?;

        if !receipt.status() {
            return Err(self
                .replay_reverted(&tx.request, receipt.from(), receipt.block_number())
                .await);
        }
        Ok(receipt.transaction_hash())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{providers::mock::Asserter, rpc::json_rpc::ErrorPayload, transports::RpcError},
        ethrpc::alloy::errors::{
            testing_alloy_contract_error,
            testing_alloy_node_error,
            testing_alloy_revert_error,
        },
    };

    #[test]
    fn converts_revert_errors() {
        let err = ChainError::from(testing_alloy_revert_error(
            "End time must be in the future",
        ));
        assert_eq!(err.code, Some(3));
        assert!(err.message.starts_with("execution reverted"));
        assert!(
            err.revert_reason
                .unwrap()
                .contains("End time must be in the future")
        );
    }

    #[test]
    fn converts_node_errors() {
        let err = ChainError::from(alloy::contract::Error::TransportError(
            RpcError::ErrorResp(ErrorPayload {
                code: -32000,
                message: "transaction underpriced".into(),
                data: None,
            }),
        ));
        assert_eq!(
            err,
            ChainError {
                code: Some(-32000),
                message: "transaction underpriced".to_string(),
                revert_reason: None,
            }
        );

        let err = ChainError::from(testing_alloy_node_error());
        assert!(err.code.is_some());
        assert!(err.revert_reason.is_none());
    }

    #[test]
    fn converts_other_errors() {
        let err = ChainError::from(testing_alloy_contract_error());
        assert_eq!(err.code, None);
        assert_eq!(err.revert_reason, None);
        assert!(!err.message.is_empty());
    }

    fn onchain(asserter: Asserter) -> Onchain {
        let provider = ethrpc::alloy::mocked_provider(asserter);
        Onchain::new(MultiAuction::Instance::new(Address::ZERO, provider))
    }

    fn request() -> AuctionCreationRequest {
        AuctionCreationRequest {
            auction_type: 0,
            start_price: U256::from(100),
            end_time: 1_700_000_000,
            price_decrement: U256::from(1),
        }
    }

    #[tokio::test]
    async fn node_rejection_surfaces_as_chain_error() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("transaction underpriced");

        let options = TxOptions {
            gas_limit: 1_000_000,
            max_fee_per_gas: 2_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        };
        assert!(
            onchain(asserter)
                .create_auction(&request(), options)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn replaying_reverted_transactions_recovers_the_reason() {
        let asserter = Asserter::new();
        let revert = testing_alloy_revert_error("End time must be in the future");
        asserter.push_failure(revert.error_payload().unwrap().clone());

        let err = onchain(asserter)
            .replay_reverted(&request(), Address::repeat_byte(1), Some(42))
            .await;
        assert_eq!(err.code, Some(ChainError::EXECUTION_REVERTED));
        assert!(
            err.revert_reason
                .unwrap()
                .contains("End time must be in the future")
        );
    }

    #[tokio::test]
    async fn failed_replays_report_a_plain_revert() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("header not found");

        let err = onchain(asserter)
            .replay_reverted(&request(), Address::repeat_byte(1), None)
            .await;
        assert_eq!(err, ChainError::new("transaction reverted"));
    }
}
