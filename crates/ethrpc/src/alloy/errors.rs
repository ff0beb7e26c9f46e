#[cfg(any(test, feature = "test-util"))]
use alloy::transports::RpcError;
use alloy::{
    contract::Error as ContractError,
    providers::PendingTransactionError,
    rpc::json_rpc::ErrorPayload,
    sol_types::decode_revert_reason,
};

pub trait ContractErrorExt {
    /// The JSON-RPC error object the node answered with, if any.
    fn error_payload(&self) -> Option<&ErrorPayload>;

    /// Human readable revert reason if the node returned revert data that
    /// decodes to a known revert format (e.g. `Error(string)`).
    fn revert_reason(&self) -> Option<String>;
}

impl ContractErrorExt for ContractError {
    fn error_payload(&self) -> Option<&ErrorPayload> {
        match self {
            ContractError::TransportError(err) => err.as_error_resp(),
            _ => None,
        }
    }

    fn revert_reason(&self) -> Option<String> {
        let data = self.error_payload()?.as_revert_data()?;
        decode_revert_reason(&data)
    }
}

impl ContractErrorExt for PendingTransactionError {
    fn error_payload(&self) -> Option<&ErrorPayload> {
        match self {
            PendingTransactionError::TransportError(err) => err.as_error_resp(),
            _ => None,
        }
    }

    fn revert_reason(&self) -> Option<String> {
        let data = self.error_payload()?.as_revert_data()?;
        decode_revert_reason(&data)
    }
}

/// Create an arbitrary alloy error that did not come from the node.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_contract_error() -> ContractError {
    ContractError::NotADeploymentTransaction
}

/// Create an arbitrary alloy error the node answered with, without revert
/// data. Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_node_error() -> ContractError {
    ContractError::TransportError(RpcError::ErrorResp(ErrorPayload::internal_error()))
}

/// Creates the error a node returns when `eth_sendRawTransaction` (or gas
/// estimation) reverted with `Error(string)`.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_revert_error(reason: &str) -> ContractError {
    use alloy::sol_types::{Revert, SolError};

    let data = alloy::primitives::hex::encode_prefixed(
        Revert {
            reason: reason.to_string(),
        }
        .abi_encode(),
    );
    ContractError::TransportError(RpcError::ErrorResp(ErrorPayload {
        code: 3,
        message: format!("execution reverted: {reason}").into(),
        data: Some(
            serde_json::value::to_raw_value(&data)
                .expect("hex strings always serialize"),
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_revert_reasons() {
        let err = testing_alloy_revert_error("End time must be in the future");
        assert_eq!(err.error_payload().unwrap().code, 3);
        assert!(
            err.revert_reason()
                .unwrap()
                .contains("End time must be in the future")
        );

        assert!(testing_alloy_node_error().revert_reason().is_none());
        assert!(testing_alloy_contract_error().revert_reason().is_none());
    }
}
