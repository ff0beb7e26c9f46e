use {
    crate::{
        api::{error, error_with_details},
        submission::{SubmissionError, Submitter},
    },
    alloy::primitives::TxHash,
    axum::{
        body::Bytes,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Json, Response},
    },
    serde::Serialize,
    std::{
        sync::Arc,
        time::{SystemTime, UNIX_EPOCH},
    },
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuctionCreated {
    message: &'static str,
    transaction_hash: TxHash,
}

pub async fn create_auction_handler(
    State(submitter): State<Arc<Submitter>>,
    body: Bytes,
) -> Response {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    match submitter.create_auction(&body, now).await {
        Ok(transaction_hash) => (
            StatusCode::OK,
            Json(AuctionCreated {
                message: "Auction created successfully",
                transaction_hash,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRequestShape => (
                StatusCode::BAD_REQUEST,
                error("InvalidRequestShape", "Invalid data types provided."),
            )
                .into_response(),
            Self::PastEndTime => (
                StatusCode::BAD_REQUEST,
                error("PastEndTime", "End time must be in the future."),
            )
                .into_response(),
            Self::Underpriced => (
                StatusCode::BAD_REQUEST,
                error(
                    "Underpriced",
                    "Transaction underpriced. Please increase the gas fee.",
                ),
            )
                .into_response(),
            Self::ContractRejected(reason) => (
                StatusCode::BAD_REQUEST,
                error_with_details("ContractRejected", "Auction rejected by contract.", reason),
            )
                .into_response(),
            Self::FeeQueryFailed(err) => {
                tracing::error!(?err, "could not determine transaction fees");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_with_details("FeeQueryFailed", "Failed to query network fees.", &err),
                )
                    .into_response()
            }
            err @ Self::ConfirmationTimeout { .. } => {
                tracing::error!(?err, "auction creation was not confirmed in time");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_with_details("ConfirmationTimeout", "Error creating auction", &err),
                )
                    .into_response()
            }
            Self::SubmissionFailed(details) => {
                tracing::error!(%details, "error creating auction");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_with_details("SubmissionFailed", "Error creating auction", details),
                )
                    .into_response()
            }
        }
    }
}
