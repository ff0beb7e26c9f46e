pub async fn liveness_handler() -> &'static str {
    "Auction API is running"
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            api::{handle_all_routes, response_body},
            contract::MockAuctionContract,
            submission::tests::{submitter, unused_fees},
        },
        axum::{
            body::Body,
            http::{Request, StatusCode},
        },
        std::sync::Arc,
        tower::ServiceExt,
    };

    #[tokio::test]
    async fn reports_liveness() {
        let router = handle_all_routes(Arc::new(submitter(
            MockAuctionContract::new(),
            unused_fees(),
        )));
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_body(response).await, b"Auction API is running");
    }
}
