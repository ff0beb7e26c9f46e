use {
    crate::{
        api,
        arguments::Arguments,
        contract::Onchain,
        submission::{self, Submitter},
    },
    alloy::{primitives::Address, providers::Provider},
    anyhow::{Context, Result, anyhow, ensure},
    clap::Parser,
    contracts::{MultiAuction, alloy::InstanceExt},
    ethrpc::AlloyProvider,
    gas_price_estimation::FeeEstimator,
    std::{sync::Arc, time::Duration},
    tokio::{net::TcpListener, signal, task},
};

/// How long in-flight requests get to finish once a shutdown was requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn start(args: impl Iterator<Item = String>) {
    // A missing `.env` file is fine, everything can come from the environment
    // or the command line.
    let dotenv = dotenvy::dotenv();
    let args = Arguments::parse_from(args);
    let obs_config = observe::Config::new(
        args.logging.log_filter.as_str(),
        args.logging.log_stderr_threshold.into_level(),
        args.logging.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    observe::metrics::setup_registry(None, None);
    if let Ok(path) = dotenv {
        tracing::info!(?path, "loaded environment file");
    }
    tracing::info!("running auction api with validated arguments:\n{}", args);

    if let Err(err) = run(args).await {
        tracing::error!(?err, "auction api failed");
        std::process::exit(1);
    }
}

pub async fn run(args: Arguments) -> Result<()> {
    let signer = ethrpc::alloy::signer_from_private_key(&args.private_key)?;
    let provider = ethrpc::alloy::provider_with_signer(&args.node_url, signer);

    let contract = connect_contract(&provider, args.chain_id, args.contract_address).await?;

    let fees = FeeEstimator::new(Arc::new(provider.clone()), args.priority_fee_policy());
    let submitter = Arc::new(Submitter::new(
        Arc::new(contract),
        Arc::new(fees),
        submission::Config {
            gas_limit: args.gas_limit,
            confirmation_timeout: args.confirmation_timeout,
        },
    ));

    let api_listener = TcpListener::bind(args.bind_address)
        .await
        .with_context(|| format!("could not bind API to {}", args.bind_address))?;
    let metrics_listener = TcpListener::bind(args.metrics_address)
        .await
        .with_context(|| format!("could not bind metrics to {}", args.metrics_address))?;

    let (shutdown_sender, shutdown_receiver) = tokio::sync::oneshot::channel();
    let serve_api = serve_api(submitter, api_listener, async {
        let _ = shutdown_receiver.await;
    });
    let metrics_task = task::spawn(serve_metrics(metrics_listener));

    futures::pin_mut!(serve_api);
    tokio::select! {
        result = &mut serve_api => Err(anyhow!("API task exited: {result:?}")),
        result = metrics_task => Err(anyhow!("metrics task exited: {result:?}")),
        _ = shutdown_signal() => {
            tracing::info!("gracefully shutting down API");
            let _ = shutdown_sender.send(());
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, serve_api).await {
                Ok(result) => result.context("API failed during shutdown"),
                Err(_) => {
                    tracing::error!("API shutdown exceeded timeout");
                    Ok(())
                }
            }
        }
    }
}

/// Makes sure the node is on the expected chain and the auction contract is
/// deployed at `address`.
async fn connect_contract(
    provider: &AlloyProvider,
    expected_chain_id: Option<u64>,
    address: Address,
) -> Result<Onchain> {
    let chain_id = provider
        .get_chain_id()
        .await
        .context("could not connect to node")?;
    if let Some(expected) = expected_chain_id {
        ensure!(
            chain_id == expected,
            "node is connected to chain {chain_id} but {expected} was expected"
        );
    }
    tracing::info!(chain_id, "connected to node");

    let instance = MultiAuction::Instance::deployed_at(address, provider).await?;
    let contract = Onchain::new(instance);
    tracing::info!(address = ?contract.address(), "using auction contract");
    Ok(contract)
}

/// Serves the auction API until `shutdown` resolves. In-flight requests are
/// finished before this returns.
pub async fn serve_api(
    submitter: Arc<Submitter>,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = api::handle_all_routes(submitter);
    tracing::info!(address = ?listener.local_addr().ok(), "serving auction api");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server failed")
}

async fn serve_metrics(listener: TcpListener) -> Result<()> {
    tracing::info!(address = ?listener.local_addr().ok(), "serving metrics");
    axum::serve(listener, observe::metrics::handle_metrics())
        .await
        .context("metrics server failed")
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept main signals for graceful shutdown
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(?err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    let sigint = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(?err, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        _ = sigterm => {}
        _ = sigint => {}
    }
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on windows
    std::future::pending().await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            contract::MockAuctionContract,
            submission::tests::{submitter, unused_fees},
        },
        alloy::providers::mock::Asserter,
    };

    const CONTRACT: Address = Address::repeat_byte(0x42);

    #[tokio::test]
    async fn connects_to_deployed_contract() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x89");
        asserter.push_success(&"0x6080604052");
        let provider = ethrpc::alloy::mocked_provider(asserter);

        let contract = connect_contract(&provider, Some(137), CONTRACT)
            .await
            .unwrap();
        assert_eq!(contract.address(), CONTRACT);
    }

    #[tokio::test]
    async fn rejects_unexpected_chain() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x1");
        let provider = ethrpc::alloy::mocked_provider(asserter);

        let err = connect_contract(&provider, Some(137), CONTRACT)
            .await
            .err()
            .unwrap();
        assert!(
            err.to_string()
                .contains("node is connected to chain 1 but 137 was expected")
        );
    }

    #[tokio::test]
    async fn rejects_missing_contract() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x1");
        asserter.push_success(&"0x");
        let provider = ethrpc::alloy::mocked_provider(asserter);

        let err = connect_contract(&provider, None, CONTRACT)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("no MultiAuction contract deployed"));
    }

    #[tokio::test]
    async fn fails_without_node() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("connection refused");
        let provider = ethrpc::alloy::mocked_provider(asserter);

        let err = connect_contract(&provider, None, CONTRACT)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("could not connect to node"));
    }

    #[tokio::test]
    async fn api_shuts_down_gracefully() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let submitter = Arc::new(submitter(MockAuctionContract::new(), unused_fees()));
        let (sender, receiver) = tokio::sync::oneshot::channel::<()>();
        let server = task::spawn(serve_api(submitter, listener, async {
            let _ = receiver.await;
        }));

        sender.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
