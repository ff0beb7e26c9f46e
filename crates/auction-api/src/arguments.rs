use {
    alloy::primitives::Address,
    gas_price_estimation::{DEFAULT_PRIORITY_FEE, PriorityFeePolicy},
    std::{
        fmt::{self, Display, Formatter},
        net::SocketAddr,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(clap::Parser)]
pub struct LoggingArguments {
    #[clap(
        long,
        env,
        default_value = "warn,auction_api=debug,gas_price_estimation=debug,ethrpc=info"
    )]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Emit log lines as JSON objects.
    #[clap(long, env, action = clap::ArgAction::Set, default_value = "false")]
    pub use_json_logs: bool,
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PriorityFee {
    /// Always tip `--fixed-priority-fee`.
    Fixed,
    /// Tip whatever the node suggests.
    Suggested,
}

#[derive(clap::Parser)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Ethereum node URL to connect to.
    #[clap(long, env)]
    pub node_url: Url,

    /// Hex encoded private key of the account that sends the auction creation
    /// transactions.
    #[clap(long, env, hide_env_values = true)]
    pub private_key: String,

    /// Address of the deployed auction contract.
    #[clap(long, env)]
    pub contract_address: Address,

    #[clap(long, env, default_value = "0.0.0.0:3000")]
    pub bind_address: SocketAddr,

    #[clap(
        long,
        env,
        default_value_t = SocketAddr::from(([0, 0, 0, 0], observe::metrics::DEFAULT_METRICS_PORT)),
    )]
    pub metrics_address: SocketAddr,

    /// Chain id the node is expected to be connected to. Startup fails if the
    /// node reports a different one.
    #[clap(long, env)]
    pub chain_id: Option<u64>,

    /// Gas limit used for every auction creation transaction.
    #[clap(long, env, default_value = "1000000")]
    pub gas_limit: u64,

    /// How long a request waits for its transaction to be mined before it
    /// gives up.
    #[clap(
        long,
        env,
        default_value = "5m",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,

    /// How the priority fee of transactions gets determined.
    #[clap(long, env, value_enum, default_value = "fixed")]
    pub priority_fee: PriorityFee,

    /// Priority fee in wei used with `--priority-fee fixed`.
    #[clap(long, env, default_value_t = DEFAULT_PRIORITY_FEE)]
    pub fixed_priority_fee: u128,
}

impl Arguments {
    pub fn priority_fee_policy(&self) -> PriorityFeePolicy {
        match self.priority_fee {
            PriorityFee::Fixed => PriorityFeePolicy::Fixed(self.fixed_priority_fee),
            PriorityFee::Suggested => PriorityFeePolicy::Suggested,
        }
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            node_url,
            private_key,
            contract_address,
            bind_address,
            metrics_address,
            chain_id,
            gas_limit,
            confirmation_timeout,
            priority_fee,
            fixed_priority_fee,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "node_url: {node_url}")?;
        let _intentionally_ignored = private_key;
        writeln!(f, "private_key: SECRET")?;
        writeln!(f, "contract_address: {contract_address}")?;
        writeln!(f, "bind_address: {bind_address}")?;
        writeln!(f, "metrics_address: {metrics_address}")?;
        display_option(f, "chain_id", chain_id)?;
        writeln!(f, "gas_limit: {gas_limit}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(f, "priority_fee: {priority_fee:?}")?;
        writeln!(f, "fixed_priority_fee: {fixed_priority_fee}")?;
        Ok(())
    }
}

fn display_option(f: &mut Formatter<'_>, name: &str, option: &Option<impl Display>) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
