// # dhcp-leases - dnsmasq lease script
//
// Invoked by dnsmasq (`--dhcp-script`) once per lease event. Mirrors the
// event into the lease table and exits.
//
// This binary is a THIN integration layer:
// 1. Reading configuration from environment variables
// 2. Parsing the command line into an invocation
// 3. Building the lease store through the registry
// 4. Running the dispatcher and mapping the outcome to an exit code
//
// All lease logic lives in lease-core.
//
// ## Usage
//
// ```text
// dhcp-leases <init|show|add|old|del|clear|tftp> [mac_address] [ip_address]
//             [client_hostname] [client_id]
// ```
//
// Fields may also be tagged (`client_id=01:aa:bb`) after the positional ones.
// `add` and `old` read the lease expiry from `DNSMASQ_LEASE_EXPIRES`.
//
// ## Configuration
//
// - `DHCP_LEASES_STORE_TYPE`: Store type. Only ovsdb, the default
// - `DHCP_LEASES_OVSDB_REMOTE`: `unix:<path>` or `tcp:<host>:<port>`
// - `DHCP_LEASES_DATABASE`: OVSDB database name
// - `DHCP_LEASES_TABLE`: OVSDB table name
// - `DHCP_LEASES_TIMEOUT_SECS`: OVSDB connect and request timeout
// - `DHCP_LEASES_LOG_LEVEL`: trace, debug, info, warn, error. Default warn
//
// Logs go to stderr without ANSI colours, since dnsmasq copies script stderr
// into its own log. stdout carries only `show` output.
//
// ## Example
//
// ```bash
// export DHCP_LEASES_OVSDB_REMOTE=tcp:127.0.0.1:6640
// DNSMASQ_LEASE_EXPIRES=1718000000 dhcp-leases add aa:bb:cc:dd:ee:ff 10.0.0.5 host1
// dhcp-leases show
// ```

use anyhow::{Context, Result};
use lease_core::{
    Dispatcher, Error, ErrorKind, InterpreterConfig, Invocation, OvsdbConfig, Outcome,
    ProcessEnvironment, StoreConfig, StoreRegistry,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Exit codes for the lease script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeaseExitCode {
    /// Event recorded, or its store failure reported
    Success = 0,
    /// Configuration error or missing environment
    ConfigError = 1,
    /// Bad arguments or unknown command
    UsageError = 2,
    /// Runtime could not be set up
    RuntimeError = 3,
}

impl From<LeaseExitCode> for ExitCode {
    fn from(code: LeaseExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Error> for LeaseExitCode {
    fn from(err: &Error) -> Self {
        match err.kind() {
            ErrorKind::Usage => LeaseExitCode::UsageError,
            ErrorKind::Environment => LeaseExitCode::ConfigError,
            ErrorKind::StoreOperation | ErrorKind::StoreConnectivity => LeaseExitCode::Success,
        }
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    store_type: String,
    ovsdb_remote: Option<String>,
    database: Option<String>,
    table: Option<String>,
    timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let timeout_secs = env::var("DHCP_LEASES_TIMEOUT_SECS")
            .ok()
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("DHCP_LEASES_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            store_type: env::var("DHCP_LEASES_STORE_TYPE").unwrap_or_else(|_| "ovsdb".to_string()),
            ovsdb_remote: env::var("DHCP_LEASES_OVSDB_REMOTE").ok(),
            database: env::var("DHCP_LEASES_DATABASE").ok(),
            table: env::var("DHCP_LEASES_TABLE").ok(),
            timeout_secs,
            log_level: env::var("DHCP_LEASES_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // Each event is its own process, so the table must outlive it
        match self.store_type.as_str() {
            "ovsdb" => {}
            "memory" => anyhow::bail!(
                "DHCP_LEASES_STORE_TYPE=memory does not persist between events. \
                Supported types: ovsdb"
            ),
            _ => anyhow::bail!(
                "DHCP_LEASES_STORE_TYPE '{}' is not supported. \
                Supported types: ovsdb",
                self.store_type
            ),
        }

        if let Some(timeout) = self.timeout_secs
            && (!(1..=300).contains(&timeout))
        {
            anyhow::bail!(
                "DHCP_LEASES_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        self.log_level()?;
        self.store_config().validate()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "DHCP_LEASES_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }

    /// Store configuration selected by the environment
    fn store_config(&self) -> StoreConfig {
        let defaults = OvsdbConfig::default();
        StoreConfig::Ovsdb(OvsdbConfig {
            remote: self.ovsdb_remote.clone().unwrap_or(defaults.remote),
            database: self.database.clone().unwrap_or(defaults.database),
            table: self.table.clone().unwrap_or(defaults.table),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        })
    }
}

/// Log subscriber writing plain text to `writer`
fn subscriber<W>(level: Level, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

/// Registry with every persistent store compiled into this binary
fn registry() -> StoreRegistry {
    let registry = StoreRegistry::new();

    #[cfg(feature = "ovsdb")]
    lease_store_ovsdb::register(&registry);

    registry
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env().and_then(|cfg| cfg.validate().map(|_| cfg)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return LeaseExitCode::ConfigError.into();
        }
    };

    let log_level = config.log_level().unwrap_or(Level::WARN);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber(log_level, std::io::stderr)) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LeaseExitCode::RuntimeError.into();
    }

    let invocation = match Invocation::parse(
        env::args().skip(1),
        &ProcessEnvironment,
        &InterpreterConfig::default(),
    ) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!("{}", e);
            return LeaseExitCode::from(&e).into();
        }
    };

    let store = match registry().create_store(&config.store_config()) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create {} store: {}", config.store_type, e);
            return LeaseExitCode::ConfigError.into();
        }
    };

    // One event per process: no worker threads
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LeaseExitCode::RuntimeError.into();
        }
    };

    let dispatcher = Dispatcher::new(store);
    let result = rt.block_on(async {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        dispatcher.dispatch(invocation, &mut out).await
    });

    match result {
        Ok(Outcome::StoreFailed { action, error }) => {
            debug!("{} reported as failed: {}", action, error);
            LeaseExitCode::Success.into()
        }
        Ok(outcome) => {
            debug!("Finished: {:?}", outcome);
            LeaseExitCode::Success.into()
        }
        Err(e) => LeaseExitCode::from(&e).into(),
    }
}
