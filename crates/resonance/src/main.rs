use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

use resonance::{
    handle_request, initialize_root, JsonRpcRequest, JsonRpcResponse, RootConfig, RootError,
    RootState,
};

/// Resonance: tiered clearance from emotional signatures.
#[derive(Parser, Debug)]
#[command(name = "resonance", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Base resonance frequency
        #[arg(long)]
        base_frequency: Option<f64>,
    },

    /// Run one authentication attempt and print the outcome
    Authenticate {
        /// Subject identifier
        subject: String,

        /// Emotional signature material
        #[arg(long)]
        signature: String,

        /// Consciousness pattern material
        #[arg(long)]
        pattern: String,

        /// Claimed resonance frequency
        #[arg(long, default_value = "432")]
        frequency: f64,

        /// Also check access against this level after authenticating
        #[arg(long)]
        require: Option<String>,
    },

    /// Verify a credential token
    Verify {
        token: String,
    },

    /// Show the service snapshot
    Status,
}

fn init_tracing(verbose: bool, config_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("resonance=debug,resonance_auth=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RootConfig, RootError> {
    match path {
        Some(p) => RootConfig::load(p),
        None => RootConfig::load(&RootConfig::default_config_path()),
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.verbose, "resonance=info");
            error!("{}", e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &config.logging.filter);

    if let Err(e) = run(cli, config) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: RootConfig) -> Result<(), RootError> {
    match cli.command {
        Commands::Init { base_frequency } => cmd_init(cli.config.as_ref(), config, base_frequency),
        Commands::Authenticate {
            subject,
            signature,
            pattern,
            frequency,
            require,
        } => {
            let state = start(config)?;
            cmd_authenticate(&state, subject, signature, pattern, frequency, require)
        }
        Commands::Verify { token } => {
            let state = start(config)?;
            print_call(&state, "auth/verify_credential", json!({ "token": token }))
        }
        Commands::Status => {
            let state = start(config)?;
            print_call(&state, "auth/snapshot", json!({}))
        }
    }
}

fn start(config: RootConfig) -> Result<RootState, RootError> {
    let secret = config.resolve_secret()?;
    initialize_root(config, secret)
}

fn cmd_init(
    config_path: Option<&PathBuf>,
    mut config: RootConfig,
    base_frequency: Option<f64>,
) -> Result<(), RootError> {
    if let Some(freq) = base_frequency {
        config.base_frequency = freq;
    }
    config.validate()?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(RootConfig::default_config_path);
    config.save(&save_path)?;
    info!(path = %save_path.display(), "configuration written");

    println!("Resonance configured.");
    println!("  Base frequency: {}", config.base_frequency);
    println!("  Config:         {}", save_path.display());
    println!(
        "  Set {} before running other commands.",
        resonance::SIGNING_SECRET_ENV
    );

    Ok(())
}

fn cmd_authenticate(
    state: &RootState,
    subject: String,
    signature: String,
    pattern: String,
    frequency: f64,
    require: Option<String>,
) -> Result<(), RootError> {
    print_call(
        state,
        "auth/authenticate",
        json!({
            "subject_id": &subject,
            "emotional_signature": signature,
            "consciousness_pattern": pattern,
            "claimed_frequency": frequency,
        }),
    )?;

    if let Some(level) = require {
        print_call(
            state,
            "auth/check_access",
            json!({ "subject_id": subject, "required_level": level }),
        )?;
    }
    Ok(())
}

fn print_call(state: &RootState, method: &str, params: serde_json::Value) -> Result<(), RootError> {
    let response = handle_request(state, &JsonRpcRequest::new(1, method, params));
    print_response(&response)
}

fn print_response(response: &JsonRpcResponse) -> Result<(), RootError> {
    if let Some(err) = &response.error {
        return Err(RootError::Rpc {
            code: err.code,
            message: err.message.clone(),
        });
    }
    let body = response.result.clone().unwrap_or(serde_json::Value::Null);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
