//! ferrite-mlp server
//!
//! Serves one network over HTTP. Every request takes the single session
//! lock, waiting at most `--lock-timeout-ms` before answering 503.
//!
//! Run with:
//!   cargo run --bin mlp-server --release -- --import-model model.json
//!
//! Routes:
//!   GET  /health   liveness
//!   GET  /model    topology and hyperparameters (JSON)
//!   POST /predict  CSV lines in, formatted outputs out
//!   POST /train    CSV lines in, one online update per line
//!   POST /test     CSV lines in, statistics out (JSON)
//!   POST /export   write the model to the configured export path

mod handlers;
mod routes;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use tiny_http::Server;

use ferrite_mlp::{AppParameters, PredictOutputFormat, Session};

use state::{ServerState, DEFAULT_LOCK_TIMEOUT};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve a multilayer perceptron over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// JSON parameters file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model JSON to serve; a fresh network is built from the config otherwise
    #[arg(long)]
    import_model: Option<PathBuf>,

    /// Where POST /export writes the model
    #[arg(long)]
    export_model: Option<PathBuf>,

    #[arg(long, value_enum)]
    output_format: Option<PredictOutputFormat>,

    /// Longest wait for the session lock, in milliseconds
    #[arg(long, default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64)]
    lock_timeout_ms: u64,

    #[arg(short, long)]
    verbose: bool,
}

fn session(args: &Args) -> ferrite_mlp::Result<Session> {
    let mut params = match &args.config {
        Some(path) => AppParameters::load_json(path)?,
        None => AppParameters::default(),
    };
    if args.import_model.is_some() {
        params.import_model = args.import_model.clone();
    }
    if args.export_model.is_some() {
        params.export_model = args.export_model.clone();
    }
    if let Some(format) = args.output_format {
        params.predict_output_format = format;
    }
    let mut session = Session::new(params);
    session.prepare()?;
    Ok(session)
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let session = match session(&args) {
        Ok(s) => s,
        Err(e) => {
            log::error!("cannot prepare the network: {e}");
            return ExitCode::FAILURE;
        }
    };
    let server = match Server::http(args.addr.as_str()) {
        Ok(s) => s,
        Err(e) => {
            log::error!("cannot bind {}: {e}", args.addr);
            return ExitCode::FAILURE;
        }
    };

    let shared_state = ServerState::new(session, Duration::from_millis(args.lock_timeout_ms));
    log::info!("listening on http://{}", args.addr);

    // One thread per request; the session lock serializes them.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    ExitCode::SUCCESS
}
