use clap::Parser;
use devfleet::cli::Cli;
use devfleet::commands::{self, CommandResponse, Request};
use devfleet::fleet::FleetCore;
use devfleet::infrastructure::config::DataPaths;
use devfleet::infrastructure::logging;
use serde_json::Value;
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging();

    let paths = DataPaths::resolve(cli.data_dir.as_deref());
    log::debug!("Data directory: {}", paths.root().display());

    match cli.command.into_request() {
        Ok(Some(request)) => run_once(&paths, request),
        Ok(None) => match serve(paths) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("Serve loop failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Err(e) => print_reply(CommandResponse::<Value>::err(e)),
    }
}

fn run_once(paths: &DataPaths, request: Request) -> ExitCode {
    let request = match request {
        Request::SelectProjectFolder { path: None } => Request::SelectProjectFolder {
            path: read_chosen_path(),
        },
        other => other,
    };

    let mut core = FleetCore::open(paths);
    print_reply(commands::dispatch(&mut core, request))
}

/// The folder picker belongs to the caller; it hands the choice over on
/// stdin. EOF or an empty line is a cancel.
fn read_chosen_path() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()).filter(|p| !p.is_empty()),
        Err(e) => {
            log::warn!("Could not read folder choice: {e}");
            None
        }
    }
}

fn print_reply(reply: CommandResponse<Value>) -> ExitCode {
    let success = reply.success;
    match serde_json::to_string(&reply) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Failed to serialize reply: {e}");
            return ExitCode::FAILURE;
        }
    }
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn serve(paths: DataPaths) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(serve_lines(paths))
}

/// One request per stdin line, one reply per stdout line, strictly in order.
async fn serve_lines(paths: DataPaths) -> anyhow::Result<()> {
    let core = Arc::new(Mutex::new(FleetCore::open(&paths)));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    log::info!("Serving requests on stdin");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let core = Arc::clone(&core);
        let reply = tokio::task::spawn_blocking(move || {
            let mut core = core.blocking_lock();
            commands::handle_line(&mut core, &line)
        })
        .await
        .unwrap_or_else(|e| CommandResponse::err(format!("Request handler failed: {e}")));

        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    log::info!("Input closed, shutting down");
    core.lock().await.shutdown();
    Ok(())
}
