use crate::commands::Request;
use crate::domains::registry::{AppSettings, ProjectConfig};
use crate::fleet::RunRequest;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// devfleet - run and manage local Node.js projects
#[derive(Debug, Parser)]
#[command(
    name = "devfleet",
    about = "devfleet - run and manage local Node.js projects",
    version = VERSION,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}

EXAMPLES:
    devfleet add ~/src/web              # Track a project
    devfleet list                       # Show tracked projects as JSON
    devfleet run <ID> ~/src/web dev     # Start a script in a new terminal
    devfleet runtime                    # Show the Node version manager
    devfleet serve                      # Answer JSON requests on stdin
    devfleet --version, -V              # Show version information
"
)]
pub struct Cli {
    /// Directory holding the project registry. Defaults to DEVFLEET_DATA_DIR
    /// or the platform data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a chosen folder; without PATH one line is read from stdin
    SelectFolder { path: Option<String> },
    /// List a project's scripts
    Scripts { path: String },
    /// Detect a project's package manager
    PackageManager { path: String },
    /// Run a script
    Run {
        project_id: String,
        path: String,
        script: String,
        /// npm, yarn, pnpm or bun
        #[arg(long)]
        package_manager: Option<String>,
        /// Node version to switch to first
        #[arg(long)]
        node_version: Option<String>,
    },
    /// Stop an attached run
    Stop { project_id: String },
    /// Report whether an attached run is alive
    Status { project_id: String },
    /// Detect installed editors
    Editors,
    /// Open a project in an editor (vscode, cursor, webstorm)
    Open { editor: String, path: String },
    /// Print the project registry
    List,
    /// Replace the project registry with a JSON document
    Save { config: String },
    /// Track a project directory
    Add { path: String },
    /// Stop tracking a project
    Remove { project_id: String },
    /// Show the Node version manager and its versions
    Runtime,
    /// Show the Node version a project pins
    RuntimeVersion { path: String },
    /// Pin (or with no VERSION, unpin) a project's Node version
    SetRuntimeVersion {
        project_id: String,
        version: Option<String>,
    },
    /// Choose a project's default script
    SelectScript { project_id: String, script: String },
    /// Change settings
    Settings {
        /// Open runs in a separate terminal window (false: attached runs)
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        external_terminal: bool,
    },
    /// Serve newline-delimited JSON requests on stdin
    Serve,
}

impl Command {
    /// The boundary request for a one-shot invocation; `None` for `serve`.
    /// A `select-folder` without a path must be resolved by the caller.
    pub fn into_request(self) -> Result<Option<Request>, String> {
        let request = match self {
            Command::SelectFolder { path } => Request::SelectProjectFolder { path },
            Command::Scripts { path } => Request::ListScripts { path },
            Command::PackageManager { path } => Request::DetectPackageManager { path },
            Command::Run {
                project_id,
                path,
                script,
                package_manager,
                node_version,
            } => Request::Run(RunRequest {
                project_id,
                path,
                script_name: script,
                package_manager,
                node_version,
            }),
            Command::Stop { project_id } => Request::Stop { project_id },
            Command::Status { project_id } => Request::CheckRunning { project_id },
            Command::Editors => Request::DetectEditors,
            Command::Open { editor, path } => Request::OpenInEditor { editor, path },
            Command::List => Request::LoadRegistry,
            Command::Save { config } => {
                let config: ProjectConfig = serde_json::from_str(&config)
                    .map_err(|e| format!("Invalid registry JSON: {e}"))?;
                Request::SaveRegistry { config }
            }
            Command::Add { path } => Request::AddProject { path },
            Command::Remove { project_id } => Request::RemoveProject { project_id },
            Command::Runtime => Request::GetRuntimeManagerInfo,
            Command::RuntimeVersion { path } => Request::DetectProjectRuntimeVersion { path },
            Command::SetRuntimeVersion {
                project_id,
                version,
            } => Request::SetProjectRuntimeVersion {
                project_id,
                version,
            },
            Command::SelectScript { project_id, script } => Request::SelectScript {
                project_id,
                script_name: script,
            },
            Command::Settings { external_terminal } => Request::UpdateSettings {
                settings: AppSettings {
                    run_in_external_terminal: external_terminal,
                },
            },
            Command::Serve => return Ok(None),
        };
        Ok(Some(request))
    }
}
