// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable, clippy::indexing_slicing)]

use std::io::Read;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use unreal_pilot::batch::{self, BatchResult};
use unreal_pilot::registry::{catalog, CommandTable};
use unreal_pilot::remote::{self, ConnectionSlot};
use unreal_pilot::settings::{self, PilotSettings, Transport};
use unreal_pilot::{execute_single, paths, report, run_batch};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "unreal-pilot",
    about = "Run language-model command batches against the Unreal editor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to <config dir>/unreal-pilot/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Transport to the editor plugin
    #[arg(long, global = true, value_enum)]
    transport: Option<Transport>,

    /// TCP host
    #[arg(long, global = true)]
    host: Option<String>,

    /// TCP port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// HTTP bridge base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and run a command batch (model output, JSON or literal text)
    Batch {
        /// Batch text; `-` or nothing reads stdin
        input: Option<String>,
        /// Read the batch from a file instead
        #[arg(long, conflicts_with = "input")]
        file: Option<PathBuf>,
    },
    /// Run a single command
    Run {
        /// Command name
        command: String,
        /// Parameters as a JSON object or dict(...) literal
        params: Option<String>,
    },
    /// Show what a batch would send, without contacting the editor
    Extract {
        /// Batch text; `-` or nothing reads stdin
        input: Option<String>,
    },
    /// List known commands or describe one
    Commands {
        /// Category slug or command name
        topic: Option<String>,
        /// Print the tool definitions handed to the language model
        #[arg(long)]
        tools: bool,
    },
    /// Show the effective settings
    Config {
        /// Save the effective settings (flags included) to the --config file, or
        /// <config dir>/unreal-pilot/settings.json without it
        #[arg(long)]
        write: bool,
    },
}

// ── Setup ────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_env("UNREAL_PILOT_LOG").unwrap_or_else(|_| EnvFilter::new("unreal_pilot=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> PilotSettings {
    let loaded = match &cli.config {
        Some(path) => settings::load_settings_file(path).map(Some),
        None => settings::load_settings(&paths::config_dir()),
    };
    let mut s = match loaded {
        Ok(found) => found.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let conn = &mut s.connection;
    if let Some(transport) = cli.transport {
        conn.transport = transport;
    }
    if let Some(host) = &cli.host {
        conn.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        conn.port = port;
    }
    if let Some(base_url) = &cli.base_url {
        conn.base_url = Some(base_url.clone());
    }
    if let Some(timeout) = cli.timeout {
        conn.timeout_secs = timeout;
    }
    s
}

fn load_table(s: &PilotSettings) -> CommandTable {
    let result = if s.command_table.is_none() {
        // A commands.json dropped next to settings.json replaces the built-in table.
        let user_table = paths::command_table_path(&paths::config_dir());
        if user_table.exists() {
            CommandTable::load(&user_table)
        } else {
            Ok(CommandTable::builtin())
        }
    } else {
        s.command_table()
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    })
}

fn open_connection(s: &PilotSettings) -> ConnectionSlot {
    let slot = ConnectionSlot::default();
    match remote::connect(&s.connection) {
        Ok(conn) => slot.set(conn),
        Err(e) => warn!(error = %e, "editor plugin unreachable; commands will report no connection"),
    }
    slot
}

fn read_input(input: Option<&str>, file: Option<&PathBuf>) -> String {
    if let Some(path) = file {
        return std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error: could not read {}: {e}", path.display());
            process::exit(1);
        });
    }
    match input {
        Some(text) if text != "-" => text.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("Error: could not read stdin: {e}");
                process::exit(1);
            });
            buf
        }
    }
}

// ── Output ───────────────────────────────────────────────────────

fn print_result(result: &BatchResult, raw_json: bool) {
    if raw_json {
        println!("{}", report::to_json(result, true));
    } else {
        println!("{}", report::render_text(result));
    }
}

fn print_value(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn exit_for(result: &BatchResult) {
    if result.has_errors() {
        process::exit(1);
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let s = load_settings(&cli);
    let raw = cli.json;

    match &cli.command {
        Commands::Batch { input, file } => {
            let text = read_input(input.as_deref(), file.as_ref());
            let table = load_table(&s);
            let slot = open_connection(&s);
            let result = run_batch(text, &table, &slot);
            print_result(&result, raw);
            exit_for(&result);
        }
        Commands::Run { command, params } => {
            let table = load_table(&s);
            let slot = open_connection(&s);
            let params = params.clone().map_or(Value::Null, Value::String);
            let envelope = execute_single(&slot, &table, command, &params);
            let result = BatchResult(vec![envelope]);
            print_result(&result, raw);
            exit_for(&result);
        }
        Commands::Extract { input } => {
            let text = read_input(input.as_deref(), None);
            let table = load_table(&s);
            let planned = batch::plan(text, &table).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                process::exit(1);
            });
            if raw {
                print_value(&serde_json::to_value(&planned).unwrap_or_default());
            } else if planned.is_empty() {
                println!("No commands found.");
            } else {
                for p in &planned {
                    let name = p.command.as_deref().unwrap_or("-");
                    let params = Value::Object(p.params.clone());
                    match &p.error {
                        None => println!("[{}] {name} {params}", p.index),
                        Some(e) => println!("[{}] {name} {params}  !! {e}", p.index),
                    }
                }
            }
            if planned.iter().any(|p| !p.valid) {
                process::exit(1);
            }
        }
        Commands::Commands { topic, tools } => {
            let table = load_table(&s);
            if *tools {
                print_value(&catalog::to_llm_tools(&table));
            } else if raw {
                print_value(&catalog::to_json(&table));
            } else {
                println!("{}", catalog::help_text(&table, topic.as_deref()));
            }
        }
        Commands::Config { write } => {
            if *write {
                let saved = match &cli.config {
                    Some(path) => settings::save_settings_file(path, &s).map(|()| path.clone()),
                    None => settings::save_settings(&paths::config_dir(), &s),
                };
                match saved {
                    Ok(path) => eprintln!("Saved settings to {}", path.display()),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        process::exit(1);
                    }
                }
            }
            print_value(&serde_json::to_value(&s).unwrap_or_default());
        }
    }
}
