//! Binary entry point for todolist.
//!
//! Serves the REST API or runs one-shot commands against the configured store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use todolist::observability::{self, InitOptions, PrometheusHandle};
use todolist::{BackendMode, Todo, TodoConfig, TodoId, TodoPatch, TodoService};

/// Todolist - a todo-list backend with Redis persistence and in-memory fallback.
#[derive(Parser)]
#[command(name = "todolist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API.
    Serve {
        /// Address to bind (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List all todos, newest first.
    List,

    /// Add a todo.
    Add {
        /// The todo text.
        text: String,
    },

    /// Mark a todo as complete.
    Complete {
        /// The todo ID.
        id: String,

        /// Mark as not complete instead.
        #[arg(long)]
        undo: bool,
    },

    /// Replace a todo's text.
    Edit {
        /// The todo ID.
        id: String,

        /// The new text.
        text: String,
    },

    /// Remove a todo.
    Remove {
        /// The todo ID.
        id: String,
    },

    /// Show todo counts.
    Stats,

    /// Check storage health.
    Health,
}

/// Main entry point.
fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let telemetry = match observability::init(
        &config,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, config, telemetry.prometheus().cloned());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(
    command: Commands,
    config: TodoConfig,
    prometheus: Option<PrometheusHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { host, port } => cmd_serve(config, host, port, prometheus),
        Commands::List => cmd_list(&TodoService::connect(&config)),
        Commands::Add { text } => cmd_add(&connect_for_change(&config), &text),
        Commands::Complete { id, undo } => {
            cmd_update(&connect_for_change(&config), id, TodoPatch::completed(!undo))
        },
        Commands::Edit { id, text } => {
            cmd_update(&connect_for_change(&config), id, TodoPatch::text(text))
        },
        Commands::Remove { id } => cmd_remove(&connect_for_change(&config), id),
        Commands::Stats => cmd_stats(&TodoService::connect(&config)),
        Commands::Health => cmd_health(&TodoService::connect(&config)),
    }
}

/// Warning for one-shot changes that cannot outlive the process.
fn volatile_warning(mode: BackendMode) -> Option<&'static str> {
    match mode {
        BackendMode::Durable => None,
        BackendMode::Volatile => Some(
            "Warning: Redis is unavailable. This command runs against a temporary in-memory \
             list, so todos from earlier runs are not visible and changes are discarded on exit.",
        ),
    }
}

/// Connects for a mutating command, warning when changes will not persist.
fn connect_for_change(config: &TodoConfig) -> TodoService {
    let service = TodoService::connect(config);
    if let Some(warning) = volatile_warning(service.mode()) {
        eprintln!("{warning}");
    }
    service
}

/// Loads configuration.
fn load_config(path: Option<&std::path::Path>) -> Result<TodoConfig, Box<dyn std::error::Error>> {
    if let Some(config_path) = path {
        return TodoConfig::load_from_file(config_path).map_err(std::convert::Into::into);
    }

    Ok(TodoConfig::load_default())
}

/// Formats a todo as a single line.
fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!(
        "[{mark}] {}  {}  ({})",
        todo.id,
        todo.text,
        todo.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Serve command.
#[cfg(feature = "http")]
fn cmd_serve(
    mut config: TodoConfig,
    host: Option<String>,
    port: Option<u16>,
    prometheus: Option<PrometheusHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let service = TodoService::connect(&config);
    todolist::http::serve(&config, service, prometheus)?;
    Ok(())
}

/// Serve command (feature not enabled).
#[cfg(not(feature = "http"))]
fn cmd_serve(
    _config: TodoConfig,
    _host: Option<String>,
    _port: Option<u16>,
    _prometheus: Option<PrometheusHandle>,
) -> Result<(), Box<dyn std::error::Error>> {
    Err(todolist::Error::FeatureNotEnabled("http".to_string()).into())
}

/// List command.
fn cmd_list(service: &TodoService) -> Result<(), Box<dyn std::error::Error>> {
    let overview = service.overview()?;

    if overview.todos.is_empty() {
        println!("No todos.");
        return Ok(());
    }

    for todo in &overview.todos {
        println!("{}", format_todo(todo));
    }
    println!();
    println!(
        "{} total, {} completed, {} pending ({} storage)",
        overview.stats.total,
        overview.stats.completed,
        overview.stats.pending,
        service.mode()
    );
    Ok(())
}

/// Add command.
fn cmd_add(service: &TodoService, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let todo = service.create(text)?;
    println!("Added: {}", format_todo(&todo));
    Ok(())
}

/// Complete and edit commands.
fn cmd_update(
    service: &TodoService,
    id: String,
    patch: TodoPatch,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = TodoId::from(id);
    match service.update(&id, &patch)? {
        Some(todo) => {
            println!("Updated: {}", format_todo(&todo));
            Ok(())
        },
        None => Err(format!("todo not found: {id}").into()),
    }
}

/// Remove command.
fn cmd_remove(service: &TodoService, id: String) -> Result<(), Box<dyn std::error::Error>> {
    let id = TodoId::from(id);
    match service.delete(&id)? {
        Some(todo) => println!("Removed: {}", format_todo(&todo)),
        None => println!("Nothing to remove: {id}"),
    }
    Ok(())
}

/// Stats command.
fn cmd_stats(service: &TodoService) -> Result<(), Box<dyn std::error::Error>> {
    let stats = service.stats()?;
    println!("Total:     {}", stats.total);
    println!("Completed: {}", stats.completed);
    println!("Pending:   {}", stats.pending);
    Ok(())
}

/// Health command.
fn cmd_health(service: &TodoService) -> Result<(), Box<dyn std::error::Error>> {
    let report = service.health();
    println!("Status:  {}", report.status);
    println!("Backend: {}", report.backend);
    println!("Mode:    {}", service.mode());
    if let Some(detail) = &report.detail {
        println!("Detail:  {detail}");
    }

    if report.status.is_serving() {
        Ok(())
    } else {
        Err(format!("storage backend '{}' is {}", report.backend, report.status).into())
    }
}
