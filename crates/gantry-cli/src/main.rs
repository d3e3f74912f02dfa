mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CACHE_ERROR, EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use gantry_loader::{ClientConfig, LoadMode};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gantry",
    version,
    about = "Resolve app manifests and load bundles from cache or a development server"
)]
struct Cli {
    /// Path to the bundle cache directory.
    #[arg(long)]
    cache: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a manifest and load its bundle.
    Load {
        /// App URL (gantry://, gantrys://, http:// or https://).
        url: String,
        /// Strategy selection: published, development, or auto.
        #[arg(long, value_parser = parse_mode)]
        mode: Option<LoadMode>,
        /// Write the loaded bundle to a file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Store a successfully fetched bundle into the cache.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Resolve a manifest and print it without loading the bundle.
    Inspect {
        /// App URL (gantry://, gantrys://, http:// or https://).
        url: String,
    },
    /// Manage the bundle cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// List cached bundles.
    List,
    /// Remove a cached bundle by key or unique prefix.
    Remove {
        /// Bundle key (full or prefix).
        key: String,
    },
    /// Verify every cached bundle against its record.
    Verify,
}

fn parse_mode(input: &str) -> Result<LoadMode, String> {
    match input {
        "published" => Ok(LoadMode::Published),
        "development" => Ok(LoadMode::Development),
        "auto" => Ok(LoadMode::Auto),
        other => Err(format!(
            "invalid mode '{other}', expected published, development, or auto"
        )),
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GANTRY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    commands::install_signal_handler();

    let config = match ClientConfig::load_default() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let cache_path = expand_tilde(
        cli.cache
            .as_deref()
            .or(config.cache_root.as_deref())
            .unwrap_or("~/.cache/gantry"),
    );
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Load {
            url,
            mode,
            output,
            save,
        } => commands::load::run(
            &url,
            &cache_path,
            mode.unwrap_or(config.mode),
            output.as_deref(),
            save || config.save_to_cache,
            json_output,
        ),
        Commands::Inspect { url } => commands::inspect::run(&url, json_output),
        Commands::Cache { action } => match action {
            CacheAction::List => commands::cache_list::run(&cache_path, json_output),
            CacheAction::Remove { key } => commands::cache_remove::run(&cache_path, &key),
            CacheAction::Verify => commands::cache_verify::run(&cache_path, json_output),
        },
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("cache") || msg.starts_with("no cached bundle") {
                EXIT_CACHE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
