//! Project Singularity CLI
//!
//! Serves the tutorial API and checks submissions from the command line.

use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use singularity_engine::{
    create_router, persistence, run_level, spawn_clock, AppState, Catalog, Config, SkillLevel,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Project Singularity - Python tutorial engine
///
/// Validates learner submissions against a fixed curriculum by pattern
/// matching, never by running them, and serves the tutorial session to the
/// browser client.
#[derive(Parser, Debug)]
#[command(name = "singularity")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: singularity.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and event stream
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Save file path, overriding the configuration
        #[arg(long, value_name = "FILE")]
        save_file: Option<String>,
    },
    /// Validate a submission against one level
    Check {
        /// Level id
        #[arg(value_name = "LEVEL")]
        level: u32,

        /// Submission file, or `-` for stdin
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// List every level with its objective
    Levels {
        /// Show the seed template for this skill tier
        #[arg(long, value_name = "SKILL")]
        seeds: Option<String>,
    },
    /// Run every shipped solution through its level's validator
    VerifySolutions,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");

    let outcome = match args.command {
        Command::Serve { port, save_file } => serve(args.config.as_deref(), port, save_file).await,
        Command::Check { level, file } => check(level, &file),
        Command::Levels { seeds } => list_levels(seeds.as_deref()),
        Command::VerifySolutions => verify_solutions(),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Serves the API until Ctrl+C, then writes a final save.
async fn serve(
    config_path: Option<&str>,
    port: u16,
    save_file: Option<String>,
) -> anyhow::Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(save_file) = save_file {
        config.save_file = save_file;
    }
    config.validate()?;
    print_config(&config);

    let state = AppState::load(config).await?;
    {
        let session = state.session.lock().await;
        let game = session.state();
        println!();
        println!(
            "Session ready: level {} (max {}), {} XP",
            game.current_level_id, game.max_reached_level, game.xp
        );
    }

    let clock = spawn_clock(state.clone());
    let router = create_router(state.clone());

    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    clock.abort();
    persistence::persist(&state.session, state.local.as_ref(), state.remote.as_deref()).await;
    println!("Progress saved");
    Ok(ExitCode::SUCCESS)
}

/// Validates one submission and prints the verdict.
///
/// Exits 1 when the submission is rejected.
fn check(level_id: u32, file: &str) -> anyhow::Result<ExitCode> {
    let catalog = Catalog::shipped()?;
    let level = catalog.level(level_id)?;
    let source = read_submission(file)?;

    let verdict = run_level(&source, level);
    tracing::debug!(level_id, success = verdict.success, "Checked submission");

    println!("Level {}: {}", level.id, level.title);
    println!("{}", if verdict.success { "PASS" } else { "FAIL" });
    println!("{}", verdict.message);
    if let Some(output) = verdict.output.as_deref().filter(|out| !out.is_empty()) {
        println!("OUTPUT: {output}");
    }

    Ok(if verdict.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Reads a submission from a file, or stdin for `-`.
fn read_submission(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    std::fs::read_to_string(file).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read submission '{file}': {e}\n\nSuggestion: Check the path, or pass - to read stdin"
        )
    })
}

/// Prints every level, optionally with its seed template.
fn list_levels(seeds: Option<&str>) -> anyhow::Result<ExitCode> {
    let skill = seeds
        .map(|name| {
            SkillLevel::from_str_case_insensitive(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown skill level '{name}'\n\nSuggestion: Use beginner, intermediate or advanced"
                )
            })
        })
        .transpose()?;

    let catalog = Catalog::shipped()?;
    for level in catalog.levels() {
        println!("{:>2}. {} ({})", level.id, level.title, level.exam.topic);
        println!("    {}", level.objective);
        if let Some(skill) = skill {
            for line in level.seed_for(skill).lines() {
                println!("    | {line}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Checks that every tier-4 solution passes its own level.
fn verify_solutions() -> anyhow::Result<ExitCode> {
    let catalog = Catalog::shipped()?;
    let mut rejected = Vec::new();

    for level in catalog.levels() {
        let solution = catalog.solution(level.id)?;
        let verdict = run_level(solution, level);
        if verdict.success {
            tracing::debug!(level_id = level.id, "Solution accepted");
        } else {
            println!("Level {}: REJECTED - {}", level.id, verdict.message);
            rejected.push(level.id);
        }
    }

    if rejected.is_empty() {
        println!("All {} solutions accepted", catalog.len());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} of {} solutions rejected: {:?}",
            rejected.len(),
            catalog.len(),
            rejected
        );
        Ok(ExitCode::from(1))
    }
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Save file: {}", config.save_file);
    println!(
        "  Remote mirror: {}",
        config.remote_dir.as_deref().unwrap_or("disabled")
    );
    println!("  Run delay: {}ms", config.run_delay_ms);
    println!("  Base XP: {}", config.base_xp);
}
