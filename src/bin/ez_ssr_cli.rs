//! ez-ssr CLI - Render and inspect a component directory
//!
//! Commands: list, render, lint, tokens
//! Rendered text or JSON goes to stdout, logs to stderr
//! Returns 2 on render errors and on malformed constructs found by lint

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ez_ssr::{Engine, EngineConfig, PropMap};

#[derive(Parser)]
#[command(name = "ez-ssr-cli")]
#[command(about = "ez-ssr CLI - server-side component rendering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the components directory (overrides the config file)
    #[arg(short = 'd', long)]
    components_dir: Option<PathBuf>,

    /// JSON config file (EngineConfig)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List components and what they include
    List,

    /// Render a component
    Render {
        /// Component name, e.g. widgets/card
        #[arg(short, long)]
        name: String,

        /// JSON object used as the root props
        #[arg(short, long, default_value = "{}")]
        props: String,
    },

    /// Report malformed constructs and unresolved inclusions (exit 2 on malformed)
    Lint,

    /// Dump the token stream of a component
    Tokens {
        #[arg(short, long)]
        name: String,
    },
}

fn print_error(error: impl std::fmt::Display) {
    let output = serde_json::json!({ "success": false, "error": error.to_string() });
    println!("{}", output);
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    print_error(error);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => return fail(e),
        },
        None => EngineConfig::default(),
    };
    let config = match cli.components_dir {
        Some(dir) => config.with_components_dir(dir),
        None => config,
    };

    let (engine, report) = match Engine::load(config) {
        Ok(loaded) => loaded,
        Err(e) => return fail(format!("Failed to load components: {}", e)),
    };

    match cli.command {
        Commands::List => {
            let registry = engine.registry();
            let components: Vec<_> = registry
                .names()
                .into_iter()
                .filter_map(|name| registry.get(name).map(|c| (name, c)))
                .map(|(name, c)| serde_json::json!({
                    "name": name,
                    "props": c.declared_props(),
                    "dependencies": c.dependencies(),
                }))
                .collect();

            println!("{}", serde_json::to_string_pretty(&components).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Render { name, props } => {
            let props: PropMap = match serde_json::from_str(&props) {
                Ok(p) => p,
                Err(e) => return fail(format!("Invalid props: {}", e)),
            };

            match engine.render_component(&name, &props) {
                Ok(rendered) => {
                    println!("{}", rendered);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_error(e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Lint => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
            if report.has_malformed() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }

        Commands::Tokens { name } => {
            let registry = engine.registry();
            match registry.get(&name) {
                Some(component) => {
                    println!("{}", serde_json::to_string_pretty(component.tokens()).unwrap());
                    ExitCode::SUCCESS
                }
                None => fail(format!("unknown component '{}'", name)),
            }
        }
    }
}
