//! Low-code engine CLI - Main entry point

mod boot;

use boot::BootOptions;
use clap::{Parser, Subcommand};
use lowcode_core::plugin::builtin;
use lowcode_foundation::version;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// lowcode - plugin runtime for the low-code engine
#[derive(Parser, Debug)]
#[command(name = "lowcode")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register builtin and declared plugins, run the init pass, then dispose
    Boot {
        /// Engine config JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Plugin preferences JSON file
        #[arg(short, long)]
        preferences: Option<PathBuf>,

        /// Plugin manifest JSON file (metadata-only plugins)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Host engine version (overrides ENGINE_VERSION in the config)
        #[arg(long)]
        engine_version: Option<String>,

        /// Disable a plugin by name (repeatable)
        #[arg(long)]
        disable: Vec<String>,
    },
    /// List builtin plugins
    Plugins,
    /// Check whether a version satisfies a range (pre-releases included)
    CheckVersion {
        /// Semver range, e.g. ^2.0.0
        range: String,

        /// Version to check, e.g. 2.1.0-beta
        version: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match args.command {
        Command::Boot {
            config,
            preferences,
            manifest,
            engine_version,
            disable,
        } => {
            let report = boot::run(BootOptions {
                config,
                preferences,
                manifest,
                engine_version,
                disable,
            })
            .await?;
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Plugins => list_plugins_cmd(),
        Command::CheckVersion { range, version } => check_version_cmd(&range, &version)?,
    }

    Ok(())
}

/// List builtin plugins
fn list_plugins_cmd() {
    println!("\n🔌 Builtin Plugins\n");
    println!("{:<20} {:<12} {}", "Name", "Engine", "Description");
    println!("{}", "-".repeat(72));

    for factory in builtin::all_factories() {
        let meta = factory.meta();
        println!(
            "{:<20} {:<12} {}",
            factory.plugin_name().unwrap_or("(unnamed)"),
            meta.engines.lowcode_engine.as_deref().unwrap_or("*"),
            meta.description.as_deref().unwrap_or("")
        );
    }
}

/// Check a version against a range
fn check_version_cmd(range: &str, version: &str) -> anyhow::Result<()> {
    if version::satisfies(range, version)? {
        println!("✓ {} satisfies {}", version, range);
        Ok(())
    } else {
        println!("✗ {} does not satisfy {}", version, range);
        std::process::exit(1);
    }
}
