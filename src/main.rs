// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! spacey-ext CLI - inspect native extension registries and exercise timers

mod repl;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use spacey_native::module_system::{load_registry, ModuleResolver};
use spacey_native::{
    Callable, ClassDef, Context, ExportEntry, ModuleDescriptor, ModuleRegistry, RuntimeConfig,
    Value, VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spacey-ext",
    about = "Inspect and exercise Spacey native extension modules",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Registry manifest (TOML, or JSON by extension)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show which registered module each specifier resolves to
    Resolve {
        /// Specifiers such as `net`, `net@1.2` or `net@>=1.0`
        #[arg(required = true)]
        specifiers: Vec<String>,

        /// Print one JSON object per specifier
        #[arg(long)]
        json: bool,
    },

    /// List registered modules in registration order
    List,

    /// Schedule one timer per delay, drain them and print the firing order
    Timers {
        /// Delays in milliseconds
        #[arg(required = true, allow_negative_numbers = true)]
        delays: Vec<i64>,
    },

    /// Start the interactive resolver
    Repl,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = RuntimeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("spacey_native=debug,spacey_ext=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry_path = cli.registry.clone().or_else(|| config.registry.clone());
    let registry = match &registry_path {
        Some(path) => load_registry(path)
            .with_context(|| format!("loading registry {}", path.display()))?,
        None => {
            tracing::warn!("no registry manifest given, starting with an empty registry");
            ModuleRegistry::new()
        }
    };
    let registry = Arc::new(registry);

    match cli.command {
        Some(Command::Resolve { specifiers, json }) => Ok(resolve(&registry, &specifiers, json)),
        Some(Command::List) => {
            list(&registry);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Timers { delays }) => run_timers(registry, &config, &delays),
        Some(Command::Repl) => run_repl(registry, &config),
        None if atty::is(atty::Stream::Stdin) => run_repl(registry, &config),
        None => {
            // One specifier per line from stdin
            let mut specifiers = Vec::new();
            for line in std::io::stdin().lock().lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    specifiers.push(line.trim().to_string());
                }
            }
            Ok(resolve(&registry, &specifiers, false))
        }
    }
}

fn run_repl(registry: Arc<ModuleRegistry>, config: &RuntimeConfig) -> anyhow::Result<ExitCode> {
    let mut repl = repl::Repl::new(registry, config).context("failed to initialize REPL")?;
    repl.run().context("REPL error")?;
    Ok(ExitCode::SUCCESS)
}

/// Resolve each specifier and report the result.
fn resolve(registry: &ModuleRegistry, specifiers: &[String], json: bool) -> ExitCode {
    let resolver = ModuleResolver::new(registry);
    let mut failed = false;

    for spec in specifiers {
        match resolver.resolve(spec) {
            Ok(resolved) => {
                let descriptor = resolved.descriptor;
                if json {
                    let output = serde_json::json!({
                        "specifier": spec,
                        "module": descriptor.base,
                        "version": descriptor.version.to_string(),
                        "index": resolved.index,
                    });
                    println!("{}", output);
                } else {
                    println!(
                        "{} {} {}",
                        spec.cyan(),
                        "->".dimmed(),
                        module_line(resolved.index, descriptor)
                    );
                }
            }
            Err(reason) => {
                failed = true;
                let message = reason.clone().into_not_found(spec).to_string();
                if json {
                    let output = serde_json::json!({
                        "specifier": spec,
                        "error": message,
                        "reason": reason.to_string(),
                    });
                    println!("{}", output);
                } else {
                    eprintln!("{}: {}", "Error".red().bold(), message);
                    tracing::debug!(%reason, "resolution detail");
                }
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn list(registry: &ModuleRegistry) {
    if registry.is_empty() {
        println!("{}", "(no modules registered)".dimmed());
        return;
    }
    for (index, descriptor) in registry.iter().enumerate() {
        println!("{}", module_line(index, descriptor));
    }
}

/// One-line description of a registered module
pub(crate) fn module_line(index: usize, descriptor: &ModuleDescriptor) -> String {
    format!(
        "{:>3}  {}{}{}  {}",
        index.dimmed(),
        descriptor.base.white().bold(),
        "@".dimmed(),
        descriptor.version.yellow(),
        exports_summary(&descriptor.surface).dimmed()
    )
}

/// `ping(), PORT, Socket{send}` style export listing
pub(crate) fn exports_summary(surface: &ClassDef) -> String {
    let exports: Vec<String> = surface
        .members
        .iter()
        .map(|(name, entry)| match entry {
            ExportEntry::Value(_) => name.clone(),
            ExportEntry::Function(_) => format!("{}()", name),
            ExportEntry::Class(class) => {
                let methods: Vec<&str> = class.methods.iter().map(|(m, _)| m.as_str()).collect();
                format!("{}{{{}}}", name, methods.join(", "))
            }
        })
        .collect();
    exports.join(", ")
}

fn run_timers(
    registry: Arc<ModuleRegistry>,
    config: &RuntimeConfig,
    delays: &[i64],
) -> anyhow::Result<ExitCode> {
    let mut cx = Context::with_config(registry, config);

    for &delay in delays {
        let callback = Value::Function(Arc::new(Callable::native(
            format!("timer({})", delay),
            move |cx, _args| {
                println!(
                    "{:>6}  {} {}",
                    format!("{}ms", cx.clock().now_ms()).yellow(),
                    "fired".green(),
                    format!("setTimeout(_, {})", delay).dimmed()
                );
                Ok(Value::Undefined)
            },
        )));
        let id = cx
            .set_timeout(&callback, delay)
            .with_context(|| format!("scheduling a {}ms timer", delay))?;
        tracing::debug!(timer = id.0, delay, "scheduled");
    }

    cx.run_timers()?;
    Ok(ExitCode::SUCCESS)
}
