// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! spacey-boot - run the built-in loaders against a module catalog
//!
//! Bootstraps the loaders from a JSON manifest (or the bundled demo catalog),
//! requires the requested built-in modules, resolves the requested bindings
//! and prints `process.moduleLoadList`.

mod report;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use spacey_loaders::{Loaders, Manifest, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;

/// Catalog used when no manifest is given
const DEMO_MANIFEST: &str = include_str!("../catalog/demo.json");

#[derive(Parser)]
#[command(
    name = "spacey-boot",
    about = "Bootstrap the spacey built-in loaders and report what they load",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Built-in modules to require
    modules: Vec<String>,

    /// Catalog manifest (JSON); defaults to the bundled demo catalog
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Let user land require internal modules
    #[arg(long)]
    expose_internals: bool,

    /// Load modules through the public (user land) loader
    #[arg(long)]
    public: bool,

    /// Resolve a binding through process.binding()
    #[arg(short, long = "binding", value_name = "NAME")]
    bindings: Vec<String>,

    /// Resolve a binding through process._linkedBinding()
    #[arg(short, long = "linked", value_name = "NAME")]
    linked: Vec<String>,

    /// Print the load list as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "spacey_loaders=debug,spacey_boot=debug"
    } else {
        "spacey_loaders=warn,spacey_boot=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut manifest = match &cli.manifest {
        Some(path) => Manifest::from_path(path)
            .with_context(|| format!("failed to load manifest {}", path.display()))?,
        None => Manifest::parse(DEMO_MANIFEST).context("bundled demo catalog is invalid")?,
    };
    manifest.config.load_from_env();
    if cli.expose_internals {
        manifest.config.expose_internals = true;
    }

    let loaders = Loaders::bootstrap(manifest.into_options());
    tracing::debug!(modules = loaders.registry().len(), "catalog loaded");

    for id in &cli.modules {
        let exports = if cli.public {
            loaders.compile_for_public_loader(id)
        } else {
            loaders.require(id)
        }
        .with_context(|| format!("cannot load '{}'", id))?;

        if !cli.json {
            match loaders.module(id) {
                Some(module) => report::print_module(&module, &exports),
                None => println!("{} {}", "module".white().bold(), id.green()),
            }
        }
    }

    for name in &cli.bindings {
        let binding = loaders.binding(name.as_str())?;
        if !cli.json {
            report::print_binding("process.binding", name, &binding);
        }
    }

    for name in &cli.linked {
        let binding = loaders.linked_binding(name.as_str())?;
        if !cli.json {
            report::print_binding("process._linkedBinding", name, &binding);
        }
    }

    let entries = loaders.load_log().snapshot();
    if cli.json {
        report::print_load_list_json(&entries)?;
    } else {
        if !cli.modules.is_empty() || !cli.bindings.is_empty() || !cli.linked.is_empty() {
            println!();
        }
        report::print_load_list(&entries);
    }
    Ok(())
}
