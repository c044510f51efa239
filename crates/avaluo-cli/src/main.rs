// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod favorites;
mod runtime;

use anyhow::{Context, Result};
use avaluo_app::{FetchFilters, WorkspaceState};
use avaluo_gateway::Client;
use avaluo_testkit::MarketFaker;
use config::Config;
use favorites::FavoritesStore;
use runtime::{DemoRuntime, GatewayRuntime};
use std::env;
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;

const DEMO_SEED: u64 = 42;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.show_version {
        println!("avaluo {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.init_config {
        return init_config(&options.config_path);
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `avaluo --init-config` to generate a template",
            options.config_path.display()
        )
    })?;

    if options.demo {
        // Demo fixtures carry close dates relative to the testkit reference
        // day, so the workspace clock uses the same reference.
        let mut faker = MarketFaker::new(DEMO_SEED);
        let subject = faker.subject();
        let mut state = WorkspaceState::new(
            subject,
            FetchFilters::default(),
            avaluo_testkit::reference_today(),
        );
        let mut runtime = DemoRuntime::new(faker);
        return avaluo_tui::run_app(&mut state, &mut runtime);
    }

    let client = Client::new(
        &config.gateway_endpoint()?,
        &config.gateway_token()?,
        config.gateway_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [gateway] config in {}; fix endpoint/token/timeout values",
            options.config_path.display()
        )
    })?;

    let favorites_path = FavoritesStore::default_path()?;
    let favorites = FavoritesStore::open(&favorites_path)?;

    let mut state = WorkspaceState::new(
        config.subject_property()?,
        config.fetch_filters(),
        OffsetDateTime::now_utc().date(),
    );
    let mut runtime = GatewayRuntime::new(client, favorites);
    avaluo_tui::run_app(&mut state, &mut runtime)
}

fn init_config(path: &PathBuf) -> Result<()> {
    if path.exists() {
        anyhow::bail!(
            "config file {} already exists; move it aside before running --init-config",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {}", parent.display()))?;
    }
    fs::write(path, Config::example_config(path))
        .with_context(|| format!("write config template {}", path.display()))?;
    println!("wrote config template to {}", path.display());
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    init_config: bool,
    demo: bool,
    show_help: bool,
    show_version: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        init_config: false,
        demo: false,
        show_help: false,
        show_version: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--init-config" => {
                options.init_config = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            "--version" | "-V" => {
                options.show_version = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("avaluo -- comparable sales analysis workspace");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --init-config            Write a commented config template");
    println!("  --demo                   Launch offline on seeded fixtures");
    println!("  --version                Print the version");
    println!("  --help                   Show this help");
}
