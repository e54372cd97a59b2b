#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::io::IsTerminal;

use anyhow::{Context, bail};
use boxlink::cli::{Args, Command};
use boxlink::config::SingBoxConfig;
use boxlink::generator::{Converter, HttpFetcher, Settings, choose_config_name, expand_tilde};
use boxlink::store::{ConfigStore, JsonFileStore, save_named};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::Level;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = Settings::load(&args.config).await?;
    let store = JsonFileStore::new(settings.store_path());

    match args.command {
        Command::Convert {
            input,
            output,
            save,
        } => {
            let reads_stdin = matches!(input.as_deref(), None | Some("-"));
            let raw = read_input(input.as_deref()).await?;

            let fetcher = HttpFetcher::new(
                settings.fetch_mode,
                &settings.relay_endpoint,
                settings.fetch_timeout(),
            )?;
            let converter = Converter::with_profile(fetcher, settings.profile.clone());
            let conversion = converter.convert(&raw).await?;

            if !conversion.failures.is_empty() {
                tracing::warn!(
                    "{} input lines were skipped, see warnings above",
                    conversion.failures.len()
                );
            }

            write_config(&conversion.config, output.as_deref()).await?;

            if let Some(name) = save {
                let name = if name.trim().is_empty() {
                    choose_config_name(!reads_stdin && std::io::stdin().is_terminal())
                } else {
                    Some(name)
                };
                match name {
                    Some(name) => {
                        save_named(&store, &name, &conversion.config).await?;
                    }
                    None => tracing::info!("No name given, config not saved"),
                }
            }
            tracing::info!("Conversion complete!");
        }
        Command::List => {
            let names = store.names().await?;
            if names.is_empty() {
                tracing::info!("No saved configs in {:?}", store.path());
            }
            for name in names {
                println!("{}", name);
            }
        }
        Command::Show { name, output } => {
            let Some(config) = store.get(&name).await? else {
                bail!("No saved config named '{}'", name);
            };
            write_config(&config, output.as_deref()).await?;
        }
        Command::Delete { name } => {
            if !store.delete(&name).await? {
                bail!("No saved config named '{}'", name);
            }
            tracing::info!("Deleted config '{}'", name);
        }
    }
    Ok(())
}

async fn read_input(input: Option<&str>) -> anyhow::Result<String> {
    match input {
        None | Some("-") => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read links from stdin")?;
            Ok(raw)
        }
        Some(path) => {
            let path = expand_tilde(path);
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read links from {}", path))
        }
    }
}

async fn write_config(config: &SingBoxConfig, output: Option<&str>) -> anyhow::Result<()> {
    let json = config.to_json_pretty()?;
    match output {
        None => println!("{}", json),
        Some(path) => {
            let path = expand_tilde(path);
            if let Some(parent) = std::path::Path::new(&path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write config to {}", path))?;
            tracing::info!("Config written to {}", path);
        }
    }
    Ok(())
}
