use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use scrapecast_core::{Config, WeatherQuery, WeatherRecord, WeatherService};
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Instant};
use tracing_subscriber::EnvFilter;

use crate::{render, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "scrapecast", version, about = "Weather from search results, extracted by an LLM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log filter, e.g. "info" or "scrapecast_core=debug". `RUST_LOG` wins when set.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenAI API key (and optionally the model) in the config file.
    Configure,

    /// Show weather for a city name or postal code.
    Show {
        /// Location to look up.
        location: String,

        /// Query a running `scrapecast serve` instead of calling upstream directly.
        #[arg(long)]
        server: Option<String>,

        /// Print the raw JSON response.
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP endpoint (`POST /weather`).
    Serve {
        /// Address to bind; overrides `server.bind` from the config file.
        #[arg(long)]
        bind: Option<String>,
    },
}

pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, server, json } => show(location, server, json).await,
            Command::Serve { bind } => {
                let mut config = load_config()?;
                if let Some(bind) = bind {
                    config.server.bind = bind;
                }
                let addr = config.bind_addr()?;
                let service = WeatherService::from_config(&config)?;
                server::serve(addr, Arc::new(service)).await
            }
        }
    }
}

/// File config with the environment laid over it.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env(|name| std::env::var(name).ok());
    Ok(config)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenAI API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let model = Text::new("Model:")
        .with_default(&config.openai.model)
        .prompt()
        .context("Failed to read model name")?;

    config.set_api_key(api_key.trim().to_string());
    config.openai.model = model;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(location: String, server: Option<String>, as_json: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    let record = match server {
        Some(base) => fetch_remote(&base, &location).await?,
        None => {
            let config = load_config()?;
            let service = WeatherService::from_config(&config)?;
            let query = WeatherQuery::new(location).map_err(|e| anyhow!(e.public_message()))?;
            service.lookup(&query).await.map_err(|e| anyhow!(e.public_message()))?
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render::format_report(&record, start.elapsed(), chrono::Local::now()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

async fn fetch_remote(base: &str, location: &str) -> anyhow::Result<WeatherRecord> {
    let url = format!("{}/weather", base.trim_end_matches('/'));

    let res = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "location": location }))
        .send()
        .await
        .with_context(|| format!("Failed to reach weather server at {url}"))?;

    let status = res.status();
    if !status.is_success() {
        let detail = res
            .json::<ErrorBody>()
            .await
            .map(|b| b.detail)
            .unwrap_or_else(|_| format!("server responded with {status}"));
        bail!(detail);
    }

    res.json::<WeatherRecord>().await.context("Failed to parse weather server response")
}
