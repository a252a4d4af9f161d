//! `spring-config` - fetch and print configuration from a Spring Cloud Config server

mod logging;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use spring_config_client::{ConfigurationLoader, Format, RemoteEnvironment, SpringCloudConfigClient};
use tracing::{debug, info};

/// How the located environment is printed
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    /// `key=value` lines, merged by precedence
    Properties,
    /// JSON object, merged by precedence
    Json,
    /// Every property source in precedence order
    Sources,
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "spring-config",
    version,
    about = "Fetch configuration from a Spring Cloud Config server"
)]
struct Cli {
    /// Client configuration file (yaml, toml, json)
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,
    /// Config server uri, comma separated for failover
    #[arg(long)]
    uri: Option<String>,
    /// Application name
    #[arg(short = 'n', long)]
    name: Option<String>,
    /// Profiles, comma separated
    #[arg(short = 'p', long)]
    profile: Option<String>,
    /// Label (branch, tag or commit)
    #[arg(short = 'l', long)]
    label: Option<String>,
    /// Exit with an error when the server cannot be reached
    #[arg(long)]
    fail_fast: bool,
    #[arg(long)]
    username: Option<String>,
    #[arg(long, env = "SPRING_CLOUD_CONFIG_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Remote format: native, json, yaml or properties
    #[arg(long)]
    format: Option<Format>,
    #[arg(short = 'o', long, value_enum, default_value_t = Output::Properties)]
    output: Output,
    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Command line flags override file and environment settings
    fn loader(&self) -> ConfigurationLoader {
        let mut loader = ConfigurationLoader::new().with_client_override("enabled", true);

        if let Some(path) = &self.config_file {
            loader = loader.with_file(path, true);
        }

        let flags = [
            ("uri", &self.uri),
            ("name", &self.name),
            ("profile", &self.profile),
            ("label", &self.label),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                loader = loader.with_client_override(field, value.as_str());
            }
        }

        if self.fail_fast {
            loader = loader.with_client_override("fail-fast", true);
        }
        if let Some(format) = self.format {
            loader = loader.with_client_override("config.format", format.to_string());
        }

        loader
    }
}

fn render(environment: &RemoteEnvironment, output: Output) -> anyhow::Result<String> {
    let rendered = match output {
        Output::Properties => environment
            .to_map()
            .into_iter()
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Json => {
            let merged: BTreeMap<_, _> = environment.to_map().into_iter().collect();
            serde_json::to_string_pretty(&merged)?
        }
        Output::Sources => {
            let mut lines = Vec::new();
            for source in environment.property_sources() {
                lines.push(format!("# {}", source.name));
                let sorted: BTreeMap<_, _> = source.source.iter().collect();
                for (key, value) in sorted {
                    lines.push(format!("{}={}", key, value));
                }
            }
            lines.join("\n")
        }
    };
    Ok(rendered)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let configuration = cli
        .loader()
        .load()
        .context("Failed to load client configuration")?;
    debug!("Using client configuration: {:?}", configuration);

    match SpringCloudConfigClient::locate(configuration).await? {
        Some(environment) => {
            let rendered = render(&environment, cli.output)?;
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
        }
        None => info!("No remote configuration located"),
    }

    Ok(())
}
