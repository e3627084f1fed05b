mod api;
mod config;
mod consts;
mod download;
mod environment;
mod job;
mod pipeline;
mod poller;

use crate::api::error::RenderError;
use crate::api::{RenderService, VeedClient};
use crate::config::{get_config_path, ClientConfig, Config};
use crate::environment::Environment;
use crate::job::JobHandle;
use crate::pipeline::RenderJob;
use crate::poller::PollPolicy;
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments
struct Args {
    /// Render service deployment to use.
    #[arg(long, global = true, value_enum, env = "VEED_ENVIRONMENT")]
    env: Option<Environment>,

    /// Base URL of the render API. Overrides --env.
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// API key used as the bearer token.
    #[arg(long, global = true, value_name = "KEY", env = "VEED_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to the config file (default: ./veed.config or ~/.veed/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an image, render it with a caption and download the video
    Render {
        /// Image to upload
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,

        /// Caption shown over the image
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,

        /// Where to save the video
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Render quality, e.g. 720p or 1080p
        #[arg(long, value_name = "QUALITY")]
        quality: Option<String>,

        /// Seconds between status checks
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Give up after this many seconds of waiting for the render
        #[arg(long = "max-wait", value_name = "SECS")]
        max_wait: Option<u64>,
    },
    /// Check the status of an existing render once
    Status {
        /// Render ID returned when the render was started
        #[arg(long, value_name = "RENDER_ID")]
        render_id: String,
    },
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// What the user sees on stderr when a run fails.
fn diagnostic(e: &RenderError) -> String {
    match e.to_pretty() {
        Some(body) => format!("Error: {}\n{}", e, body),
        None => format!("Error: {}", e),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", diagnostic(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), RenderError> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };

    let settings = || -> Result<(Config, String), RenderError> {
        let config = Config::load_or_default(&config_path)?;
        debug!("Using config file {}", config_path.display());
        let base_url = args
            .api_url
            .clone()
            .or_else(|| non_empty(&config.api_url).map(str::to_string))
            .unwrap_or_else(|| {
                let env = args.env.unwrap_or_default();
                debug!("Using the {} environment", env);
                env.api_url()
            });
        Ok((config, base_url))
    };

    match &args.command {
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                return Err(RenderError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                )));
            }
            Config::default().save(&config_path)?;
            println!("Wrote default config to {}", config_path.display());
            Ok(())
        }
        Command::Render {
            image,
            text,
            output,
            quality,
            interval,
            max_wait,
        } => {
            let (config, base_url) = settings()?;
            let image = image
                .clone()
                .or_else(|| non_empty(&config.image).map(PathBuf::from))
                .ok_or_else(|| RenderError::Config("no input image (pass --image)".into()))?;
            if !image.is_file() {
                return Err(RenderError::NotFound(image));
            }
            let text = text
                .clone()
                .or_else(|| non_empty(&config.text).map(str::to_string))
                .ok_or_else(|| RenderError::Config("no caption text (pass --text)".into()))?;
            let api_key = config.resolve_api_key(args.api_key.as_deref())?;

            let job = RenderJob {
                image,
                text,
                output: output.clone().unwrap_or_else(|| PathBuf::from(&config.output)),
                quality: quality.clone().unwrap_or_else(|| config.quality.clone()),
                policy: PollPolicy::from_secs(
                    interval.unwrap_or(config.poll_interval_secs),
                    max_wait.unwrap_or(config.max_wait_secs),
                )?,
            };

            println!("Image:  {}", job.image.display());
            println!("Text:   '{}'", job.text);
            println!("Output: {}", job.output.display());
            println!("API:    {}", base_url);
            println!(
                "Polling every {}s for up to {}s",
                job.policy.interval().as_secs(),
                job.policy.max_wait().as_secs()
            );

            let client = VeedClient::new(ClientConfig::new(base_url, api_key))?;
            let result = pipeline::run(&client, &job, &mut pipeline::print_progress).await;
            println!();
            result?;
            println!("Done. Check {}", job.output.display());
            Ok(())
        }
        Command::Status { render_id } => {
            let (config, base_url) = settings()?;
            let api_key = config.resolve_api_key(args.api_key.as_deref())?;
            let client = VeedClient::new(ClientConfig::new(base_url, api_key))?;
            let status = client.render_status(&JobHandle::new(render_id.clone())).await?;
            println!("Render {}: {}", render_id, status);
            Ok(())
        }
    }
}
