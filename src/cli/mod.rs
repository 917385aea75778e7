//! Command-line interface.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchOrchestrator, BatchRequest, OnErrorMode, OperationSpec};
use crate::config::Config;
use crate::context::ToolContext;
use crate::ops::{OperationKind, OperationRegistry, OperationServices};
use crate::slides::{Credentials, SlidesClient, TranslateClient};
use crate::tools::ToolRegistry;

#[derive(Debug, Parser)]
#[command(name = "slidekit", version, about = "Batch editing for Google Slides presentations")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a list of operations with as few API calls as possible
    Batch(BatchArgs),

    /// Run a single operation through its tool
    Run(RunArgs),

    /// List every operation kind
    Operations,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    #[arg(long, env = "SLIDES_PRESENTATION_ID")]
    pub presentation_id: String,

    /// JSON file with an array of `{kind, parameters}`; `-` reads stdin
    #[arg(long)]
    pub file: PathBuf,

    /// Failure policy: stop, continue or rollback
    #[arg(long)]
    pub on_error: Option<OnErrorMode>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Operation kind, e.g. create_slide
    pub kind: String,

    #[arg(long, env = "SLIDES_PRESENTATION_ID")]
    pub presentation_id: String,

    /// Operation parameters as a JSON object
    #[arg(long, default_value = "{}")]
    pub params: String,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Batch(args) => run_batch(args).await,
            Command::Run(args) => run_single(args).await,
            Command::Operations => {
                list_operations();
                Ok(())
            }
        }
    }
}

/// Remote clients and credentials built from the environment.
struct Runtime {
    config: Config,
    operations: Arc<OperationRegistry>,
    credentials: Credentials,
}

impl Runtime {
    fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        let credentials = Credentials::bearer(config.require_token()?);
        let services = OperationServices {
            documents: Arc::new(SlidesClient::new(&config.slides)?),
            translator: Arc::new(TranslateClient::new(&config.translate)?),
        };
        Ok(Self {
            config,
            operations: Arc::new(OperationRegistry::new(services)),
            credentials,
        })
    }

    /// Context whose token fires on Ctrl-C.
    fn context(&self) -> ToolContext {
        let token = CancellationToken::new();
        let on_signal = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling remaining operations");
                on_signal.cancel();
            }
        });
        ToolContext::new(self.credentials.clone()).with_cancellation(token)
    }
}

fn read_operations(file: &PathBuf) -> anyhow::Result<Vec<OperationSpec>> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read operations from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?
    };
    serde_json::from_str(&raw).context("operations file must be a JSON array of {kind, parameters}")
}

async fn run_batch(args: BatchArgs) -> anyhow::Result<()> {
    let operations = read_operations(&args.file)?;
    let runtime = Runtime::from_env()?;
    let orchestrator =
        BatchOrchestrator::new(runtime.operations.clone()).with_config(&runtime.config.batch);

    let request = BatchRequest {
        presentation_id: args.presentation_id,
        operations,
        on_error: args.on_error.map(|m| m.to_string()),
    };
    let report = orchestrator.run(request, &runtime.context()).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failure_count > 0 {
        anyhow::bail!(
            "{} of {} operations failed",
            report.failure_count,
            report.total_operations
        );
    }
    Ok(())
}

async fn run_single(args: RunArgs) -> anyhow::Result<()> {
    let kind: OperationKind = args.kind.parse()?;
    let mut params: serde_json::Value =
        serde_json::from_str(&args.params).context("--params must be a JSON object")?;
    let map = params
        .as_object_mut()
        .context("--params must be a JSON object")?;
    map.insert(
        "presentation_id".to_string(),
        serde_json::Value::String(args.presentation_id),
    );

    let runtime = Runtime::from_env()?;
    let mut tools = ToolRegistry::new();
    tools.register_slides_tools(runtime.operations.clone(), &runtime.config.batch);
    let tool = tools
        .get(kind.as_str())
        .with_context(|| format!("no tool registered for {}", kind))?;

    let output = tool.execute(params, &runtime.context()).await?;
    tracing::debug!("{} finished in {:?}", kind, output.duration);
    println!("{}", serde_json::to_string_pretty(&output.result)?);
    Ok(())
}

fn list_operations() {
    let width = OperationKind::ALL
        .iter()
        .map(|k| k.as_str().len())
        .max()
        .unwrap_or(0);

    println!("Operations:");
    println!();
    for kind in OperationKind::ALL {
        let mode = if kind.is_batchable() { "batch" } else { "standalone" };
        println!(
            "  {:width$}  {:10}  {}",
            kind.as_str(),
            mode,
            kind.description(),
            width = width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_command() {
        let cli = Cli::try_parse_from([
            "slidekit",
            "batch",
            "--presentation-id",
            "deck1",
            "--file",
            "ops.json",
            "--on-error",
            "continue",
            "--log-json",
        ])
        .unwrap();

        assert!(cli.log_json);
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.presentation_id, "deck1");
                assert_eq!(args.on_error, Some(OnErrorMode::Continue));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_on_error() {
        assert!(
            Cli::try_parse_from([
                "slidekit",
                "batch",
                "--presentation-id",
                "deck1",
                "--file",
                "ops.json",
                "--on-error",
                "abort",
            ])
            .is_err()
        );
    }
}
