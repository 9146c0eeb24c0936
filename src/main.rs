use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tool_dispatch::{DispatchConfig, Dispatcher, ToolCatalog, ToolRegistry};

#[derive(Parser)]
#[command(name = "tool-dispatch", version)]
#[command(about = "Registry and dispatcher for model-callable tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file (default: ./tool-dispatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the descriptors of every callable tool as JSON
    List,

    /// Invoke a tool with JSON-encoded arguments
    Invoke {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,

        /// Check the arguments against the tool's parameter schema first
        #[arg(long)]
        validate: bool,
    },

    /// Invoke an external tool with a free-form argument string
    Cli {
        /// Tool name
        tool: String,

        /// Free-form arguments passed to the tool
        arguments: String,
    },

    /// Print the source that provides a tool
    Source {
        /// Tool name
        tool: String,
    },

    /// Print the CLI help of an external tool
    #[command(name = "cli-help")]
    CliHelp {
        /// Tool name
        tool: String,
    },

    /// Print the numbered CLI help of every external tool
    Dynamic,

    /// Print the names of the built-in plugins
    Plugins,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config =
        DispatchConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    debug!(?config, "configuration");

    let catalog = ToolCatalog::builtin();
    let dispatcher = Dispatcher::new(ToolRegistry::from_config(&config, &catalog));

    match cli.command {
        Commands::List => {
            let descriptors = dispatcher.list_descriptors().await;
            info!(count = descriptors.len(), "listing tools");
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        }
        Commands::Invoke {
            tool,
            arguments,
            validate,
        } => {
            let result = if validate {
                dispatcher.invoke_validated(&tool, &arguments).await
            } else {
                dispatcher.invoke(&tool, &arguments).await
            };
            println!("{}", result);
        }
        Commands::Cli { tool, arguments } => {
            println!("{}", dispatcher.invoke_cli(&tool, &arguments).await);
        }
        Commands::Source { tool } => {
            let source = dispatcher.source_name_for(&tool).await;
            if source.is_empty() {
                anyhow::bail!("unknown tool: {}", tool);
            }
            println!("{}", source);
        }
        Commands::CliHelp { tool } => {
            let help = dispatcher
                .cli_help_for(&tool)
                .await
                .with_context(|| format!("no CLI help available for {}", tool))?;
            println!("{}", help.trim_end());
        }
        Commands::Dynamic => {
            println!("{}", dispatcher.dynamic_tools_as_text().await);
        }
        Commands::Plugins => {
            for name in catalog.names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
