mod commands;
mod registry;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(about = "Multi-cloud instance lifecycle from one CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the discovery chain)
    #[arg(short, long, global = true, env = "CIRRUS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered and configured providers
    Providers,
    /// List instances
    List {
        /// Provider to query (default: every configured provider)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Create an instance
    Create {
        /// Instance name
        name: String,
        /// Instance type / VM size (e.g. t3.micro, Standard_B1s)
        #[arg(short = 't', long = "type")]
        instance_type: String,
        /// Provider (default: the configured default provider)
        #[arg(short, long)]
        provider: Option<String>,
        /// Block until the instance is up
        #[arg(short, long)]
        wait: bool,
    },
    /// Show one instance
    Get {
        /// Instance id (AWS: i-..., Azure: resource-group/vm-name)
        id: String,
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Delete an instance
    Delete {
        id: String,
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Walk the full lifecycle on every configured provider
    Demo,
    /// Package the project for delivery
    Package {
        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Version => {
            println!("cirrus {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Package { output } => {
            init_logging(&cirrus_config::LoggingConfig::default());
            commands::package::run(output.as_deref())
        }
        command => run_with_config(command, cli.config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_with_config(command: Commands, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    init_logging(&config.app.logging);

    let registry = registry::default_registry()?;

    match command {
        Commands::Providers => {
            commands::lifecycle::providers(&registry, &config);
            Ok(())
        }
        Commands::List { provider } => {
            commands::lifecycle::list(&registry, &config, provider.as_deref()).await
        }
        Commands::Create {
            name,
            instance_type,
            provider,
            wait,
        } => {
            commands::lifecycle::create(
                &registry,
                &config,
                &name,
                &instance_type,
                provider.as_deref(),
                wait,
            )
            .await
        }
        Commands::Get { id, provider } => {
            commands::lifecycle::get(&registry, &config, &id, provider.as_deref()).await
        }
        Commands::Delete { id, provider } => {
            commands::lifecycle::delete(&registry, &config, &id, provider.as_deref()).await
        }
        Commands::Demo => commands::demo::run(&registry, &config).await,
        // Handled before configuration is loaded.
        Commands::Package { .. } | Commands::Version => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<cirrus_config::CirrusConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => cirrus_config::find_config_file()?,
    };
    Ok(cirrus_config::load_from_path(&path, None)?)
}

fn init_logging(logging: &cirrus_config::LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    if logging.enable_file_logging {
        if let Some(path) = &logging.log_file {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok();
            if let Some(file) = file {
                tracing_subscriber::fmt()
                    .with_writer(file)
                    .with_max_level(level)
                    .with_ansi(false)
                    .init();
                return;
            }
        }
    }

    tracing_subscriber::fmt().with_max_level(level).init();
}
