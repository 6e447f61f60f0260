use clap::{Parser, Subcommand};
use tasklane_cli::{init_logging, run_server, Config};

#[derive(Parser)]
#[command(name = "tasklane")]
#[command(about = "Tasklane - todo tracking with background CSV imports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
        /// SQLite database URL (overrides DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, database_url } => {
            let mut config = Config::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database_url) = database_url {
                config.database_url = database_url;
            }

            init_logging(&config.log_level, config.log_format)?;
            run_server(config).await
        }
    }
}
