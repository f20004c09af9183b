use clap::Parser;
use tracing::debug;

use tradelog::adapter::cli::output::{self, OutputConfig};
use tradelog::adapter::cli::{execute, Cli};
use tradelog::config::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    output::configure(OutputConfig::new(args.json, args.quiet));

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(2);
        }
    };

    config.init_logging();
    debug!(database = %config.database, user = %args.user, "tradelog starting");

    if !execute(args, &config).await {
        std::process::exit(1);
    }
}
