mod archive;
mod cli;
mod config;
mod download;
mod error;
mod feed;
mod imaging;
mod ledger;
mod promote;

use std::process::ExitCode;

use clap::Parser;
use cli::{
    command::{self, Context},
    Cli, Commands,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("forecast_imagery=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let ctx = match Context::load(cli.config.as_deref(), cli.date) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Commands::Run {} => command::run(&ctx).await.map(|_| ()),
        Commands::Archive {} => command::archive(&ctx).map(|_| ()),
        Commands::Download {} => command::download(&ctx)
            .await
            .map(|summary| println!("There were a total of {}", summary)),
        Commands::Animate {} => command::animate(&ctx)
            .await
            .map(|n| println!("{} animations created", n)),
        Commands::Process {} => command::process(&ctx).await.map(|summary| {
            println!(
                "{} images processed, {} failed, {} joint animations",
                summary.processed, summary.failed, summary.joints
            )
        }),
        Commands::Refresh {} => command::refresh(&ctx).await.map(|summary| {
            println!(
                "{} slides backed up, {} replaced, {}",
                summary.backed_up, summary.replaced, summary.download
            )
        }),
        Commands::Catalog {} => command::catalog(&ctx).map(|listing| print!("{}", listing)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
