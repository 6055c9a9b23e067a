mod bootstrap_helpers;

use anyhow::Result;
use clap::Parser;
use tix_cli::Cli;
use tix_discord_runtime::{run_discord_runtime, DiscordRuntimeConfig};
use tix_tickets::{load_ticket_desk_config, render_config_summary};
use tracing::{debug, info};

use crate::bootstrap_helpers::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }
    let cli = Cli::parse();
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    let desk = load_ticket_desk_config(&cli.config)?;
    if cli.check_config {
        println!("{}", render_config_summary(&desk));
        return Ok(());
    }

    let token = cli.resolved_discord_token()?;
    info!(
        config = %cli.config.display(),
        guild_id = desk.guild_id,
        categories = desk.categories.len(),
        "starting ticket desk"
    );
    run_discord_runtime(DiscordRuntimeConfig {
        token,
        desk,
        counter_path: cli.counter_path(),
        sync_commands: !cli.skip_command_sync,
        publish_board_on_ready: !cli.skip_board_publish,
    })
    .await
}
