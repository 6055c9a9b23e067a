use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};

pub const COUNTER_FILE_NAME: &str = "ticket_counter.json";

#[derive(Debug, Parser)]
#[command(
    name = "tix",
    about = "Support-ticket desk bot for Discord guilds",
    version
)]
/// Command-line flags for the ticket desk bot.
pub struct Cli {
    #[arg(
        long,
        env = "TIX_CONFIG",
        default_value = "tix.toml",
        help = "Path to the ticket desk TOML configuration"
    )]
    pub config: PathBuf,

    #[arg(
        long = "discord-token",
        env = "DISCORD_TOKEN",
        hide_env_values = true,
        help = "Discord bot token used for the gateway and REST API"
    )]
    pub discord_token: Option<String>,

    #[arg(
        long = "state-dir",
        env = "TIX_STATE_DIR",
        default_value = ".tix",
        help = "Directory holding the persisted ticket counter"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long = "check-config",
        default_value_t = false,
        help = "Validate the configuration, print a summary and exit"
    )]
    pub check_config: bool,

    #[arg(
        long = "skip-command-sync",
        default_value_t = false,
        action = ArgAction::SetTrue,
        help = "Do not re-register guild slash commands on startup"
    )]
    pub skip_command_sync: bool,

    #[arg(
        long = "skip-board-publish",
        default_value_t = false,
        action = ArgAction::SetTrue,
        help = "Do not purge and republish the ticket board on startup"
    )]
    pub skip_board_publish: bool,
}

impl Cli {
    pub fn counter_path(&self) -> PathBuf {
        self.state_dir.join(COUNTER_FILE_NAME)
    }

    /// Token with surrounding whitespace removed; empty values count as missing.
    pub fn resolved_discord_token(&self) -> Result<String> {
        match self.discord_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => bail!("discord token missing: set DISCORD_TOKEN or pass --discord-token"),
        }
    }
}
