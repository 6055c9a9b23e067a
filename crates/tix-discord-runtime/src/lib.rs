//! Discord gateway runtime for the ticket desk.
mod discord_runtime;

pub use discord_runtime::{run_discord_runtime, DiscordRuntimeConfig, SerenityTicketPlatform};
