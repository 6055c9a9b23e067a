//! Discord gateway runtime that routes interactions into the ticket lifecycle.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serenity::all::{Context, EventHandler, GatewayIntents, GuildId, Interaction, Ready};
use serenity::async_trait;
use serenity::Client;
use serenity::http::Http;
use tix_tickets::{
    publish_ticket_board, CounterStore, JsonFileCounterStore, TicketDeskConfig,
    TicketLifecycleController,
};
use tracing::{error, info, warn};

mod discord_command_helpers;
mod discord_interactions;
mod discord_platform;
mod discord_render_helpers;

use discord_command_helpers::ticket_slash_commands;
use discord_interactions::{handle_command, handle_component, handle_modal};
pub use discord_platform::SerenityTicketPlatform;

#[derive(Clone)]
/// Runtime configuration for the Discord gateway connection.
pub struct DiscordRuntimeConfig {
    pub token: String,
    pub desk: TicketDeskConfig,
    pub counter_path: PathBuf,
    /// Re-register the guild slash commands on every ready event.
    pub sync_commands: bool,
    /// Purge and republish the ticket board on every ready event.
    pub publish_board_on_ready: bool,
}

pub(crate) struct TicketDeskHandler {
    controller: Arc<TicketLifecycleController>,
    bot_user_id: AtomicU64,
    sync_commands: bool,
    publish_board_on_ready: bool,
}

impl TicketDeskHandler {
    pub(crate) fn new(
        controller: Arc<TicketLifecycleController>,
        sync_commands: bool,
        publish_board_on_ready: bool,
    ) -> Self {
        Self {
            controller,
            bot_user_id: AtomicU64::new(0),
            sync_commands,
            publish_board_on_ready,
        }
    }

    async fn bot_user_id(&self, ctx: &Context) -> Result<u64> {
        let known = self.bot_user_id.load(Ordering::Relaxed);
        if known != 0 {
            return Ok(known);
        }
        let user = ctx
            .http
            .get_current_user()
            .await
            .context("failed to resolve bot user")?;
        let user_id = user.id.get();
        self.bot_user_id.store(user_id, Ordering::Relaxed);
        Ok(user_id)
    }

    async fn on_ready(&self, ctx: &Context, ready: &Ready) -> Result<()> {
        let bot_user_id = ready.user.id.get();
        self.bot_user_id.store(bot_user_id, Ordering::Relaxed);
        info!(bot = %ready.user.name, bot_user_id, "discord gateway ready");

        let config = self.controller.config();
        if self.sync_commands {
            let commands = GuildId::new(config.guild_id)
                .set_commands(&ctx.http, ticket_slash_commands())
                .await
                .context("failed to sync guild slash commands")?;
            info!(guild_id = config.guild_id, commands = commands.len(), "slash commands synced");
        }
        if self.publish_board_on_ready {
            match publish_ticket_board(self.controller.platform(), config, bot_user_id).await {
                Ok(report) => info!(
                    channel_id = report.channel_id,
                    purged_messages = report.purged_messages,
                    "ticket board republished on startup"
                ),
                Err(error) => warn!(error = %error, "ticket board not republished on startup"),
            }
        }
        Ok(())
    }

    async fn on_interaction(&self, ctx: &Context, interaction: &Interaction) -> Result<()> {
        match interaction {
            Interaction::Command(command) => {
                let bot_user_id = self.bot_user_id(ctx).await?;
                handle_command(ctx, &self.controller, bot_user_id, command).await
            }
            Interaction::Component(component) => {
                handle_component(ctx, &self.controller, component).await
            }
            Interaction::Modal(modal) => handle_modal(ctx, &self.controller, modal).await,
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EventHandler for TicketDeskHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        if let Err(error) = self.on_ready(&ctx, &ready).await {
            error!(error = %format!("{error:#}"), "startup routine failed");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Err(error) = self.on_interaction(&ctx, &interaction).await {
            error!(error = %format!("{error:#}"), "interaction handling failed");
        }
    }
}

pub(crate) fn gateway_intents() -> GatewayIntents {
    GatewayIntents::non_privileged() | GatewayIntents::GUILD_MEMBERS | GatewayIntents::MESSAGE_CONTENT
}

/// Connects to the gateway and serves ticket interactions until shutdown.
pub async fn run_discord_runtime(config: DiscordRuntimeConfig) -> Result<()> {
    let counter = JsonFileCounterStore::open(config.counter_path.clone())?;
    info!(
        path = %counter.path().display(),
        count = counter.load().await?,
        "ticket counter ready"
    );

    let platform = SerenityTicketPlatform::new(Arc::new(Http::new(&config.token)));
    let controller = Arc::new(TicketLifecycleController::new(
        Arc::new(config.desk),
        Arc::new(platform),
        Arc::new(counter),
    ));
    let handler = TicketDeskHandler::new(
        controller,
        config.sync_commands,
        config.publish_board_on_ready,
    );

    let mut client = Client::builder(&config.token, gateway_intents())
        .event_handler(handler)
        .await
        .context("failed to build Discord gateway client")?;
    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });
    client
        .start()
        .await
        .context("Discord gateway client stopped unexpectedly")
}
