//! [`TicketPlatform`] backed by the Discord REST API.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateChannel, GetMessages, GuildChannel, GuildId, Http,
    Message, MessageId, PermissionOverwrite, PermissionOverwriteType, UserId,
};
use tix_tickets::{
    ChannelAccess, ChannelSnapshot, DeliveryOutcome, HistoryMessage, OutboundMessage,
    TicketChannelRequest, TicketPlatform,
};

use super::discord_render_helpers::{access_permissions, create_message, permission_overwrite};

const HISTORY_PAGE_SIZE: u8 = 100;
const HTTP_STATUS_FORBIDDEN: u16 = 403;
const HTTP_STATUS_NOT_FOUND: u16 = 404;

fn http_status(error: &serenity::Error) -> Option<u16> {
    match error {
        serenity::Error::Http(error) => error.status_code().map(|status| status.as_u16()),
        _ => None,
    }
}

fn channel_snapshot(channel: &GuildChannel) -> ChannelSnapshot {
    ChannelSnapshot {
        channel_id: channel.id.get(),
        name: channel.name.clone(),
        parent_id: channel.parent_id.map(ChannelId::get),
        topic: channel.topic.clone(),
    }
}

fn history_message(message: &Message) -> HistoryMessage {
    HistoryMessage {
        message_id: message.id.get(),
        author_id: message.author.id.get(),
        author_name: message.author.name.clone(),
        content: message.content.clone(),
        created_unix_ms: message.timestamp.unix_timestamp().saturating_mul(1_000),
    }
}

/// Talks to Discord through its own [`Http`] client, independent of the gateway.
pub struct SerenityTicketPlatform {
    http: Arc<Http>,
}

impl SerenityTicketPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TicketPlatform for SerenityTicketPlatform {
    async fn channel(&self, channel_id: u64) -> Result<Option<ChannelSnapshot>> {
        match self.http.get_channel(ChannelId::new(channel_id)).await {
            Ok(Channel::Guild(channel)) => Ok(Some(channel_snapshot(&channel))),
            Ok(_) => Ok(None),
            Err(error) if http_status(&error) == Some(HTTP_STATUS_NOT_FOUND) => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("failed to fetch channel {channel_id}"))
            }
        }
    }

    async fn category_channels(
        &self,
        guild_id: u64,
        category_id: u64,
    ) -> Result<Vec<ChannelSnapshot>> {
        let parent = ChannelId::new(category_id);
        let channels = GuildId::new(guild_id)
            .channels(&self.http)
            .await
            .with_context(|| format!("failed to list channels of guild {guild_id}"))?;
        Ok(channels
            .values()
            .filter(|channel| channel.parent_id == Some(parent))
            .map(channel_snapshot)
            .collect())
    }

    async fn create_ticket_channel(
        &self,
        request: &TicketChannelRequest,
    ) -> Result<ChannelSnapshot> {
        let overwrites = request
            .overwrites
            .iter()
            .map(|overwrite| permission_overwrite(request.guild_id, overwrite))
            .collect::<Vec<_>>();
        let builder = CreateChannel::new(&request.name)
            .kind(ChannelType::Text)
            .category(ChannelId::new(request.parent_id))
            .topic(&request.topic)
            .permissions(overwrites);
        let channel = GuildId::new(request.guild_id)
            .create_channel(&self.http, builder)
            .await
            .with_context(|| format!("failed to create ticket channel '{}'", request.name))?;
        Ok(channel_snapshot(&channel))
    }

    async fn send_message(&self, channel_id: u64, message: &OutboundMessage) -> Result<u64> {
        let sent = ChannelId::new(channel_id)
            .send_message(&self.http, create_message(message))
            .await
            .with_context(|| format!("failed to send message to channel {channel_id}"))?;
        Ok(sent.id.get())
    }

    async fn message_history(&self, channel_id: u64) -> Result<Vec<HistoryMessage>> {
        let channel = ChannelId::new(channel_id);
        let mut newest_first = Vec::new();
        let mut before: Option<MessageId> = None;
        loop {
            let mut request = GetMessages::new().limit(HISTORY_PAGE_SIZE);
            if let Some(before) = before {
                request = request.before(before);
            }
            let page = channel
                .messages(&self.http, request)
                .await
                .with_context(|| format!("failed to read history of channel {channel_id}"))?;
            before = page.last().map(|message| message.id);
            let page_len = page.len();
            newest_first.extend(page.iter().map(history_message));
            if page_len < usize::from(HISTORY_PAGE_SIZE) {
                break;
            }
        }
        newest_first.reverse();
        Ok(newest_first)
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> Result<Vec<HistoryMessage>> {
        let page = ChannelId::new(channel_id)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .with_context(|| format!("failed to read recent messages of channel {channel_id}"))?;
        Ok(page.iter().map(history_message).collect())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .with_context(|| format!("failed to delete message {message_id} in {channel_id}"))
    }

    async fn set_member_access(
        &self,
        channel_id: u64,
        user_id: u64,
        access: Option<ChannelAccess>,
    ) -> Result<()> {
        let channel = ChannelId::new(channel_id);
        let member = PermissionOverwriteType::Member(UserId::new(user_id));
        let result = match access {
            Some(access) => {
                let (allow, deny) = access_permissions(access);
                let overwrite = PermissionOverwrite {
                    allow,
                    deny,
                    kind: member,
                };
                channel.create_permission(&self.http, overwrite).await
            }
            None => channel.delete_permission(&self.http, member).await,
        };
        result.with_context(|| format!("failed to update access of {user_id} in channel {channel_id}"))
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .delete(&self.http)
            .await
            .with_context(|| format!("failed to delete channel {channel_id}"))?;
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: u64,
        message: &OutboundMessage,
    ) -> DeliveryOutcome {
        let result: serenity::Result<Message> = async {
            let dm = UserId::new(user_id).create_dm_channel(&self.http).await?;
            dm.id.send_message(&self.http, create_message(message)).await
        }
        .await;
        match result {
            Ok(_) => DeliveryOutcome::Delivered,
            Err(error) if http_status(&error) == Some(HTTP_STATUS_FORBIDDEN) => {
                DeliveryOutcome::Refused
            }
            Err(error) => DeliveryOutcome::Unknown(error.to_string()),
        }
    }
}
