//! Chat-platform operations the ticket desk consumes.
//!
//! The controller only speaks in these platform-neutral shapes; the gateway
//! runtime maps them onto concrete API calls.

use anyhow::Result;
use async_trait::async_trait;

use crate::category::TicketCategory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub channel_id: u64,
    pub name: String,
    pub parent_id: Option<u64>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `OverwriteTarget` values.
pub enum OverwriteTarget {
    Everyone,
    Role(u64),
    Member(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-target channel access.
pub enum ChannelAccess {
    /// View, send, and read history.
    Participant,
    /// Channel is not visible.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessOverwrite {
    pub target: OverwriteTarget,
    pub access: ChannelAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketChannelRequest {
    pub guild_id: u64,
    pub parent_id: u64,
    pub name: String,
    pub topic: String,
    pub overwrites: Vec<AccessOverwrite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColour {
    Red,
    Green,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedCard {
    pub title: String,
    pub description: String,
    pub colour: EmbedColour,
    pub fields: Vec<EmbedField>,
}

impl EmbedCard {
    pub fn new(title: impl Into<String>, description: impl Into<String>, colour: EmbedColour) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Interactive controls attached to an outbound message.
pub enum MessageControl {
    CloseTicket,
    ConfirmClose,
    CategoryPicker { categories: Vec<TicketCategory> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embed: Option<EmbedCard>,
    pub attachment: Option<FileAttachment>,
    pub controls: Vec<MessageControl>,
}

impl OutboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: EmbedCard) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn attachment(mut self, attachment: FileAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn control(mut self, control: MessageControl) -> Self {
        self.controls.push(control);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    pub created_unix_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a best-effort direct message.
pub enum DeliveryOutcome {
    Delivered,
    /// The recipient does not accept direct messages from the bot.
    Refused,
    Unknown(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Refused => "refused",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[async_trait]
/// Trait contract for `TicketPlatform` behavior.
pub trait TicketPlatform: Send + Sync {
    /// Looks up a channel; `Ok(None)` when it does not exist.
    async fn channel(&self, channel_id: u64) -> Result<Option<ChannelSnapshot>>;

    /// Channels nested under `category_id`.
    async fn category_channels(&self, guild_id: u64, category_id: u64)
        -> Result<Vec<ChannelSnapshot>>;

    async fn create_ticket_channel(&self, request: &TicketChannelRequest)
        -> Result<ChannelSnapshot>;

    /// Posts a message and returns its id.
    async fn send_message(&self, channel_id: u64, message: &OutboundMessage) -> Result<u64>;

    /// Full channel history, oldest first.
    async fn message_history(&self, channel_id: u64) -> Result<Vec<HistoryMessage>>;

    /// Up to `limit` most recent messages, newest first.
    async fn recent_messages(&self, channel_id: u64, limit: u8) -> Result<Vec<HistoryMessage>>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()>;

    /// Sets a member overwrite, or removes it when `access` is `None`.
    async fn set_member_access(
        &self,
        channel_id: u64,
        user_id: u64,
        access: Option<ChannelAccess>,
    ) -> Result<()>;

    async fn delete_channel(&self, channel_id: u64) -> Result<()>;

    async fn send_direct_message(&self, user_id: u64, message: &OutboundMessage)
        -> DeliveryOutcome;
}
