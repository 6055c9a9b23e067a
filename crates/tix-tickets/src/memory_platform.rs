//! In-memory [`TicketPlatform`] used by unit and integration tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::platform::{
    AccessOverwrite, ChannelAccess, ChannelSnapshot, DeliveryOutcome, HistoryMessage,
    OutboundMessage, OverwriteTarget, TicketChannelRequest, TicketPlatform,
};

/// Author id recorded for messages the platform itself sends.
pub const MEMORY_BOT_USER_ID: u64 = 9_000;
const MEMORY_BOT_NAME: &str = "tix";
const FIRST_CREATED_CHANNEL_ID: u64 = 5_000;
const FIRST_MESSAGE_ID: u64 = 70_000;

#[derive(Debug, Default)]
struct MemoryPlatformState {
    next_channel_id: u64,
    next_message_id: u64,
    clock_unix_ms: i64,
    channels: BTreeMap<u64, ChannelSnapshot>,
    overwrites: HashMap<u64, Vec<AccessOverwrite>>,
    history: HashMap<u64, Vec<HistoryMessage>>,
    sent: Vec<(u64, OutboundMessage)>,
    direct_messages: Vec<(u64, OutboundMessage)>,
    refused_dm_users: HashSet<u64>,
    failing_history: HashSet<u64>,
    deleted_channels: Vec<u64>,
    deleted_messages: Vec<(u64, u64)>,
    fail_next_channel_creation: bool,
    fail_next_send: bool,
}

impl MemoryPlatformState {
    fn allocate_message_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    fn require_channel(&self, channel_id: u64) -> Result<()> {
        if self.channels.contains_key(&channel_id) {
            Ok(())
        } else {
            Err(anyhow!("unknown channel {channel_id}"))
        }
    }
}

#[derive(Debug)]
pub struct MemoryTicketPlatform {
    state: Mutex<MemoryPlatformState>,
}

impl Default for MemoryTicketPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTicketPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryPlatformState {
                next_channel_id: FIRST_CREATED_CHANNEL_ID,
                next_message_id: FIRST_MESSAGE_ID,
                ..MemoryPlatformState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryPlatformState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_category(&self, category_id: u64) {
        self.add_text_channel(category_id, &format!("category-{category_id}"), None, None);
    }

    pub fn add_text_channel(
        &self,
        channel_id: u64,
        name: &str,
        parent_id: Option<u64>,
        topic: Option<&str>,
    ) {
        self.state().channels.insert(
            channel_id,
            ChannelSnapshot {
                channel_id,
                name: name.to_string(),
                parent_id,
                topic: topic.map(str::to_string),
            },
        );
    }

    /// Drops a channel without recording it as deleted by the desk.
    pub fn remove_channel(&self, channel_id: u64) {
        self.state().channels.remove(&channel_id);
    }

    /// Timestamp stamped on messages the bot sends.
    pub fn set_clock(&self, unix_ms: i64) {
        self.state().clock_unix_ms = unix_ms;
    }

    /// Appends a user message to a channel's history; returns its id.
    pub fn push_history(
        &self,
        channel_id: u64,
        author_id: u64,
        author_name: &str,
        content: &str,
        created_unix_ms: i64,
    ) -> u64 {
        let mut state = self.state();
        let message_id = state.allocate_message_id();
        state
            .history
            .entry(channel_id)
            .or_default()
            .push(HistoryMessage {
                message_id,
                author_id,
                author_name: author_name.to_string(),
                content: content.to_string(),
                created_unix_ms,
            });
        message_id
    }

    pub fn refuse_dms_for(&self, user_id: u64) {
        self.state().refused_dm_users.insert(user_id);
    }

    pub fn fail_next_channel_creation(&self) {
        self.state().fail_next_channel_creation = true;
    }

    pub fn fail_next_send(&self) {
        self.state().fail_next_send = true;
    }

    pub fn fail_history_for(&self, channel_id: u64) {
        self.state().failing_history.insert(channel_id);
    }

    pub fn channel_snapshot(&self, channel_id: u64) -> Option<ChannelSnapshot> {
        self.state().channels.get(&channel_id).cloned()
    }

    pub fn channel_named(&self, parent_id: u64, name: &str) -> Option<ChannelSnapshot> {
        self.state()
            .channels
            .values()
            .find(|channel| channel.parent_id == Some(parent_id) && channel.name == name)
            .cloned()
    }

    pub fn sent_messages(&self, channel_id: u64) -> Vec<OutboundMessage> {
        self.state()
            .sent
            .iter()
            .filter(|(target, _)| *target == channel_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn direct_messages(&self, user_id: u64) -> Vec<OutboundMessage> {
        self.state()
            .direct_messages
            .iter()
            .filter(|(target, _)| *target == user_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn channel_overwrites(&self, channel_id: u64) -> Vec<AccessOverwrite> {
        self.state()
            .overwrites
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn member_access(&self, channel_id: u64, user_id: u64) -> Option<ChannelAccess> {
        self.channel_overwrites(channel_id)
            .into_iter()
            .find(|overwrite| overwrite.target == OverwriteTarget::Member(user_id))
            .map(|overwrite| overwrite.access)
    }

    pub fn history_len(&self, channel_id: u64) -> usize {
        self.state()
            .history
            .get(&channel_id)
            .map_or(0, Vec::len)
    }

    pub fn deleted_channels(&self) -> Vec<u64> {
        self.state().deleted_channels.clone()
    }

    pub fn deleted_messages(&self) -> Vec<(u64, u64)> {
        self.state().deleted_messages.clone()
    }
}

#[async_trait]
impl TicketPlatform for MemoryTicketPlatform {
    async fn channel(&self, channel_id: u64) -> Result<Option<ChannelSnapshot>> {
        Ok(self.channel_snapshot(channel_id))
    }

    async fn category_channels(
        &self,
        _guild_id: u64,
        category_id: u64,
    ) -> Result<Vec<ChannelSnapshot>> {
        Ok(self
            .state()
            .channels
            .values()
            .filter(|channel| channel.parent_id == Some(category_id))
            .cloned()
            .collect())
    }

    async fn create_ticket_channel(
        &self,
        request: &TicketChannelRequest,
    ) -> Result<ChannelSnapshot> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_next_channel_creation) {
            bail!("channel creation rejected for '{}'", request.name);
        }
        state.require_channel(request.parent_id)?;
        let channel_id = state.next_channel_id;
        state.next_channel_id += 1;
        let snapshot = ChannelSnapshot {
            channel_id,
            name: request.name.clone(),
            parent_id: Some(request.parent_id),
            topic: Some(request.topic.clone()),
        };
        state.channels.insert(channel_id, snapshot.clone());
        state.overwrites.insert(channel_id, request.overwrites.clone());
        Ok(snapshot)
    }

    async fn send_message(&self, channel_id: u64, message: &OutboundMessage) -> Result<u64> {
        let mut state = self.state();
        state.require_channel(channel_id)?;
        if std::mem::take(&mut state.fail_next_send) {
            bail!("message rejected in channel {channel_id}");
        }
        let message_id = state.allocate_message_id();
        let content = message
            .content
            .clone()
            .or_else(|| message.embed.as_ref().map(|embed| embed.title.clone()))
            .unwrap_or_default();
        let created_unix_ms = state.clock_unix_ms;
        state
            .history
            .entry(channel_id)
            .or_default()
            .push(HistoryMessage {
                message_id,
                author_id: MEMORY_BOT_USER_ID,
                author_name: MEMORY_BOT_NAME.to_string(),
                content,
                created_unix_ms,
            });
        state.sent.push((channel_id, message.clone()));
        Ok(message_id)
    }

    async fn message_history(&self, channel_id: u64) -> Result<Vec<HistoryMessage>> {
        let state = self.state();
        state.require_channel(channel_id)?;
        if state.failing_history.contains(&channel_id) {
            bail!("history unavailable for channel {channel_id}");
        }
        Ok(state.history.get(&channel_id).cloned().unwrap_or_default())
    }

    async fn recent_messages(&self, channel_id: u64, limit: u8) -> Result<Vec<HistoryMessage>> {
        let state = self.state();
        state.require_channel(channel_id)?;
        Ok(state
            .history
            .get(&channel_id)
            .map(|messages| {
                messages
                    .iter()
                    .rev()
                    .take(usize::from(limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()> {
        let mut state = self.state();
        let messages = state
            .history
            .get_mut(&channel_id)
            .ok_or_else(|| anyhow!("unknown channel {channel_id}"))?;
        let before = messages.len();
        messages.retain(|message| message.message_id != message_id);
        if messages.len() == before {
            bail!("unknown message {message_id} in channel {channel_id}");
        }
        state.deleted_messages.push((channel_id, message_id));
        Ok(())
    }

    async fn set_member_access(
        &self,
        channel_id: u64,
        user_id: u64,
        access: Option<ChannelAccess>,
    ) -> Result<()> {
        let mut state = self.state();
        state.require_channel(channel_id)?;
        let overwrites = state.overwrites.entry(channel_id).or_default();
        overwrites.retain(|overwrite| overwrite.target != OverwriteTarget::Member(user_id));
        if let Some(access) = access {
            overwrites.push(AccessOverwrite {
                target: OverwriteTarget::Member(user_id),
                access,
            });
        }
        Ok(())
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<()> {
        let mut state = self.state();
        if state.channels.remove(&channel_id).is_none() {
            bail!("unknown channel {channel_id}");
        }
        state.overwrites.remove(&channel_id);
        state.history.remove(&channel_id);
        state.deleted_channels.push(channel_id);
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: u64,
        message: &OutboundMessage,
    ) -> DeliveryOutcome {
        let mut state = self.state();
        if state.refused_dm_users.contains(&user_id) {
            return DeliveryOutcome::Refused;
        }
        state.direct_messages.push((user_id, message.clone()));
        DeliveryOutcome::Delivered
    }
}
