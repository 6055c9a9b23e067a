//! Ticket lifecycle: open, close confirmation, transcript archival and
//! participant management.

use std::sync::{Arc, Mutex, MutexGuard};

use tix_access::{evaluate_ticket_access, parse_owner_topic, render_owner_topic, TicketActor};
use tix_core::{deadline_after_ms, is_deadline_elapsed};
use tracing::{error, info, warn};

use crate::category::{ticket_channel_name, TicketCategory};
use crate::config::TicketDeskConfig;
use crate::counter::CounterStore;
use crate::error::{TicketAction, TicketError};
use crate::platform::{
    AccessOverwrite, ChannelAccess, ChannelSnapshot, DeliveryOutcome, FileAttachment,
    OutboundMessage, OverwriteTarget, TicketChannelRequest, TicketPlatform,
};
use crate::registry::{TicketRecord, TicketRegistry, TicketState};
use crate::render::{
    participant_added_dm, participant_added_notice, participant_removed_dm,
    participant_removed_notice, ticket_summary_message, transcript_archive_message,
    transcript_owner_message, DM_REFUSED_CHANNEL_NOTICE,
};
use crate::transcript::{render_transcript, transcript_file_name, TranscriptEntry};


#[derive(Debug, Clone, PartialEq, Eq)]
/// A submitted ticket form. `values` follow the category's field order.
pub struct TicketSubmission {
    pub category: TicketCategory,
    pub user_id: u64,
    pub username: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTicket {
    pub channel_id: u64,
    pub channel_name: String,
    pub ticket_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseRequest {
    pub channel_id: u64,
    pub deadline_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedTicket {
    pub channel_id: u64,
    pub channel_name: String,
    pub transcript_lines: usize,
    /// `None` when the owner is unknown and no DM was attempted.
    pub owner_dm: Option<DeliveryOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantChange {
    pub channel_id: u64,
    pub member_id: u64,
    pub member_dm: DeliveryOutcome,
}

/// Drives ticket state against a [`TicketPlatform`].
///
/// Configuration, platform and counter store are injected at construction; the
/// registry lives here and is rebuilt lazily from channel topics for tickets
/// created by an earlier process.
pub struct TicketLifecycleController {
    config: Arc<TicketDeskConfig>,
    platform: Arc<dyn TicketPlatform>,
    counter: Arc<dyn CounterStore>,
    registry: Mutex<TicketRegistry>,
}

impl TicketLifecycleController {
    pub fn new(
        config: Arc<TicketDeskConfig>,
        platform: Arc<dyn TicketPlatform>,
        counter: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            config,
            platform,
            counter,
            registry: Mutex::new(TicketRegistry::new()),
        }
    }

    pub fn config(&self) -> &TicketDeskConfig {
        &self.config
    }

    pub fn platform(&self) -> &dyn TicketPlatform {
        self.platform.as_ref()
    }

    fn registry(&self) -> MutexGuard<'_, TicketRegistry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ticket_state(&self, channel_id: u64) -> Option<TicketState> {
        self.registry().get(channel_id).map(|record| record.state)
    }

    pub fn tracked_tickets(&self) -> usize {
        self.registry().len()
    }

    /// Creates the ticket channel for a submitted form.
    ///
    /// The counter is incremented after the duplicate check and before the
    /// channel is created, so a failed creation consumes a number.
    pub async fn open_ticket(
        &self,
        submission: TicketSubmission,
    ) -> Result<OpenedTicket, TicketError> {
        let TicketSubmission {
            category,
            user_id,
            username,
            values,
        } = submission;
        let expected = category.field_labels().len();
        if values.len() != expected {
            return Err(TicketError::InvalidSubmission(format!(
                "{category} expects {expected} answers, got {}",
                values.len()
            )));
        }

        let parent_id = self
            .config
            .category_channel_id(category)
            .ok_or(TicketError::CategoryNotConfigured { category })?;
        if self.platform.channel(parent_id).await?.is_none() {
            return Err(TicketError::ChannelNotFound {
                channel_id: parent_id,
                purpose: "ticket category",
            });
        }

        let channel_name = ticket_channel_name(category, &username);
        let existing = self
            .platform
            .category_channels(self.config.guild_id, parent_id)
            .await?;
        if existing
            .iter()
            .any(|channel| channel.name == channel_name && self.blocks_reopen(channel, user_id))
        {
            info!(
                user_id,
                category = category.slug(),
                channel_name = %channel_name,
                "duplicate ticket rejected"
            );
            return Err(TicketError::DuplicateTicket { channel_name });
        }

        let ticket_number = self.counter.increment().await?;
        let request = TicketChannelRequest {
            guild_id: self.config.guild_id,
            parent_id,
            name: channel_name.clone(),
            topic: render_owner_topic(user_id),
            overwrites: vec![
                AccessOverwrite {
                    target: OverwriteTarget::Everyone,
                    access: ChannelAccess::Hidden,
                },
                AccessOverwrite {
                    target: OverwriteTarget::Member(user_id),
                    access: ChannelAccess::Participant,
                },
                AccessOverwrite {
                    target: OverwriteTarget::Role(self.config.staff_role_id),
                    access: ChannelAccess::Participant,
                },
            ],
        };
        let channel = match self.platform.create_ticket_channel(&request).await {
            Ok(channel) => channel,
            Err(error) => {
                warn!(
                    user_id,
                    ticket_number,
                    category = category.slug(),
                    error = %error,
                    "ticket channel creation failed after counter increment"
                );
                return Err(error.into());
            }
        };

        self.registry().upsert(TicketRecord {
            channel_id: channel.channel_id,
            channel_name: channel.name.clone(),
            owner_id: Some(user_id),
            category,
            state: TicketState::Open,
        });
        let summary = ticket_summary_message(&self.config, category, user_id, &username, &values);
        if let Err(error) = self.platform.send_message(channel.channel_id, &summary).await {
            self.discard_unannounced_channel(channel.channel_id).await;
            return Err(error.into());
        }

        info!(
            channel_id = channel.channel_id,
            user_id,
            ticket_number,
            category = category.slug(),
            "ticket opened"
        );
        Ok(OpenedTicket {
            channel_id: channel.channel_id,
            channel_name: channel.name,
            ticket_number,
        })
    }

    /// A same-named channel blocks a new ticket unless it is known to belong to
    /// someone else. Names fold characters away, so `j.doe` and `jdoe` share one.
    fn blocks_reopen(&self, channel: &ChannelSnapshot, user_id: u64) -> bool {
        let tracked_owner = self
            .registry()
            .get(channel.channel_id)
            .map(|record| record.owner_id);
        let owner_id =
            tracked_owner.unwrap_or_else(|| parse_owner_topic(channel.topic.as_deref()));
        match owner_id {
            Some(owner_id) => owner_id == user_id,
            None => true,
        }
    }

    /// Rolls back a channel whose summary (and Close control) never arrived.
    async fn discard_unannounced_channel(&self, channel_id: u64) {
        self.registry().remove(channel_id);
        match self.platform.delete_channel(channel_id).await {
            Ok(()) => warn!(channel_id, "ticket summary not delivered; channel removed"),
            Err(error) => error!(
                channel_id,
                error = %error,
                "ticket summary not delivered and channel could not be removed"
            ),
        }
    }

    /// Moves an open ticket to pending close; pressing again refreshes the deadline.
    pub async fn request_close(
        &self,
        channel_id: u64,
        actor: &TicketActor,
        now_unix_ms: u64,
    ) -> Result<CloseRequest, TicketError> {
        let record = self.tracked_or_hydrated(channel_id).await?;
        if record.state == TicketState::Closed {
            return Err(TicketError::TicketClosed { channel_id });
        }
        self.authorize(&record, actor, TicketAction::Close)?;

        let deadline_unix_ms =
            deadline_after_ms(now_unix_ms, self.config.close_confirmation_window_ms());
        self.registry().set_state(
            channel_id,
            TicketState::PendingClose {
                requested_by: actor.user_id,
                deadline_unix_ms,
            },
        );
        info!(
            channel_id,
            user_id = actor.user_id,
            deadline_unix_ms,
            "ticket close requested"
        );
        Ok(CloseRequest {
            channel_id,
            deadline_unix_ms,
        })
    }

    /// Archives the transcript, notifies the owner and deletes the channel.
    ///
    /// Any failure before the channel is gone returns the ticket to `Open`.
    pub async fn confirm_close(
        &self,
        channel_id: u64,
        actor: &TicketActor,
        now_unix_ms: u64,
    ) -> Result<ClosedTicket, TicketError> {
        let record = {
            let mut registry = self.registry();
            let record = registry
                .get(channel_id)
                .cloned()
                .ok_or(TicketError::NoPendingClose { channel_id })?;
            match record.state {
                TicketState::Open => return Err(TicketError::NoPendingClose { channel_id }),
                TicketState::Closed => return Err(TicketError::TicketClosed { channel_id }),
                TicketState::PendingClose {
                    deadline_unix_ms, ..
                } => {
                    if is_deadline_elapsed(deadline_unix_ms, now_unix_ms) {
                        registry.set_state(channel_id, TicketState::Open);
                        info!(channel_id, "ticket close confirmation expired");
                        return Err(TicketError::ConfirmationExpired { channel_id });
                    }
                }
            }
            self.authorize(&record, actor, TicketAction::Close)?;
            registry.set_state(channel_id, TicketState::Closed);
            record
        };

        match self.archive_and_delete(&record).await {
            Ok(closed) => {
                self.registry().remove(channel_id);
                info!(
                    channel_id,
                    user_id = actor.user_id,
                    transcript_lines = closed.transcript_lines,
                    "ticket closed"
                );
                Ok(closed)
            }
            Err(error) => {
                self.registry().set_state(channel_id, TicketState::Open);
                warn!(channel_id, error = %error, "ticket close aborted; ticket reopened");
                Err(error)
            }
        }
    }

    async fn archive_and_delete(&self, record: &TicketRecord) -> Result<ClosedTicket, TicketError> {
        let archive_id = self.config.transcript_channel_id;
        if self.platform.channel(archive_id).await?.is_none() {
            return Err(TicketError::ChannelNotFound {
                channel_id: archive_id,
                purpose: "transcript channel",
            });
        }

        let history = self.platform.message_history(record.channel_id).await?;
        let entries = history.iter().map(TranscriptEntry::from).collect::<Vec<_>>();
        let transcript = render_transcript(&entries, self.config.transcript_tz());
        let attachment = FileAttachment {
            file_name: transcript_file_name(&record.channel_name),
            bytes: transcript.into_bytes(),
        };
        self.platform
            .send_message(archive_id, &transcript_archive_message(attachment.clone()))
            .await?;

        let owner_dm = match record.owner_id {
            Some(owner_id) => Some(
                self.deliver_owner_transcript(record, owner_id, attachment)
                    .await,
            ),
            None => {
                warn!(
                    channel_id = record.channel_id,
                    "ticket owner unknown; transcript not sent by DM"
                );
                None
            }
        };

        self.platform.delete_channel(record.channel_id).await?;
        Ok(ClosedTicket {
            channel_id: record.channel_id,
            channel_name: record.channel_name.clone(),
            transcript_lines: entries.len(),
            owner_dm,
        })
    }

    async fn deliver_owner_transcript(
        &self,
        record: &TicketRecord,
        owner_id: u64,
        attachment: FileAttachment,
    ) -> DeliveryOutcome {
        let message = transcript_owner_message(&record.channel_name, attachment);
        let outcome = self.platform.send_direct_message(owner_id, &message).await;
        if !outcome.is_delivered() {
            warn!(
                channel_id = record.channel_id,
                user_id = owner_id,
                outcome = outcome.as_str(),
                "transcript DM not delivered"
            );
            let notice = OutboundMessage::new().content(DM_REFUSED_CHANNEL_NOTICE);
            if let Err(error) = self.platform.send_message(record.channel_id, &notice).await {
                warn!(
                    channel_id = record.channel_id,
                    error = %error,
                    "failed to post DM refusal notice"
                );
            }
        }
        outcome
    }

    /// Reverts this channel's pending close once its confirmation window has
    /// passed. Returns false when the close was confirmed, refreshed or never pending.
    pub fn expire_pending_close(&self, channel_id: u64, now_unix_ms: u64) -> bool {
        let Some(requested_by) = self.registry().revert_expired_close(channel_id, now_unix_ms)
        else {
            return false;
        };
        info!(channel_id, requested_by, "ticket close confirmation expired");
        true
    }

    pub async fn add_participant(
        &self,
        channel_id: u64,
        actor: &TicketActor,
        member_id: u64,
    ) -> Result<ParticipantChange, TicketError> {
        let record = self
            .authorize_participant_change(channel_id, actor, TicketAction::AddParticipant)
            .await?;
        self.platform
            .set_member_access(channel_id, member_id, Some(ChannelAccess::Participant))
            .await?;
        self.platform
            .send_message(channel_id, &participant_added_notice(actor.user_id, member_id))
            .await?;
        let member_dm = self
            .platform
            .send_direct_message(
                member_id,
                &participant_added_dm(self.config.guild_id, channel_id, actor.user_id),
            )
            .await;
        self.log_participant_change(&record, actor, member_id, "added", &member_dm);
        Ok(ParticipantChange {
            channel_id,
            member_id,
            member_dm,
        })
    }

    pub async fn remove_participant(
        &self,
        channel_id: u64,
        actor: &TicketActor,
        member_id: u64,
    ) -> Result<ParticipantChange, TicketError> {
        let record = self
            .authorize_participant_change(channel_id, actor, TicketAction::RemoveParticipant)
            .await?;
        self.platform
            .set_member_access(channel_id, member_id, None)
            .await?;
        self.platform
            .send_message(
                channel_id,
                &participant_removed_notice(actor.user_id, member_id),
            )
            .await?;
        let member_dm = self
            .platform
            .send_direct_message(
                member_id,
                &participant_removed_dm(&record.channel_name, actor.user_id),
            )
            .await;
        self.log_participant_change(&record, actor, member_id, "removed", &member_dm);
        Ok(ParticipantChange {
            channel_id,
            member_id,
            member_dm,
        })
    }

    fn log_participant_change(
        &self,
        record: &TicketRecord,
        actor: &TicketActor,
        member_id: u64,
        change: &'static str,
        member_dm: &DeliveryOutcome,
    ) {
        info!(
            channel_id = record.channel_id,
            user_id = actor.user_id,
            member_id,
            change,
            "ticket participants changed"
        );
        if !member_dm.is_delivered() {
            warn!(
                channel_id = record.channel_id,
                member_id,
                outcome = member_dm.as_str(),
                "participant DM not delivered"
            );
        }
    }

    /// Participant commands only apply inside a configured ticket category.
    async fn authorize_participant_change(
        &self,
        channel_id: u64,
        actor: &TicketActor,
        action: TicketAction,
    ) -> Result<TicketRecord, TicketError> {
        let snapshot = self
            .platform
            .channel(channel_id)
            .await?
            .ok_or(TicketError::NotATicketChannel { channel_id })?;
        let record = self.hydrate(&snapshot)?;
        if record.state == TicketState::Closed {
            return Err(TicketError::TicketClosed { channel_id });
        }
        self.authorize(&record, actor, action)?;
        Ok(record)
    }

    async fn tracked_or_hydrated(&self, channel_id: u64) -> Result<TicketRecord, TicketError> {
        let tracked = self.registry().get(channel_id).cloned();
        if let Some(record) = tracked {
            return Ok(record);
        }
        let snapshot = self
            .platform
            .channel(channel_id)
            .await?
            .ok_or(TicketError::NotATicketChannel { channel_id })?;
        self.hydrate(&snapshot)
    }

    /// Returns the tracked record, rebuilding it from the channel topic when the
    /// channel predates this process.
    fn hydrate(&self, snapshot: &ChannelSnapshot) -> Result<TicketRecord, TicketError> {
        let category = self
            .config
            .category_for_parent(snapshot.parent_id)
            .ok_or(TicketError::NotATicketChannel {
                channel_id: snapshot.channel_id,
            })?;
        let owner_id = parse_owner_topic(snapshot.topic.as_deref());
        let mut registry = self.registry();
        if let Some(record) = registry.get(snapshot.channel_id) {
            return Ok(record.clone());
        }
        if owner_id.is_none() {
            warn!(
                channel_id = snapshot.channel_id,
                "ticket owner could not be resolved from topic; staff only"
            );
        }
        Ok(registry.insert_if_absent(TicketRecord {
            channel_id: snapshot.channel_id,
            channel_name: snapshot.name.clone(),
            owner_id,
            category,
            state: TicketState::Open,
        }))
    }

    fn authorize(
        &self,
        record: &TicketRecord,
        actor: &TicketActor,
        action: TicketAction,
    ) -> Result<(), TicketError> {
        let decision = evaluate_ticket_access(&self.config.access_policy(), record.owner_id, actor);
        if decision.is_allowed() {
            return Ok(());
        }
        info!(
            channel_id = record.channel_id,
            user_id = actor.user_id,
            action = action.as_str(),
            reason_code = decision.reason_code(),
            "ticket action denied"
        );
        Err(TicketError::Unauthorized {
            channel_id: record.channel_id,
            actor_id: actor.user_id,
            action,
            reason_code: decision.reason_code().to_string(),
        })
    }
}
