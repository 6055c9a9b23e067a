use thiserror::Error;

use crate::category::TicketCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Ticket operations that pass through the access policy.
pub enum TicketAction {
    Close,
    AddParticipant,
    RemoveParticipant,
}

impl TicketAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::AddParticipant => "add_participant",
            Self::RemoveParticipant => "remove_participant",
        }
    }

    fn denial_phrase(self) -> &'static str {
        match self {
            Self::Close => "close this ticket",
            Self::AddParticipant => "add people",
            Self::RemoveParticipant => "remove people",
        }
    }
}

#[derive(Debug, Error)]
/// Enumerates supported `TicketError` values.
pub enum TicketError {
    #[error("no channel category configured for {category}")]
    CategoryNotConfigured { category: TicketCategory },
    #[error("{purpose} {channel_id} does not exist")]
    ChannelNotFound {
        channel_id: u64,
        purpose: &'static str,
    },
    #[error("channel {channel_id} is not a ticket channel")]
    NotATicketChannel { channel_id: u64 },
    #[error("user {actor_id} may not {} ticket {channel_id} ({reason_code})", .action.as_str())]
    Unauthorized {
        channel_id: u64,
        actor_id: u64,
        action: TicketAction,
        reason_code: String,
    },
    #[error("ticket channel {channel_name} is already open")]
    DuplicateTicket { channel_name: String },
    #[error("no close request is pending for ticket {channel_id}")]
    NoPendingClose { channel_id: u64 },
    #[error("close confirmation for ticket {channel_id} expired")]
    ConfirmationExpired { channel_id: u64 },
    #[error("ticket {channel_id} is already closed")]
    TicketClosed { channel_id: u64 },
    #[error("invalid ticket submission: {0}")]
    InvalidSubmission(String),
    #[error("ticket board publishing denied ({reason_code})")]
    PublishDenied { reason_code: String },
    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}

impl TicketError {
    /// Platform failures are operator-facing; everything else is the user's to see.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Platform(_))
    }

    /// Ephemeral text shown to the invoking user.
    pub fn user_message(&self) -> String {
        match self {
            Self::CategoryNotConfigured { category } => {
                format!("❌ Category for {category} not found.")
            }
            Self::ChannelNotFound { purpose, .. } => {
                let mut chars = purpose.chars();
                let purpose = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                };
                format!("❌ {purpose} does not exist.")
            }
            Self::NotATicketChannel { .. } => {
                "❌ This command can only be used inside a valid ticket channel.".to_string()
            }
            Self::Unauthorized { action, .. } => format!(
                "❌ Only the ticket owner or staff can {}.",
                action.denial_phrase()
            ),
            Self::DuplicateTicket { .. } => {
                "❌ You already have a ticket open in this category.".to_string()
            }
            Self::NoPendingClose { .. } => {
                "❌ There is no pending close request. Press Close Ticket again.".to_string()
            }
            Self::ConfirmationExpired { .. } => {
                "⌛ The close confirmation expired. Press Close Ticket again.".to_string()
            }
            Self::TicketClosed { .. } => "❌ This ticket is already being closed.".to_string(),
            Self::InvalidSubmission(_) => {
                "❌ The form submission was incomplete. Please try again.".to_string()
            }
            Self::PublishDenied { .. } => {
                "❌ You do not have permission to use this command.".to_string()
            }
            Self::Platform(_) => {
                "❌ Something went wrong while talking to Discord. Please try again later."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{TicketAction, TicketError};
    use crate::category::TicketCategory;

    #[test]
    fn unit_user_messages_match_denial_wording() {
        let error = TicketError::Unauthorized {
            channel_id: 1,
            actor_id: 2,
            action: TicketAction::AddParticipant,
            reason_code: "deny_not_owner_or_staff".to_string(),
        };
        assert_eq!(
            error.user_message(),
            "❌ Only the ticket owner or staff can add people."
        );
        assert!(error.to_string().contains("add_participant"));
        assert!(error.to_string().contains("deny_not_owner_or_staff"));
    }

    #[test]
    fn unit_channel_not_found_capitalizes_purpose() {
        let error = TicketError::ChannelNotFound {
            channel_id: 40,
            purpose: "transcript channel",
        };
        assert_eq!(error.user_message(), "❌ Transcript channel does not exist.");
        assert_eq!(error.to_string(), "transcript channel 40 does not exist");
    }

    #[test]
    fn regression_platform_errors_are_not_user_facing() {
        let error = TicketError::from(anyhow!("rate limited"));
        assert!(!error.is_user_facing());
        assert!(!error.user_message().contains("rate limited"));
        assert!(TicketError::CategoryNotConfigured {
            category: TicketCategory::BugReport
        }
        .is_user_facing());
    }
}
