//! Ticket board: the category picker message in the board channel.

use tix_access::{evaluate_role_gate, TicketActor};
use tracing::{info, warn};

use crate::config::TicketDeskConfig;
use crate::error::TicketError;
use crate::platform::TicketPlatform;
use crate::render::ticket_board_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPublishReport {
    pub channel_id: u64,
    pub purged_messages: usize,
    pub message_id: u64,
}

/// Only holders of the publisher role may (re)publish the board.
pub fn authorize_board_publisher(
    config: &TicketDeskConfig,
    actor: &TicketActor,
) -> Result<(), TicketError> {
    let decision = evaluate_role_gate(config.publisher_role_id, actor);
    if decision.is_allowed() {
        return Ok(());
    }
    info!(
        user_id = actor.user_id,
        reason_code = decision.reason_code(),
        "ticket board publish denied"
    );
    Err(TicketError::PublishDenied {
        reason_code: decision.reason_code().to_string(),
    })
}

/// Deletes earlier bot-authored messages among the most recent ones in the
/// board channel, then posts a fresh category picker.
pub async fn publish_ticket_board(
    platform: &dyn TicketPlatform,
    config: &TicketDeskConfig,
    bot_user_id: u64,
) -> Result<BoardPublishReport, TicketError> {
    let channel_id = config.board_channel_id;
    if platform.channel(channel_id).await?.is_none() {
        return Err(TicketError::ChannelNotFound {
            channel_id,
            purpose: "ticket board channel",
        });
    }

    let recent = platform
        .recent_messages(channel_id, config.board_purge_scan_limit)
        .await?;
    let mut purged_messages = 0;
    for message in recent.iter().filter(|message| message.author_id == bot_user_id) {
        match platform.delete_message(channel_id, message.message_id).await {
            Ok(()) => purged_messages += 1,
            Err(error) => warn!(
                channel_id,
                message_id = message.message_id,
                error = %error,
                "failed to delete stale ticket board message"
            ),
        }
    }

    let message_id = platform
        .send_message(
            channel_id,
            &ticket_board_message(config.configured_categories()),
        )
        .await?;
    info!(channel_id, purged_messages, message_id, "ticket board published");
    Ok(BoardPublishReport {
        channel_id,
        purged_messages,
        message_id,
    })
}

#[cfg(test)]
mod tests {
    use tix_access::TicketActor;

    use super::{authorize_board_publisher, publish_ticket_board};
    use crate::category::TicketCategory;
    use crate::config::sample_ticket_desk_config;
    use crate::error::TicketError;
    use crate::memory_platform::{MemoryTicketPlatform, MEMORY_BOT_USER_ID};
    use crate::platform::MessageControl;

    #[test]
    fn unit_board_publishing_requires_publisher_role() {
        let config = sample_ticket_desk_config();
        assert!(authorize_board_publisher(&config, &TicketActor::new(1, vec![10])).is_ok());
        let error = authorize_board_publisher(&config, &TicketActor::new(1, vec![20]))
            .expect_err("staff role is not the publisher role");
        assert!(matches!(error, TicketError::PublishDenied { .. }));
        assert_eq!(
            error.user_message(),
            "❌ You do not have permission to use this command."
        );
    }

    #[tokio::test]
    async fn functional_publish_purges_only_bot_messages_and_posts_picker() {
        let config = sample_ticket_desk_config();
        let platform = MemoryTicketPlatform::new();
        platform.add_text_channel(30, "tickets", None, None);
        let stale = platform.push_history(30, MEMORY_BOT_USER_ID, "tix", "old board", 1);
        let human = platform.push_history(30, 77, "alice", "hello", 2);

        let report = publish_ticket_board(&platform, &config, MEMORY_BOT_USER_ID)
            .await
            .expect("publish");
        assert_eq!(report.purged_messages, 1);
        assert_eq!(platform.deleted_messages(), vec![(30, stale)]);
        assert_ne!(report.message_id, human);

        let sent = platform.sent_messages(30);
        assert_eq!(
            sent[0].controls,
            vec![MessageControl::CategoryPicker {
                categories: TicketCategory::ALL.to_vec()
            }]
        );
        assert_eq!(platform.history_len(30), 2);
    }

    #[tokio::test]
    async fn regression_publish_scan_respects_limit() {
        let mut config = sample_ticket_desk_config();
        config.board_purge_scan_limit = 1;
        let platform = MemoryTicketPlatform::new();
        platform.add_text_channel(30, "tickets", None, None);
        platform.push_history(30, MEMORY_BOT_USER_ID, "tix", "older board", 1);
        platform.push_history(30, 77, "alice", "newest", 2);

        let report = publish_ticket_board(&platform, &config, MEMORY_BOT_USER_ID)
            .await
            .expect("publish");
        assert_eq!(report.purged_messages, 0);
    }

    #[tokio::test]
    async fn regression_missing_board_channel_is_reported() {
        let config = sample_ticket_desk_config();
        let platform = MemoryTicketPlatform::new();
        let error = publish_ticket_board(&platform, &config, MEMORY_BOT_USER_ID)
            .await
            .expect_err("no board channel");
        assert_eq!(error.user_message(), "❌ Ticket board channel does not exist.");
    }
}
