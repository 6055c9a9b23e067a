//! Message and embed rendering for ticket desk notices.

use crate::category::TicketCategory;
use crate::config::TicketDeskConfig;
use crate::platform::{EmbedCard, EmbedColour, FileAttachment, MessageControl, OutboundMessage};

pub const DM_REFUSED_CHANNEL_NOTICE: &str =
    "❌ Could not send DM to the user. They may have DMs disabled.";

pub fn user_mention(user_id: u64) -> String {
    format!("<@{user_id}>")
}

pub fn role_mention(role_id: u64) -> String {
    format!("<@&{role_id}>")
}

pub fn channel_mention(channel_id: u64) -> String {
    format!("<#{channel_id}>")
}

pub fn channel_jump_url(guild_id: u64, channel_id: u64) -> String {
    format!("https://discord.com/channels/{guild_id}/{channel_id}")
}

/// First message of a new ticket: staff ping, answers embed, close control.
pub fn ticket_summary_message(
    config: &TicketDeskConfig,
    category: TicketCategory,
    user_id: u64,
    username: &str,
    values: &[String],
) -> OutboundMessage {
    let mut card = EmbedCard::new(
        format!("{} - Ticket for {}", category.display_name(), username),
        "Click the button below to close this ticket.",
        EmbedColour::Red,
    )
    .field("Category:", category.display_name());
    for (label, value) in category.field_labels().iter().zip(values) {
        card = card.field(*label, value.clone());
    }

    OutboundMessage::new()
        .content(format!(
            "{} New **{} ticket** opened by {}!",
            role_mention(config.staff_role_id),
            category.display_name().to_lowercase(),
            user_mention(user_id)
        ))
        .embed(card)
        .control(MessageControl::CloseTicket)
}

pub fn ticket_created_ack(category: TicketCategory, channel_id: u64) -> String {
    format!(
        "✅ {} ticket created: {}",
        category.display_name(),
        channel_mention(channel_id)
    )
}

pub fn close_confirmation_card() -> EmbedCard {
    EmbedCard::new(
        "⚠️ Confirm Close ⚠️",
        "Are you sure that you want to close this ticket?",
        EmbedColour::Red,
    )
}

pub fn ticket_board_message(categories: Vec<TicketCategory>) -> OutboundMessage {
    OutboundMessage::new()
        .embed(EmbedCard::new(
            "🎫 Open a Ticket! 🎫",
            "Select a ticket type from the dropdown below.",
            EmbedColour::Red,
        ))
        .control(MessageControl::CategoryPicker { categories })
}

pub fn board_published_ack(board_channel_id: u64) -> String {
    format!(
        "✅ The button is now sent to {}",
        channel_mention(board_channel_id)
    )
}

pub fn transcript_archive_message(attachment: FileAttachment) -> OutboundMessage {
    OutboundMessage::new().attachment(attachment)
}

pub fn transcript_owner_message(channel_name: &str, attachment: FileAttachment) -> OutboundMessage {
    OutboundMessage::new()
        .content(format!(
            "Here is the transcript for your ticket **{channel_name}**:"
        ))
        .attachment(attachment)
}

pub fn participant_added_notice(actor_id: u64, member_id: u64) -> OutboundMessage {
    OutboundMessage::new().embed(EmbedCard::new(
        "👤 User Added",
        format!(
            "{} added {} to this ticket.",
            user_mention(actor_id),
            user_mention(member_id)
        ),
        EmbedColour::Red,
    ))
}

pub fn participant_removed_notice(actor_id: u64, member_id: u64) -> OutboundMessage {
    OutboundMessage::new().embed(EmbedCard::new(
        "🚫 User Removed",
        format!(
            "{} removed {} from this ticket.",
            user_mention(actor_id),
            user_mention(member_id)
        ),
        EmbedColour::Red,
    ))
}

pub fn participant_added_dm(guild_id: u64, channel_id: u64, actor_id: u64) -> OutboundMessage {
    OutboundMessage::new().embed(
        EmbedCard::new(
            "🎫 You have been added to a ticket",
            format!("You were added to the ticket: {}", channel_mention(channel_id)),
            EmbedColour::Green,
        )
        .field("Added by", user_mention(actor_id))
        .field(
            "Ticket",
            format!("[Open ticket]({})", channel_jump_url(guild_id, channel_id)),
        ),
    )
}

pub fn participant_removed_dm(channel_name: &str, actor_id: u64) -> OutboundMessage {
    OutboundMessage::new().embed(
        EmbedCard::new(
            "🚫 You have been removed from a ticket",
            format!("You were removed from the ticket: **{channel_name}**"),
            EmbedColour::Red,
        )
        .field("Removed by", user_mention(actor_id))
        .field("Ticket (no longer accessible)", channel_name),
    )
}

pub fn participant_added_ack(member_id: u64) -> String {
    format!("✅ {} has been added to this ticket!", user_mention(member_id))
}

pub fn participant_removed_ack(member_id: u64) -> String {
    format!(
        "✅ {} has been removed from this ticket!",
        user_mention(member_id)
    )
}

pub fn participant_dm_refused_notice(member_id: u64) -> String {
    format!(
        "⚠️ Could not DM {}. They might have DMs disabled.",
        user_mention(member_id)
    )
}

#[cfg(test)]
mod tests {
    use super::{participant_added_dm, ticket_board_message, ticket_summary_message};
    use crate::category::TicketCategory;
    use crate::config::sample_ticket_desk_config;
    use crate::platform::MessageControl;

    #[test]
    fn functional_summary_embeds_category_then_answers_in_form_order() {
        let config = sample_ticket_desk_config();
        let values = vec![
            "Alice".to_string(),
            "Bob".to_string(),
            "griefing".to_string(),
        ];
        let message =
            ticket_summary_message(&config, TicketCategory::PlayerReport, 5, "alice", &values);
        assert_eq!(
            message.content.as_deref(),
            Some("<@&20> New **player report ticket** opened by <@5>!")
        );
        let card = message.embed.expect("embed");
        assert_eq!(card.title, "Player Report - Ticket for alice");
        let pairs = card
            .fields
            .iter()
            .map(|field| (field.name.as_str(), field.value.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("Category:", "Player Report"),
                ("Your Minecraft Name", "Alice"),
                ("Name of the Player", "Bob"),
                ("Why are you reporting this player?", "griefing"),
            ]
        );
        assert_eq!(message.controls, vec![MessageControl::CloseTicket]);
    }

    #[test]
    fn unit_board_message_lists_given_categories() {
        let message = ticket_board_message(vec![TicketCategory::BugReport]);
        assert_eq!(
            message.controls,
            vec![MessageControl::CategoryPicker {
                categories: vec![TicketCategory::BugReport]
            }]
        );
    }

    #[test]
    fn unit_added_dm_links_to_ticket() {
        let message = participant_added_dm(1, 77, 5);
        let card = message.embed.expect("embed");
        assert_eq!(card.fields[0].value, "<@5>");
        assert_eq!(
            card.fields[1].value,
            "[Open ticket](https://discord.com/channels/1/77)"
        );
    }
}
