//! Maps platform-neutral ticket messages onto serenity builders.

use serenity::all::{
    ButtonStyle, Colour, CreateActionRow, CreateAttachment, CreateButton, CreateEmbed,
    CreateInputText, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, CreateModal, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, InputTextStyle, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};
use tix_tickets::render::close_confirmation_card;
use tix_tickets::{
    AccessOverwrite, ChannelAccess, EmbedCard, EmbedColour, MessageControl, OutboundMessage,
    OverwriteTarget, TicketCategory,
};

use super::discord_command_helpers::{
    field_custom_id, form_custom_id, BOARD_SELECT_ID, CLOSE_TICKET_ID, CONFIRM_CLOSE_ID,
};

const CATEGORY_PLACEHOLDER: &str = "Select ticket type...";

fn embed_colour(colour: EmbedColour) -> Colour {
    match colour {
        EmbedColour::Red => Colour::RED,
        EmbedColour::Green => Colour::DARK_GREEN,
    }
}

pub(super) fn create_embed(card: &EmbedCard) -> CreateEmbed {
    CreateEmbed::new()
        .title(&card.title)
        .description(&card.description)
        .colour(embed_colour(card.colour))
        .fields(
            card.fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone(), false)),
        )
}

fn danger_button(custom_id: &str, label: &str) -> CreateButton {
    CreateButton::new(custom_id)
        .label(label)
        .style(ButtonStyle::Danger)
}

pub(super) fn action_rows(controls: &[MessageControl]) -> Vec<CreateActionRow> {
    controls
        .iter()
        .map(|control| match control {
            MessageControl::CloseTicket => {
                CreateActionRow::Buttons(vec![danger_button(CLOSE_TICKET_ID, "Close Ticket")])
            }
            MessageControl::ConfirmClose => {
                CreateActionRow::Buttons(vec![danger_button(CONFIRM_CLOSE_ID, "Yes, I'm sure")])
            }
            MessageControl::CategoryPicker { categories } => {
                let options = categories
                    .iter()
                    .map(|category| {
                        CreateSelectMenuOption::new(category.display_name(), category.slug())
                    })
                    .collect();
                CreateActionRow::SelectMenu(
                    CreateSelectMenu::new(
                        BOARD_SELECT_ID,
                        CreateSelectMenuKind::String { options },
                    )
                    .placeholder(CATEGORY_PLACEHOLDER)
                    .min_values(1)
                    .max_values(1),
                )
            }
        })
        .collect()
}

pub(super) fn create_message(message: &OutboundMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content);
    }
    if let Some(card) = &message.embed {
        builder = builder.embed(create_embed(card));
    }
    if let Some(attachment) = &message.attachment {
        builder = builder.add_file(CreateAttachment::bytes(
            attachment.bytes.clone(),
            attachment.file_name.clone(),
        ));
    }
    if !message.controls.is_empty() {
        builder = builder.components(action_rows(&message.controls));
    }
    builder
}

pub(super) fn ephemeral_reply(content: impl Into<String>) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

pub(super) fn ephemeral_followup(content: impl Into<String>) -> CreateInteractionResponseFollowup {
    CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true)
}

pub(super) fn close_confirmation_response() -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(create_embed(&close_confirmation_card()))
            .components(action_rows(&[MessageControl::ConfirmClose]))
            .ephemeral(true),
    )
}

pub(super) fn ticket_form_modal(category: TicketCategory) -> CreateModal {
    let rows = category
        .field_labels()
        .iter()
        .enumerate()
        .map(|(index, label)| {
            CreateActionRow::InputText(
                CreateInputText::new(InputTextStyle::Short, *label, field_custom_id(index))
                    .required(true),
            )
        })
        .collect();
    CreateModal::new(
        form_custom_id(category),
        format!("{} Form", category.display_name()),
    )
    .components(rows)
}

fn participant_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY
}

pub(super) fn access_permissions(access: ChannelAccess) -> (Permissions, Permissions) {
    match access {
        ChannelAccess::Participant => (participant_permissions(), Permissions::empty()),
        ChannelAccess::Hidden => (Permissions::empty(), Permissions::VIEW_CHANNEL),
    }
}

/// `@everyone` is the role whose id equals the guild id.
pub(super) fn overwrite_kind(guild_id: u64, target: OverwriteTarget) -> PermissionOverwriteType {
    match target {
        OverwriteTarget::Everyone => PermissionOverwriteType::Role(RoleId::new(guild_id)),
        OverwriteTarget::Role(role_id) => PermissionOverwriteType::Role(RoleId::new(role_id)),
        OverwriteTarget::Member(user_id) => PermissionOverwriteType::Member(UserId::new(user_id)),
    }
}

pub(super) fn permission_overwrite(guild_id: u64, overwrite: &AccessOverwrite) -> PermissionOverwrite {
    let (allow, deny) = access_permissions(overwrite.access);
    PermissionOverwrite {
        allow,
        deny,
        kind: overwrite_kind(guild_id, overwrite.target),
    }
}
