//! Slash command definitions and component custom-id parsing.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};
use tix_tickets::TicketCategory;

pub(super) const BOARD_SELECT_ID: &str = "tix:board:select";
pub(super) const CLOSE_TICKET_ID: &str = "tix:ticket:close";
pub(super) const CONFIRM_CLOSE_ID: &str = "tix:ticket:close-confirm";
const FORM_ID_PREFIX: &str = "tix:form:";
const FIELD_ID_PREFIX: &str = "tix:field:";

pub(super) const PUBLISH_BOARD_COMMAND: &str = "ticket_send";
pub(super) const ADD_PERSON_COMMAND: &str = "add_person";
pub(super) const REMOVE_PERSON_COMMAND: &str = "remove_person";
pub(super) const MEMBER_OPTION: &str = "member";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ComponentAction {
    SelectCategory,
    CloseTicket,
    ConfirmClose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TicketCommand {
    PublishBoard,
    AddPerson { member_id: u64 },
    RemovePerson { member_id: u64 },
    Invalid { message: String },
}

pub(super) fn parse_component_custom_id(custom_id: &str) -> Option<ComponentAction> {
    match custom_id {
        BOARD_SELECT_ID => Some(ComponentAction::SelectCategory),
        CLOSE_TICKET_ID => Some(ComponentAction::CloseTicket),
        CONFIRM_CLOSE_ID => Some(ComponentAction::ConfirmClose),
        _ => None,
    }
}

pub(super) fn form_custom_id(category: TicketCategory) -> String {
    format!("{FORM_ID_PREFIX}{}", category.slug())
}

pub(super) fn parse_form_custom_id(custom_id: &str) -> Option<TicketCategory> {
    custom_id
        .strip_prefix(FORM_ID_PREFIX)
        .and_then(TicketCategory::from_slug)
}

pub(super) fn field_custom_id(index: usize) -> String {
    format!("{FIELD_ID_PREFIX}{index}")
}

fn parse_field_custom_id(custom_id: &str) -> Option<usize> {
    custom_id.strip_prefix(FIELD_ID_PREFIX)?.parse().ok()
}

/// Picks the category chosen in the board select menu.
pub(super) fn selected_category(values: &[String]) -> Option<TicketCategory> {
    values
        .first()
        .and_then(|value| TicketCategory::from_slug(value))
}

/// Reorders submitted modal inputs into the category's field order.
///
/// Missing inputs are skipped, so an incomplete form yields fewer values than
/// the category has fields.
pub(super) fn ordered_form_values(
    category: TicketCategory,
    submitted: &[(String, String)],
) -> Vec<String> {
    (0..category.field_labels().len())
        .filter_map(|index| {
            submitted
                .iter()
                .find(|(custom_id, _)| parse_field_custom_id(custom_id) == Some(index))
                .map(|(_, value)| value.trim().to_string())
        })
        .collect()
}

pub(super) fn parse_slash_command(name: &str, member_id: Option<u64>) -> Option<TicketCommand> {
    let command = match (name, member_id) {
        (PUBLISH_BOARD_COMMAND, _) => TicketCommand::PublishBoard,
        (ADD_PERSON_COMMAND, Some(member_id)) => TicketCommand::AddPerson { member_id },
        (REMOVE_PERSON_COMMAND, Some(member_id)) => TicketCommand::RemovePerson { member_id },
        (ADD_PERSON_COMMAND | REMOVE_PERSON_COMMAND, None) => TicketCommand::Invalid {
            message: format!("Usage: /{name} <{MEMBER_OPTION}>"),
        },
        _ => return None,
    };
    Some(command)
}

pub(super) fn ticket_slash_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(PUBLISH_BOARD_COMMAND).description("Send the Open Ticket button"),
        CreateCommand::new(ADD_PERSON_COMMAND)
            .description("Add a person to your ticket")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, MEMBER_OPTION, "Member to add")
                    .required(true),
            ),
        CreateCommand::new(REMOVE_PERSON_COMMAND)
            .description("Remove a person from your ticket")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::User,
                    MEMBER_OPTION,
                    "Member to remove",
                )
                .required(true),
            ),
    ]
}
