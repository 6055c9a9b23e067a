//! Interaction flows: slash commands, board select, form modals and the close buttons.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use serenity::all::{
    ActionRowComponent, CommandDataOptionValue, CommandInteraction, ComponentInteraction,
    ComponentInteractionDataKind, Context, CreateInteractionResponse, EditInteractionResponse,
    Member, ModalInteraction, User,
};
use tix_access::TicketActor;
use tix_core::current_unix_timestamp_ms;
use tix_tickets::render::{
    board_published_ack, participant_added_ack, participant_dm_refused_notice,
    participant_removed_ack, ticket_created_ack,
};
use tix_tickets::{
    authorize_board_publisher, publish_ticket_board, TicketError, TicketLifecycleController,
    TicketSubmission,
};
use tracing::{debug, error, info, warn};

use super::discord_command_helpers::{
    parse_component_custom_id, parse_form_custom_id, parse_slash_command, ordered_form_values,
    selected_category, ComponentAction, TicketCommand, MEMBER_OPTION,
};
use super::discord_render_helpers::{
    close_confirmation_response, ephemeral_followup, ephemeral_reply, ticket_form_modal,
};

const UNKNOWN_TICKET_TYPE_REPLY: &str = "❌ Unknown ticket type.";

pub(super) fn ticket_actor(user: &User, member: Option<&Member>) -> TicketActor {
    let role_ids = member
        .map(|member| member.roles.iter().map(|role| role.get()).collect())
        .unwrap_or_default();
    TicketActor::new(user.id.get(), role_ids)
}

/// Ephemeral text for a failed ticket operation; platform failures are logged.
pub(super) fn error_reply(operation: &'static str, error: &TicketError) -> String {
    if error.is_user_facing() {
        debug!(operation, error = %error, "ticket operation rejected");
    } else {
        error!(operation, error = %error, "ticket operation failed");
    }
    error.user_message()
}

pub(super) async fn handle_command(
    ctx: &Context,
    controller: &TicketLifecycleController,
    bot_user_id: u64,
    command: &CommandInteraction,
) -> Result<()> {
    let member_id = command
        .data
        .options
        .iter()
        .find(|option| option.name == MEMBER_OPTION)
        .and_then(|option| match option.value {
            CommandDataOptionValue::User(user_id) => Some(user_id.get()),
            _ => None,
        });
    let Some(parsed) = parse_slash_command(&command.data.name, member_id) else {
        warn!(command = %command.data.name, "unknown slash command");
        return Ok(());
    };
    let actor = ticket_actor(&command.user, command.member.as_deref());
    let channel_id = command.channel_id.get();

    if let TicketCommand::Invalid { message } = &parsed {
        command
            .create_response(&ctx.http, ephemeral_reply(message.as_str()))
            .await
            .context("failed to answer invalid command")?;
        return Ok(());
    }
    if parsed == TicketCommand::PublishBoard {
        if let Err(error) = authorize_board_publisher(controller.config(), &actor) {
            command
                .create_response(&ctx.http, ephemeral_reply(error_reply("publish_board", &error)))
                .await
                .context("failed to answer board publish denial")?;
            return Ok(());
        }
    }

    command
        .defer_ephemeral(&ctx.http)
        .await
        .context("failed to defer command response")?;
    let (reply, dm_notice) = match parsed {
        TicketCommand::PublishBoard => {
            match publish_ticket_board(controller.platform(), controller.config(), bot_user_id)
                .await
            {
                Ok(report) => (board_published_ack(report.channel_id), None),
                Err(error) => (error_reply("publish_board", &error), None),
            }
        }
        TicketCommand::AddPerson { member_id } => {
            match controller.add_participant(channel_id, &actor, member_id).await {
                Ok(change) => (
                    participant_added_ack(member_id),
                    (!change.member_dm.is_delivered())
                        .then(|| participant_dm_refused_notice(member_id)),
                ),
                Err(error) => (error_reply("add_participant", &error), None),
            }
        }
        TicketCommand::RemovePerson { member_id } => {
            match controller
                .remove_participant(channel_id, &actor, member_id)
                .await
            {
                Ok(change) => (
                    participant_removed_ack(member_id),
                    (!change.member_dm.is_delivered())
                        .then(|| participant_dm_refused_notice(member_id)),
                ),
                Err(error) => (error_reply("remove_participant", &error), None),
            }
        }
        TicketCommand::Invalid { .. } => return Ok(()),
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(reply))
        .await
        .context("failed to edit command response")?;
    if let Some(notice) = dm_notice {
        command
            .create_followup(&ctx.http, ephemeral_followup(notice))
            .await
            .context("failed to send DM refusal follow-up")?;
    }
    Ok(())
}

pub(super) async fn handle_component(
    ctx: &Context,
    controller: &Arc<TicketLifecycleController>,
    component: &ComponentInteraction,
) -> Result<()> {
    let Some(action) = parse_component_custom_id(&component.data.custom_id) else {
        debug!(custom_id = %component.data.custom_id, "ignoring foreign component");
        return Ok(());
    };
    let actor = ticket_actor(&component.user, component.member.as_ref());
    let channel_id = component.channel_id.get();

    match action {
        ComponentAction::SelectCategory => {
            let category = match &component.data.kind {
                ComponentInteractionDataKind::StringSelect { values } => {
                    selected_category(values)
                }
                _ => None,
            };
            let response = match category {
                Some(category) => CreateInteractionResponse::Modal(ticket_form_modal(category)),
                None => ephemeral_reply(UNKNOWN_TICKET_TYPE_REPLY),
            };
            component
                .create_response(&ctx.http, response)
                .await
                .context("failed to open ticket form")?;
        }
        ComponentAction::CloseTicket => {
            match controller
                .request_close(channel_id, &actor, current_unix_timestamp_ms())
                .await
            {
                Ok(request) => {
                    component
                        .create_response(&ctx.http, close_confirmation_response())
                        .await
                        .context("failed to send close confirmation")?;
                    spawn_confirmation_expiry(
                        ctx,
                        Arc::clone(controller),
                        component.clone(),
                        request.deadline_unix_ms,
                    );
                }
                Err(error) => {
                    component
                        .create_response(&ctx.http, ephemeral_reply(error_reply("request_close", &error)))
                        .await
                        .context("failed to answer close request")?;
                }
            }
        }
        ComponentAction::ConfirmClose => {
            component
                .defer(&ctx.http)
                .await
                .context("failed to acknowledge close confirmation")?;
            if let Err(error) = controller
                .confirm_close(channel_id, &actor, current_unix_timestamp_ms())
                .await
            {
                component
                    .create_followup(&ctx.http, ephemeral_followup(error_reply("confirm_close", &error)))
                    .await
                    .context("failed to report close failure")?;
            }
        }
    }
    Ok(())
}

/// Reverts the pending close and strips the confirm button once the window passes.
fn spawn_confirmation_expiry(
    ctx: &Context,
    controller: Arc<TicketLifecycleController>,
    component: ComponentInteraction,
    deadline_unix_ms: u64,
) {
    let http = Arc::clone(&ctx.http);
    tokio::spawn(async move {
        let wait_ms = deadline_unix_ms.saturating_sub(current_unix_timestamp_ms());
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        let channel_id = component.channel_id.get();
        if !controller.expire_pending_close(channel_id, current_unix_timestamp_ms()) {
            return;
        }
        if let Err(error) = component
            .edit_response(&http, EditInteractionResponse::new().components(Vec::new()))
            .await
        {
            debug!(
                channel_id,
                error = %error,
                "close confirmation prompt no longer editable"
            );
        }
    });
}

pub(super) async fn handle_modal(
    ctx: &Context,
    controller: &TicketLifecycleController,
    modal: &ModalInteraction,
) -> Result<()> {
    let Some(category) = parse_form_custom_id(&modal.data.custom_id) else {
        debug!(custom_id = %modal.data.custom_id, "ignoring foreign modal");
        return Ok(());
    };
    let submitted = modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|component| match component {
            ActionRowComponent::InputText(input) => Some((
                input.custom_id.clone(),
                input.value.clone().unwrap_or_default(),
            )),
            _ => None,
        })
        .collect::<Vec<_>>();

    modal
        .defer_ephemeral(&ctx.http)
        .await
        .context("failed to defer ticket form response")?;
    let submission = TicketSubmission {
        category,
        user_id: modal.user.id.get(),
        username: modal.user.name.clone(),
        values: ordered_form_values(category, &submitted),
    };
    let reply = match controller.open_ticket(submission).await {
        Ok(opened) => {
            info!(
                channel_id = opened.channel_id,
                ticket_number = opened.ticket_number,
                "ticket form handled"
            );
            ticket_created_ack(category, opened.channel_id)
        }
        Err(error) => error_reply("open_ticket", &error),
    };
    modal
        .edit_response(&ctx.http, EditInteractionResponse::new().content(reply))
        .await
        .context("failed to edit ticket form response")?;
    Ok(())
}
