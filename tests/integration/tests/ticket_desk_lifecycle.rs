use std::sync::Arc;

use tempfile::TempDir;
use tix_access::TicketActor;
use tix_tickets::memory_platform::{MemoryTicketPlatform, MEMORY_BOT_USER_ID};
use tix_tickets::{
    parse_ticket_desk_config, publish_ticket_board, ChannelAccess, CounterStore, DeliveryOutcome,
    JsonFileCounterStore, MessageControl, OverwriteTarget, TicketCategory, TicketDeskConfig,
    TicketError, TicketLifecycleController, TicketState, TicketSubmission,
};

const DESK_TOML: &str = r#"
guild_id = 1
publisher_role_id = 10
staff_role_id = 20
board_channel_id = 30
transcript_channel_id = 40
transcript_timezone = "Europe/Stockholm"

[categories]
general_question = 101
bug_report = 102
player_report = 103
staff_report = 104
"#;

const ALICE: u64 = 501;
const BOB: u64 = 502;
const STAFF_ROLE: u64 = 20;
const T1: i64 = 1_709_294_400_000;

struct Harness {
    _state_dir: TempDir,
    counter_path: std::path::PathBuf,
    platform: Arc<MemoryTicketPlatform>,
    controller: TicketLifecycleController,
}

fn desk_config() -> TicketDeskConfig {
    parse_ticket_desk_config(DESK_TOML).expect("desk config")
}

fn seeded_platform(config: &TicketDeskConfig) -> Arc<MemoryTicketPlatform> {
    let platform = Arc::new(MemoryTicketPlatform::new());
    for category_id in config.categories.values() {
        platform.add_category(*category_id);
    }
    platform.add_text_channel(config.board_channel_id, "open-a-ticket", None, None);
    platform.add_text_channel(config.transcript_channel_id, "transcripts", None, None);
    platform
}

fn controller_for(
    platform: &Arc<MemoryTicketPlatform>,
    counter_path: &std::path::Path,
) -> TicketLifecycleController {
    let counter = JsonFileCounterStore::open(counter_path).expect("counter store");
    TicketLifecycleController::new(
        Arc::new(desk_config()),
        platform.clone(),
        Arc::new(counter),
    )
}

fn harness() -> Harness {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let counter_path = state_dir.path().join("ticket_counter.json");
    let platform = seeded_platform(&desk_config());
    let controller = controller_for(&platform, &counter_path);
    Harness {
        _state_dir: state_dir,
        counter_path,
        platform,
        controller,
    }
}

fn player_report(user_id: u64, username: &str) -> TicketSubmission {
    TicketSubmission {
        category: TicketCategory::PlayerReport,
        user_id,
        username: username.to_string(),
        values: vec![
            "Alice".to_string(),
            "Bob".to_string(),
            "griefing".to_string(),
        ],
    }
}

#[tokio::test]
async fn integration_player_report_end_to_end_creates_scoped_ticket() {
    let harness = harness();
    let opened = harness
        .controller
        .open_ticket(player_report(ALICE, "Alice"))
        .await
        .expect("open ticket");

    let channel = harness
        .platform
        .channel_named(103, "ticket-playerreport-alice")
        .expect("ticket channel");
    assert_eq!(channel.channel_id, opened.channel_id);
    assert_eq!(
        harness.platform.member_access(opened.channel_id, ALICE),
        Some(ChannelAccess::Participant)
    );
    let overwrites = harness.platform.channel_overwrites(opened.channel_id);
    assert!(overwrites
        .iter()
        .any(|o| o.target == OverwriteTarget::Role(STAFF_ROLE)
            && o.access == ChannelAccess::Participant));
    assert!(overwrites
        .iter()
        .any(|o| o.target == OverwriteTarget::Everyone && o.access == ChannelAccess::Hidden));

    let summary = harness.platform.sent_messages(opened.channel_id);
    let card = summary[0].embed.as_ref().expect("summary embed");
    let answers = card
        .fields
        .iter()
        .skip(1)
        .map(|field| (field.name.as_str(), field.value.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        answers,
        vec![
            ("Your Minecraft Name", "Alice"),
            ("Name of the Player", "Bob"),
            ("Why are you reporting this player?", "griefing"),
        ]
    );

    let reloaded = JsonFileCounterStore::open(&harness.counter_path).expect("reload counter");
    assert_eq!(reloaded.load().await.expect("count"), 1);
}

#[tokio::test]
async fn integration_duplicate_guard_blocks_same_category_only() {
    let harness = harness();
    harness
        .controller
        .open_ticket(TicketSubmission {
            category: TicketCategory::BugReport,
            user_id: ALICE,
            username: "alice".to_string(),
            values: vec!["alice".to_string(), "crash on join".to_string()],
        })
        .await
        .expect("first bug report");

    let error = harness
        .controller
        .open_ticket(TicketSubmission {
            category: TicketCategory::BugReport,
            user_id: ALICE,
            username: "alice".to_string(),
            values: vec!["alice".to_string(), "again".to_string()],
        })
        .await
        .expect_err("second bug report rejected");
    assert_eq!(
        error.user_message(),
        "❌ You already have a ticket open in this category."
    );

    harness
        .controller
        .open_ticket(TicketSubmission {
            category: TicketCategory::GeneralQuestion,
            user_id: ALICE,
            username: "alice".to_string(),
            values: vec!["alice".to_string(), "how do I join?".to_string()],
        })
        .await
        .expect("general question allowed");
    let reloaded = JsonFileCounterStore::open(&harness.counter_path).expect("reload counter");
    assert_eq!(reloaded.load().await.expect("count"), 2);
}

#[tokio::test]
async fn integration_close_flow_archives_transcript_in_configured_timezone() {
    let harness = harness();
    harness.platform.refuse_dms_for(ALICE);
    harness.platform.set_clock(T1);
    let opened = harness
        .controller
        .open_ticket(player_report(ALICE, "alice"))
        .await
        .expect("open");
    harness
        .platform
        .push_history(opened.channel_id, ALICE, "alice", "hi", T1 + 1_000);
    harness
        .platform
        .push_history(opened.channel_id, 600, "mod", "hello", T1 + 2_000);

    let actor = TicketActor::new(ALICE, Vec::new());
    harness
        .controller
        .request_close(opened.channel_id, &actor, 0)
        .await
        .expect("request close");
    let closed = harness
        .controller
        .confirm_close(opened.channel_id, &actor, 1_000)
        .await
        .expect("confirm close");
    assert_eq!(closed.owner_dm, Some(DeliveryOutcome::Refused));

    let archived = harness.platform.sent_messages(40);
    let attachment = archived[0].attachment.as_ref().expect("transcript");
    let text = String::from_utf8(attachment.bytes.clone()).expect("utf8");
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("[2024-03-01 13:00:00 CET] tix: "));
    assert_eq!(
        lines[1..],
        [
            "[2024-03-01 13:00:01 CET] alice: hi",
            "[2024-03-01 13:00:02 CET] mod: hello",
        ]
    );
    assert!(harness
        .platform
        .channel_named(103, "ticket-playerreport-alice")
        .is_none());
}

#[tokio::test]
async fn integration_unconfirmed_close_expires_and_ticket_stays_open() {
    let harness = harness();
    let opened = harness
        .controller
        .open_ticket(player_report(ALICE, "alice"))
        .await
        .expect("open");
    let actor = TicketActor::new(ALICE, Vec::new());
    let request = harness
        .controller
        .request_close(opened.channel_id, &actor, 5_000)
        .await
        .expect("request close");
    assert_eq!(request.deadline_unix_ms, 65_000);

    assert!(harness
        .controller
        .expire_pending_close(opened.channel_id, 65_000));
    let error = harness
        .controller
        .confirm_close(opened.channel_id, &actor, 65_001)
        .await
        .expect_err("nothing pending");
    assert!(matches!(error, TicketError::NoPendingClose { .. }));
    assert_eq!(
        harness.controller.ticket_state(opened.channel_id),
        Some(TicketState::Open)
    );
    assert!(harness.platform.deleted_channels().is_empty());
    assert!(harness.platform.sent_messages(40).is_empty());
}

#[tokio::test]
async fn integration_restarted_controller_recovers_owner_from_topic() {
    let harness = harness();
    let opened = harness
        .controller
        .open_ticket(player_report(ALICE, "alice"))
        .await
        .expect("open");

    let restarted = controller_for(&harness.platform, &harness.counter_path);
    assert_eq!(restarted.ticket_state(opened.channel_id), None);
    let change = restarted
        .add_participant(opened.channel_id, &TicketActor::new(ALICE, Vec::new()), BOB)
        .await
        .expect("owner recovered from topic");
    assert_eq!(change.member_dm, DeliveryOutcome::Delivered);
    assert_eq!(
        restarted.ticket_state(opened.channel_id),
        Some(TicketState::Open)
    );

    let denied = restarted
        .remove_participant(opened.channel_id, &TicketActor::new(BOB, Vec::new()), ALICE)
        .await
        .expect_err("added participants do not gain ownership");
    assert_eq!(
        denied.user_message(),
        "❌ Only the ticket owner or staff can remove people."
    );

    let second = restarted
        .open_ticket(player_report(BOB, "bob"))
        .await
        .expect("counter continues");
    assert_eq!(second.ticket_number, 2);
}

#[tokio::test]
async fn integration_failed_creation_burns_persisted_counter_value() {
    let harness = harness();
    harness.platform.fail_next_channel_creation();
    harness
        .controller
        .open_ticket(player_report(ALICE, "alice"))
        .await
        .expect_err("platform rejects creation");
    let reloaded = JsonFileCounterStore::open(&harness.counter_path).expect("reload counter");
    assert_eq!(reloaded.load().await.expect("count"), 1);
}

#[tokio::test]
async fn integration_board_publish_replaces_previous_picker() {
    let config = desk_config();
    let platform = seeded_platform(&config);
    let first = publish_ticket_board(platform.as_ref(), &config, MEMORY_BOT_USER_ID)
        .await
        .expect("first publish");
    let second = publish_ticket_board(platform.as_ref(), &config, MEMORY_BOT_USER_ID)
        .await
        .expect("second publish");
    assert_eq!(first.purged_messages, 0);
    assert_eq!(second.purged_messages, 1);
    assert_eq!(
        platform.deleted_messages(),
        vec![(config.board_channel_id, first.message_id)]
    );
    assert_eq!(platform.history_len(config.board_channel_id), 1);
    assert!(matches!(
        platform.sent_messages(config.board_channel_id)[1].controls[0],
        MessageControl::CategoryPicker { ref categories } if categories.len() == 4
    ));
}
