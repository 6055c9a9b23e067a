//! Ticket desk domain: categories and their forms, desk configuration, the
//! persisted ticket counter, the in-process ticket registry, transcript
//! rendering and the lifecycle controller that drives a [`TicketPlatform`].
//!
//! Nothing in this crate talks to Discord directly; the gateway runtime plugs a
//! platform implementation into [`TicketLifecycleController`].

pub mod board;
pub mod category;
pub mod config;
pub mod counter;
pub mod error;
pub mod lifecycle;
#[cfg(any(test, feature = "test-support"))]
pub mod memory_platform;
pub mod platform;
pub mod registry;
pub mod render;
pub mod transcript;

pub use board::{authorize_board_publisher, publish_ticket_board, BoardPublishReport};
pub use category::{fields_for, ticket_channel_name, TicketCategory, DEFAULT_FORM_FIELDS};
pub use config::{
    load_ticket_desk_config, parse_ticket_desk_config, render_config_summary,
    validate_ticket_desk_config, TicketDeskConfig,
};
pub use counter::{CounterStore, InMemoryCounterStore, JsonFileCounterStore};
pub use error::{TicketAction, TicketError};
pub use lifecycle::{
    CloseRequest, ClosedTicket, OpenedTicket, ParticipantChange, TicketLifecycleController,
    TicketSubmission,
};
pub use platform::{
    AccessOverwrite, ChannelAccess, ChannelSnapshot, DeliveryOutcome, EmbedCard, EmbedColour,
    EmbedField, FileAttachment, HistoryMessage, MessageControl, OutboundMessage, OverwriteTarget,
    TicketChannelRequest, TicketPlatform,
};
pub use registry::{TicketRecord, TicketRegistry, TicketState};
pub use transcript::{render_transcript, transcript_file_name, TranscriptEntry};
