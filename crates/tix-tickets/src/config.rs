//! Desk configuration loaded from TOML at startup.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tix_access::TicketAccessPolicy;

use crate::category::TicketCategory;

const DEFAULT_TRANSCRIPT_TIMEZONE: &str = "UTC";
const DEFAULT_CLOSE_CONFIRMATION_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_BOARD_PURGE_SCAN_LIMIT: u8 = 50;

fn default_transcript_timezone() -> String {
    DEFAULT_TRANSCRIPT_TIMEZONE.to_string()
}

fn default_close_confirmation_timeout_seconds() -> u64 {
    DEFAULT_CLOSE_CONFIRMATION_TIMEOUT_SECONDS
}

fn default_board_purge_scan_limit() -> u8 {
    DEFAULT_BOARD_PURGE_SCAN_LIMIT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Guild-specific ids and tunables for one ticket desk.
pub struct TicketDeskConfig {
    pub guild_id: u64,
    /// Role allowed to (re)publish the ticket board.
    pub publisher_role_id: u64,
    /// Role that can see and manage every ticket.
    pub staff_role_id: u64,
    /// Channel holding the category picker.
    pub board_channel_id: u64,
    /// Archive destination for closed-ticket transcripts.
    pub transcript_channel_id: u64,
    /// Platform category (channel group) each ticket type is created under.
    #[serde(default)]
    pub categories: BTreeMap<TicketCategory, u64>,
    #[serde(default = "default_transcript_timezone")]
    pub transcript_timezone: String,
    #[serde(default = "default_close_confirmation_timeout_seconds")]
    pub close_confirmation_timeout_seconds: u64,
    #[serde(default = "default_board_purge_scan_limit")]
    pub board_purge_scan_limit: u8,
}

impl TicketDeskConfig {
    pub fn category_channel_id(&self, category: TicketCategory) -> Option<u64> {
        self.categories.get(&category).copied()
    }

    /// Reverse lookup from a channel's parent id to the ticket category it hosts.
    pub fn category_for_parent(&self, parent_id: Option<u64>) -> Option<TicketCategory> {
        let parent_id = parent_id?;
        self.categories
            .iter()
            .find(|(_, channel_id)| **channel_id == parent_id)
            .map(|(category, _)| *category)
    }

    /// Configured categories in board display order.
    pub fn configured_categories(&self) -> Vec<TicketCategory> {
        TicketCategory::ALL
            .into_iter()
            .filter(|category| self.categories.contains_key(category))
            .collect()
    }

    pub fn access_policy(&self) -> TicketAccessPolicy {
        TicketAccessPolicy {
            staff_role_id: self.staff_role_id,
        }
    }

    pub fn close_confirmation_window_ms(&self) -> u64 {
        self.close_confirmation_timeout_seconds.saturating_mul(1_000)
    }

    pub fn transcript_tz(&self) -> Tz {
        self.transcript_timezone.parse::<Tz>().unwrap_or(Tz::UTC)
    }
}

pub fn parse_ticket_desk_config(raw: &str) -> Result<TicketDeskConfig> {
    let config =
        toml::from_str::<TicketDeskConfig>(raw).context("failed to parse ticket desk config")?;
    validate_ticket_desk_config(&config)?;
    Ok(config)
}

pub fn load_ticket_desk_config(path: &Path) -> Result<TicketDeskConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ticket desk config {}", path.display()))?;
    parse_ticket_desk_config(&raw)
        .with_context(|| format!("invalid ticket desk config {}", path.display()))
}

pub fn validate_ticket_desk_config(config: &TicketDeskConfig) -> Result<()> {
    for (name, value) in [
        ("guild_id", config.guild_id),
        ("publisher_role_id", config.publisher_role_id),
        ("staff_role_id", config.staff_role_id),
        ("board_channel_id", config.board_channel_id),
        ("transcript_channel_id", config.transcript_channel_id),
    ] {
        if value == 0 {
            bail!("{name} must be a non-zero id");
        }
    }
    if config.categories.is_empty() {
        bail!("at least one ticket category must be configured");
    }
    for (category, channel_id) in &config.categories {
        if *channel_id == 0 {
            bail!("category '{}' must map to a non-zero id", category.slug());
        }
    }
    let mut seen = config.categories.values().copied().collect::<Vec<_>>();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != config.categories.len() {
        bail!("each ticket category must map to a distinct channel category");
    }
    if config.transcript_timezone.parse::<Tz>().is_err() {
        bail!(
            "transcript_timezone '{}' is not a known IANA time zone",
            config.transcript_timezone
        );
    }
    if config.close_confirmation_timeout_seconds == 0 {
        bail!("close_confirmation_timeout_seconds must be greater than 0");
    }
    if config.board_purge_scan_limit == 0 || config.board_purge_scan_limit > 100 {
        bail!("board_purge_scan_limit must be in range 1..=100");
    }
    Ok(())
}

pub fn render_config_summary(config: &TicketDeskConfig) -> String {
    let mut lines = vec![
        format!("guild_id: {}", config.guild_id),
        format!("publisher_role_id: {}", config.publisher_role_id),
        format!("staff_role_id: {}", config.staff_role_id),
        format!("board_channel_id: {}", config.board_channel_id),
        format!("transcript_channel_id: {}", config.transcript_channel_id),
        format!("transcript_timezone: {}", config.transcript_timezone),
        format!(
            "close_confirmation_timeout_seconds: {}",
            config.close_confirmation_timeout_seconds
        ),
        format!("categories: {}", config.categories.len()),
    ];
    for category in config.configured_categories() {
        lines.push(format!(
            "- {} -> {}",
            category.display_name(),
            config.category_channel_id(category).unwrap_or_default()
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
pub(crate) fn sample_ticket_desk_config() -> TicketDeskConfig {
    TicketDeskConfig {
        guild_id: 1,
        publisher_role_id: 10,
        staff_role_id: 20,
        board_channel_id: 30,
        transcript_channel_id: 40,
        categories: BTreeMap::from([
            (TicketCategory::GeneralQuestion, 101),
            (TicketCategory::BugReport, 102),
            (TicketCategory::PlayerReport, 103),
            (TicketCategory::StaffReport, 104),
        ]),
        transcript_timezone: "UTC".to_string(),
        close_confirmation_timeout_seconds: 60,
        board_purge_scan_limit: 50,
    }
}
