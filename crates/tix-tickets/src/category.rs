//! Ticket categories and the form each one presents.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const GENERAL_QUESTION_FIELDS: &[&str] = &["Your Minecraft Name", "Your Question"];
const BUG_REPORT_FIELDS: &[&str] = &[
    "Your Minecraft Name",
    "Describe the bug, send a video if u can",
];
const PLAYER_REPORT_FIELDS: &[&str] = &[
    "Your Minecraft Name",
    "Name of the Player",
    "Why are you reporting this player?",
];
const STAFF_REPORT_FIELDS: &[&str] = &[
    "Your Minecraft Name",
    "Name of the Staff",
    "Why are you reporting this staff?",
];

/// Form used for any category name the desk does not recognise.
pub const DEFAULT_FORM_FIELDS: &[&str] = GENERAL_QUESTION_FIELDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Enumerates supported `TicketCategory` values.
pub enum TicketCategory {
    GeneralQuestion,
    BugReport,
    PlayerReport,
    StaffReport,
}

impl TicketCategory {
    /// Every category, in board display order.
    pub const ALL: [TicketCategory; 4] = [
        Self::GeneralQuestion,
        Self::BugReport,
        Self::PlayerReport,
        Self::StaffReport,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::GeneralQuestion => "General Question",
            Self::BugReport => "Bug Report",
            Self::PlayerReport => "Player Report",
            Self::StaffReport => "Staff Report",
        }
    }

    /// Separator-free lowercase key used in channel names and component ids.
    pub fn slug(self) -> &'static str {
        match self {
            Self::GeneralQuestion => "generalquestion",
            Self::BugReport => "bugreport",
            Self::PlayerReport => "playerreport",
            Self::StaffReport => "staffreport",
        }
    }

    pub fn field_labels(self) -> &'static [&'static str] {
        match self {
            Self::GeneralQuestion => GENERAL_QUESTION_FIELDS,
            Self::BugReport => BUG_REPORT_FIELDS,
            Self::PlayerReport => PLAYER_REPORT_FIELDS,
            Self::StaffReport => STAFF_REPORT_FIELDS,
        }
    }

    /// snake_case key used in configuration files.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::GeneralQuestion => "general_question",
            Self::BugReport => "bug_report",
            Self::PlayerReport => "player_report",
            Self::StaffReport => "staff_report",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.config_key() == key.trim())
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.display_name().eq_ignore_ascii_case(name))
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.slug() == slug)
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for TicketCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.config_key())
    }
}

impl<'de> Deserialize<'de> for TicketCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_config_key(&raw).ok_or_else(|| {
            de::Error::unknown_variant(
                &raw,
                &[
                    "general_question",
                    "bug_report",
                    "player_report",
                    "staff_report",
                ],
            )
        })
    }
}

/// Ordered form labels for a category name; unknown names get the default form.
pub fn fields_for(category_name: &str) -> &'static [&'static str] {
    TicketCategory::from_display_name(category_name)
        .map(TicketCategory::field_labels)
        .unwrap_or(DEFAULT_FORM_FIELDS)
}

/// Deterministic `ticket-<category>-<username>` channel name.
///
/// The username is reduced to lowercase ASCII alphanumerics, `-` and `_` so the
/// platform stores the name exactly as rendered and duplicate lookups match.
pub fn ticket_channel_name(category: TicketCategory, username: &str) -> String {
    let mut segment = String::with_capacity(username.len());
    for ch in username.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            segment.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() && !segment.ends_with('-') {
            segment.push('-');
        }
    }
    let segment = segment.trim_matches('-');
    let segment = if segment.is_empty() { "user" } else { segment };
    format!("ticket-{}-{}", category.slug(), segment)
}
