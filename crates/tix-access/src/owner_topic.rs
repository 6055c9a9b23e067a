//! `owner:<id>` token carried in a ticket channel's topic.

pub const OWNER_TOPIC_PREFIX: &str = "owner:";

/// Renders the topic string written onto a freshly created ticket channel.
pub fn render_owner_topic(owner_id: u64) -> String {
    format!("{OWNER_TOPIC_PREFIX}{owner_id}")
}

/// Extracts the owner id from a channel topic.
///
/// The last `owner:` marker wins and must be followed by a bare decimal id.
/// Anything else (missing topic, missing marker, empty or non-numeric id) yields
/// `None`, which callers must treat as "no owner".
pub fn parse_owner_topic(topic: Option<&str>) -> Option<u64> {
    let topic = topic?;
    let (_, tail) = topic.rsplit_once(OWNER_TOPIC_PREFIX)?;
    let token = tail.split_whitespace().next()?;
    if !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse::<u64>().ok().filter(|id| *id != 0)
}
