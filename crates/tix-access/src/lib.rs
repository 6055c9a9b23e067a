//! Ticket ownership encoding and access decisions.
pub mod owner_topic;
pub mod ticket_policy;

pub use owner_topic::*;
pub use ticket_policy::*;
