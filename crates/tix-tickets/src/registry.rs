//! In-process record of ticket channels and their lifecycle state.
//!
//! The registry is the source of truth for owner and state while the process
//! runs. The channel topic only mirrors the owner so records can be rebuilt for
//! channels created before a restart.

use std::collections::HashMap;

use tix_core::is_deadline_elapsed;

use crate::category::TicketCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `TicketState` values.
pub enum TicketState {
    Open,
    PendingClose {
        requested_by: u64,
        deadline_unix_ms: u64,
    },
    Closed,
}

impl TicketState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::PendingClose { .. } => "pending_close",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub channel_id: u64,
    pub channel_name: String,
    /// `None` when the owner could not be recovered; only staff may act then.
    pub owner_id: Option<u64>,
    pub category: TicketCategory,
    pub state: TicketState,
}

#[derive(Debug, Default)]
pub struct TicketRegistry {
    tickets: HashMap<u64, TicketRecord>,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn get(&self, channel_id: u64) -> Option<&TicketRecord> {
        self.tickets.get(&channel_id)
    }

    /// Inserts `record` unless the channel is already tracked; returns the tracked record.
    pub fn insert_if_absent(&mut self, record: TicketRecord) -> TicketRecord {
        self.tickets
            .entry(record.channel_id)
            .or_insert(record)
            .clone()
    }

    pub fn upsert(&mut self, record: TicketRecord) {
        self.tickets.insert(record.channel_id, record);
    }

    pub fn remove(&mut self, channel_id: u64) -> Option<TicketRecord> {
        self.tickets.remove(&channel_id)
    }

    /// Moves a tracked ticket to `state`; returns the previous state.
    pub fn set_state(&mut self, channel_id: u64, state: TicketState) -> Option<TicketState> {
        let record = self.tickets.get_mut(&channel_id)?;
        Some(std::mem::replace(&mut record.state, state))
    }

    /// Reverts the channel's pending close to `Open` once its deadline has
    /// passed; returns who requested it.
    pub fn revert_expired_close(&mut self, channel_id: u64, now_unix_ms: u64) -> Option<u64> {
        let record = self.tickets.get_mut(&channel_id)?;
        match record.state {
            TicketState::PendingClose {
                requested_by,
                deadline_unix_ms,
            } if is_deadline_elapsed(deadline_unix_ms, now_unix_ms) => {
                record.state = TicketState::Open;
                Some(requested_by)
            }
            _ => None,
        }
    }
}
