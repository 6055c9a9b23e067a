use serde::Serialize;
use tracing::debug;

const ALLOW_TICKET_OWNER: &str = "allow_ticket_owner";
const ALLOW_STAFF_ROLE: &str = "allow_staff_role";
const ALLOW_REQUIRED_ROLE: &str = "allow_required_role";
const DENY_NOT_OWNER_OR_STAFF: &str = "deny_not_owner_or_staff";
const DENY_OWNER_UNRESOLVED: &str = "deny_owner_unresolved_not_staff";
const DENY_REQUIRED_ROLE_MISSING: &str = "deny_required_role_missing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Access policy applied to close and participant-management requests.
pub struct TicketAccessPolicy {
    pub staff_role_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identity of the user acting on a ticket.
pub struct TicketActor {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
}

impl TicketActor {
    pub fn new(user_id: u64, role_ids: Vec<u64>) -> Self {
        Self { user_id, role_ids }
    }

    pub fn has_role(&self, role_id: u64) -> bool {
        self.role_ids.contains(&role_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Enumerates supported `AccessDecision` values.
pub enum AccessDecision {
    Allow { reason_code: String },
    Deny { reason_code: String },
}

impl AccessDecision {
    pub fn reason_code(&self) -> &str {
        match self {
            Self::Allow { reason_code } | Self::Deny { reason_code } => reason_code,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Decides whether `actor` may close the ticket or change its participants.
///
/// Allowed iff the actor is the resolved owner or holds the staff role. An
/// unresolved owner never matches anyone.
pub fn evaluate_ticket_access(
    policy: &TicketAccessPolicy,
    owner_id: Option<u64>,
    actor: &TicketActor,
) -> AccessDecision {
    let decision = if owner_id == Some(actor.user_id) {
        AccessDecision::Allow {
            reason_code: ALLOW_TICKET_OWNER.to_string(),
        }
    } else if actor.has_role(policy.staff_role_id) {
        AccessDecision::Allow {
            reason_code: ALLOW_STAFF_ROLE.to_string(),
        }
    } else if owner_id.is_none() {
        AccessDecision::Deny {
            reason_code: DENY_OWNER_UNRESOLVED.to_string(),
        }
    } else {
        AccessDecision::Deny {
            reason_code: DENY_NOT_OWNER_OR_STAFF.to_string(),
        }
    };
    debug!(
        actor_id = actor.user_id,
        owner_id = ?owner_id,
        reason_code = decision.reason_code(),
        "ticket access evaluated"
    );
    decision
}

pub fn can_manage_ticket(
    policy: &TicketAccessPolicy,
    owner_id: Option<u64>,
    actor: &TicketActor,
) -> bool {
    evaluate_ticket_access(policy, owner_id, actor).is_allowed()
}

/// Gate for administrative commands bound to a single role.
pub fn evaluate_role_gate(required_role_id: u64, actor: &TicketActor) -> AccessDecision {
    if actor.has_role(required_role_id) {
        AccessDecision::Allow {
            reason_code: ALLOW_REQUIRED_ROLE.to_string(),
        }
    } else {
        AccessDecision::Deny {
            reason_code: DENY_REQUIRED_ROLE_MISSING.to_string(),
        }
    }
}
