use inbox_common::ticket::{Ticket, TicketPriority, TicketStatus, UpdateRequest};

use crate::api::ApiError;

/// Which resulting states trigger an outbound notification. Defaults match
/// the product rule: escalation to high priority, or a ticket being closed.
#[derive(Debug, Clone, Copy)]
pub struct NotifyRule {
    pub priority: TicketPriority,
    pub status: TicketStatus,
}

impl Default for NotifyRule {
    fn default() -> Self {
        Self {
            priority: TicketPriority::High,
            status: TicketStatus::Closed,
        }
    }
}

/// The accepted outcome of an update request.
#[derive(Debug, Clone)]
pub struct Transition {
    pub ticket: Ticket,
    pub notify: bool,
}

/// Decide what an update request does to a ticket.
///
/// Pure function, no I/O. Rejects requests that change nothing, so a no-op
/// can never reach the store or re-trigger a notification. Identity fields
/// (id, subject, customer, channel, created_at) are copied through untouched.
///
/// A transition notifies when the *resulting* priority matches the rule
/// (however it got there), or when the status lands on the rule's status
/// coming from a different one. Both conditions holding at once still means
/// a single notification, carrying the combined final state.
pub fn evaluate(
    previous: &Ticket,
    requested: &UpdateRequest,
    rule: &NotifyRule,
) -> Result<Transition, ApiError> {
    if requested.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }

    let new_status = requested.status.filter(|status| *status != previous.status);
    let new_priority = requested
        .priority
        .filter(|priority| *priority != previous.priority);

    if new_status.is_none() && new_priority.is_none() {
        return Err(ApiError::NoChanges);
    }

    let ticket = Ticket {
        status: new_status.unwrap_or(previous.status),
        priority: new_priority.unwrap_or(previous.priority),
        ..previous.clone()
    };

    let escalated = ticket.priority == rule.priority;
    let reached_status = ticket.status == rule.status && previous.status != rule.status;

    Ok(Transition {
        notify: escalated || reached_status,
        ticket,
    })
}
