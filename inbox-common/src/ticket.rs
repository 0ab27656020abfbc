use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} is not a valid {1}")]
pub struct ParseEnumError(pub String, pub &'static str);

/// Lifecycle state of a ticket. Stored and serialized in lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "open" => Ok(TicketStatus::Open),
            "pending" => Ok(TicketStatus::Pending),
            "closed" => Ok(TicketStatus::Closed),
            invalid => Err(ParseEnumError(invalid.to_owned(), "TicketStatus")),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::Pending => write!(f, "pending"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl FromStr for TicketPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            invalid => Err(ParseEnumError(invalid.to_owned(), "TicketPriority")),
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
        }
    }
}

/// A normalized support-request record.
///
/// Ids are assigned once by the normalizer and are stable across re-runs on
/// unchanged input. `created_at` never changes after creation; only `status`
/// and `priority` are mutable, and only through the update path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    pub customer_name: String,
    /// Origin channel. Open set stored as text; well-known values are
    /// Email, Chat and Phone.
    pub channel: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
}

/// A requested change to a ticket's mutable fields. Absent fields mean
/// "no change". Not persisted.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct UpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
}

impl UpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }
}

/// The webhook payload for a qualifying transition: a snapshot of the ticket
/// *after* the update was written, not a diff.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationEvent {
    pub id: i64,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub customer_name: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Ticket> for NotificationEvent {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            subject: ticket.subject.clone(),
            status: ticket.status,
            priority: ticket.priority,
            customer_name: ticket.customer_name.clone(),
            channel: ticket.channel.clone(),
            created_at: ticket.created_at,
        }
    }
}
