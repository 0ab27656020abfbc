use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use inbox_common::ticket::Ticket;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    NotFound(i64),
    #[error("ticket {0} was modified concurrently")]
    Conflict(i64),
}

/// The boundary to durable ticket state.
///
/// `compare_and_write` is the per-ticket serialization point: it only swaps
/// the row when it still equals what the caller read, so two racing
/// read-modify-write cycles can never both act on the same prior state.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Ticket, StoreError>;

    /// All tickets, newest first. A non-empty search term filters by
    /// case-insensitive substring over subject and customer name. Ordering is
    /// stable across calls absent mutation.
    async fn list(&self, search: Option<&str>) -> Vec<Ticket>;

    async fn insert(&self, ticket: Ticket);

    async fn compare_and_write(&self, expected: &Ticket, new: Ticket) -> Result<(), StoreError>;
}

/// In-process implementation backing the service; also what the tests run
/// against. Atomicity per ticket comes from doing the compare and the swap
/// under one write-lock acquisition.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<BTreeMap<i64, Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn get(&self, id: i64) -> Result<Ticket, StoreError> {
        self.tickets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, search: Option<&str>) -> Vec<Ticket> {
        let tickets = self.tickets.read().await;

        let mut matched: Vec<Ticket> = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                tickets
                    .values()
                    .filter(|ticket| {
                        ticket.subject.to_lowercase().contains(&term)
                            || ticket.customer_name.to_lowercase().contains(&term)
                    })
                    .cloned()
                    .collect()
            }
            None => tickets.values().cloned().collect(),
        };

        // Newest first; id disambiguates tickets created in the same instant.
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched
    }

    async fn insert(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    async fn compare_and_write(&self, expected: &Ticket, new: Ticket) -> Result<(), StoreError> {
        let mut tickets = self.tickets.write().await;

        let current = tickets
            .get_mut(&expected.id)
            .ok_or(StoreError::NotFound(expected.id))?;

        if current != expected {
            return Err(StoreError::Conflict(expected.id));
        }

        *current = new;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use inbox_common::ticket::{TicketPriority, TicketStatus};

    fn ticket(id: i64, subject: &str, customer: &str, day: u32) -> Ticket {
        Ticket {
            id,
            subject: subject.to_string(),
            customer_name: customer.to_string(),
            channel: "Email".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
        }
    }

    async fn seeded_store() -> MemoryTicketStore {
        let store = MemoryTicketStore::new();
        store.insert(ticket(1, "Broken screen", "Alan Turing", 1)).await;
        store.insert(ticket(2, "Billing question", "Grace Hopper", 2)).await;
        store.insert(ticket(3, "Screen flickers", "Ada Lovelace", 3)).await;
        store
    }

    #[tokio::test]
    async fn test_get_missing_ticket() {
        let store = MemoryTicketStore::new();
        assert_eq!(store.get(42).await, Err(StoreError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = seeded_store().await;
        let ids: Vec<i64> = store.list(None).await.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_search_matches_subject_and_customer_case_insensitively() {
        let store = seeded_store().await;

        let by_subject: Vec<i64> = store
            .list(Some("SCREEN"))
            .await
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(by_subject, vec![3, 1]);

        let by_customer: Vec<i64> = store
            .list(Some("grace"))
            .await
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(by_customer, vec![2]);
    }

    #[tokio::test]
    async fn test_blank_search_returns_everything() {
        let store = seeded_store().await;
        assert_eq!(store.list(Some("   ")).await.len(), 3);
        assert_eq!(store.list(Some("")).await.len(), 3);
    }

    #[tokio::test]
    async fn test_compare_and_write_swaps_when_unchanged() {
        let store = seeded_store().await;
        let current = store.get(1).await.unwrap();

        let mut updated = current.clone();
        updated.status = TicketStatus::Closed;
        store.compare_and_write(&current, updated).await.unwrap();

        assert_eq!(store.get(1).await.unwrap().status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn test_compare_and_write_rejects_stale_reads() {
        let store = seeded_store().await;
        let stale = store.get(1).await.unwrap();

        // Another writer slips in first.
        let mut first = stale.clone();
        first.priority = TicketPriority::High;
        store.compare_and_write(&stale, first).await.unwrap();

        let mut second = stale.clone();
        second.status = TicketStatus::Closed;
        assert_eq!(
            store.compare_and_write(&stale, second).await,
            Err(StoreError::Conflict(1))
        );

        // The first write is intact.
        let current = store.get(1).await.unwrap();
        assert_eq!(current.priority, TicketPriority::High);
        assert_eq!(current.status, TicketStatus::Open);
    }
}
