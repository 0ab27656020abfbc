use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use tracing::debug;

use inbox_common::ticket::{Ticket, TicketPriority, TicketStatus};

use crate::record::{NormalizedRecord, RawRecord};

const UNKNOWN: &str = "Unknown";

/// The outcome of one normalization pass.
pub struct NormalizeOutput {
    pub records: Vec<NormalizedRecord>,
    /// Rows dropped for missing a subject or a usable timestamp.
    pub skipped_rows: u64,
}

/// Turn raw transaction rows into well-formed tickets.
///
/// Ids are a counter over input order starting at 1, so re-running over
/// unchanged input reproduces the exact same assignment. A row missing its
/// subject or date is skipped and counted rather than failing the run; a
/// missing customer or channel degrades to "Unknown".
pub fn normalize(rows: impl IntoIterator<Item = RawRecord>) -> NormalizeOutput {
    let mut records = Vec::new();
    let mut skipped_rows = 0u64;
    let mut next_id = 1i64;

    for row in rows {
        let Some(created_at) = row.date.as_deref().and_then(parse_timestamp) else {
            debug!("skipping row without a usable date");
            skipped_rows += 1;
            continue;
        };

        // Rows exported straight from the shop catalog carry a product name
        // but no subject; the product name is the next best subject.
        let subject = non_blank(row.subject.as_deref())
            .or_else(|| non_blank(row.product.as_deref()));
        let Some(subject) = subject else {
            debug!("skipping row without a subject or product name");
            skipped_rows += 1;
            continue;
        };

        let ticket = Ticket {
            id: next_id,
            subject,
            customer_name: non_blank(row.customer_name.as_deref())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            channel: non_blank(row.channel.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
            status: row
                .status
                .as_deref()
                .and_then(|s| s.parse::<TicketStatus>().ok())
                .unwrap_or(TicketStatus::Open),
            priority: row
                .priority
                .as_deref()
                .and_then(|s| s.parse::<TicketPriority>().ok())
                .unwrap_or(TicketPriority::Medium),
            created_at,
        };
        next_id += 1;

        records.push(NormalizedRecord {
            ticket,
            category: non_blank(row.category.as_deref()),
            brand: non_blank(row.brand.as_deref()),
            product: non_blank(row.product.as_deref()),
        });
    }

    counter!("etl_rows_skipped_total").increment(skipped_rows);
    counter!("etl_rows_normalized_total").increment(records.len() as u64);

    NormalizeOutput {
        records,
        skipped_rows,
    }
}

/// Source timestamps arrive as RFC 3339, as a naive datetime, or as a bare
/// calendar date (taken as midnight UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
