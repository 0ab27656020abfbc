use std::collections::{BTreeMap, HashMap};

use inbox_common::snapshot::{DayCount, MetricsSnapshot, TopCounts};

use crate::record::NormalizedRecord;

/// Fold the normalized records into one complete `MetricsSnapshot`.
///
/// Pure with respect to its input: the same record sequence produces a
/// byte-identical snapshot. Writing the snapshot anywhere is the caller's
/// concern. An empty input yields a zeroed snapshot, not an error.
pub fn aggregate(records: &[NormalizedRecord], top_n: usize) -> MetricsSnapshot {
    let mut by_day: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for record in records {
        *by_day
            .entry(record.ticket.created_at.date_naive())
            .or_insert(0) += 1;
    }

    MetricsSnapshot {
        total_tickets: records.len() as u64,
        tickets_by_day: by_day
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
        top_categories: top_counts(records.iter().map(|r| r.category.as_deref()), top_n),
        top_brands: top_counts(records.iter().map(|r| r.brand.as_deref()), top_n),
        top_products: top_counts(records.iter().map(|r| r.product.as_deref()), top_n),
    }
}

/// Count label occurrences and keep the `top_n` largest.
///
/// Ties are broken by the label's first appearance in the input sequence, so
/// the result never depends on hash map iteration order.
fn top_counts<'a>(labels: impl Iterator<Item = Option<&'a str>>, top_n: usize) -> TopCounts {
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    let mut seen = 0usize;

    for label in labels.flatten() {
        let entry = counts.entry(label).or_insert_with(|| {
            let first_seen = seen;
            seen += 1;
            (0, first_seen)
        });
        entry.0 += 1;
    }

    let mut entries: Vec<(&str, (u64, usize))> = counts.into_iter().collect();
    entries.sort_by(|(_, (count_a, seen_a)), (_, (count_b, seen_b))| {
        count_b.cmp(count_a).then(seen_a.cmp(seen_b))
    });
    entries.truncate(top_n);

    TopCounts::new(
        entries
            .into_iter()
            .map(|(label, (count, _))| (label.to_owned(), count))
            .collect(),
    )
}
