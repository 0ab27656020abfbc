use std::fmt;

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ticket count for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// A bounded label -> count mapping with a meaningful entry order:
/// count descending, ties broken by first appearance in the source data.
///
/// Serialized as a JSON object whose keys keep that order, which is what the
/// dashboard consumes directly. A plain `HashMap` would destroy the ordering,
/// so this wraps a vec and hand-rolls the serde impls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopCounts(Vec<(String, u64)>);

impl TopCounts {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, u64)> {
        self.0.iter()
    }
}

impl Serialize for TopCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

struct TopCountsVisitor;

impl<'de> Visitor<'de> for TopCountsVisitor {
    type Value = TopCounts;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a map of labels to counts")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        // MapAccess yields entries in document order, preserving the
        // count-descending layout written by `Serialize`.
        while let Some((label, count)) = access.next_entry::<String, u64>()? {
            entries.push((label, count));
        }
        Ok(TopCounts(entries))
    }
}

impl<'de> Deserialize<'de> for TopCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TopCountsVisitor)
    }
}

/// The complete set of aggregated dashboard metrics.
///
/// A snapshot is regenerated wholesale by each aggregation run and published
/// atomically; readers never observe a partially built one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricsSnapshot {
    pub total_tickets: u64,
    pub tickets_by_day: Vec<DayCount>,
    pub top_categories: TopCounts,
    pub top_brands: TopCounts,
    pub top_products: TopCounts,
}

impl MetricsSnapshot {
    /// `tickets_by_day` partitions the ticket population, so its counts must
    /// add back up to the total.
    pub fn is_consistent(&self) -> bool {
        self.tickets_by_day.iter().map(|day| day.count).sum::<u64>() == self.total_tickets
    }
}
