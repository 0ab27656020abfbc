use serde::Deserialize;

use inbox_common::ticket::Ticket;

/// A raw transaction row as exported by the shop. Rows are heterogeneous and
/// frequently incomplete, so every field is optional at parse time; the
/// normalizer decides what is defaultable and what makes a row unusable.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "order_date", alias = "created_at")]
    pub date: Option<String>,
    #[serde(alias = "title")]
    pub subject: Option<String>,
    #[serde(alias = "customer")]
    pub customer_name: Option<String>,
    pub channel: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,

    // Aggregation-only attributes. Carried through normalization alongside
    // the ticket but never persisted on it. The product name doubles as the
    // subject fallback for rows that carry none.
    pub category: Option<String>,
    pub brand: Option<String>,
    #[serde(alias = "product_name")]
    pub product: Option<String>,
}

/// A well-formed ticket plus the auxiliary attributes the aggregator groups
/// by. The auxiliary fields exist only for the duration of a batch run.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub ticket: Ticket,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub product: Option<String>,
}
