use std::path::Path;

use tracing::info;

use inbox_common::ticket::Ticket;

use crate::aggregator::aggregate;
use crate::config::Config;
use crate::error::EtlError;
use crate::normalizer::normalize;
use crate::publish::write_json_atomic;
use crate::record::RawRecord;

/// One batch run: read the raw export, normalize it into tickets, aggregate
/// the dashboard metrics and publish both artifacts. A run that fails before
/// publishing leaves any previously published artifacts in place.
pub fn run(config: &Config) -> Result<(), EtlError> {
    let input_path = Path::new(&config.input_path);

    let raw = std::fs::read(input_path).map_err(|error| EtlError::SourceUnreadable {
        path: input_path.to_path_buf(),
        error,
    })?;
    let rows: Vec<RawRecord> =
        serde_json::from_slice(&raw).map_err(|error| EtlError::SourceMalformed {
            path: input_path.to_path_buf(),
            error,
        })?;

    let row_count = rows.len();
    let output = normalize(rows);
    let snapshot = aggregate(&output.records, config.top_n);

    let tickets: Vec<&Ticket> = output.records.iter().map(|r| &r.ticket).collect();
    write_json_atomic(Path::new(&config.tickets_path), &tickets)?;
    write_json_atomic(Path::new(&config.metrics_path), &snapshot)?;

    info!(
        rows = row_count,
        tickets = tickets.len(),
        skipped = output.skipped_rows,
        days = snapshot.tickets_by_day.len(),
        "batch run published"
    );

    Ok(())
}
