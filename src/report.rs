use crate::error::ScanError;
use crate::types::{CategoryShare, EntityMetadata, ScanAccumulator, ScanReport};
use time::{format_description::well_known, OffsetDateTime};

/// `count / scanned * 100`, rounded to one decimal place (half away from zero).
pub fn percent_of(count: u64, scanned: u64) -> f64 {
    if scanned == 0 {
        return 0.0;
    }
    // Tenths of a percent, rounded in integers so exact ties go up.
    ((count * 2000 + scanned) / (2 * scanned)) as f64 / 10.0
}

/// Turn the counters of a finished scan into a report.
///
/// `cap` is the bound the scan ran with. The platform-reported total is carried as-is,
/// even if it is smaller than `scanned`.
pub fn aggregate(
    acc: &ScanAccumulator,
    entity: &EntityMetadata,
    cap: usize,
) -> Result<ScanReport, ScanError> {
    if acc.scanned == 0 {
        return Err(ScanError::EmptyRoster);
    }
    let share = |count: u64| CategoryShare {
        count,
        percent: percent_of(count, acc.scanned),
    };
    Ok(ScanReport {
        entity_id: entity.id,
        display_name: entity.display_name.clone(),
        reported_total: entity.reported_total,
        scanned: acc.scanned,
        cap: cap as u64,
        capped: acc.scanned >= cap as u64,
        real: share(acc.real),
        bot: share(acc.bot),
        suspicious: share(acc.suspicious),
        fake: share(acc.fake),
        signals: acc.signals,
        scanned_at: now_rfc3339(),
    })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
