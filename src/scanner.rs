use crate::classifier::{Classifier, Signal, Verdict};
use crate::directory::MemberDirectory;
use crate::error::{RunError, ScanError};
use crate::report;
use crate::resolver::{self, EntityReference};
use crate::types::{ScanAccumulator, ScanReport};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolve `raw`, then scan the entity it names. This is the single entry point callers need.
pub async fn run_scan(
    directory: &dyn MemberDirectory,
    classifier: &Classifier,
    raw: &str,
    cap: usize,
) -> Result<ScanReport, RunError> {
    let reference = resolver::resolve(raw)?;
    debug!(input = raw, reference = %reference, "resolved reference");
    Ok(scan_entity(directory, classifier, &reference, cap).await?)
}

/// Look up the entity and classify up to `cap` of its members.
///
/// - Members are pulled one at a time from the directory's stream; each is classified as it arrives.
/// - Any platform failure ends the scan immediately. Nothing is retried.
/// - A scan that observes no member fails with [`ScanError::EmptyRoster`].
pub async fn scan_entity(
    directory: &dyn MemberDirectory,
    classifier: &Classifier,
    reference: &EntityReference,
    cap: usize,
) -> Result<ScanReport, ScanError> {
    scan_entity_internal(directory, classifier, reference, cap, None).await
}

/// Variant that accepts a `CancellationToken`. Cancelling stops enumeration and reports
/// on the members seen so far.
pub async fn scan_entity_with_cancel(
    directory: &dyn MemberDirectory,
    classifier: &Classifier,
    reference: &EntityReference,
    cap: usize,
    cancel: CancellationToken,
) -> Result<ScanReport, ScanError> {
    scan_entity_internal(directory, classifier, reference, cap, Some(cancel)).await
}

async fn scan_entity_internal(
    directory: &dyn MemberDirectory,
    classifier: &Classifier,
    reference: &EntityReference,
    cap: usize,
    cancel_opt: Option<CancellationToken>,
) -> Result<ScanReport, ScanError> {
    let cancel = cancel_opt.unwrap_or_default();

    let entity = directory.lookup_entity(reference).await?;
    info!(
        entity = %entity.id,
        name = %entity.display_name,
        reported_total = entity.reported_total,
        cap,
        "scanning roster"
    );

    // The directory is asked to honour the cap; take() guarantees it.
    let mut members = directory.iterate_members(entity.id, cap).take(cap);
    let mut acc = ScanAccumulator::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(entity = %entity.id, scanned = acc.scanned, "scan cancelled");
                break;
            }
            item = members.next() => item,
        };
        let Some(item) = next else { break };
        let profile = item?;
        tally(&mut acc, classifier.evaluate(&profile));
    }

    info!(
        entity = %entity.id,
        scanned = acc.scanned,
        real = acc.real,
        bot = acc.bot,
        suspicious = acc.suspicious,
        fake = acc.fake,
        "scan finished"
    );
    report::aggregate(&acc, &entity, cap)
}

fn tally(acc: &mut ScanAccumulator, verdict: Verdict) {
    acc.record(verdict.category);
    for signal in verdict.signals.iter() {
        match signal {
            Signal::NoPhoto => acc.signals.no_photo += 1,
            Signal::SuspiciousUsername => acc.signals.suspicious_username += 1,
            Signal::SuspiciousName => acc.signals.suspicious_name += 1,
            Signal::NoLastName => acc.signals.no_last_name += 1,
        }
    }
}
