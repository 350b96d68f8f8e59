use super::{
    prefill_from_cache::{lookup_cache, prefill_from_cache},
    prelude::*,
    should_resolve::ResolutionSession,
};
use crate::gateways::geocode::GeoCodingGateway;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

/// Default pause between two requests to a throttled gateway.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(350);

/// A cooperative stop signal for a running batch.
///
/// Checked before each lookup is dispatched. Requests
/// that are already in flight finish or time out.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Pause between consecutive requests, only applied
    /// if the gateway requires throttling.
    pub throttle: Duration,
    /// Maximum number of parallel lookups, only used
    /// for gateways without throttling.
    pub workers: usize,
    pub cancellation: Cancellation,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            workers: 1,
            cancellation: Cancellation::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records with pre-supplied coordinates.
    pub supplied: usize,
    /// Records that have been filled from the cache before the lookups.
    pub cache_hits: usize,
    /// Records without any usable address.
    pub without_address: usize,
    /// Distinct addresses that have been sent to the gateway.
    pub lookups: usize,
    pub resolved: usize,
    pub failed: usize,
    /// Distinct addresses that have not been sent due to cancellation.
    pub skipped: usize,
    /// Resolved positions that could not be persisted.
    pub persist_failures: usize,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub records: Vec<ResolvedRecord>,
    pub unmapped: usize,
    pub stats: BatchStats,
}

impl BatchOutcome {
    pub fn unmapped_records(&self) -> impl Iterator<Item = &ResolvedRecord> {
        self.records.iter().filter(|r| !r.is_mapped())
    }
}

/// Resolves the positions of all records.
///
/// Only addresses that are neither supplied nor cached are sent
/// to the gateway, each distinct address at most once. Every
/// resolved position is written through to the cache immediately.
/// A failing lookup leaves the affected records unmapped but never
/// aborts the batch.
pub fn resolve_batch<R, G>(
    repo: &R,
    gateway: &G,
    records: Vec<AuctionRecord>,
    settings: &BatchSettings,
) -> Result<BatchOutcome>
where
    R: GeoCacheRepo + Sync,
    G: GeoCodingGateway + Sync,
{
    gateway.check_preconditions()?;

    let mut records = prefill_from_cache(repo, records);
    let mut stats = BatchStats::default();
    for r in &records {
        match r.pos {
            Some((_, PosSource::Supplied)) => stats.supplied += 1,
            Some((_, PosSource::Cache)) => stats.cache_hits += 1,
            _ => {
                if r.key.is_empty() {
                    stats.without_address += 1;
                }
            }
        }
    }

    let missing_keys = distinct_missing_keys(&records);
    log::info!(
        "Resolving {} distinct address(es) of {} record(s)",
        missing_keys.len(),
        records.len()
    );

    let throttled = gateway.requires_throttling();
    let counters = Counters::default();
    let resolved_keys = if throttled || settings.workers <= 1 || missing_keys.len() <= 1 {
        lookup_sequentially(repo, gateway, &missing_keys, settings, throttled, &counters)
    } else {
        lookup_in_parallel(repo, gateway, &missing_keys, settings, &counters)
    };
    counters.add_to(&mut stats);

    for r in records.iter_mut().filter(|r| !r.is_mapped()) {
        let source = if resolved_keys.contains(&r.key) {
            PosSource::Geocoder
        } else {
            PosSource::Cache
        };
        r.pos = lookup_cache(repo, &r.key).map(|pos| (pos, source));
    }

    let unmapped = records.iter().filter(|r| !r.is_mapped()).count();
    log::info!(
        "Resolved {} of {} address(es) ({} failed, {} skipped), {} record(s) remain unmapped",
        stats.resolved,
        stats.lookups,
        stats.failed,
        stats.skipped,
        unmapped
    );
    Ok(BatchOutcome {
        records,
        unmapped,
        stats,
    })
}

fn distinct_missing_keys(records: &[ResolvedRecord]) -> Vec<CanonicalKey> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !r.is_mapped() && !r.key.is_empty())
        .filter(|r| seen.insert(&r.key))
        .map(|r| r.key.clone())
        .collect()
}

#[derive(Default)]
struct Counters {
    lookups: AtomicUsize,
    resolved: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    persist_failures: AtomicUsize,
}

impl Counters {
    fn inc(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn add_to(self, stats: &mut BatchStats) {
        stats.lookups += self.lookups.into_inner();
        stats.resolved += self.resolved.into_inner();
        stats.failed += self.failed.into_inner();
        stats.skipped += self.skipped.into_inner();
        stats.persist_failures += self.persist_failures.into_inner();
    }
}

// Returns true if the position has been resolved.
fn lookup_one<R, G>(repo: &R, gateway: &G, key: &CanonicalKey, counters: &Counters) -> bool
where
    R: GeoCacheRepo,
    G: GeoCodingGateway,
{
    Counters::inc(&counters.lookups);
    let Some(pos) = gateway.resolve_address_lat_lng(key) else {
        log::debug!("Unable to resolve address '{key}'");
        Counters::inc(&counters.failed);
        return false;
    };
    log::debug!("Resolved address '{key}': {pos}");
    Counters::inc(&counters.resolved);
    if let Err(err) = repo.put_pos(key.clone(), pos) {
        log::warn!("Failed to persist the position of '{key}': {err}");
        Counters::inc(&counters.persist_failures);
    }
    true
}

fn lookup_sequentially<R, G>(
    repo: &R,
    gateway: &G,
    keys: &[CanonicalKey],
    settings: &BatchSettings,
    throttled: bool,
    counters: &Counters,
) -> HashSet<CanonicalKey>
where
    R: GeoCacheRepo,
    G: GeoCodingGateway,
{
    let mut resolved = HashSet::new();
    for (i, key) in keys.iter().enumerate() {
        if settings.cancellation.is_cancelled() {
            log::info!("Resolution cancelled");
            counters
                .skipped
                .fetch_add(keys.len() - i, Ordering::Relaxed);
            break;
        }
        if throttled && i > 0 && !settings.throttle.is_zero() {
            thread::sleep(settings.throttle);
        }
        if lookup_one(repo, gateway, key, counters) {
            resolved.insert(key.clone());
        }
    }
    resolved
}

fn lookup_in_parallel<R, G>(
    repo: &R,
    gateway: &G,
    keys: &[CanonicalKey],
    settings: &BatchSettings,
    counters: &Counters,
) -> HashSet<CanonicalKey>
where
    R: GeoCacheRepo + Sync,
    G: GeoCodingGateway + Sync,
{
    let next = &AtomicUsize::new(0);
    let workers = settings.workers.min(keys.len());
    log::debug!("Resolving addresses with {workers} workers");
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut resolved = Vec::new();
                    while !settings.cancellation.is_cancelled() {
                        let Some(key) = keys.get(next.fetch_add(1, Ordering::Relaxed)) else {
                            break;
                        };
                        if lookup_one(repo, gateway, key, counters) {
                            resolved.push(key.clone());
                        }
                    }
                    resolved
                })
            })
            .collect();
        let resolved = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|err| std::panic::resume_unwind(err)))
            .collect();
        // Every key that has not been taken by a worker has been skipped.
        let taken = next.load(Ordering::Relaxed).min(keys.len());
        counters
            .skipped
            .fetch_add(keys.len() - taken, Ordering::Relaxed);
        resolved
    })
}

impl ResolutionSession {
    /// Runs the batch and marks the input as processed.
    pub fn run<R, G>(
        &self,
        state: &mut SessionState,
        repo: &R,
        gateway: &G,
        records: Vec<AuctionRecord>,
        settings: &BatchSettings,
    ) -> Result<BatchOutcome>
    where
        R: GeoCacheRepo + Sync,
        G: GeoCodingGateway + Sync,
    {
        log::debug!(
            "Starting {:?} resolution for {}",
            self.trigger,
            self.signature
        );
        let outcome = resolve_batch(repo, gateway, records, settings)?;
        if settings.cancellation.is_cancelled() {
            state.signature = Some(self.signature.clone());
            state.done = false;
        } else {
            state.mark_done(self.signature.clone());
        }
        Ok(outcome)
    }
}
