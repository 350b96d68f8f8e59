use super::prelude::*;
use crate::normalize::normalize_record;

/// Attaches positions to records without touching the network.
///
/// Pre-supplied coordinates win over cached ones.
/// Records with an empty lookup key are never looked up.
pub fn prefill_from_cache<R>(repo: &R, records: Vec<AuctionRecord>) -> Vec<ResolvedRecord>
where
    R: GeoCacheRepo,
{
    records
        .into_iter()
        .map(|record| {
            let key = normalize_record(&record);
            let pos = record
                .supplied_pos()
                .map(|pos| (pos, PosSource::Supplied))
                .or_else(|| lookup_cache(repo, &key).map(|pos| (pos, PosSource::Cache)));
            ResolvedRecord { record, key, pos }
        })
        .collect()
}

pub(crate) fn lookup_cache<R: GeoCacheRepo>(repo: &R, key: &CanonicalKey) -> Option<MapPoint> {
    if key.is_empty() {
        None
    } else {
        repo.get_pos(key)
    }
}
