pub mod prelude {
    pub use crate::{
        entities::*,
        gateways::geocode::{GeoCodingGateway, PreconditionError},
        repositories::{Error as RepoError, *},
        usecases,
    };
    pub use amap_entities::builders::*;

    use std::{
        collections::HashMap,
        io,
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
    };

    #[derive(Default)]
    pub struct MockGeoCache {
        pub entries: Mutex<HashMap<CanonicalKey, MapPoint>>,
        pub fail_persist: AtomicBool,
    }

    impl GeoCacheRepo for MockGeoCache {
        fn get_pos(&self, key: &CanonicalKey) -> Option<MapPoint> {
            self.entries.lock().unwrap().get(key).copied()
        }
        fn put_pos(&self, key: CanonicalKey, pos: MapPoint) -> Result<(), RepoError> {
            self.entries.lock().unwrap().insert(key, pos);
            if self.fail_persist.load(Ordering::Relaxed) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into());
            }
            Ok(())
        }
        fn count_entries(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
        fn clear(&self) -> Result<(), RepoError> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }

    /// Answers from a fixed table and records every request.
    #[derive(Default)]
    pub struct MockGeoCoder {
        pub known: HashMap<String, MapPoint>,
        pub requests: Mutex<Vec<String>>,
        pub throttled: bool,
        pub missing_credential: bool,
    }

    impl MockGeoCoder {
        pub fn with(known: &[(&str, MapPoint)]) -> Self {
            Self {
                known: known.iter().map(|(k, p)| ((*k).to_owned(), *p)).collect(),
                ..Default::default()
            }
        }
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl GeoCodingGateway for MockGeoCoder {
        fn resolve_address_lat_lng(&self, addr: &CanonicalKey) -> Option<MapPoint> {
            self.requests.lock().unwrap().push(addr.as_str().to_owned());
            self.known.get(addr.as_str()).copied()
        }
        fn requires_throttling(&self) -> bool {
            self.throttled
        }
        fn check_preconditions(&self) -> Result<(), PreconditionError> {
            if self.missing_credential {
                return Err(PreconditionError::MissingCredential("mock"));
            }
            Ok(())
        }
    }

    pub fn record(address: &str) -> AuctionRecord {
        AuctionRecord::build().address(address).finish()
    }
}

mod resolve_batch {
    use super::prelude::*;
    use std::{
        sync::atomic::Ordering,
        time::{Duration, Instant},
    };
    use crate::usecases::{resolve_batch, BatchSettings, Cancellation, ResolutionSession};

    fn fast() -> BatchSettings {
        BatchSettings {
            throttle: Duration::ZERO,
            ..Default::default()
        }
    }

    fn islip() -> MapPoint {
        MapPoint::from_lat_lng_deg(40.73, -73.21)
    }

    fn st_james() -> MapPoint {
        MapPoint::from_lat_lng_deg(40.87, -73.15)
    }

    #[test]
    fn resolve_and_write_through() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("153-16 Tuskegee Ave St James NY 11780", st_james())]);
        let records = vec![record("153-16TuskegeeAveStJamesNY11780")];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert_eq!(outcome.unmapped, 0);
        assert_eq!(
            outcome.records[0].pos,
            Some((st_james(), PosSource::Geocoder))
        );
        assert_eq!(
            repo.get_pos(&"153-16 Tuskegee Ave St James NY 11780".into()),
            Some(st_james())
        );
        assert_eq!(outcome.stats.lookups, 1);
        assert_eq!(outcome.stats.resolved, 1);
    }

    #[test]
    fn second_run_does_not_hit_the_network() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("1 Main St, Islip", islip())]);
        let records = vec![record("1 Main St,Islip"), record("2 Unknown Rd")];

        let first = resolve_batch(&repo, &gw, records.clone(), &fast()).unwrap();
        assert_eq!(gw.requests().len(), 2);
        assert_eq!(first.unmapped, 1);

        let gw = MockGeoCoder::with(&[("1 Main St, Islip", islip())]);
        let second = resolve_batch(&repo, &gw, records, &fast()).unwrap();
        // the failed address is retried, the resolved one is cached
        assert_eq!(gw.requests(), vec!["2 Unknown Rd"]);
        assert_eq!(second.records[0].pos, Some((islip(), PosSource::Cache)));
        assert_eq!(second.stats.cache_hits, 1);
    }

    #[test]
    fn unchanged_and_fully_cached_input_needs_no_requests() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("1 Main St, Islip", islip())]);
        let records = vec![record("1 Main St, Islip")];
        resolve_batch(&repo, &gw, records.clone(), &fast()).unwrap();
        resolve_batch(&repo, &gw, records, &fast()).unwrap();
        assert_eq!(gw.requests().len(), 1);
    }

    #[test]
    fn resolve_each_distinct_address_only_once() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("1 Main St, Islip", islip())]);
        let records = vec![
            record("1 Main St,Islip"),
            record("1 Main St , Islip"),
            record("1  Main St, Islip"),
        ];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert_eq!(gw.requests(), vec!["1 Main St, Islip"]);
        assert_eq!(outcome.unmapped, 0);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.map_point() == Some(islip())));
    }

    #[test]
    fn partial_failure_does_not_abort_the_batch() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("2 Good St", islip())]);
        let records = vec![record("1 Bad St"), record("2 Good St"), record("3 Bad St")];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert_eq!(gw.requests().len(), 3);
        assert!(!outcome.records[0].is_mapped());
        assert!(outcome.records[1].is_mapped());
        assert!(!outcome.records[2].is_mapped());
        assert_eq!(outcome.unmapped, 2);
        assert_eq!(outcome.stats.failed, 2);
        assert_eq!(repo.count_entries(), 1);
        let unmapped: Vec<_> = outcome
            .unmapped_records()
            .map(|r| r.key.as_str().to_owned())
            .collect();
        assert_eq!(unmapped, vec!["1 Bad St", "3 Bad St"]);
    }

    #[test]
    fn never_look_up_supplied_coordinates() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("1 Main St", islip())]);
        let records = vec![AuctionRecord::build()
            .address("1 Main St")
            .lat_lng(40.1, -74.2)
            .finish()];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert!(gw.requests().is_empty());
        assert_eq!(
            outcome.records[0].pos,
            Some((MapPoint::from_lat_lng_deg(40.1, -74.2), PosSource::Supplied))
        );
        assert_eq!(outcome.stats.supplied, 1);
        assert_eq!(repo.count_entries(), 0);
    }

    #[test]
    fn records_without_address_stay_unmapped() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::default();
        let records = vec![AuctionRecord::build().field("price", "$1").finish()];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert!(gw.requests().is_empty());
        assert_eq!(outcome.unmapped, 1);
        assert_eq!(outcome.stats.without_address, 1);
    }

    #[test]
    fn continue_if_the_cache_cannot_be_persisted() {
        let repo = MockGeoCache::default();
        repo.fail_persist.store(true, Ordering::Relaxed);
        let gw = MockGeoCoder::with(&[("1 A St", islip()), ("2 B St", st_james())]);
        let records = vec![record("1 A St"), record("2 B St")];

        let outcome = resolve_batch(&repo, &gw, records, &fast()).unwrap();

        assert_eq!(outcome.unmapped, 0);
        assert_eq!(outcome.stats.persist_failures, 2);
        assert_eq!(repo.count_entries(), 2);
    }

    #[test]
    fn fail_before_any_request_without_credentials() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder {
            missing_credential: true,
            ..MockGeoCoder::with(&[("1 A St", islip())])
        };
        let err = resolve_batch(&repo, &gw, vec![record("1 A St")], &fast()).unwrap_err();
        assert!(matches!(
            err,
            usecases::Error::Precondition(PreconditionError::MissingCredential(_))
        ));
        assert!(gw.requests().is_empty());
    }

    #[test]
    fn stop_dispatching_after_cancellation() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::with(&[("1 A St", islip())]);
        let settings = fast();
        settings.cancellation.cancel();

        let outcome =
            resolve_batch(&repo, &gw, vec![record("1 A St"), record("2 B St")], &settings)
                .unwrap();

        assert!(gw.requests().is_empty());
        assert_eq!(outcome.stats.skipped, 2);
        assert_eq!(outcome.unmapped, 2);
    }

    #[test]
    fn resolve_in_parallel_without_duplicate_requests() {
        let repo = MockGeoCache::default();
        let known: Vec<(String, MapPoint)> = (0..20)
            .map(|i| (format!("{i} Main St"), islip()))
            .collect();
        let known: Vec<(&str, MapPoint)> = known.iter().map(|(k, p)| (k.as_str(), *p)).collect();
        let gw = MockGeoCoder::with(&known);
        let records = (0..20)
            .flat_map(|i| [record(&format!("{i} Main St")), record(&format!("{i}  Main St"))])
            .collect();
        let settings = BatchSettings {
            workers: 4,
            ..fast()
        };

        let outcome = resolve_batch(&repo, &gw, records, &settings).unwrap();

        let mut requests = gw.requests();
        requests.sort();
        requests.dedup();
        assert_eq!(requests.len(), 20);
        assert_eq!(gw.requests().len(), 20);
        assert_eq!(outcome.unmapped, 0);
        assert_eq!(repo.count_entries(), 20);
    }

    #[test]
    fn throttle_requests_of_rate_limited_gateways() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder {
            throttled: true,
            ..Default::default()
        };
        let settings = BatchSettings {
            throttle: Duration::from_millis(20),
            workers: 4,
            ..Default::default()
        };
        let records = vec![record("1 A St"), record("2 B St"), record("3 C St")];

        let start = Instant::now();
        resolve_batch(&repo, &gw, records, &settings).unwrap();

        assert!(start.elapsed() >= Duration::from_millis(40));
        // throttled gateways are always used sequentially
        assert_eq!(gw.requests(), vec!["1 A St", "2 B St", "3 C St"]);
    }

    #[test]
    fn mark_session_as_done() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::default();
        let signature = FileSignature {
            content_hash: "abc".into(),
            modified_at: 1,
        };
        let mut state = SessionState::default();
        let session = ResolutionSession::start(signature.clone(), false, true, &state).unwrap();

        session
            .run(&mut state, &repo, &gw, vec![record("1 A St")], &fast())
            .unwrap();

        assert_eq!(state.signature, Some(signature.clone()));
        assert!(state.done);
        assert!(ResolutionSession::start(signature, false, true, &state).is_none());
    }

    #[test]
    fn cancelled_session_is_not_done() {
        let repo = MockGeoCache::default();
        let gw = MockGeoCoder::default();
        let signature = FileSignature {
            content_hash: "abc".into(),
            modified_at: 1,
        };
        let mut state = SessionState::default();
        let session = ResolutionSession::start(signature.clone(), true, false, &state).unwrap();
        let settings = fast();
        settings.cancellation.cancel();

        session
            .run(&mut state, &repo, &gw, vec![record("1 A St")], &settings)
            .unwrap();

        assert!(!state.done);
        assert!(ResolutionSession::start(signature, false, true, &state).is_some());
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let c = Cancellation::default();
        let c2 = c.clone();
        c2.cancel();
        assert!(c.is_cancelled());
    }
}

mod clear_geocache {
    use super::prelude::*;

    #[test]
    fn remove_all_entries() {
        let repo = MockGeoCache::default();
        repo.put_pos("a".into(), MapPoint::from_lat_lng_deg(1.0, 2.0))
            .unwrap();
        repo.put_pos("b".into(), MapPoint::from_lat_lng_deg(3.0, 4.0))
            .unwrap();
        assert_eq!(usecases::clear_geocache(&repo).unwrap(), 2);
        assert_eq!(repo.get_pos(&"a".into()), None);
        assert_eq!(repo.count_entries(), 0);
    }
}
