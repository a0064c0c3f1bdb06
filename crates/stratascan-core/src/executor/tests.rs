use super::*;
use crate::{
    config::ScanPolicy,
    native::{Filter, IndexType, NativeKey, NativeRecord},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn user(id: i64, set: &str, age: i64) -> NativeRecord {
    NativeRecord::new(NativeKey::new("test", Some(set), NativeValue::Integer(id)))
        .with_bin("id", id)
        .with_bin("age", age)
        .with_bin(
            "tags",
            NativeValue::List(vec![NativeValue::from("red"), NativeValue::from("blue")]),
        )
}

fn seeded(workers: usize) -> MemoryExecutor {
    let executor = MemoryExecutor::new(workers);
    for id in 0..10 {
        executor.put(user(id, if id % 2 == 0 { "even" } else { "odd" }, 20 + id));
    }

    executor
}

// Collects every callback, end-of-stream included.
fn collect(run: impl FnOnce(&ResultCallback<'_>)) -> Vec<Option<NativeValue>> {
    let seen = Mutex::new(Vec::new());
    run(&|value: Option<&NativeValue>| {
        seen.lock().push(value.cloned());
        true
    });

    seen.into_inner()
}

fn ids(results: &[Option<NativeValue>]) -> Vec<i64> {
    let mut ids: Vec<i64> = results
        .iter()
        .flatten()
        .filter_map(|value| value.as_record()?.bin("id")?.as_integer())
        .collect();
    ids.sort_unstable();

    ids
}

// ----------------------------------------------------------------------
// Scans
// ----------------------------------------------------------------------

#[test]
fn scan_delivers_every_record_then_end_of_stream() {
    let executor = seeded(4);
    let mut request = ScanRequest::new("test", None);
    request.set_policy(ScanPolicy {
        concurrent: true,
        ..ScanPolicy::default()
    });

    let results = collect(|cb| executor.scan_foreach(&request, cb).unwrap());

    assert_eq!(results.len(), 11);
    assert_eq!(results.iter().filter(|r| r.is_none()).count(), 1);
    assert_eq!(results.last(), Some(&None));
    assert_eq!(ids(&results), (0..10).collect::<Vec<_>>());
}

#[test]
fn scan_honours_set_projection_and_no_bins() {
    let executor = seeded(2);

    let mut request = ScanRequest::new("test", Some("even"));
    request.select_init(1);
    request.select("id");
    let results = collect(|cb| executor.scan_foreach(&request, cb).unwrap());

    assert_eq!(ids(&results), vec![0, 2, 4, 6, 8]);
    let first = results[0].as_ref().and_then(NativeValue::as_record).unwrap();
    assert_eq!(first.bins.len(), 1);

    let mut request = ScanRequest::new("test", Some("odd"));
    request.set_policy(ScanPolicy {
        no_bins: true,
        ..ScanPolicy::default()
    });
    let results = collect(|cb| executor.scan_foreach(&request, cb).unwrap());

    assert!(
        results
            .iter()
            .flatten()
            .all(|value| value.as_record().is_some_and(|r| r.bins.is_empty()))
    );
}

#[test]
fn scan_percent_visits_a_share_of_records() {
    let executor = seeded(1);
    let mut request = ScanRequest::new("test", None);
    request.set_policy(ScanPolicy {
        percent: 50,
        ..ScanPolicy::default()
    });

    let results = collect(|cb| executor.scan_foreach(&request, cb).unwrap());

    assert_eq!(ids(&results).len(), 5);
}

#[test]
fn unknown_namespace_is_reported() {
    let executor = seeded(1);

    let err = executor
        .scan_foreach(&ScanRequest::new("missing", None), &|_| true)
        .unwrap_err();

    assert_eq!(err.status, Status::ErrNamespaceNotFound);
}

#[test]
fn empty_namespace_only_ends_the_stream() {
    let executor = MemoryExecutor::new(2);
    executor.create_namespace("empty");

    let results = collect(|cb| {
        executor
            .scan_foreach(&ScanRequest::new("empty", None), cb)
            .unwrap();
    });

    assert_eq!(results, vec![None]);
}

#[test]
fn stop_request_suppresses_end_of_stream() {
    let executor = seeded(4);
    let mut request = ScanRequest::new("test", None);
    request.set_policy(ScanPolicy {
        concurrent: true,
        ..ScanPolicy::default()
    });
    let calls = AtomicUsize::new(0);
    let ended = AtomicUsize::new(0);

    executor
        .scan_foreach(&request, &|value| {
            if value.is_none() {
                ended.fetch_add(1, Ordering::SeqCst);
                return false;
            }
            calls.fetch_add(1, Ordering::SeqCst);
            false
        })
        .unwrap();

    assert_eq!(ended.load(Ordering::SeqCst), 0);
    // at most one record per worker before the stop flag is seen
    assert!(calls.load(Ordering::SeqCst) <= executor.workers());
}

// ----------------------------------------------------------------------
// Queries
// ----------------------------------------------------------------------

#[test]
fn query_applies_filter() {
    let executor = seeded(3);
    let mut request = QueryRequest::new("test", None);
    request.where_(Filter::integer_range("age", 22, 25));

    let results = collect(|cb| executor.query_foreach(&request, cb).unwrap());

    assert_eq!(ids(&results), vec![2, 3, 4, 5]);
}

#[test]
fn query_contains_filter_looks_inside_lists() {
    let executor = seeded(1);
    executor.put(
        NativeRecord::new(NativeKey::new("test", Some("odd"), NativeValue::Integer(99)))
            .with_bin("id", 99)
            .with_bin("tags", NativeValue::List(vec![NativeValue::from("green")])),
    );

    let mut request = QueryRequest::new("test", None);
    request.where_(Filter::contains_string("tags", IndexType::List, "green"));
    let results = collect(|cb| executor.query_foreach(&request, cb).unwrap());

    assert_eq!(ids(&results), vec![99]);
}

#[test]
fn query_on_unindexed_bin_reports_index_not_found() {
    let executor = seeded(1);
    executor.create_namespace("empty");

    let mut request = QueryRequest::new("test", None);
    request.where_(Filter::integer_equals("weight", 3));
    let err = executor.query_foreach(&request, &|_| true).unwrap_err();
    assert_eq!(err.status, Status::ErrIndexNotFound);
    assert!(err.message.contains("weight"));

    let mut request = QueryRequest::new("empty", None);
    request.where_(Filter::integer_equals("age", 3));
    let err = executor.query_foreach(&request, &|_| true).unwrap_err();
    assert_eq!(err.status, Status::ErrIndexNotFound);
}

#[test]
fn aggregate_runs_registered_udf() {
    let executor = seeded(2);
    executor.register_aggregate("stats", "count", |records, args| {
        let offset = args.first().and_then(NativeValue::as_integer).unwrap_or(0);
        let count = i64::try_from(records.len()).unwrap();
        vec![NativeValue::Integer(count + offset)]
    });

    let mut request = QueryRequest::new("test", Some("even"));
    assert!(request.apply("stats", "count", Some(vec![NativeValue::Integer(100)])));
    let results = collect(|cb| executor.query_foreach(&request, cb).unwrap());

    assert_eq!(results, vec![Some(NativeValue::Integer(105)), None]);
}

#[test]
fn aggregate_with_unknown_udf_fails() {
    let executor = seeded(1);
    let mut request = QueryRequest::new("test", None);
    assert!(request.apply("stats", "missing", None));

    let err = executor.query_foreach(&request, &|_| true).unwrap_err();

    assert_eq!(err.status, Status::ErrUdf);
    assert!(err.message.contains("stats.missing"));
}

// ----------------------------------------------------------------------
// Background scans
// ----------------------------------------------------------------------

#[test]
fn background_scan_updates_records_and_reports_progress() {
    let executor = seeded(2);
    executor.register_record_udf("ops", "bump", |record, args| {
        let by = args.first().and_then(NativeValue::as_integer).unwrap_or(1);
        let age = record.bin("age").and_then(NativeValue::as_integer).unwrap_or(0);
        record.set_bin("age", NativeValue::Integer(age + by));
    });

    let mut request = ScanRequest::new("test", Some("odd"));
    assert!(request.apply_each("ops", "bump", Some(vec![NativeValue::Integer(5)])));
    let scan_id = executor.scan_background(&request).unwrap();

    let info = executor.scan_info(scan_id).unwrap();
    assert_eq!(info.status, ScanStatus::Completed);
    assert_eq!(info.progress_pct, 100);
    assert_eq!(info.records_scanned, 5);

    let key = NativeKey::new("test", Some("odd"), NativeValue::Integer(1));
    let record = executor.get(&key).unwrap();
    assert_eq!(record.bin("age"), Some(&NativeValue::Integer(26)));
    assert_eq!(record.generation, 2);

    let untouched = NativeKey::new("test", Some("even"), NativeValue::Integer(0));
    assert_eq!(
        executor.get(&untouched).unwrap().bin("age"),
        Some(&NativeValue::Integer(20))
    );
}

#[test]
fn background_scan_requires_udf_and_scan_info_requires_known_job() {
    let executor = seeded(1);

    let err = executor
        .scan_background(&ScanRequest::new("test", None))
        .unwrap_err();
    assert_eq!(err.status, Status::ErrParam);

    let err = executor.scan_info(9_999).unwrap_err();
    assert_eq!(err.status, Status::ErrParam);
}

#[test]
fn put_replaces_and_bumps_generation() {
    let executor = MemoryExecutor::default();
    executor.put(user(1, "odd", 30));
    executor.put(user(1, "odd", 31));

    assert_eq!(executor.len("test"), 1);
    let record = executor
        .get(&NativeKey::new("test", Some("odd"), NativeValue::Integer(1)))
        .unwrap();
    assert_eq!(record.generation, 2);
    assert_eq!(record.bin("age"), Some(&NativeValue::Integer(31)));
}
