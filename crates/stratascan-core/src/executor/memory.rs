use super::{Executor, NativeError, ResultCallback, ScanInfo, ScanStatus};
use crate::{
    config::{DEFAULT_WORKERS, ExecutorConfig},
    native::{NativeKey, NativeRecord, NativeValue, QueryRequest, ScanRequest, Status, UdfCall},
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    thread,
};

/// Stream UDF: reduces the matched records into zero or more values.
pub type AggregateUdf = Box<dyn Fn(&[NativeRecord], &[NativeValue]) -> Vec<NativeValue> + Send + Sync>;

/// Record UDF: applied in place to every record a background scan visits.
pub type RecordUdf = Box<dyn Fn(&mut NativeRecord, &[NativeValue]) + Send + Sync>;

type UdfKey = (String, String);

///
/// MemoryExecutor
///
/// In-process execution layer. Records live in per-namespace vectors and
/// results are delivered from `workers` scoped threads.
///

pub struct MemoryExecutor {
    workers: usize,
    store: RwLock<BTreeMap<String, Vec<NativeRecord>>>,
    aggregates: RwLock<HashMap<UdfKey, AggregateUdf>>,
    record_udfs: RwLock<HashMap<UdfKey, RecordUdf>>,
    jobs: Mutex<HashMap<u64, ScanInfo>>,
    next_job: AtomicU64,
}

impl MemoryExecutor {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            store: RwLock::new(BTreeMap::new()),
            aggregates: RwLock::new(HashMap::new()),
            record_udfs: RwLock::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            next_job: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.workers)
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    pub fn create_namespace(&self, namespace: &str) {
        self.store.write().entry(namespace.to_string()).or_default();
    }

    /// Insert a record, or replace the bins of an existing one and bump its generation.
    pub fn put(&self, record: NativeRecord) {
        let mut store = self.store.write();
        let records = store.entry(record.key.namespace.clone()).or_default();

        match records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => {
                let generation = existing.generation.wrapping_add(1).max(1);
                *existing = record;
                existing.generation = generation;
            }
            None => records.push(record),
        }
    }

    #[must_use]
    pub fn get(&self, key: &NativeKey) -> Option<NativeRecord> {
        self.store
            .read()
            .get(&key.namespace)
            .and_then(|records| records.iter().find(|r| r.key == *key))
            .cloned()
    }

    #[must_use]
    pub fn len(&self, namespace: &str) -> usize {
        self.store.read().get(namespace).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }

    // ------------------------------------------------------------------
    // UDF registry
    // ------------------------------------------------------------------

    pub fn register_aggregate<F>(&self, module: &str, function: &str, udf: F)
    where
        F: Fn(&[NativeRecord], &[NativeValue]) -> Vec<NativeValue> + Send + Sync + 'static,
    {
        self.aggregates
            .write()
            .insert(udf_key(module, function), Box::new(udf));
    }

    pub fn register_record_udf<F>(&self, module: &str, function: &str, udf: F)
    where
        F: Fn(&mut NativeRecord, &[NativeValue]) + Send + Sync + 'static,
    {
        self.record_udfs
            .write()
            .insert(udf_key(module, function), Box::new(udf));
    }
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Executor for MemoryExecutor {
    fn scan_foreach(
        &self,
        request: &ScanRequest,
        callback: &ResultCallback<'_>,
    ) -> Result<(), NativeError> {
        let policy = request.policy();
        let results: Vec<NativeValue> = {
            let store = self.store.read();
            let records = namespace_records(&store, request.namespace())?;

            sample(in_set(records, request.set()), policy.percent)
                .map(|record| project(record, request.selected(), policy.no_bins).into())
                .collect()
        };

        let workers = if policy.concurrent { self.workers } else { 1 };
        tracing::debug!(
            namespace = request.namespace(),
            set = ?request.set(),
            records = results.len(),
            workers,
            "scan started"
        );
        deliver(&results, workers, callback);

        Ok(())
    }

    fn query_foreach(
        &self,
        request: &QueryRequest,
        callback: &ResultCallback<'_>,
    ) -> Result<(), NativeError> {
        let matched: Vec<NativeRecord> = {
            let store = self.store.read();
            let records = namespace_records(&store, request.namespace())?;
            if let Some(filter) = request.filter() {
                check_index(records, request.namespace(), &filter.bin)?;
            }

            in_set(records, request.set())
                .filter(|record| {
                    request.filter().is_none_or(|filter| {
                        record.bin(&filter.bin).is_some_and(|bin| filter.matches(bin))
                    })
                })
                .cloned()
                .collect()
        };

        let results = match request.udf() {
            Some(call) => self.run_aggregate(call, &matched)?,
            None => matched
                .iter()
                .map(|record| project(record, request.selected(), false).into())
                .collect(),
        };

        tracing::debug!(
            namespace = request.namespace(),
            filter = ?request.filter(),
            timeout_ms = request.policy().timeout_ms,
            results = results.len(),
            "query started"
        );
        deliver(&results, self.workers, callback);

        Ok(())
    }

    fn scan_background(&self, request: &ScanRequest) -> Result<u64, NativeError> {
        let Some(call) = request.udf() else {
            return Err(NativeError::new(
                Status::ErrParam,
                "background scan requires a UDF",
            ));
        };

        let udfs = self.record_udfs.read();
        let udf = udfs
            .get(&udf_key(&call.module, &call.function))
            .ok_or_else(|| unknown_udf(call))?;
        let args = call.args.as_deref().unwrap_or_default();

        let mut store = self.store.write();
        let records = store
            .get_mut(request.namespace())
            .ok_or_else(|| namespace_not_found(request.namespace()))?;

        let set = request.set();
        let wanted = sample_len(
            records
                .iter()
                .filter(|record| set.is_none_or(|set| record.key.set.as_deref() == Some(set)))
                .count(),
            request.policy().percent,
        );

        let mut scanned = 0_u64;
        for record in records
            .iter_mut()
            .filter(|record| set.is_none_or(|set| record.key.set.as_deref() == Some(set)))
            .take(wanted)
        {
            udf(record, args);
            record.generation = record.generation.wrapping_add(1).max(1);
            scanned += 1;
        }

        let scan_id = self.next_job.fetch_add(1, Ordering::Relaxed);
        self.jobs.lock().insert(
            scan_id,
            ScanInfo {
                status: ScanStatus::Completed,
                progress_pct: 100,
                records_scanned: scanned,
            },
        );
        tracing::debug!(scan_id, scanned, udf = %call.function, "background scan completed");

        Ok(scan_id)
    }

    fn scan_info(&self, scan_id: u64) -> Result<ScanInfo, NativeError> {
        self.jobs.lock().get(&scan_id).copied().ok_or_else(|| {
            NativeError::new(Status::ErrParam, format!("scan job {scan_id} not found"))
        })
    }
}

impl MemoryExecutor {
    fn run_aggregate(
        &self,
        call: &UdfCall,
        records: &[NativeRecord],
    ) -> Result<Vec<NativeValue>, NativeError> {
        let udfs = self.aggregates.read();
        let udf = udfs
            .get(&udf_key(&call.module, &call.function))
            .ok_or_else(|| unknown_udf(call))?;

        Ok(udf(records, call.args.as_deref().unwrap_or_default()))
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

/// Fan results out over worker threads. The end-of-stream signal is sent
/// once, after every worker has finished, and only if nobody asked to stop.
fn deliver(results: &[NativeValue], workers: usize, callback: &ResultCallback<'_>) {
    let stop = AtomicBool::new(false);
    let chunk = results.len().div_ceil(workers.max(1)).max(1);

    thread::scope(|scope| {
        for part in results.chunks(chunk) {
            let stop = &stop;
            scope.spawn(move || {
                for value in part {
                    if stop.load(Ordering::Acquire) {
                        return;
                    }
                    if !callback(Some(value)) {
                        stop.store(true, Ordering::Release);
                        return;
                    }
                }
            });
        }
    });

    if stop.load(Ordering::Acquire) {
        tracing::debug!(delivered = results.len(), "delivery stopped by callback");
    } else {
        callback(None);
    }
}

fn udf_key(module: &str, function: &str) -> UdfKey {
    (module.to_string(), function.to_string())
}

fn unknown_udf(call: &UdfCall) -> NativeError {
    NativeError::new(
        Status::ErrUdf,
        format!("udf '{}.{}' is not registered", call.module, call.function),
    )
}

fn namespace_not_found(namespace: &str) -> NativeError {
    NativeError::new(
        Status::ErrNamespaceNotFound,
        format!("namespace '{namespace}' not found"),
    )
}

// A bin counts as indexed once any record in the namespace carries it.
fn check_index(records: &[NativeRecord], namespace: &str, bin: &str) -> Result<(), NativeError> {
    if records.iter().any(|record| record.bin(bin).is_some()) {
        return Ok(());
    }

    Err(NativeError::new(
        Status::ErrIndexNotFound,
        format!("no secondary index on bin '{bin}' in namespace '{namespace}'"),
    ))
}

fn namespace_records<'s>(
    store: &'s BTreeMap<String, Vec<NativeRecord>>,
    namespace: &str,
) -> Result<&'s [NativeRecord], NativeError> {
    store
        .get(namespace)
        .map(Vec::as_slice)
        .ok_or_else(|| namespace_not_found(namespace))
}

fn in_set<'r>(
    records: &'r [NativeRecord],
    set: Option<&'r str>,
) -> impl Iterator<Item = &'r NativeRecord> + Clone + 'r {
    records
        .iter()
        .filter(move |record| set.is_none_or(|set| record.key.set.as_deref() == Some(set)))
}

// Deterministic sampling: the first `percent` of the matching records.
fn sample<'r>(
    records: impl Iterator<Item = &'r NativeRecord> + Clone,
    percent: u8,
) -> impl Iterator<Item = &'r NativeRecord> {
    let wanted = sample_len(records.clone().count(), percent);

    records.take(wanted)
}

fn sample_len(len: usize, percent: u8) -> usize {
    (len * usize::from(percent.min(100))).div_ceil(100)
}

fn project(record: &NativeRecord, selected: Option<&[String]>, no_bins: bool) -> NativeRecord {
    let bins = if no_bins {
        Vec::new()
    } else {
        match selected {
            Some(names) => record
                .bins
                .iter()
                .filter(|(name, _)| names.contains(name))
                .cloned()
                .collect(),
            None => record.bins.clone(),
        }
    };

    NativeRecord {
        key: record.key.clone(),
        generation: record.generation,
        ttl: record.ttl,
        bins,
    }
}
