//! Cache Tests
//!
//! Tests verify:
//! - Two-phase (clear-then-notify) invalidation ordering
//! - Idempotent population under concurrency
//! - Lazy unique-index builds and duplicate-key detection
//! - Clear semantics for row caches and indexes
//! - Registry dense-numbering and bounds checks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use hostlink::{
    CachedTable, HostlinkError, InvalidateList, InvalidationBroadcaster, InvalidationSink, Row,
    RowLoader, Table, TableId, TableListener, TableRegistry,
};

// =============================================================================
// Test Fixtures
// =============================================================================

/// One hosting account row
#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: i32,
    owner: i32,
    name: String,
}

impl Row for Account {
    type Key = i32;

    fn key(&self) -> i32 {
        self.id
    }
}

/// Loader serving a fixed snapshot, counting calls, optionally slow
struct FixedLoader {
    rows: Mutex<Vec<Account>>,
    loads: AtomicUsize,
    delay: Duration,
}

impl FixedLoader {
    fn new(rows: Vec<Account>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            loads: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    fn slow(rows: Vec<Account>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            loads: AtomicUsize::new(0),
            delay,
        })
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl RowLoader<Account> for FixedLoader {
    fn load_all(&self) -> hostlink::Result<Vec<Account>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.rows.lock().clone())
    }
}

fn account(id: i32, owner: i32, name: &str) -> Account {
    Account {
        id,
        owner,
        name: name.to_string(),
    }
}

fn sample_rows() -> Vec<Account> {
    vec![
        account(1, 10, "alpha"),
        account(2, 10, "beta"),
        account(3, 20, "gamma"),
    ]
}

/// Table recording every clear/notify into a shared event log
struct RecordingTable {
    id: TableId,
    events: Arc<Mutex<Vec<String>>>,
}

impl Table for RecordingTable {
    fn table_id(&self) -> TableId {
        self.id
    }

    fn clear_cache(&self) {
        self.events.lock().push(format!("clear {}", self.id));
    }

    fn table_updated(&self) {
        self.events.lock().push(format!("notify {}", self.id));
    }
}

fn recording_registry(count: u16) -> (Arc<TableRegistry>, Arc<Mutex<Vec<String>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let tables: Vec<Arc<dyn Table>> = (0..count)
        .map(|id| {
            Arc::new(RecordingTable {
                id: TableId(id),
                events: events.clone(),
            }) as Arc<dyn Table>
        })
        .collect();
    (Arc::new(TableRegistry::new(tables).unwrap()), events)
}

struct CountingListener {
    notified: AtomicUsize,
    last: Mutex<Option<TableId>>,
}

impl CountingListener {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            notified: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }
}

impl TableListener for CountingListener {
    fn table_updated(&self, table: TableId) {
        self.notified.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(table);
    }
}

// =============================================================================
// Row Cache Tests
// =============================================================================

#[test]
fn test_get_populates_then_hits_cache() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(0), loader.clone());

    assert_eq!(table.get(&2).unwrap().unwrap().name, "beta");
    assert_eq!(table.get(&1).unwrap().unwrap().name, "alpha");
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn test_get_missing_key_is_ok_none() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(0), loader);

    assert_eq!(table.get(&99).unwrap(), None);
}

#[test]
fn test_rows_returns_full_snapshot() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(0), loader);

    let rows = table.rows().unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_clear_cache_forces_reload() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(0), loader.clone());

    table.rows().unwrap();
    assert!(table.is_loaded());

    table.clear_cache();
    assert!(!table.is_loaded());

    table.rows().unwrap();
    assert_eq!(loader.load_count(), 2);
}

#[test]
fn test_duplicate_primary_key_is_consistency_error() {
    let loader = FixedLoader::new(vec![account(1, 10, "a"), account(1, 20, "b")]);
    let table = CachedTable::new(TableId(0), loader);

    let err = table.rows().unwrap_err();
    assert!(matches!(err, HostlinkError::Consistency(_)));
}

#[test]
fn test_failed_load_leaves_cache_empty_for_retry() {
    struct FlakyLoader {
        calls: AtomicUsize,
    }

    impl RowLoader<Account> for FlakyLoader {
        fn load_all(&self) -> hostlink::Result<Vec<Account>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(HostlinkError::Transport(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "reset",
                )))
            } else {
                Ok(sample_rows())
            }
        }
    }

    let table = CachedTable::new(
        TableId(0),
        Arc::new(FlakyLoader {
            calls: AtomicUsize::new(0),
        }),
    );

    assert!(table.rows().is_err());
    assert!(!table.is_loaded());
    assert_eq!(table.rows().unwrap().len(), 3);
}

#[test]
fn test_concurrent_population_loads_exactly_once() {
    let loader = FixedLoader::slow(sample_rows(), Duration::from_millis(100));
    let table = Arc::new(CachedTable::new(TableId(0), loader.clone()));

    crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                scope.spawn(move |_| table.rows().unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
    })
    .unwrap();

    assert_eq!(loader.load_count(), 1);
}

// =============================================================================
// Listener Tests
// =============================================================================

#[test]
fn test_table_updated_fans_out_without_cache_mutation() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(4), loader.clone());
    let listener = CountingListener::new();
    table.add_listener(listener.clone());

    table.rows().unwrap();
    table.table_updated();

    assert_eq!(listener.notified.load(Ordering::SeqCst), 1);
    assert_eq!(*listener.last.lock(), Some(TableId(4)));
    // Notification alone must not touch the cache
    assert!(table.is_loaded());
    assert_eq!(loader.load_count(), 1);
}

#[test]
fn test_removed_listener_is_not_notified() {
    let table = CachedTable::new(TableId(0), FixedLoader::new(sample_rows()));
    let listener = CountingListener::new();
    table.add_listener(listener.clone());
    table.remove_listener(&(listener.clone() as Arc<dyn TableListener>));

    table.table_updated();
    assert_eq!(listener.notified.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Unique Index Tests
// =============================================================================

#[test]
fn test_unique_index_lookup() {
    let table = CachedTable::new(TableId(0), FixedLoader::new(sample_rows()));
    let by_name = table.unique_index("account.name", |a: &Account| a.name.clone());

    let row = by_name.get(&table, &"beta".to_string()).unwrap().unwrap();
    assert_eq!(row.id, 2);
    assert!(by_name.is_built());
    assert_eq!(by_name.get(&table, &"nope".to_string()).unwrap(), None);
}

#[test]
fn test_index_builds_lazily() {
    let table = CachedTable::new(TableId(0), FixedLoader::new(sample_rows()));
    let by_name = table.unique_index("account.name", |a: &Account| a.name.clone());

    assert!(!by_name.is_built());
    by_name.get(&table, &"alpha".to_string()).unwrap();
    assert!(by_name.is_built());
}

#[test]
fn test_clear_cache_resets_index_built_flag() {
    let loader = FixedLoader::new(sample_rows());
    let table = CachedTable::new(TableId(0), loader.clone());
    let by_name = table.unique_index("account.name", |a: &Account| a.name.clone());

    by_name.get(&table, &"alpha".to_string()).unwrap();
    table.clear_cache();
    assert!(!by_name.is_built());

    // Rebuilds on the next keyed lookup
    assert!(by_name
        .get(&table, &"gamma".to_string())
        .unwrap()
        .is_some());
    assert!(by_name.is_built());
    assert_eq!(loader.load_count(), 2);
}

#[test]
fn test_duplicate_index_key_is_consistency_error_not_overwrite() {
    let rows = vec![account(1, 10, "same"), account(2, 20, "same")];
    let table = CachedTable::new(TableId(0), FixedLoader::new(rows));
    let by_name = table.unique_index("account.name", |a: &Account| a.name.clone());

    let err = by_name.get(&table, &"same".to_string()).unwrap_err();
    match err {
        HostlinkError::Consistency(message) => {
            assert!(message.contains("account.name"));
        }
        other => panic!("Expected Consistency error, got {:?}", other),
    }
    assert!(!by_name.is_built());
}

#[test]
fn test_index_scoped_to_owner() {
    let table = CachedTable::new(TableId(0), FixedLoader::new(sample_rows()));
    let by_owner_name =
        table.unique_index("account.owner_name", |a: &Account| (a.owner, a.name.clone()));

    let row = by_owner_name
        .get(&table, &(10, "beta".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(row.id, 2);
    assert_eq!(
        by_owner_name.get(&table, &(20, "beta".to_string())).unwrap(),
        None
    );
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_registry_rejects_sparse_numbering() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let tables: Vec<Arc<dyn Table>> = vec![
        Arc::new(RecordingTable {
            id: TableId(0),
            events: events.clone(),
        }),
        Arc::new(RecordingTable {
            id: TableId(5),
            events,
        }),
    ];
    let err = TableRegistry::new(tables).unwrap_err();
    assert!(matches!(err, HostlinkError::InvalidArgument(_)));
}

#[test]
fn test_registry_by_id_bounds_check() {
    let (registry, _) = recording_registry(4);
    assert_eq!(registry.by_id(TableId(3)).unwrap().table_id(), TableId(3));
    let err = registry.by_id(TableId(4)).unwrap_err();
    assert!(matches!(err, HostlinkError::InvalidArgument(_)));
}

// =============================================================================
// Two-Phase Invalidation Tests
// =============================================================================

#[test]
fn test_apply_clears_all_before_notifying_any() {
    let (registry, events) = recording_registry(8);
    let broadcaster = InvalidationBroadcaster::new(registry);

    broadcaster
        .apply(&InvalidateList(vec![TableId(3), TableId(7), TableId(3)]))
        .unwrap();

    assert_eq!(
        *events.lock(),
        vec![
            "clear 3", "clear 7", "clear 3", // Pass 1, full list, in order
            "notify 3", "notify 7", "notify 3", // Pass 2, same order
        ]
    );
}

#[test]
fn test_apply_empty_list_touches_nothing() {
    let (registry, events) = recording_registry(8);
    let broadcaster = InvalidationBroadcaster::new(registry);

    broadcaster.apply(&InvalidateList(Vec::new())).unwrap();
    assert!(events.lock().is_empty());
}

#[test]
fn test_apply_with_unknown_id_clears_nothing() {
    let (registry, events) = recording_registry(4);
    let broadcaster = InvalidationBroadcaster::new(registry);

    let err = broadcaster
        .apply(&InvalidateList(vec![TableId(1), TableId(9)]))
        .unwrap_err();

    assert!(matches!(err, HostlinkError::InvalidArgument(_)));
    // The bad ID was caught up front, before any cache was cleared
    assert!(events.lock().is_empty());
}
