use signlabel_core::db::open_db;
use signlabel_core::{
    LabelEvent, LabelId, LabelStore, MemoryLabelStore, RepoError, RepoResult, SqliteLabelStore,
    StoredLabel, StoreWorker,
};

/// Store whose backend is always down.
struct UnreachableStore;

impl LabelStore for UnreachableStore {
    fn insert(&self, _event: &LabelEvent) -> RepoResult<LabelId> {
        Err(RepoError::Unavailable("connection refused".to_string()))
    }

    fn count(&self) -> RepoResult<u64> {
        Err(RepoError::Unavailable("connection refused".to_string()))
    }

    fn select_page(&self, _offset: u64, _limit: u32) -> RepoResult<Vec<StoredLabel>> {
        Err(RepoError::Unavailable("connection refused".to_string()))
    }
}

#[test]
fn snapshot_after_submit_observes_the_write() {
    let worker = StoreWorker::with_store(MemoryLabelStore::new()).unwrap();

    let pending = worker.submit(LabelEvent::new("ana", "img1", Vec::new()));
    drop(pending);

    let rows = worker.snapshot().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event.user, "ana");
}

#[test]
fn pending_write_reports_assigned_id() {
    let worker = StoreWorker::with_store(MemoryLabelStore::new()).unwrap();
    let first = worker
        .submit(LabelEvent::new("ana", "img1", Vec::new()))
        .wait()
        .unwrap();
    let second = worker
        .submit(LabelEvent::new("ben", "img1", Vec::new()))
        .wait()
        .unwrap();
    assert_eq!((first, second), (1, 2));
}

#[test]
fn store_failure_reaches_the_waiting_caller() {
    let worker = StoreWorker::with_store(UnreachableStore).unwrap();
    let err = worker
        .submit(LabelEvent::new("ana", "img1", Vec::new()))
        .wait()
        .unwrap_err();
    assert!(matches!(err, RepoError::Unavailable(_)));
    assert!(worker.snapshot().is_err());
}

#[test]
fn unobserved_failure_does_not_stop_the_worker() {
    let worker = StoreWorker::with_store(MemoryLabelStore::new()).unwrap();
    drop(worker.submit(LabelEvent::new("   ", "img1", Vec::new())));

    let id = worker
        .submit(LabelEvent::new("ana", "img1", Vec::new()))
        .wait()
        .unwrap();
    assert_eq!(id, 1);
}

#[test]
fn open_failure_is_returned_from_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let missing_parent = dir.path().join("no/such/dir/labels.db");

    let result = StoreWorker::spawn(move || -> RepoResult<SqliteLabelStore> {
        SqliteLabelStore::try_new(open_db(&missing_parent)?)
    });
    assert!(matches!(result, Err(RepoError::Db(_))));
}

#[test]
fn dropping_worker_flushes_queued_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.db");

    {
        let db_path = path.clone();
        let worker = StoreWorker::spawn(move || -> RepoResult<SqliteLabelStore> {
            SqliteLabelStore::try_new(open_db(&db_path)?)
        })
        .unwrap();
        for n in 0..25 {
            drop(worker.submit(LabelEvent::new("ana", format!("img{n}"), Vec::new())));
        }
    }

    let store = SqliteLabelStore::try_new(open_db(&path).unwrap()).unwrap();
    assert_eq!(store.count().unwrap(), 25);
}

#[test]
fn try_result_is_available_after_snapshot_barrier() {
    let worker = StoreWorker::with_store(MemoryLabelStore::new()).unwrap();
    let pending = worker.submit(LabelEvent::new("ana", "img1", Vec::new()));
    worker.snapshot().unwrap();
    assert_eq!(pending.try_result().unwrap().unwrap(), 1);
}
