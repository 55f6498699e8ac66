#![allow(dead_code)]

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::{Barrier, Mutex};

use taskdeck::application::pagination::PageRequest;
use taskdeck::application::repos::{
    NewTask, RepoError, TaskChanges, TasksRepo, TasksWriteRepo,
};
use taskdeck::application::tasks::TaskService;
use taskdeck::cache::{
    BackendError, CacheBackend, CacheClient, CacheConfig, ItemCache, MemoryBackend, TaggedCache,
};
use taskdeck::domain::tasks::{LifecycleAction, TaskRecord};

/// Record store kept in memory, ordered the same way as the Postgres adapter.
#[derive(Default)]
pub struct InMemoryTasks {
    rows: Mutex<BTreeMap<i64, TaskRecord>>,
    next_id: AtomicUsize,
    pub find_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    write_gate: StdMutex<Option<Arc<Barrier>>>,
}

impl InMemoryTasks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn row(&self, id: i64) -> Option<TaskRecord> {
        self.rows.lock().await.get(&id).cloned()
    }

    /// Change a row behind the service's back, as another writer would.
    pub async fn overwrite(&self, record: TaskRecord) {
        self.rows.lock().await.insert(record.id, record);
    }

    pub fn finds(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Hold the next `writers` writes until all of them have arrived, so
    /// concurrent commands reach the store together.
    pub fn arm_write_gate(&self, writers: usize) {
        *self.write_gate.lock().unwrap() = Some(Arc::new(Barrier::new(writers)));
    }

    async fn pass_write_gate(&self) {
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if gate.wait().await.is_leader() {
                self.write_gate.lock().unwrap().take();
            }
        }
    }
}

fn active_order(a: &TaskRecord, b: &TaskRecord) -> CmpOrdering {
    a.done
        .cmp(&b.done)
        .then_with(|| match (a.due_at, b.due_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => CmpOrdering::Equal,
        })
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl TasksRepo for InMemoryTasks {
    async fn list_active(&self, page: PageRequest) -> Result<Vec<TaskRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let mut active: Vec<TaskRecord> = rows
            .values()
            .filter(|row| row.deleted_at.is_none())
            .cloned()
            .collect();
        active.sort_by(active_order);

        Ok(active
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        let rows = self.rows.lock().await;
        Ok(rows.values().filter(|row| row.deleted_at.is_none()).count() as u64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TaskRecord>, RepoError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn list_trashed(&self) -> Result<Vec<TaskRecord>, RepoError> {
        let rows = self.rows.lock().await;
        let mut trashed: Vec<TaskRecord> = rows
            .values()
            .filter(|row| row.deleted_at.is_some())
            .cloned()
            .collect();
        trashed.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then_with(|| b.id.cmp(&a.id)));
        Ok(trashed)
    }
}

#[async_trait]
impl TasksWriteRepo for InMemoryTasks {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRecord, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let now = OffsetDateTime::now_utc();
        let record = TaskRecord {
            id,
            title: task.title,
            done: task.done,
            due_at: task.due_at,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().await.insert(id, record.clone());
        Ok(record)
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<TaskRecord, RepoError> {
        self.pass_write_gate().await;
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.title = changes.title.clone();
        row.done = changes.done;
        row.due_at = changes.due_at;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }

    async fn toggle_task(&self, id: i64) -> Result<TaskRecord, RepoError> {
        self.pass_write_gate().await;
        let mut rows = self.rows.lock().await;
        let row = rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.done = !row.done;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }

    async fn transition_task(&self, id: i64, action: LifecycleAction) -> Result<bool, RepoError> {
        self.pass_write_gate().await;
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.get_mut(&id) else {
            return Ok(false);
        };
        if !row.state().permits(action) {
            return Ok(false);
        }

        let now = OffsetDateTime::now_utc();
        match action {
            LifecycleAction::SoftDelete => {
                row.deleted_at = Some(now);
                row.updated_at = now;
            }
            LifecycleAction::Restore => {
                row.deleted_at = None;
                row.updated_at = now;
            }
            LifecycleAction::Purge => {
                rows.remove(&id);
            }
        }
        Ok(true)
    }
}

/// Memory backend that counts calls per operation.
pub struct CountingBackend {
    inner: MemoryBackend,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
    pub invalidations: AtomicUsize,
}

impl CountingBackend {
    pub fn new(config: &CacheConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryBackend::new(config),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        })
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for CountingBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_with_expiry(key, value, ttl).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), BackendError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(keys).await
    }

    async fn tag_entry(&self, key: &str, tags: &[&str]) -> Result<(), BackendError> {
        self.inner.tag_entry(key, tags).await
    }

    async fn invalidate_by_tag(&self, tags: &[&str]) -> Result<(), BackendError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate_by_tag(tags).await
    }
}

/// Backend that rejects every call, standing in for an unreachable server.
pub struct DownBackend;

#[async_trait]
impl CacheBackend for DownBackend {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, BackendError> {
        Err(BackendError::unavailable("connection refused"))
    }

    async fn set_with_expiry(
        &self,
        _key: &str,
        _value: Bytes,
        _ttl: Duration,
    ) -> Result<(), BackendError> {
        Err(BackendError::unavailable("connection refused"))
    }

    async fn delete(&self, _keys: &[&str]) -> Result<(), BackendError> {
        Err(BackendError::unavailable("connection refused"))
    }

    async fn tag_entry(&self, _key: &str, _tags: &[&str]) -> Result<(), BackendError> {
        Err(BackendError::unavailable("connection refused"))
    }

    async fn invalidate_by_tag(&self, _tags: &[&str]) -> Result<(), BackendError> {
        Err(BackendError::unavailable("connection refused"))
    }
}

pub struct Harness {
    pub store: Arc<InMemoryTasks>,
    pub backend: Arc<CountingBackend>,
    pub client: CacheClient,
    pub service: TaskService,
}

pub fn harness() -> Harness {
    harness_with(CacheConfig::default())
}

pub fn harness_with(config: CacheConfig) -> Harness {
    let store = InMemoryTasks::new();
    let backend = CountingBackend::new(&config);
    let client = CacheClient::new(backend.clone(), config);
    let service = service_over(store.clone(), client.clone());
    Harness {
        store,
        backend,
        client,
        service,
    }
}

pub fn service_over(store: Arc<InMemoryTasks>, client: CacheClient) -> TaskService {
    let reader: Arc<dyn TasksRepo> = store.clone();
    let writer: Arc<dyn TasksWriteRepo> = store;
    TaskService::new(
        reader,
        writer,
        ItemCache::new(client.clone()),
        TaggedCache::new(client),
    )
}
