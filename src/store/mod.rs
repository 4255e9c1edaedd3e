//! In-process job store.
//!
//! Jobs live only as long as the process; a restart loses them. The trait is
//! the seam where an externally shared store would plug in for multi-process
//! deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::job::Job;

/// Keyed job storage. Writers put whole `Job` snapshots, so readers never
/// observe a partially updated job.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Option<Job>;

    /// Insert or replace a job atomically.
    async fn put(&self, job: Job);

    async fn list(&self) -> Vec<Uuid>;
}

/// Concurrency-safe in-memory store backed by a sharded map.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<Uuid, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.get(&id).map(|entry| entry.value().clone())
    }

    async fn put(&self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    async fn list(&self) -> Vec<Uuid> {
        self.jobs.iter().map(|entry| *entry.key()).collect()
    }
}
