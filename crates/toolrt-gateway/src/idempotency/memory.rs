//! [`ToolMemory`] implementations backing idempotency replay.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as DashEntry;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use toolrt_core::{MemoryLock, Result, RuntimeError, ToolMemory};

struct StoredEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() >= t)
    }
}

/// Concurrent, process-local idempotency store. Sharded by `DashMap`, same
/// concurrency pattern the session manager uses for per-session state — a
/// shard lock protects each bucket so `set_if_absent` is atomic without a
/// single global mutex serializing every tool call.
#[derive(Default)]
pub struct InMemoryMemory {
    store: DashMap<String, StoredEntry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InMemoryMemory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
            locks: DashMap::new(),
        }
    }
}

/// Held lock scope backed by a real `tokio::sync::Mutex` permit. Dropping it
/// releases the permit and lets the next waiter through.
struct OwnedMemoryLock(#[allow(dead_code)] OwnedMutexGuard<()>);

impl MemoryLock for OwnedMemoryLock {}

/// No mutual exclusion at all: holding this "lock" serializes nothing.
struct NoopMemoryLock;

impl MemoryLock for NoopMemoryLock {}

#[async_trait]
impl ToolMemory for InMemoryMemory {
    async fn lock(&self, key: &str, ttl: Duration) -> Result<Box<dyn MemoryLock>> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        match tokio::time::timeout(ttl, mutex.lock_owned()).await {
            Ok(guard) => Ok(Box::new(OwnedMemoryLock(guard))),
            Err(_) => Err(RuntimeError::Timeout {
                detail: format!("timed out waiting for idempotency lock on {key}"),
            }),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.store.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        self.store.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<bool> {
        match self.store.entry(key.to_string()) {
            DashEntry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredEntry {
                        value,
                        expires_at: ttl.map(|d| Instant::now() + d),
                    });
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            DashEntry::Vacant(vacant) => {
                vacant.insert(StoredEntry {
                    value,
                    expires_at: ttl.map(|d| Instant::now() + d),
                });
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        Ok(())
    }
}

/// Never remembers anything: every `set_if_absent` claims success, so the
/// idempotency layer becomes a no-op and every call executes. Matches the
/// original `NoOpMemory` used in tests and single-shot scripts.
#[derive(Debug, Default)]
pub struct NoopMemory;

#[async_trait]
impl ToolMemory for NoopMemory {
    async fn lock(&self, _key: &str, _ttl: Duration) -> Result<Box<dyn MemoryLock>> {
        Ok(Box::new(NoopMemoryLock))
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn set_if_absent(
        &self,
        _key: &str,
        _value: Value,
        _ttl: Option<Duration>,
    ) -> Result<bool> {
        Ok(true)
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
