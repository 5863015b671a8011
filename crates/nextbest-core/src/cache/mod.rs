//! Client-side recommendation cache.
//!
//! One recommendation list per [`CacheKey`]. Entries go stale on
//! invalidation and are refetched by the next reader. Task mutations bridge
//! the network round trip with an optimistic patch that is either committed
//! or rolled back, and the key is invalidated on settlement in both cases.
//!
//! ## Write ordering
//!
//! Readers fetch through a [`FetchTicket`]. Every invalidation, `set` and
//! optimistic patch bumps the key's generation, and a completion is dropped
//! when its ticket's generation is no longer current or a patch on the key
//! is still outstanding. A read that started before a mutation can therefore
//! never overwrite the optimistic state or the post-settlement refetch.

mod key;
pub mod mutation;

pub use key::{CacheKey, CacheMode};
pub use mutation::{PendingMutation, Settlement};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::api::RecommendationItem;
use crate::error::CacheError;
use crate::task::Task;

/// Cache handle shared between the feed, the week plan and the CLI.
pub type SharedCache = Arc<Mutex<RecommendationCache>>;

#[derive(Debug)]
struct Entry {
    items: Vec<RecommendationItem>,
    stale: bool,
    /// Changes only when the list is replaced.
    revision: u64,
}

/// Proof that a reader started fetching `key` at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    key: CacheKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> CacheKey {
        self.key
    }
}

/// Snapshot needed to undo one optimistic patch.
///
/// Consumed by [`RecommendationCache::commit`] or [`RecommendationCache::rollback`].
#[derive(Debug)]
pub struct RollbackToken {
    id: u64,
    key: CacheKey,
    task_id: String,
    /// Task as it was before the patch; `None` when the task was not cached.
    snapshot: Option<Task>,
    /// Revision of the list the patch was applied to.
    revision: u64,
}

impl RollbackToken {
    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn snapshot(&self) -> Option<&Task> {
        self.snapshot.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct RecommendationCache {
    entries: HashMap<CacheKey, Entry>,
    generations: HashMap<CacheKey, u64>,
    /// (key, task id) -> id of the outstanding token
    outstanding: HashMap<(CacheKey, String), u64>,
    next_token: u64,
    next_revision: u64,
}

impl RecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh cache for sharing.
    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Cached items for `key`, or `None` when absent or stale.
    pub fn get(&self, key: &CacheKey) -> Option<&[RecommendationItem]> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.items.as_slice())
    }

    /// Cached items for `key` even when stale.
    pub fn peek(&self, key: &CacheKey) -> Option<&[RecommendationItem]> {
        self.entries.get(key).map(|entry| entry.items.as_slice())
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.stale)
    }

    pub fn has_outstanding_patch(&self, key: &CacheKey, task_id: &str) -> bool {
        self.outstanding.contains_key(&(*key, task_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the list for `key` and mark it fresh.
    pub fn set(&mut self, key: CacheKey, items: Vec<RecommendationItem>) {
        self.bump(key);
        self.next_revision += 1;
        let revision = self.next_revision;
        self.entries.insert(key, Entry { items, stale: false, revision });
    }

    /// Start a read of `key`; pass the ticket back to [`complete_fetch`](Self::complete_fetch).
    pub fn begin_fetch(&mut self, key: CacheKey) -> FetchTicket {
        let generation = *self.generations.entry(key).or_insert(0);
        FetchTicket { key, generation }
    }

    /// Store a fetched list unless it was superseded. Returns whether it was stored.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, items: Vec<RecommendationItem>) -> bool {
        let current = self.generations.get(&ticket.key).copied().unwrap_or(0);
        if current != ticket.generation {
            tracing::debug!(key = ?ticket.key, "discarding superseded fetch");
            return false;
        }
        if self.outstanding.keys().any(|(key, _)| *key == ticket.key) {
            tracing::debug!(key = ?ticket.key, "discarding fetch during optimistic update");
            return false;
        }
        self.set(ticket.key, items);
        true
    }

    /// Mark every entry whose key matches `predicate` stale. Returns how many were marked.
    pub fn invalidate<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&CacheKey) -> bool,
    {
        let keys: HashSet<CacheKey> = self
            .generations
            .keys()
            .chain(self.entries.keys())
            .filter(|key| predicate(key))
            .copied()
            .collect();

        let mut marked = 0;
        for key in keys {
            self.bump(key);
            if let Some(entry) = self.entries.get_mut(&key) {
                if !entry.stale {
                    entry.stale = true;
                    marked += 1;
                }
            }
        }
        marked
    }

    pub fn invalidate_key(&mut self, key: &CacheKey) -> usize {
        self.invalidate(|k| k == key)
    }

    pub fn invalidate_all(&mut self) -> usize {
        self.invalidate(|_| true)
    }

    // ── Optimistic updates ───────────────────────────────────────────

    /// Apply `mutation` to the cached task `task_id` under `key`.
    ///
    /// Fails with [`CacheError::PatchOutstanding`] while an earlier patch on
    /// the same (key, task) has not been committed or rolled back. A task
    /// that is not cached still reserves the slot; its token restores nothing.
    pub fn optimistic_patch<F>(
        &mut self,
        key: CacheKey,
        task_id: &str,
        mutation: F,
    ) -> Result<RollbackToken, CacheError>
    where
        F: FnOnce(&mut Task),
    {
        let slot = (key, task_id.to_string());
        if self.outstanding.contains_key(&slot) {
            return Err(CacheError::PatchOutstanding {
                task_id: task_id.to_string(),
            });
        }

        let mut revision = 0;
        let snapshot = self.entries.get_mut(&key).and_then(|entry| {
            revision = entry.revision;
            entry
                .items
                .iter_mut()
                .find(|item| item.task.id == task_id)
                .map(|item| {
                    let before = item.task.clone();
                    mutation(&mut item.task);
                    before
                })
        });

        self.next_token += 1;
        let id = self.next_token;
        self.outstanding.insert(slot, id);
        self.bump(key);

        tracing::debug!(?key, task_id, token = id, cached = snapshot.is_some(), "optimistic patch applied");

        Ok(RollbackToken {
            id,
            key,
            task_id: task_id.to_string(),
            snapshot,
            revision,
        })
    }

    /// Phase two on success: drop the snapshot and invalidate the key.
    pub fn commit(&mut self, token: RollbackToken) -> Result<(), CacheError> {
        self.release(&token)?;
        self.invalidate_key(&token.key);
        Ok(())
    }

    /// Phase two on failure: restore the task and invalidate the key.
    ///
    /// Only the patched task is restored, and only while the list it was
    /// taken from is still cached; a list stored since then is left as is.
    pub fn rollback(&mut self, token: RollbackToken) -> Result<(), CacheError> {
        self.release(&token)?;

        if let Some(snapshot) = token.snapshot {
            match self.entries.get_mut(&token.key) {
                Some(entry) if entry.revision == token.revision => {
                    if let Some(item) = entry
                        .items
                        .iter_mut()
                        .find(|item| item.task.id == token.task_id)
                    {
                        item.task = snapshot;
                    }
                }
                _ => {
                    tracing::debug!(key = ?token.key, task_id = %token.task_id, "list replaced since patch; nothing to restore");
                }
            }
        }

        tracing::warn!(key = ?token.key, task_id = %token.task_id, "optimistic patch rolled back");
        self.invalidate_key(&token.key);
        Ok(())
    }

    fn release(&mut self, token: &RollbackToken) -> Result<(), CacheError> {
        let slot = (token.key, token.task_id.clone());
        match self.outstanding.get(&slot) {
            Some(&id) if id == token.id => {
                self.outstanding.remove(&slot);
                Ok(())
            }
            _ => Err(CacheError::UnknownToken {
                token_id: token.id,
                task_id: token.task_id.clone(),
            }),
        }
    }

    fn bump(&mut self, key: CacheKey) {
        *self.generations.entry(key).or_insert(0) += 1;
    }
}
