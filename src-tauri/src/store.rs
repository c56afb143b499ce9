//! Client-side list cache with optimistic mutations.
//!
//! Each remote collection (banners, videos) gets one [`ListStore`]. The
//! server stays the source of truth: the cache is a disposable projection
//! that mutations edit optimistically and mark stale once settled, so the
//! next read re-synchronizes with the server.
//!
//! A mutation lifecycle is strictly ordered: [`ListStore::begin`] cancels
//! any in-flight refresh and snapshots the list, [`Mutation::apply`] edits
//! the cache before the network call resolves, then [`Mutation::commit`]
//! or [`Mutation::rollback`] settles it. Rollback restores the snapshot
//! verbatim, but only if no newer mutation started in between.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cache lock poisoned")]
    Poisoned,
}

struct Inner<T> {
    items: Option<Vec<T>>,
    stale: bool,
    refresh_seq: u64,
    active_mutation: Option<Uuid>,
}

pub struct ListStore<T> {
    name: &'static str,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for ListStore<T> {
    fn clone(&self) -> Self {
        ListStore {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handed out when a refresh starts; the fetched list is only installed
/// if no mutation began while the request was in flight.
pub struct RefreshTicket {
    seq: u64,
}

impl<T: Clone> ListStore<T> {
    pub fn new(name: &'static str) -> Self {
        ListStore {
            name,
            inner: Arc::new(Mutex::new(Inner {
                items: None,
                stale: false,
                refresh_seq: 0,
                active_mutation: None,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<T>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Current cached list, if the cache has ever been primed.
    pub fn read(&self) -> Result<Option<Vec<T>>, StoreError> {
        Ok(self.lock()?.items.clone())
    }

    /// True when the cached list can be served without hitting the server.
    pub fn is_fresh(&self) -> Result<bool, StoreError> {
        let inner = self.lock()?;
        Ok(inner.items.is_some() && !inner.stale)
    }

    /// Force the next read to refetch.
    pub fn invalidate(&self) -> Result<(), StoreError> {
        self.lock()?.stale = true;
        Ok(())
    }

    pub fn begin_refresh(&self) -> Result<RefreshTicket, StoreError> {
        let inner = self.lock()?;
        Ok(RefreshTicket {
            seq: inner.refresh_seq,
        })
    }

    /// Install a fetched list. Returns false when the ticket was cancelled
    /// by a mutation that began after the fetch started; the result is
    /// discarded then and the cache keeps the optimistic state.
    pub fn complete_refresh(&self, ticket: RefreshTicket, items: Vec<T>) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        if inner.refresh_seq != ticket.seq {
            debug!("{}: refresh overlapped a mutation, discarding result", self.name);
            return Ok(false);
        }
        inner.items = Some(items);
        inner.stale = false;
        Ok(true)
    }

    /// Start a mutation lifecycle: cancel any in-flight refresh and take
    /// the rollback snapshot.
    pub fn begin(&self) -> Result<Mutation<T>, StoreError> {
        let mut inner = self.lock()?;
        inner.refresh_seq += 1;
        let token = Uuid::new_v4();
        inner.active_mutation = Some(token);
        debug!("{}: mutation {} begun", self.name, token);
        Ok(Mutation {
            store: self.clone(),
            token,
            snapshot: inner.items.clone(),
        })
    }
}

/// One in-flight mutation against a [`ListStore`]. Must settle via
/// [`commit`](Mutation::commit) or [`rollback`](Mutation::rollback);
/// either way the key is marked stale so the next read heals any
/// divergence from the server.
pub struct Mutation<T> {
    store: ListStore<T>,
    token: Uuid,
    snapshot: Option<Vec<T>>,
}

impl<T: Clone> Mutation<T> {
    /// Apply the expected local effect synchronously, ahead of the remote
    /// call. No-op while the cache is unprimed; the first list read will
    /// fetch the server's state anyway.
    pub fn apply(&self, effect: impl FnOnce(&mut Vec<T>)) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        if let Some(items) = inner.items.as_mut() {
            effect(items);
        }
        Ok(())
    }

    /// Accept the optimistic state as final.
    pub fn commit(self) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        if inner.active_mutation == Some(self.token) {
            inner.active_mutation = None;
        }
        inner.stale = true;
        debug!("{}: mutation {} committed", self.store.name, self.token);
        Ok(())
    }

    /// Restore the pre-mutation snapshot verbatim. If a newer mutation
    /// began since this one, its write wins and we only mark the key
    /// stale; a snapshot is never restored by a different lifecycle.
    pub fn rollback(self) -> Result<(), StoreError> {
        let mut inner = self.store.lock()?;
        if inner.active_mutation == Some(self.token) {
            inner.items = self.snapshot;
            inner.active_mutation = None;
            warn!("{}: mutation {} rolled back", self.store.name, self.token);
        } else {
            warn!(
                "{}: mutation {} superseded, leaving cache for refetch",
                self.store.name, self.token
            );
        }
        inner.stale = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Banner, MediaFolder, MediaVideo};

    fn banner(id: &str, is_active: bool) -> Banner {
        Banner {
            id: id.into(),
            thumbnail_image: format!("https://img.example.com/{id}.jpg"),
            toptitle: "Welcome to".into(),
            title: format!("Banner {id}"),
            bottomtitle: "Quality since 1984".into(),
            is_active,
            created_at: "2025-01-01T00:00:00.000Z".into(),
            updated_at: "2025-01-01T00:00:00.000Z".into(),
        }
    }

    fn video(id: &str) -> MediaVideo {
        MediaVideo {
            id: id.into(),
            folder: MediaFolder::MediaVideos,
            video_url: format!("https://youtu.be/{id}"),
            title: format!("Video {id}"),
            date: "2025-03-01".into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn refresh_primes_the_cache() {
        let store = ListStore::new("banners");
        assert!(!store.is_fresh().unwrap());

        let ticket = store.begin_refresh().unwrap();
        assert!(store.complete_refresh(ticket, vec![banner("b1", true)]).unwrap());

        assert!(store.is_fresh().unwrap());
        assert_eq!(store.read().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn mutation_cancels_in_flight_refresh() {
        let store = ListStore::new("banners");
        let ticket = store.begin_refresh().unwrap();
        assert!(store.complete_refresh(ticket, vec![banner("b1", false)]).unwrap());

        // A refresh goes out, then a delete lands before its response does.
        let stale_ticket = store.begin_refresh().unwrap();
        let txn = store.begin().unwrap();
        txn.apply(|items| items.retain(|b| b.id != "b1")).unwrap();

        // The late response must not clobber the optimistic removal.
        assert!(!store
            .complete_refresh(stale_ticket, vec![banner("b1", false)])
            .unwrap());
        assert!(store.read().unwrap().unwrap().is_empty());

        txn.commit().unwrap();
    }

    #[test]
    fn failed_toggle_restores_pre_mutation_snapshot() {
        let store = ListStore::new("banners");
        let ticket = store.begin_refresh().unwrap();
        let before = vec![banner("b1", false), banner("b2", true)];
        store.complete_refresh(ticket, before.clone()).unwrap();

        let txn = store.begin().unwrap();
        txn.apply(|items| {
            if let Some(b) = items.iter_mut().find(|b| b.id == "b1") {
                b.is_active = true;
            }
        })
        .unwrap();
        assert!(store.read().unwrap().unwrap()[0].is_active);

        // Simulated server failure.
        txn.rollback().unwrap();

        let after = store.read().unwrap().unwrap();
        assert_eq!(after, before);
        assert!(!after[0].is_active);
        assert!(!store.is_fresh().unwrap());
    }

    #[test]
    fn delete_commits_removal_and_marks_stale() {
        let store = ListStore::new("videos");
        let ticket = store.begin_refresh().unwrap();
        store
            .complete_refresh(ticket, vec![video("v1"), video("v9"), video("v3")])
            .unwrap();

        let txn = store.begin().unwrap();
        txn.apply(|items| items.retain(|v| v.id != "v9")).unwrap();
        txn.commit().unwrap();

        let items = store.read().unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|v| v.id != "v9"));
        assert!(!store.is_fresh().unwrap());
    }

    #[test]
    fn failed_delete_reappears_in_original_position() {
        let store = ListStore::new("videos");
        let ticket = store.begin_refresh().unwrap();
        let before = vec![video("v1"), video("v9"), video("v3")];
        store.complete_refresh(ticket, before.clone()).unwrap();

        let txn = store.begin().unwrap();
        txn.apply(|items| items.retain(|v| v.id != "v9")).unwrap();
        assert_eq!(store.read().unwrap().unwrap().len(), 2);

        txn.rollback().unwrap();

        let after = store.read().unwrap().unwrap();
        assert_eq!(after, before);
        assert_eq!(after[1].id, "v9");
    }

    #[test]
    fn superseded_rollback_never_restores_its_snapshot() {
        let store = ListStore::new("banners");
        let ticket = store.begin_refresh().unwrap();
        store
            .complete_refresh(ticket, vec![banner("b1", false), banner("b2", false)])
            .unwrap();

        let first = store.begin().unwrap();
        first
            .apply(|items| {
                if let Some(b) = items.iter_mut().find(|b| b.id == "b1") {
                    b.is_active = true;
                }
            })
            .unwrap();

        // A second toggle starts before the first settles; last write wins.
        let second = store.begin().unwrap();
        second
            .apply(|items| {
                if let Some(b) = items.iter_mut().find(|b| b.id == "b2") {
                    b.is_active = true;
                }
            })
            .unwrap();

        first.rollback().unwrap();

        let items = store.read().unwrap().unwrap();
        assert!(items.iter().find(|b| b.id == "b2").unwrap().is_active);
        assert!(!store.is_fresh().unwrap());

        second.commit().unwrap();
    }

    #[test]
    fn create_inserts_the_server_record_exactly_once() {
        let store = ListStore::new("banners");
        let ticket = store.begin_refresh().unwrap();
        store.complete_refresh(ticket, vec![banner("b1", true)]).unwrap();

        // The server's response record, id and timestamps included.
        let created = banner("b2", true);
        let txn = store.begin().unwrap();
        let row = created.clone();
        txn.apply(move |items| items.insert(0, row)).unwrap();
        txn.commit().unwrap();

        let items = store.read().unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().filter(|b| b.id == "b2").count(), 1);
        assert_eq!(items[0], created);
    }

    #[test]
    fn idempotent_update_leaves_no_visible_diff() {
        use crate::forms::BannerPatch;

        let store = ListStore::new("banners");
        let ticket = store.begin_refresh().unwrap();
        store.complete_refresh(ticket, vec![banner("b1", true)]).unwrap();
        let before = store.read().unwrap().unwrap();

        // Re-submitting the row's current values changes nothing visible.
        let patch = BannerPatch {
            title: Some("Banner b1".into()),
            is_active: Some(true),
            ..Default::default()
        };
        let txn = store.begin().unwrap();
        txn.apply(move |items| {
            if let Some(b) = items.iter_mut().find(|b| b.id == "b1") {
                patch.apply_to(b);
            }
        })
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(store.read().unwrap().unwrap(), before);
    }

    #[test]
    fn unprimed_cache_ignores_optimistic_apply() {
        let store: ListStore<Banner> = ListStore::new("banners");
        let txn = store.begin().unwrap();
        txn.apply(|items| items.push(banner("b1", true))).unwrap();
        assert!(store.read().unwrap().is_none());
        txn.commit().unwrap();
    }

    #[tokio::test]
    async fn refresh_and_mutation_interleave_across_tasks() {
        let store = ListStore::new("videos");
        let ticket = store.begin_refresh().unwrap();
        store
            .complete_refresh(ticket, vec![video("v1"), video("v2")])
            .unwrap();

        let slow_ticket = store.begin_refresh().unwrap();
        let refresher = store.clone();
        let (response_arrived, gate) = tokio::sync::oneshot::channel();
        let refresh = tokio::spawn(async move {
            // Response held until the mutation has settled.
            gate.await.unwrap();
            refresher
                .complete_refresh(slow_ticket, vec![video("v1"), video("v2")])
                .unwrap()
        });

        let txn = store.begin().unwrap();
        txn.apply(|items| items.retain(|v| v.id != "v2")).unwrap();
        txn.commit().unwrap();
        response_arrived.send(()).unwrap();

        // The slow refresh loses and the optimistic state survives.
        assert!(!refresh.await.unwrap());
        assert_eq!(store.read().unwrap().unwrap().len(), 1);
    }
}
