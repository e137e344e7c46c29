//! Table of outstanding requests used for request coalescing.
//!
//! A request is started as a spawned tokio task and published as a
//! [`Shared`] future under its [`RequestKey`]. Callers asking for the same
//! key while it is outstanding join the existing future instead of issuing
//! another request. The entry is removed when the task settles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::errors::RegistryError;
use crate::identity::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestOp {
    List,
    ReadUrl,
}

/// Identity of a coalescable request: operation, owner and an optional
/// subject such as the file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub op: RequestOp,
    pub owner: OwnerId,
    pub subject: Option<String>,
}

impl RequestKey {
    pub fn list(owner: &OwnerId) -> Self {
        Self {
            op: RequestOp::List,
            owner: owner.clone(),
            subject: None,
        }
    }

    pub fn read_url(owner: &OwnerId, name: &str) -> Self {
        Self {
            op: RequestOp::ReadUrl,
            owner: owner.clone(),
            subject: Some(name.to_string()),
        }
    }
}

pub type SharedRequest<V> = Shared<BoxFuture<'static, Result<V, RegistryError>>>;

/// Outcome of [`InFlight::admit`].
pub enum Admission<V> {
    /// Answered locally; no request needed.
    Ready(V),
    /// An identical request was already outstanding.
    Joined(SharedRequest<V>),
    /// A new request was started.
    Started(SharedRequest<V>),
}

pub struct InFlight<V> {
    next_ticket: AtomicU64,
    entries: Mutex<HashMap<RequestKey, (u64, SharedRequest<V>)>>,
}

impl<V> InFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_ticket: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Join an outstanding request for `key`, answer from `ready`, or start
    /// `start` as a new request, in that order of preference.
    ///
    /// `ready` and `start` run while the table lock is held, so two callers
    /// can never both start a request for the same key. Must be called from
    /// within a tokio runtime.
    pub fn admit<R, S>(self: &Arc<Self>, key: RequestKey, ready: R, start: S) -> Admission<V>
    where
        R: FnOnce() -> Option<V>,
        S: FnOnce() -> BoxFuture<'static, Result<V, RegistryError>>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if let Some((_, shared)) = entries.get(&key) {
            debug!("Joining in-flight {:?}", key);
            return Admission::Joined(shared.clone());
        }
        if let Some(value) = ready() {
            return Admission::Ready(value);
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let request = start();
        let table = Arc::clone(self);
        let settle_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = request.await;
            table.settle(&settle_key, ticket);
            result
        });
        let shared = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(RegistryError::unknown(format!("request task failed: {e}"))),
            }
        }
        .boxed()
        .shared();

        debug!("Started {:?}", key);
        entries.insert(key, (ticket, shared.clone()));
        Admission::Started(shared)
    }

    /// Remove `key` if it still belongs to request `ticket`.
    fn settle(&self, key: &RequestKey, ticket: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.get(key).is_some_and(|(current, _)| *current == ticket) {
            entries.remove(key);
        }
    }

    /// Forget an outstanding request so later callers start a new one. The
    /// detached request still runs to completion.
    pub fn detach(&self, key: &RequestKey) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.remove(key).is_some() {
            debug!("Detached in-flight {:?}", key);
        }
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
