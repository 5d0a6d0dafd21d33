//! Publish-on-change plumbing for live queries.
//!
//! Mutating repository operations announce which table they touched through
//! the store's [`ChangeNotifier`]; a [`LiveQuery`] re-runs its query on every
//! relevant announcement and publishes the fresh result into a watch channel.
//! Each emission fully supersedes the previous one; there is no diffing.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::errors::Result;
use crate::store::Store;

/// Capacity of the change event buffer. A receiver that falls further behind
/// than this is told it lagged and refreshes unconditionally.
const CHANGE_BUFFER: usize = 64;

/// The tables a change event can originate from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Categories,
    Suppliers,
    Products,
    Expenses,
    ShoppingListItems,
    CategorySuppliers,
}

/// Broadcasts row-change events to all live queries of a store.
#[derive(Debug)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<Table>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_BUFFER);
        Self { tx }
    }

    /// Announces that rows in `table` changed. Called by every mutating
    /// repository operation after the write lands.
    pub fn notify(&self, table: Table) {
        // No subscribers is fine; the event is simply dropped.
        let _ = self.tx.send(table);
    }

    /// Opens a subscription to subsequent change events.
    pub fn watch(&self) -> ChangeStream {
        ChangeStream {
            rx: self.tx.subscribe(),
        }
    }
}

/// A subscription to table-change events.
pub struct ChangeStream {
    rx: broadcast::Receiver<Table>,
}

impl ChangeStream {
    /// Waits until one of `tables` changes.
    ///
    /// A lagged receiver treats the missed window as a change: reloading once
    /// too often is harmless, missing an update is not. If the notifier is
    /// gone the future never resolves; the owning task is aborted with it.
    pub async fn changed(&mut self, tables: &[Table]) {
        loop {
            match self.rx.recv().await {
                Ok(table) if tables.contains(&table) => return,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => return,
                Err(broadcast::error::RecvError::Closed) => {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

/// A continuously refreshed query result.
///
/// The background task owns the query; dropping the handle aborts it, which
/// is how a consumer stops observing. The watch channel starts out with the
/// caller-provided placeholder and receives the first real result as soon as
/// the initial query completes.
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawns the producer task: run `query` once, then again after every
    /// change to one of `tables`, publishing each result.
    pub(crate) fn spawn<F, Fut>(store: Arc<Store>, tables: Vec<Table>, initial: T, query: F) -> Self
    where
        F: Fn(Arc<Store>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(async move {
            let mut changes = store.changes().watch();
            loop {
                match query(Arc::clone(&store)).await {
                    Ok(value) => {
                        tx.send_replace(value);
                    }
                    // Keep the previous value; the next change retries.
                    Err(err) => warn!("live query failed: {err}"),
                }
                changes.changed(&tables).await;
            }
        });
        Self { rx, task }
    }

    /// Returns the most recently published value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next emission. Returns false if the producer is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Hands out an independent receiver onto the same stream of results.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
