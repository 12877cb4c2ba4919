use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;

/// Process-local request coalescing: concurrent [`SingleFlight::run`] calls
/// for the same key share one execution of the supplied work and all
/// observe its result.
///
/// The work future runs on a detached task. A waiter whose own future is
/// dropped (request deadline expired, client went away) therefore never
/// cancels a build other waiters are still attached to. Coalescing is
/// process-local only; separate server processes may refresh the same key
/// concurrently.
pub struct SingleFlight<T> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
}

/// The owning task died without publishing a result.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("in-flight work for this key was abandoned")]
pub struct Abandoned;

/// Removes the key on drop so a panicking work future cannot wedge the key
/// forever.
struct ClearKey<T> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<T>>>>,
    key: String,
}

impl<T> Drop for ClearKey<T> {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .expect("singleflight lock poisoned")
            .remove(&self.key);
    }
}

impl<T: Clone + Send + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `work` under `key`, or attaches to an execution already in
    /// flight for that key.
    ///
    /// `Err(Abandoned)` means the owning task panicked before producing a
    /// result; callers should treat it like a failed execution.
    pub async fn run<F>(&self, key: &str, work: F) -> Result<T, Abandoned>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let mut rx = {
            let mut inflight = self.inflight.lock().expect("singleflight lock poisoned");
            match inflight.get(key) {
                Some(tx) => tx.subscribe(),
                None => {
                    let (tx, rx) = broadcast::channel(1);
                    inflight.insert(key.to_string(), tx.clone());

                    let clear = ClearKey {
                        inflight: Arc::clone(&self.inflight),
                        key: key.to_string(),
                    };
                    tokio::spawn(async move {
                        let result = work.await;
                        // The key must be gone before the result is
                        // published, so late callers start a new flight
                        // instead of waiting on a spent channel.
                        drop(clear);
                        let _ = tx.send(result);
                    });
                    rx
                }
            }
        };

        rx.recv().await.map_err(|_| Abandoned)
    }
}

impl<T: Clone + Send + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
