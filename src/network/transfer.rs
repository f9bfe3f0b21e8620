// One-shot transfer handles

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::NetworkError;

/// Byte counters reported while a transfer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes moved since the previous report
    pub bytes: u64,
    /// Bytes moved so far
    pub total_bytes: u64,
    /// Expected total, when the server announced one
    pub total_bytes_expected: Option<u64>,
}

pub type ProgressHandler = Arc<dyn Fn(Progress) + Send + Sync>;

/// Handed to the adapter running a transfer: progress sink plus the
/// suspend/resume gate.
#[derive(Clone)]
pub struct TransferContext {
    progress: Option<ProgressHandler>,
    gate: Arc<watch::Sender<bool>>,
}

impl std::fmt::Debug for TransferContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferContext")
            .field("has_progress", &self.progress.is_some())
            .field("running", &*self.gate.borrow())
            .finish()
    }
}

impl TransferContext {
    /// A context that is always running and reports nowhere
    pub fn detached() -> Self {
        Self::new(None)
    }

    fn new(progress: Option<ProgressHandler>) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            progress,
            gate: Arc::new(gate),
        }
    }

    /// Wait while the transfer is suspended. Adapters call this between
    /// chunks.
    pub async fn checkpoint(&self) -> Result<(), NetworkError> {
        let mut gate = self.gate.subscribe();
        gate.wait_for(|running| *running)
            .await
            .map(|_| ())
            .map_err(|_| NetworkError::Cancelled)
    }

    pub fn is_suspended(&self) -> bool {
        !*self.gate.borrow()
    }

    pub fn report(&self, progress: Progress) {
        if let Some(handler) = &self.progress {
            handler(progress);
        }
    }
}

type Slot<T> = Option<Result<T, NetworkError>>;

/// Handle to an in-flight transfer
///
/// The result is set exactly once. Clones share the same transfer, and a
/// clone created after completion still observes the result.
pub struct Transfer<T> {
    result: watch::Receiver<Slot<T>>,
    result_tx: Arc<watch::Sender<Slot<T>>>,
    ctx: TransferContext,
    abort: Option<AbortHandle>,
}

impl<T> Clone for Transfer<T> {
    fn clone(&self) -> Self {
        Self {
            result: self.result.clone(),
            result_tx: self.result_tx.clone(),
            ctx: self.ctx.clone(),
            abort: self.abort.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Transfer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("finished", &self.is_finished())
            .field("suspended", &self.ctx.is_suspended())
            .finish()
    }
}

impl<T> Transfer<T> {
    /// Suspend at the next checkpoint
    pub fn suspend(&self) {
        self.ctx.gate.send_replace(false);
    }

    pub fn resume(&self) {
        self.ctx.gate.send_replace(true);
    }

    /// Abort the transfer. Waiters that have not seen a result get
    /// [`NetworkError::Cancelled`].
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
        resolve(&self.result_tx, Err(NetworkError::Cancelled));
    }

    pub fn is_finished(&self) -> bool {
        self.result.borrow().is_some()
    }
}

impl<T> Transfer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn `work` on the tokio runtime
    pub fn spawn<F, Fut>(progress: Option<ProgressHandler>, work: F) -> Self
    where
        F: FnOnce(TransferContext) -> Fut,
        Fut: Future<Output = Result<T, NetworkError>> + Send + 'static,
    {
        let (result_tx, result) = watch::channel(None);
        let result_tx = Arc::new(result_tx);
        let ctx = TransferContext::new(progress);

        let future = work(ctx.clone());
        let gate_ctx = ctx.clone();
        let tx = result_tx.clone();
        let handle = tokio::spawn(async move {
            let outcome = match gate_ctx.checkpoint().await {
                Ok(()) => future.await,
                Err(e) => Err(e),
            };
            resolve(&tx, outcome);
        });

        Self {
            result,
            result_tx,
            ctx,
            abort: Some(handle.abort_handle()),
        }
    }

    /// An already finished transfer
    pub fn completed(outcome: Result<T, NetworkError>) -> Self {
        let (result_tx, result) = watch::channel(Some(outcome));
        Self {
            result,
            result_tx: Arc::new(result_tx),
            ctx: TransferContext::detached(),
            abort: None,
        }
    }

    /// Wait for the result
    pub async fn response(&self) -> Result<T, NetworkError> {
        let mut result = self.result.clone();
        let outcome = match result.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(NetworkError::Cancelled))
    }
}

/// First writer wins
fn resolve<T>(tx: &watch::Sender<Slot<T>>, outcome: Result<T, NetworkError>) {
    tx.send_if_modified(|slot| {
        if slot.is_none() {
            *slot = Some(outcome);
            true
        } else {
            false
        }
    });
}
