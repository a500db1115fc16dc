use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::error::WebSqlError;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Single-consumer FIFO pipe for units of work.
///
/// Every begin, statement, commit, rollback and transaction start is scheduled through one queue,
/// so exactly one unit is in flight at a time and units run in submission order no matter which
/// transaction submitted them. A unit may enqueue further units while it runs; they land at the
/// tail. A unit that fails or panics does not stop the consumer.
#[derive(Clone, Debug)]
pub struct ExecQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl ExecQueue {
    /// Start the consumer task on the current tokio runtime.
    ///
    /// # Errors
    /// Returns [`WebSqlError::ConfigError`] when called outside a tokio runtime.
    pub fn spawn() -> Result<Self, WebSqlError> {
        let handle = Handle::try_current().map_err(|err| {
            WebSqlError::ConfigError(format!("execution queue needs a tokio runtime: {err}"))
        })?;
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        handle.spawn(run_queue(receiver));
        Ok(Self { sender })
    }

    /// Append `unit` to the queue.
    ///
    /// The returned handle resolves with the unit's output once it has run; dropping the handle
    /// does not cancel the unit.
    ///
    /// # Errors
    /// Returns [`WebSqlError::QueueClosed`] if the consumer has stopped.
    pub fn enqueue<F, T>(&self, unit: F) -> Result<QueueHandle<T>, WebSqlError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = tx.send(unit.await);
        });
        self.sender
            .send(job)
            .map_err(|_| WebSqlError::QueueClosed)?;
        Ok(QueueHandle { receiver: rx })
    }

    /// Resolves once every unit enqueued before this call has run.
    ///
    /// # Errors
    /// Returns [`WebSqlError::QueueClosed`] if the consumer has stopped.
    pub async fn drain(&self) -> Result<(), WebSqlError> {
        self.enqueue(async {})?.await
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

async fn run_queue(mut receiver: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = receiver.recv().await {
        // Each unit runs on its own task so a panic ends that unit only.
        if let Err(err) = tokio::spawn(job).await {
            warn!("unit of work aborted: {err}");
        }
    }
}

/// Completion of one enqueued unit of work.
#[derive(Debug)]
pub struct QueueHandle<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Future for QueueHandle<T> {
    type Output = Result<T, WebSqlError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|res| res.map_err(|_| WebSqlError::WorkDropped))
    }
}
