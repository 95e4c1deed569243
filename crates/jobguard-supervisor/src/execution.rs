//! Completion handle for a spawned supervisor pass.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use jobguard_core::{CoreError, JobContext};

use crate::report::PassReport;

/// Handle to a supervisor pass running on the tokio runtime.
///
/// Resolves to the pass outcome. A pass whose task panicked or was aborted
/// resolves to [`CoreError::ExecutionAborted`].
pub struct JobExecution {
    context: JobContext,
    handle: JoinHandle<Result<PassReport, CoreError>>,
}

impl JobExecution {
    pub(crate) fn new(context: JobContext, handle: JoinHandle<Result<PassReport, CoreError>>) -> Self {
        Self { context, handle }
    }

    /// Correlation context the pass runs under.
    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Returns true once the pass has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the pass. Writes already issued are not rolled back.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Future for JobExecution {
    type Output = Result<PassReport, CoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join_error)) => {
                Poll::Ready(Err(CoreError::ExecutionAborted(join_error.to_string())))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
