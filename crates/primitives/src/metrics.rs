use core::{
    fmt::{Debug, Formatter},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use std::time::Instant;

/// A future that measures the wall-clock time from its creation until it resolves.
///
/// Used to observe the latency of remote calls such as executor round-trips.
pub struct MeteredFuture<F> {
    fut: F,
    started_at: Instant,
}

impl<F> Debug for MeteredFuture<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeteredFuture").field("started_at", &self.started_at).finish()
    }
}

impl<F> MeteredFuture<F> {
    /// Wraps the future, starting the clock now.
    pub fn new(fut: F) -> Self {
        Self { fut, started_at: Instant::now() }
    }
}

impl<F: Future + Unpin> Future for MeteredFuture<F> {
    type Output = (Duration, F::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.fut).poll(cx) {
            Poll::Ready(output) => Poll::Ready((this.started_at.elapsed(), output)),
            Poll::Pending => Poll::Pending,
        }
    }
}
