use tokio::sync::{oneshot, Mutex};

/// Single-flight coordination for silent refresh.
///
/// Without this, N requests failing at once would fire N parallel refresh
/// calls, each rotating the refresh token and invalidating the others. The
/// coordinator guarantees at most one refresh in flight per client instance:
/// the first caller becomes the initiator, everyone else queues and is
/// released in FIFO order with the initiator's outcome.
#[derive(Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Option<String>>>,
}

/// What `begin` handed this caller.
pub enum RefreshTicket {
    /// This caller must perform the refresh and report back via `finish`.
    Initiator,
    /// A refresh is already in flight; await the shared outcome.
    /// `None` means the refresh failed and the request should be rejected.
    Waiter(oneshot::Receiver<Option<String>>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the in-flight refresh, or claims the initiator role.
    pub async fn begin(&self) -> RefreshTicket {
        let mut inner = self.inner.lock().await;
        if inner.in_flight {
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            RefreshTicket::Waiter(rx)
        } else {
            inner.in_flight = true;
            RefreshTicket::Initiator
        }
    }

    /// Ends the in-flight refresh and releases all queued waiters in the
    /// order they arrived. `None` rejects every waiter.
    pub async fn finish(&self, token: Option<String>) {
        let mut inner = self.inner.lock().await;
        inner.in_flight = false;
        for waiter in inner.waiters.drain(..) {
            // A waiter that went away mid-refresh is simply dropped.
            let _ = waiter.send(token.clone());
        }
    }
}
