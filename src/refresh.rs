//! Single-flight coordination for token refresh.
//!
//! One coordinator lives inside each gateway instance. The first
//! request to hit an expired token becomes the leader and performs the
//! refresh call; every request arriving while that call is in flight
//! joins as a follower and waits on a oneshot continuation. The
//! coordinator guarantees at most one refresh call per expiry event and
//! releases followers in the order they joined.

use tokio::sync::oneshot;

/// Terminal refresh failure delivered to every waiting follower.
///
/// Cloneable so a single failure can fan out to all waiters; the full
/// error (with source) goes to the leader's caller.
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    pub message: String,
}

impl RefreshFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome delivered to followers: the new access token, or the
/// failure that ended the refresh.
pub type RefreshOutcome = std::result::Result<String, RefreshFailure>;

/// What a request should do after asking to refresh.
#[derive(Debug)]
pub enum JoinOutcome {
    /// No refresh was running; the caller must perform the refresh call
    /// and then invoke [`RefreshCoordinator::complete`].
    Leader,
    /// A refresh is already in flight; await the receiver for its
    /// outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug)]
enum State {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Idle → Refreshing → Idle state machine with a FIFO waiter list.
///
/// The owning gateway wraps this in a mutex that is never held across
/// an await point; both operations are synchronous.
#[derive(Debug)]
pub struct RefreshCoordinator {
    state: State,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Start a refresh or join the one already in flight.
    pub fn begin_or_join(&mut self) -> JoinOutcome {
        match &mut self.state {
            State::Idle => {
                self.state = State::Refreshing {
                    waiters: Vec::new(),
                };
                JoinOutcome::Leader
            }
            State::Refreshing { waiters } => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                JoinOutcome::Follower(rx)
            }
        }
    }

    /// Finish the in-flight refresh, releasing waiters in join order
    /// and returning to `Idle`. Called by the leader on success and
    /// failure alike, so a failed refresh never wedges later requests.
    pub fn complete(&mut self, outcome: RefreshOutcome) {
        let waiters = match std::mem::replace(&mut self.state, State::Idle) {
            State::Refreshing { waiters } => waiters,
            State::Idle => Vec::new(),
        };
        for waiter in waiters {
            // A follower that gave up waiting just drops its receiver.
            let _ = waiter.send(outcome.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn is_refreshing(&self) -> bool {
        matches!(self.state, State::Refreshing { .. })
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
