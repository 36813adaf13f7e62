//! Background eviction of expired cache entries

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::cache::CacheState;

/// Periodic sweep task owned by a cache
///
/// Holds only a weak reference to the cache state, so it never keeps a
/// dropped cache alive. Stops when cancelled or when the state is gone.
pub(super) struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub(super) fn spawn(handle: &Handle, state: Weak<CacheState>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(state) = state.upgrade() else {
                            break;
                        };
                        state.sweep();
                    }
                }
            }

            tracing::debug!("pool cache sweeper stopped");
        });

        Self { cancel, handle }
    }

    pub(super) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(super) fn stop(self) {
        self.cancel.cancel();
    }
}
