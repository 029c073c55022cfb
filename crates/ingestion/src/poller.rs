use std::any::Any;
use std::fmt::Debug;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::time::{self, sleep};

/// What a poller should do after one tick.
#[derive(Clone)]
pub enum Continuation {
    Continue,
    Exit,
}

#[derive(Clone)]
pub enum SupervisionStrategy {
    Resume,
    Stop,
}

/// One contributor's polling loop: fetch its upstream feed, run it through
/// [`crate::coordinator::ingest`], and report how to continue. Tick/backoff/
/// panic handling follows the same supervision vocabulary used elsewhere in
/// this workspace, generalized to a single contributor rather than a
/// database-persisted collector instance.
#[async_trait]
pub trait Poller: Send {
    type Error: Debug + Send;

    fn contributor_name(&self) -> &str;

    async fn poll_once(&mut self) -> Result<Continuation, Self::Error>;

    fn tick(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn backoff(&self, last_backoff: Duration) -> Duration {
        last_backoff + self.tick()
    }

    fn on_error(&self, _error: &Self::Error) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }

    fn on_panic(&self, _payload: &(dyn Any + Send)) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }
}

/// Runs a poller forever on its own Tokio task: one task per contributor,
/// none of them sharing mutable state outside the `Database` handle each
/// poller was built with.
pub async fn run<P: Poller + 'static>(mut poller: P) {
    let mut interval = time::interval(poller.tick());
    let mut backoff = poller.tick();

    loop {
        let result = AssertUnwindSafe(poller.poll_once()).catch_unwind().await;
        let outcome = match result {
            Ok(Ok(continuation)) => Ok(continuation),
            Ok(Err(why)) => {
                log::error!("poller for {} failed: {:?}", poller.contributor_name(), why);
                Err(poller.on_error(&why))
            }
            Err(panic) => {
                log::error!("poller for {} panicked", poller.contributor_name());
                Err(poller.on_panic(&*panic))
            }
        };

        match outcome {
            Ok(Continuation::Continue) => {
                interval.tick().await;
                backoff = poller.tick();
            }
            Ok(Continuation::Exit) => break,
            Err(SupervisionStrategy::Resume) => {
                backoff = poller.backoff(backoff);
                sleep(backoff).await;
            }
            Err(SupervisionStrategy::Stop) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPoller {
        runs: Arc<AtomicUsize>,
        stop_after: usize,
    }

    #[async_trait]
    impl Poller for CountingPoller {
        type Error = ();

        fn contributor_name(&self) -> &str {
            "test"
        }

        fn tick(&self) -> Duration {
            Duration::from_millis(1)
        }

        async fn poll_once(&mut self) -> Result<Continuation, ()> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                Ok(Continuation::Exit)
            } else {
                Ok(Continuation::Continue)
            }
        }
    }

    #[tokio::test]
    async fn stops_after_the_poller_signals_exit() {
        let runs = Arc::new(AtomicUsize::new(0));
        run(CountingPoller {
            runs: runs.clone(),
            stop_after: 3,
        })
        .await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
