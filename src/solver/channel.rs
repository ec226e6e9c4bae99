use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::config::SolverConfig;
use crate::error::ChannelError;

use super::protocol::{SolverMessage, SolverRequest};
use super::worker::run_worker;

/// Outbound half of the link to a solver. Replies come back asynchronously
/// through whatever sink the solver was created with.
pub trait SolverChannel: Send {
    fn send(&mut self, request: SolverRequest) -> Result<(), ChannelError>;
}

/// A solver worker running on its own thread.
///
/// Dropping it closes the request channel, which the worker notices at its
/// next poll, and joins the thread.
pub struct ThreadedSolver {
    requests: Option<Sender<SolverRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadedSolver {
    /// Start a worker whose messages are delivered into `replies`.
    pub fn spawn<T>(config: &SolverConfig, replies: Sender<T>) -> Result<Self, ChannelError>
    where
        T: From<SolverMessage> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let config = config.clone();
        let handle = thread::Builder::new()
            .name("solver".to_string())
            .spawn(move || run_worker(config, rx, replies))
            .map_err(ChannelError::Spawn)?;

        Ok(ThreadedSolver {
            requests: Some(tx),
            handle: Some(handle),
        })
    }
}

impl SolverChannel for ThreadedSolver {
    fn send(&mut self, request: SolverRequest) -> Result<(), ChannelError> {
        let requests = self.requests.as_ref().ok_or(ChannelError::Closed)?;
        requests.send(request).map_err(|_| ChannelError::Closed)
    }
}

impl Drop for ThreadedSolver {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("solver worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug)]
    struct Wrapped(SolverMessage);

    impl From<SolverMessage> for Wrapped {
        fn from(message: SolverMessage) -> Self {
            Wrapped(message)
        }
    }

    fn small_config() -> SolverConfig {
        SolverConfig {
            max_depth: 2,
            node_budget: 100_000,
            interrupt_check_nodes: 128,
        }
    }

    #[test]
    fn replies_are_converted_into_the_sink_type() {
        let (tx, rx) = mpsc::channel::<Wrapped>();
        let mut solver = ThreadedSolver::spawn(&small_config(), tx).unwrap();
        solver.send(SolverRequest::NewGame).unwrap();

        let Wrapped(first) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(first, SolverMessage::EvaluationUpdate { ply: 0, .. }));
    }

    #[test]
    fn drop_stops_the_worker() {
        let (tx, rx) = mpsc::channel::<Wrapped>();
        let solver = ThreadedSolver::spawn(&small_config(), tx).unwrap();
        drop(solver);

        // The worker owned the only sender; once joined, the sink disconnects.
        while rx.recv_timeout(Duration::from_secs(10)).is_ok() {}
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::TryRecvError::Disconnected)
        ));
    }
}
