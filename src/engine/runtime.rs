//! Ordered command runtime.
//!
//! Commands submitted to a [`CommandRuntime`] run one at a time, to
//! completion, in submission order on a single worker thread. The submitter
//! gets a [`CommandHandle`] it may wait on. A full queue rejects new work
//! instead of blocking.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::debug;
use uuid::Uuid;

use crate::command::{CommandOutcome, CommandRequest};
use crate::engine::CrmEngine;
use crate::error::{CrmError, CrmResult, ExecutionError};

const WORKER_NAME: &str = "dealflow-command";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct CommandRuntimeConfig {
    /// Maximum queued commands.
    pub queue_capacity: usize,
}

impl Default for CommandRuntimeConfig {
    fn default() -> Self {
        Self { queue_capacity: 1024 }
    }
}

enum Job {
    Execute {
        request: CommandRequest,
        reply: Sender<CrmResult<CommandOutcome>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

/// Handle returned by [`CommandRuntime::submit`].
pub struct CommandHandle {
    request_id: Uuid,
    rx: Receiver<CrmResult<CommandOutcome>>,
}

impl CommandHandle {
    /// Request id of the submitted command.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Waits for the command to finish.
    pub fn join(self) -> CrmResult<CommandOutcome> {
        self.rx
            .recv()
            .map_err(|_| CrmError::Execution(ExecutionError::Disconnected))?
    }

    /// Waits at most `timeout`. The command keeps running if the wait
    /// times out.
    pub fn join_timeout(self, timeout: Duration) -> CrmResult<CommandOutcome> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => CrmError::Execution(ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => CrmError::Execution(ExecutionError::Disconnected),
        })?
    }
}

/// Single-worker queue in front of a [`CrmEngine`].
pub struct CommandRuntime {
    engine: CrmEngine,
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    queue_capacity: usize,
}

impl CommandRuntime {
    /// Starts the worker thread.
    pub fn new(engine: CrmEngine, config: CommandRuntimeConfig) -> CrmResult<Self> {
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let worker_engine = engine.clone();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || run_worker(&worker_engine, &rx))
            .map_err(|err| CrmError::internal(format!("failed to spawn command worker: {err}")))?;

        Ok(Self {
            engine,
            tx: Some(tx),
            worker: Some(worker),
            queue_capacity,
        })
    }

    /// Queues a command without waiting for it.
    pub fn submit(&self, request: impl Into<CommandRequest>) -> CrmResult<CommandHandle> {
        let request = request.into();
        let request_id = request.request_id;
        let (reply, rx) = bounded::<CrmResult<CommandOutcome>>(1);
        self.try_submit(Job::Execute { request, reply })?;
        debug!(%request_id, "command queued");
        Ok(CommandHandle { request_id, rx })
    }

    /// Queues a command and waits for its result.
    pub fn execute(&self, request: impl Into<CommandRequest>) -> CrmResult<CommandOutcome> {
        self.submit(request)?.join()
    }

    /// Returns the engine commands run against.
    #[must_use]
    pub const fn engine(&self) -> &CrmEngine {
        &self.engine
    }

    fn try_submit(&self, job: Job) -> CrmResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or(CrmError::Execution(ExecutionError::Disconnected))?;
        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(CrmError::Execution(ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            })),
            Err(TrySendError::Disconnected(_)) => Err(CrmError::Execution(ExecutionError::Disconnected)),
        }
    }

    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> CrmResult<Receiver<()>> {
        let (reply, rx) = bounded::<()>(1);
        self.try_submit(Job::Sleep { duration, reply })?;
        Ok(rx)
    }
}

fn run_worker(engine: &CrmEngine, rx: &Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Execute { request, reply } => {
                let _ = reply.send(engine.execute_request(request));
            }

            #[cfg(test)]
            Job::Sleep { duration, reply } => {
                thread::sleep(duration);
                let _ = reply.send(());
            }
        }
    }
}

impl Drop for CommandRuntime {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued, then exit.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::command::Command;
    use crate::contact::ContactPatch;
    use crate::deal::{DealId, DealPatch, DealStage};
    use crate::storage::{DealStore, InMemoryStores};

    fn runtime(queue_capacity: usize) -> CommandRuntime {
        let engine = CrmEngine::from_memory(InMemoryStores::default());
        CommandRuntime::new(engine, CommandRuntimeConfig { queue_capacity }).unwrap()
    }

    #[test]
    fn commands_run_in_submission_order() {
        let stores = InMemoryStores::default();
        let deal = stores.deals.create(DealPatch::new().title("Renewal")).unwrap();
        let runtime = CommandRuntime::new(CrmEngine::from_memory(stores), CommandRuntimeConfig::default()).unwrap();

        let handles: Vec<CommandHandle> = [DealStage::Qualified, DealStage::Proposal, DealStage::Negotiation]
            .into_iter()
            .map(|stage| runtime.submit(Command::MoveDeal { id: deal.id, stage }).unwrap())
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(runtime.engine().deal(deal.id).unwrap().stage, DealStage::Negotiation);
    }

    #[test]
    fn full_queue_rejects_new_work() {
        let runtime = runtime(1);
        let busy = runtime.submit_sleep(Duration::from_millis(200)).unwrap();
        // Wait until the worker has picked the sleep up, then fill the one slot.
        thread::sleep(Duration::from_millis(50));
        let queued = runtime.submit_sleep(Duration::from_millis(1)).unwrap();

        let err = runtime
            .submit(Command::CreateContact(ContactPatch::new()))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CrmError::Execution(ExecutionError::QueueFull { capacity: 1 })
        ));

        busy.recv_timeout(Duration::from_secs(1)).unwrap();
        queued.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn join_timeout_reports_timeout_while_busy() {
        let runtime = runtime(4);
        let _busy = runtime.submit_sleep(Duration::from_millis(200)).unwrap();
        let handle = runtime.submit(Command::DeleteDeal(DealId::new(1))).unwrap();
        let err = handle.join_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(
            err,
            CrmError::Execution(ExecutionError::Timeout { duration_ms: 10 })
        ));
    }

    #[test]
    fn failed_commands_come_back_through_the_handle() {
        let runtime = runtime(4);
        let handle = runtime.submit(Command::DeleteDeal(DealId::new(9))).unwrap();
        let request_id = handle.request_id();
        assert!(!request_id.is_nil());
        assert!(handle.join().unwrap_err().is_not_found());
    }

    #[test]
    fn join_reports_disconnected_when_reply_sender_dropped() {
        let (tx, rx) = bounded::<CrmResult<CommandOutcome>>(1);
        drop(tx);
        let handle = CommandHandle {
            request_id: Uuid::new_v4(),
            rx,
        };
        let err = handle.join().unwrap_err();
        assert!(matches!(err, CrmError::Execution(ExecutionError::Disconnected)));
    }

    #[test]
    fn join_timeout_reports_disconnected_not_timeout_when_reply_sender_dropped() {
        let (tx, rx) = bounded::<CrmResult<CommandOutcome>>(1);
        drop(tx);
        let handle = CommandHandle {
            request_id: Uuid::new_v4(),
            rx,
        };
        let err = handle.join_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, CrmError::Execution(ExecutionError::Disconnected)));
    }
}
