use hedgeguard_core::GuardEvent;
use tokio::time::Instant;

/// Events emitted by a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A new worker was started for a submitted task.
    WorkerSpawned {
        name: String,
        timestamp: Instant,
        active_workers: usize,
    },
    /// A worker stayed idle for its whole lifetime and exited.
    WorkerRetired {
        name: String,
        timestamp: Instant,
        active_workers: usize,
    },
    /// A task went straight to an idle worker.
    TaskHandedOff { name: String, timestamp: Instant },
    /// Every worker was busy and the pool was full, so a submission had to wait.
    SubmissionBlocked { name: String, timestamp: Instant },
}

impl GuardEvent for PoolEvent {
    fn kind(&self) -> &'static str {
        match self {
            PoolEvent::WorkerSpawned { .. } => "worker_spawned",
            PoolEvent::WorkerRetired { .. } => "worker_retired",
            PoolEvent::TaskHandedOff { .. } => "task_handed_off",
            PoolEvent::SubmissionBlocked { .. } => "submission_blocked",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PoolEvent::WorkerSpawned { timestamp, .. }
            | PoolEvent::WorkerRetired { timestamp, .. }
            | PoolEvent::TaskHandedOff { timestamp, .. }
            | PoolEvent::SubmissionBlocked { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            PoolEvent::WorkerSpawned { name, .. }
            | PoolEvent::WorkerRetired { name, .. }
            | PoolEvent::TaskHandedOff { name, .. }
            | PoolEvent::SubmissionBlocked { name, .. } => name,
        }
    }
}
