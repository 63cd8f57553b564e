// THEORY:
// The `SessionPool` hosts many independent sessions at once, as a serving layer
// handling concurrent requests would. It is a fixed set of tokio worker tasks, each
// owning a private map of sessions and fed through its own unbounded channel.
//
// Key architectural principles:
// 1.  **Pinned sessions**: A session lives on exactly one worker, chosen from its id.
//     All commands for that session travel down the same channel, so its frames are
//     processed strictly in arrival order and its state is never touched by two tasks.
// 2.  **Request/reply**: Every command carries a `oneshot` sender for its answer, so a
//     caller simply awaits the result of the frame it submitted.
// 3.  **No shared mutable state**: Workers share nothing but the id counter. A slow
//     session only delays the sessions pinned to the same worker.

use crate::pipeline::{ActivitySession, Assessment, FrameSize, KeypointSet, SessionConfig, WindowStatistics};
use crate::summary::{SessionSummary, SummaryAccumulator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub type SessionId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("session {0} is not open")]
    UnknownSession(SessionId),
    #[error("worker {0} has shut down")]
    WorkerUnavailable(usize),
    #[error("worker {0} dropped the request without replying")]
    NoReply(usize),
}

type Reply<T> = oneshot::Sender<Result<T, PoolError>>;

enum Command {
    Open {
        id: SessionId,
        config: SessionConfig,
        reply: Reply<()>,
    },
    Submit {
        id: SessionId,
        keypoints: Option<KeypointSet>,
        frame: FrameSize,
        reply: Reply<Option<Assessment>>,
    },
    Statistics {
        id: SessionId,
        reply: Reply<Option<WindowStatistics>>,
    },
    Close {
        id: SessionId,
        reply: Reply<SessionSummary>,
    },
}

/// A session plus the bookkeeping needed to summarize it.
struct HostedSession {
    session: ActivitySession,
    /// The configuration as the caller sent it, before clamping. The summary reports it.
    requested: SessionConfig,
    summary: SummaryAccumulator,
    opened_at: Instant,
}

impl HostedSession {
    fn open(config: SessionConfig) -> Self {
        Self {
            session: ActivitySession::new(config.clone()),
            requested: config,
            summary: SummaryAccumulator::new(),
            opened_at: Instant::now(),
        }
    }

    fn submit(&mut self, keypoints: Option<KeypointSet>, frame: FrameSize) -> Option<Assessment> {
        let (assessment, statistics) = match keypoints {
            Some(keypoints) => {
                let (assessment, statistics) = self.session.process_frame_with_statistics(&keypoints, frame);
                (Some(assessment), statistics)
            }
            None => (None, None),
        };
        self.summary.record(assessment.as_ref(), statistics.as_ref());
        assessment
    }

    fn finish(&self) -> SessionSummary {
        self.summary.finish(&self.requested, self.opened_at.elapsed())
    }
}

/// A fixed pool of workers hosting independent sessions.
pub struct SessionPool {
    senders: Vec<mpsc::UnboundedSender<Command>>,
    workers: Vec<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl SessionPool {
    /// Spawns `worker_count` workers (at least one). Must be called inside a tokio runtime.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..worker_count).map(|_| mpsc::unbounded_channel::<Command>()).unzip();

        let workers = receivers
            .into_iter()
            .enumerate()
            .map(|(index, receiver)| tokio::spawn(Self::run_worker(index, receiver)))
            .collect();

        debug!(worker_count, "session pool started");
        Self {
            senders,
            workers,
            next_id: AtomicU64::new(0),
        }
    }

    /// One worker per logical CPU.
    pub fn with_default_workers() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    async fn run_worker(index: usize, mut receiver: mpsc::UnboundedReceiver<Command>) {
        let mut sessions: HashMap<SessionId, HostedSession> = HashMap::new();

        while let Some(command) = receiver.recv().await {
            match command {
                Command::Open { id, config, reply } => {
                    info!(session = id, worker = index, fps = config.fps, mode = %config.mode, "session opened");
                    sessions.insert(id, HostedSession::open(config));
                    let _ = reply.send(Ok(()));
                }
                Command::Submit { id, keypoints, frame, reply } => {
                    let result = match sessions.get_mut(&id) {
                        Some(hosted) => Ok(hosted.submit(keypoints, frame)),
                        None => Err(PoolError::UnknownSession(id)),
                    };
                    let _ = reply.send(result);
                }
                Command::Statistics { id, reply } => {
                    let result = sessions
                        .get(&id)
                        .map(|hosted| hosted.session.current_statistics())
                        .ok_or(PoolError::UnknownSession(id));
                    let _ = reply.send(result);
                }
                Command::Close { id, reply } => {
                    let result = match sessions.remove(&id) {
                        Some(hosted) => {
                            let summary = hosted.finish();
                            info!(
                                session = id,
                                frames = summary.frames_processed,
                                last_label = ?summary.last_label,
                                "session closed"
                            );
                            Ok(summary)
                        }
                        None => Err(PoolError::UnknownSession(id)),
                    };
                    let _ = reply.send(result);
                }
            }
        }
        debug!(worker = index, "session worker stopped");
    }

    fn worker_for(&self, id: SessionId) -> usize {
        (id % self.senders.len() as u64) as usize
    }

    async fn request<T>(
        &self,
        id: SessionId,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, PoolError> {
        let worker = self.worker_for(id);
        let (reply, response) = oneshot::channel();
        self.senders[worker]
            .send(command(reply))
            .map_err(|_| PoolError::WorkerUnavailable(worker))?;
        response.await.map_err(|_| PoolError::NoReply(worker))?
    }

    /// Opens a new session and returns its id.
    pub async fn open(&self, config: SessionConfig) -> Result<SessionId, PoolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.request(id, |reply| Command::Open { id, config, reply }).await?;
        Ok(id)
    }

    /// Processes one frame. `keypoints` is `None` when no person was detected; the
    /// frame is counted in the summary but produces no assessment.
    pub async fn submit(
        &self,
        id: SessionId,
        keypoints: Option<KeypointSet>,
        frame: FrameSize,
    ) -> Result<Option<Assessment>, PoolError> {
        self.request(id, |reply| Command::Submit { id, keypoints, frame, reply }).await
    }

    /// Current window statistics of a session.
    pub async fn statistics(&self, id: SessionId) -> Result<Option<WindowStatistics>, PoolError> {
        self.request(id, |reply| Command::Statistics { id, reply }).await
    }

    /// Ends a session and returns its summary.
    pub async fn close(&self, id: SessionId) -> Result<SessionSummary, PoolError> {
        self.request(id, |reply| Command::Close { id, reply }).await
    }

    /// Stops accepting commands and waits for every worker to drain its queue.
    pub async fn shutdown(self) {
        drop(self.senders);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ActivityClass, Keypoint};
    use crate::summary::TemporalStats;

    const FRAME: FrameSize = FrameSize::new(640, 720);

    fn standing_keypoints() -> KeypointSet {
        let mut points = vec![Keypoint::new(0.0, 0.0, 1.0); 33];
        let joints = [
            (11, 350.0, 200.0),
            (12, 250.0, 200.0),
            (13, 350.0, 280.0),
            (14, 250.0, 280.0),
            (15, 400.0, 280.0),
            (16, 200.0, 280.0),
            (23, 330.0, 350.0),
            (24, 270.0, 350.0),
            (25, 330.0, 450.0),
            (26, 270.0, 450.0),
            (27, 330.0, 550.0),
            (28, 270.0, 550.0),
        ];
        for (index, x, y) in joints {
            points[index] = Keypoint::new(x, y, 1.0);
        }
        KeypointSet::from_pixels(&points)
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = SessionPool::new(2);
        let id = pool.open(SessionConfig::default()).await.unwrap();

        assert_eq!(pool.statistics(id).await.unwrap(), None);
        assert_eq!(pool.submit(id, None, FRAME).await.unwrap(), None);

        let mut last = None;
        for _ in 0..5 {
            last = pool.submit(id, Some(standing_keypoints()), FRAME).await.unwrap();
        }
        let last = last.expect("detected frames are assessed");
        assert_eq!(last.label, Some(ActivityClass::Standing));
        assert!(pool.statistics(id).await.unwrap().is_some());

        let summary = pool.close(id).await.unwrap();
        assert_eq!(summary.frames_processed, 6);
        assert_eq!(summary.last_label.as_deref(), Some("standing"));
        assert_eq!(summary.max_score, Some(100));
        assert!(summary.temporal_stats.is_some());

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let pool = SessionPool::new(1);
        assert_eq!(pool.submit(7, None, FRAME).await, Err(PoolError::UnknownSession(7)));
        assert_eq!(pool.close(7).await.unwrap_err(), PoolError::UnknownSession(7));

        let id = pool.open(SessionConfig::default()).await.unwrap();
        pool.close(id).await.unwrap();
        assert_eq!(pool.statistics(id).await, Err(PoolError::UnknownSession(id)));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let pool = SessionPool::new(3);
        let busy = pool.open(SessionConfig::default()).await.unwrap();
        let idle = pool.open(SessionConfig { mode: "plank".into(), ..SessionConfig::default() }).await.unwrap();
        assert_ne!(busy, idle);

        let submissions = (0..4).map(|_| pool.submit(busy, Some(standing_keypoints()), FRAME));
        for result in futures::future::join_all(submissions).await {
            assert!(result.unwrap().is_some());
        }

        let idle_summary = pool.close(idle).await.unwrap();
        assert_eq!(idle_summary.frames_processed, 0);
        assert_eq!(idle_summary.mode, "plank");
        assert_eq!(pool.close(busy).await.unwrap().frames_processed, 4);
    }

    #[test]
    fn submitted_frames_record_the_assessed_snapshot() {
        let mut hosted = HostedSession::open(SessionConfig::default());
        assert_eq!(hosted.submit(None, FRAME), None);
        for _ in 0..4 {
            hosted.submit(Some(standing_keypoints()), FRAME);
        }
        let snapshot = hosted.session.current_statistics().expect("valid frames were pushed");
        let summary = hosted.finish();
        assert_eq!(summary.frames_processed, 5);
        assert_eq!(summary.temporal_stats, Some(TemporalStats::from(&snapshot)));
    }

    #[tokio::test]
    async fn summary_reports_the_requested_fps() {
        let pool = SessionPool::new(1);
        let id = pool.open(SessionConfig { fps: 0.5, ..SessionConfig::default() }).await.unwrap();
        for _ in 0..3 {
            pool.submit(id, Some(standing_keypoints()), FRAME).await.unwrap();
        }
        let summary = pool.close(id).await.unwrap();
        assert_eq!(summary.input_fps, 0.5);
        assert_eq!(summary.duration_seconds, 6.0);
    }

    #[tokio::test]
    async fn oversized_window_config_opens_normally() {
        let pool = SessionPool::new(2);
        let long = pool.open(SessionConfig { window_seconds: 1e30, ..SessionConfig::default() }).await.unwrap();
        let fast = pool.open(SessionConfig { fps: 1e12, ..SessionConfig::default() }).await.unwrap();
        for id in [long, fast] {
            let assessment = pool.submit(id, Some(standing_keypoints()), FRAME).await.unwrap();
            assert_eq!(assessment.and_then(|a| a.label), Some(ActivityClass::Standing));
            assert_eq!(pool.close(id).await.unwrap().frames_processed, 1);
        }
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn worker_count_has_a_floor() {
        assert_eq!(SessionPool::new(0).worker_count(), 1);
        assert!(SessionPool::with_default_workers().worker_count() >= 1);
    }
}
