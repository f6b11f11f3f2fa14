//! Task Queue
//!
//! プロセス内のタスクキュー。固定数のワーカーが1つのジョブチャネルを共有し、
//! 各ジョブはブロッキングスレッド上で逐次実行されます。
//! タスクが送信したイベントは収集タスクが1本のチャネルから受け取り、
//! `TaskStore`に反映します。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{Excel2MdError, Result};
use crate::task::{ConversionTask, ProgressReporter, TaskEvent};
use crate::types::{ConversionResult, JobId, ProgressInfo};

/// ジョブの状態
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    /// 未開始（未知のIDも含む）
    Pending,

    /// 実行中（最新のチェックポイント）
    Progress(ProgressInfo),

    /// 成功
    Success(ConversionResult),

    /// 失敗（エラーの説明）
    Failure(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success(_) | TaskState::Failure(_))
    }
}

/// すべてのジョブの状態を保持するストア
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<JobId, TaskState>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// イベントを反映する
    ///
    /// 終端状態に到達したジョブへのイベントと、進捗を後退させるイベントは
    /// 無視されます。
    pub async fn apply(&self, event: TaskEvent) {
        let mut tasks = self.tasks.write().await;
        let current = tasks.entry(event.job_id().clone()).or_insert(TaskState::Pending);

        if current.is_terminal() {
            debug!(task_id = %event.job_id(), "Event after terminal state ignored");
            return;
        }

        match event {
            TaskEvent::Progress { info, .. } => {
                if let TaskState::Progress(previous) = current {
                    if info.progress < previous.progress {
                        return;
                    }
                }
                *current = TaskState::Progress(info);
            }
            TaskEvent::Succeeded { result, .. } => {
                *current = TaskState::Success(result);
            }
            TaskEvent::Failed { error, .. } => {
                *current = TaskState::Failure(error);
            }
        }
    }

    /// ジョブの状態（未知のIDは`Pending`）
    pub async fn get(&self, job_id: &JobId) -> TaskState {
        self.tasks
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or(TaskState::Pending)
    }
}

/// 複数のワーカーで1つのチャネルを共有する受信側
struct SharedReceiver<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> SharedReceiver<T> {
    fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

/// タスクキュー
///
/// `start`はTokioランタイム内で呼び出す必要があります。
#[derive(Debug, Clone)]
pub struct TaskQueue {
    jobs: mpsc::UnboundedSender<ConversionTask>,
    store: TaskStore,
}

impl TaskQueue {
    /// ワーカーと収集タスクを起動する
    ///
    /// # 引数
    ///
    /// * `workers` - 同時に実行するジョブの最大数（0の場合は1）
    pub fn start(workers: usize) -> Self {
        let store = TaskStore::new();
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        spawn_collector(events_rx, store.clone());
        spawn_workers(workers.max(1), SharedReceiver::new(jobs_rx), events_tx);

        Self {
            jobs: jobs_tx,
            store,
        }
    }

    /// ジョブをキューに投入する
    ///
    /// # 戻り値
    ///
    /// * `Ok(JobId)` - 投入されたジョブのID
    /// * `Err(Excel2MdError::TaskFailed)` - ワーカーが停止している場合
    pub fn submit(&self, task: ConversionTask) -> Result<JobId> {
        let job_id = task.job().id.clone();
        self.jobs
            .send(task)
            .map_err(|_| Excel2MdError::TaskFailed("Task queue is closed".to_string()))?;
        debug!(task_id = %job_id, "Task queued");
        Ok(job_id)
    }

    pub async fn state(&self, job_id: &JobId) -> TaskState {
        self.store.get(job_id).await
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }
}

fn spawn_collector(mut events: mpsc::UnboundedReceiver<TaskEvent>, store: TaskStore) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            store.apply(event).await;
        }
    });
}

fn spawn_workers(
    count: usize,
    rx: SharedReceiver<ConversionTask>,
    events: mpsc::UnboundedSender<TaskEvent>,
) {
    for worker in 0..count {
        let rx = rx.clone();
        let events = events.clone();

        tokio::spawn(async move {
            debug!(worker, "Conversion worker started");

            while let Some(task) = rx.recv().await {
                let job_id = task.job().id.clone();
                let reporter = ProgressReporter::new(job_id.clone(), events.clone());

                let outcome = {
                    let reporter = reporter.clone();
                    tokio::task::spawn_blocking(move || task.run(&reporter)).await
                };

                let event = match outcome {
                    Ok(Ok(result)) => {
                        info!(task_id = %job_id, worker, "Task succeeded");
                        TaskEvent::Succeeded { job_id, result }
                    }
                    Ok(Err(e)) => {
                        error!(task_id = %job_id, worker, error = %e, "Conversion failed");
                        TaskEvent::Failed {
                            job_id,
                            error: e.to_string(),
                        }
                    }
                    Err(e) => {
                        error!(task_id = %job_id, worker, error = %e, "Conversion task panicked");
                        TaskEvent::Failed {
                            job_id,
                            error: format!("Task panicked: {}", e),
                        }
                    }
                };
                reporter.send(event);
            }

            debug!(worker, "Conversion worker stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SheetResults;
    use std::path::PathBuf;

    fn progress(job: &str, value: u8) -> TaskEvent {
        TaskEvent::Progress {
            job_id: JobId::from(job),
            info: ProgressInfo::new(value, "Converting", 1),
        }
    }

    fn success(job: &str) -> TaskEvent {
        TaskEvent::Succeeded {
            job_id: JobId::from(job),
            result: ConversionResult {
                task_id: JobId::from(job),
                original_filename: "book.xlsx".to_string(),
                result_dir: PathBuf::from("results").join(job),
                sheets: SheetResults::new(),
                total_sheets: 0,
                has_archive: false,
                archive_path: None,
            },
        }
    }

    #[tokio::test]
    async fn test_unknown_job_is_pending() {
        let store = TaskStore::new();
        assert_eq!(store.get(&JobId::from("missing")).await, TaskState::Pending);
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let store = TaskStore::new();
        store.apply(progress("job", 50)).await;
        store.apply(progress("job", 10)).await;

        match store.get(&JobId::from("job")).await {
            TaskState::Progress(info) => assert_eq!(info.progress, 50),
            other => panic!("Expected Progress, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_terminal_state_is_final() {
        let store = TaskStore::new();
        store.apply(progress("job", 10)).await;
        store.apply(success("job")).await;
        store.apply(progress("job", 95)).await;
        store
            .apply(TaskEvent::Failed {
                job_id: JobId::from("job"),
                error: "late".to_string(),
            })
            .await;

        assert!(matches!(
            store.get(&JobId::from("job")).await,
            TaskState::Success(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_task_reaches_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let queue = TaskQueue::start(2);
        let job = crate::types::ConversionJob {
            id: JobId::from("broken"),
            upload_name: "missing.xlsx".to_string(),
            original_filename: "missing.xlsx".to_string(),
            use_headers: true,
            output_format: crate::api::OutputFormat::Markdown,
        };
        let uploads = crate::storage::JobDirectory::new(dir.path().join("uploads"));
        let results = crate::storage::JobDirectory::new(dir.path().join("results"));
        let id = queue.submit(ConversionTask::new(job, uploads, results)).unwrap();

        let mut state = TaskState::Pending;
        for _ in 0..200 {
            state = queue.state(&id).await;
            if state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        match state {
            TaskState::Failure(error) => assert_eq!(error, "Not found: File not found: missing.xlsx"),
            other => panic!("Expected Failure, got {:?}", other),
        }
    }
}
