//! Task Status Service
//!
//! タスクキューの状態をクライアント向けのステータスに変換する読み取り専用の層。

use serde::Serialize;

use crate::error::{Excel2MdError, Result};
use crate::queue::{TaskQueue, TaskState};
use crate::types::{ConversionResult, JobId};

/// ステータスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusKind {
    Pending,
    Progress,
    Success,
    Failure,
}

/// クライアントに返すジョブのステータス
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatus {
    pub task_id: JobId,
    pub status: StatusKind,
    pub progress: u8,
    pub message: String,
    pub current_sheet: Option<String>,
    pub total_sheets: usize,
    pub result: Option<ConversionResult>,
    pub error: Option<String>,
}

impl TaskStatus {
    fn new(task_id: JobId, status: StatusKind, message: impl Into<String>) -> Self {
        Self {
            task_id,
            status,
            progress: 0,
            message: message.into(),
            current_sheet: None,
            total_sheets: 0,
            result: None,
            error: None,
        }
    }

    /// ジョブの状態からステータスを生成
    pub fn from_state(task_id: JobId, state: TaskState) -> Self {
        match state {
            TaskState::Pending => Self::new(task_id, StatusKind::Pending, "Task is pending"),
            TaskState::Progress(info) => Self {
                progress: info.progress,
                current_sheet: info.current_sheet,
                total_sheets: info.total_sheets,
                ..Self::new(task_id, StatusKind::Progress, info.message)
            },
            TaskState::Success(result) => Self {
                progress: 100,
                total_sheets: result.total_sheets,
                result: Some(result),
                ..Self::new(task_id, StatusKind::Success, "Conversion completed")
            },
            TaskState::Failure(error) => Self {
                error: Some(error),
                ..Self::new(task_id, StatusKind::Failure, "Conversion failed")
            },
        }
    }
}

/// ステータス照会サービス
#[derive(Debug, Clone)]
pub struct TaskStatusService {
    queue: TaskQueue,
}

impl TaskStatusService {
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }

    /// ジョブのステータスを取得（未知のIDは`PENDING`）
    pub async fn status(&self, job_id: &JobId) -> TaskStatus {
        let state = self.queue.state(job_id).await;
        TaskStatus::from_state(job_id.clone(), state)
    }

    /// ジョブの結果を取得
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(ConversionResult))` - `SUCCESS`の場合
    /// * `Ok(None)` - まだ完了していない場合
    /// * `Err(Excel2MdError::TaskFailed)` - `FAILURE`の場合（エラーのテキストを保持）
    pub async fn result(&self, job_id: &JobId) -> Result<Option<ConversionResult>> {
        match self.queue.state(job_id).await {
            TaskState::Success(result) => Ok(Some(result)),
            TaskState::Failure(error) => Err(Excel2MdError::TaskFailed(error)),
            TaskState::Pending | TaskState::Progress(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressInfo;

    #[test]
    fn test_pending_status() {
        let status = TaskStatus::from_state(JobId::from("id"), TaskState::Pending);
        assert_eq!(status.status, StatusKind::Pending);
        assert_eq!(status.progress, 0);
        assert_eq!(status.message, "Task is pending");
    }

    #[test]
    fn test_progress_status_is_verbatim() {
        let info = ProgressInfo::new(36, "Converting sheet: B", 3).with_sheet("B");
        let status = TaskStatus::from_state(JobId::from("id"), TaskState::Progress(info));
        assert_eq!(status.status, StatusKind::Progress);
        assert_eq!(status.progress, 36);
        assert_eq!(status.message, "Converting sheet: B");
        assert_eq!(status.current_sheet.as_deref(), Some("B"));
        assert_eq!(status.total_sheets, 3);
    }

    #[test]
    fn test_failure_status() {
        let status = TaskStatus::from_state(JobId::from("id"), TaskState::Failure("boom".into()));
        assert_eq!(status.message, "Conversion failed");
        assert_eq!(status.error.as_deref(), Some("boom"));
        assert!(status.result.is_none());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "FAILURE");
    }

    #[tokio::test]
    async fn test_result_not_ready_for_unknown_job() {
        let service = TaskStatusService::new(TaskQueue::start(1));
        assert_eq!(service.result(&JobId::from("unknown")).await.unwrap(), None);
    }
}
