//! Conversion Service
//!
//! アップロードの受け付け、ジョブの投入、ステータス照会、成果物の取得を
//! まとめたファサード。HTTP層はこのサービスだけを呼び出します。

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::api::OutputFormat;
use crate::config::ServiceConfig;
use crate::error::{Excel2MdError, Result};
use crate::packager::ARCHIVE_NAME;
use crate::queue::TaskQueue;
use crate::security::UploadLimits;
use crate::status::{TaskStatus, TaskStatusService};
use crate::storage::Storage;
use crate::task::ConversionTask;
use crate::types::{ConversionJob, ConversionResult, JobId};

/// ダウンロード対象の成果物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,

    /// クライアントに提示するファイル名
    pub filename: String,

    pub content_type: &'static str,
}

/// タスクファイルの削除結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub uploads_removed: bool,
    pub results_removed: bool,
}

/// 変換サービス
#[derive(Debug, Clone)]
pub struct ConversionService {
    config: ServiceConfig,
    storage: Storage,
    limits: UploadLimits,
    queue: TaskQueue,
    status: TaskStatusService,
}

impl ConversionService {
    /// サービスを生成し、ストレージの作成とワーカーの起動を行う
    ///
    /// Tokioランタイム内で呼び出す必要があります。
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let storage = Storage::new(config.uploads_dir(), config.results_dir());
        storage.ensure_roots()?;

        let queue = TaskQueue::start(config.workers);
        info!(
            storage = %config.storage_dir.display(),
            workers = config.workers,
            max_file_size_mb = config.max_file_size_mb,
            "Conversion service started"
        );

        Ok(Self {
            limits: UploadLimits::new(config.max_file_size_mb),
            status: TaskStatusService::new(queue.clone()),
            config,
            storage,
            queue,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// アップロードを受け付ける前の検証（ファイル名、拡張子、宣言サイズ）
    pub fn validate_upload(&self, filename: &str, declared_size: Option<u64>) -> Result<()> {
        self.limits.validate_upload(filename, declared_size)
    }

    /// アップロードを保存し、変換ジョブを投入する
    ///
    /// 検証エラーはジョブを作成せずに同期的に返されます。
    ///
    /// # 戻り値
    ///
    /// * `Ok(JobId)` - 投入されたジョブのID
    /// * `Err(Excel2MdError::InvalidFormat)` - ファイル名または拡張子が不正な場合
    /// * `Err(Excel2MdError::FileTooLarge)` - サイズ上限を超える場合
    pub fn submit(
        &self,
        filename: &str,
        content: Vec<u8>,
        use_headers: bool,
        output_format: OutputFormat,
    ) -> Result<JobId> {
        self.limits.validate_upload(filename, None)?;
        self.limits.check_content_size(content.len())?;

        let job_id = JobId::generate();
        let upload_name = base_name(filename);
        let uploads = self.storage.uploads(&job_id);
        let source_path = uploads.write(upload_name, &content)?;
        info!(task_id = %job_id, path = %source_path.display(), "Saved uploaded file");

        let job = ConversionJob {
            id: job_id.clone(),
            upload_name: upload_name.to_string(),
            original_filename: filename.to_string(),
            use_headers,
            output_format,
        };
        let task = ConversionTask::new(job, uploads, self.storage.results(&job_id));
        self.queue.submit(task)?;

        info!(task_id = %job_id, format = %output_format, "Started conversion task");
        Ok(job_id)
    }

    pub async fn status(&self, job_id: &JobId) -> TaskStatus {
        self.status.status(job_id).await
    }

    pub async fn result(&self, job_id: &JobId) -> Result<Option<ConversionResult>> {
        self.status.result(job_id).await
    }

    /// ダウンロードする成果物を解決する
    ///
    /// - `file`指定あり: その成果物
    /// - アーカイブあり: `<元のファイル名の語幹>.zip`としてアーカイブ
    /// - それ以外: アーカイブ以外の最初の成果物
    ///
    /// # 戻り値
    ///
    /// * `Ok(Download)` - 成果物が見つかった場合
    /// * `Err(Excel2MdError::NotFound)` - ジョブが成功していない、または成果物がない場合
    pub async fn download(&self, job_id: &JobId, file: Option<&str>) -> Result<Download> {
        let result = match self.status.result(job_id).await {
            Ok(Some(result)) => result,
            Ok(None) | Err(_) => {
                return Err(Excel2MdError::NotFound("Task result not found".to_string()))
            }
        };
        let results = self.storage.results(job_id);

        if let Some(name) = file.filter(|name| !name.is_empty()) {
            if !results.contains(name) {
                return Err(Excel2MdError::NotFound(format!(
                    "Result file not found: {}",
                    name
                )));
            }
            return Ok(Download {
                path: results.entry_path(name)?,
                filename: name.to_string(),
                content_type: "application/octet-stream",
            });
        }

        if result.has_archive {
            if !results.contains(ARCHIVE_NAME) {
                return Err(Excel2MdError::NotFound("ZIP archive not found".to_string()));
            }
            return Ok(Download {
                path: results.entry_path(ARCHIVE_NAME)?,
                filename: format!("{}.zip", file_stem(&result.original_filename)),
                content_type: "application/zip",
            });
        }

        let name = results
            .list()?
            .into_iter()
            .find(|name| name != ARCHIVE_NAME)
            .ok_or_else(|| Excel2MdError::NotFound("No result files found".to_string()))?;

        Ok(Download {
            path: results.entry_path(&name)?,
            filename: name,
            content_type: "application/octet-stream",
        })
    }

    /// ジョブのアップロードと成果物を削除する
    pub fn cleanup_task_files(&self, job_id: &JobId) -> Result<CleanupReport> {
        let report = CleanupReport {
            uploads_removed: self.storage.uploads(job_id).remove()?,
            results_removed: self.storage.results(job_id).remove()?,
        };
        info!(
            task_id = %job_id,
            uploads = report.uploads_removed,
            results = report.results_removed,
            "Cleaned up task files"
        );
        Ok(report)
    }
}

/// パス区切りを除いたファイル名
fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// 拡張子を除いたファイル名（空の場合は`result`）
fn file_stem(filename: &str) -> &str {
    let name = base_name(filename);
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(index) => &name[..index],
    };
    if stem.is_empty() {
        "result"
    } else {
        stem
    }
}
