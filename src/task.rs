//! Conversion Task
//!
//! 1件のジョブを実行するパイプライン（読み込み → シートごとの出力 → アーカイブ）。
//! 進捗はチャネル経由のイベントとして送信され、タスク自身は状態を持ちません。

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::packager;
use crate::parser;
use crate::storage::JobDirectory;
use crate::types::{ConversionJob, ConversionResult, JobId, ProgressInfo, SheetResult, SheetResults};

/// タスクから結果ストアへ送信されるイベント
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// 進捗のチェックポイント
    Progress { job_id: JobId, info: ProgressInfo },

    /// 成功（終端）
    Succeeded {
        job_id: JobId,
        result: ConversionResult,
    },

    /// 失敗（終端）
    Failed { job_id: JobId, error: String },
}

impl TaskEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            TaskEvent::Progress { job_id, .. }
            | TaskEvent::Succeeded { job_id, .. }
            | TaskEvent::Failed { job_id, .. } => job_id,
        }
    }
}

/// 実行中タスクの進捗通知
///
/// 1ジョブに束縛された送信側です。受信側が閉じている場合、通知は破棄されます。
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    job_id: JobId,
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl ProgressReporter {
    pub fn new(job_id: JobId, tx: mpsc::UnboundedSender<TaskEvent>) -> Self {
        Self { job_id, tx }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// 進捗を通知する
    pub fn report(&self, info: ProgressInfo) {
        debug!(task_id = %self.job_id, progress = info.progress, message = %info.message, "Progress");
        self.send(TaskEvent::Progress {
            job_id: self.job_id.clone(),
            info,
        });
    }

    pub(crate) fn send(&self, event: TaskEvent) {
        if self.tx.send(event).is_err() {
            debug!(task_id = %self.job_id, "Progress receiver closed, event dropped");
        }
    }
}

/// 変換タスク
///
/// ジョブと、そのジョブ専用のアップロード・結果ディレクトリを受け取って実行されます。
/// タスクはこの2つのディレクトリ以外のファイルに触れません。
#[derive(Debug, Clone)]
pub struct ConversionTask {
    job: ConversionJob,
    uploads: JobDirectory,
    results: JobDirectory,
}

impl ConversionTask {
    pub fn new(job: ConversionJob, uploads: JobDirectory, results: JobDirectory) -> Self {
        Self {
            job,
            uploads,
            results,
        }
    }

    pub fn job(&self) -> &ConversionJob {
        &self.job
    }

    /// ジョブを実行する（ブロッキング）
    ///
    /// 進捗は次の順に通知されます:
    /// `0` 読み込み開始 → `10` シート数判明 → シートごとに`10 + i*80/N`
    /// → 複数の成果物がある場合のみ`95`。
    ///
    /// 行のないシート、名前が空のシートは出力されません。途中でエラーが
    /// 発生した場合、書き込み済みのファイルはそのまま残ります。
    ///
    /// # 戻り値
    ///
    /// * `Ok(ConversionResult)` - 変換に成功した場合
    /// * `Err(Excel2MdError)` - 読み込み・出力・アーカイブ作成のいずれかに失敗した場合
    pub fn run(&self, reporter: &ProgressReporter) -> Result<ConversionResult> {
        let job = &self.job;
        info!(
            task_id = %job.id,
            filename = %job.original_filename,
            format = %job.output_format,
            "Starting conversion"
        );

        reporter.report(ProgressInfo::new(0, "Reading Excel file", 0));

        let content = self.uploads.read(&job.upload_name)?;
        let sheets = parser::ingest(content, &job.original_filename, job.use_headers)?;
        let total_sheets = sheets.len();

        info!(task_id = %job.id, total_sheets, "Found sheets in file");
        reporter.report(ProgressInfo::new(
            10,
            format!("Found {} sheet(s)", total_sheets),
            total_sheets,
        ));

        self.results.create()?;

        let mut sheet_results = SheetResults::new();
        let mut written = Vec::new();

        for (index, sheet) in sheets.iter().enumerate() {
            let progress = 10 + (index * 80 / total_sheets) as u8;
            reporter.report(
                ProgressInfo::new(
                    progress,
                    format!("Converting sheet: {}", sheet.name),
                    total_sheets,
                )
                .with_sheet(sheet.name.clone()),
            );

            if sheet.name.is_empty() || sheet.rows.is_empty() {
                warn!(task_id = %job.id, sheet = %sheet.name, "Sheet has no rows, skipped");
                continue;
            }

            let content = job.output_format.render(sheet)?;
            let file_name = format!("{}.{}", sheet.name, job.output_format.extension());
            self.results.write(&file_name, &content)?;

            debug!(task_id = %job.id, sheet = %sheet.name, file = %file_name, "Sheet converted");

            sheet_results.insert(
                sheet.name.clone(),
                SheetResult {
                    content,
                    row_count: sheet.row_count(),
                    column_count: sheet.column_count(),
                },
            );
            if !written.contains(&file_name) {
                written.push(file_name);
            }
        }

        if written.len() > 1 {
            reporter.report(ProgressInfo::new(95, "Creating ZIP archive", total_sheets));
        }
        let archive_path = packager::package(&self.results, &written)?;

        info!(task_id = %job.id, sheets = sheet_results.len(), "Conversion completed");

        Ok(ConversionResult {
            task_id: job.id.clone(),
            original_filename: job.original_filename.clone(),
            result_dir: self.results.path().to_path_buf(),
            total_sheets: sheet_results.len(),
            has_archive: archive_path.is_some(),
            archive_path,
            sheets: sheet_results,
        })
    }
}
