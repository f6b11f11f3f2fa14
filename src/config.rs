//! Config Module
//!
//! Fluent Builder APIを提供し、変換サービスの設定を段階的に構築する。

use std::path::{Path, PathBuf};

use crate::error::{Excel2MdError, Result};

/// アップロードの最大サイズ（MB）のデフォルト値
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

/// 成果物の保持日数のデフォルト値
pub const DEFAULT_FILE_RETENTION_DAYS: u32 = 7;

/// 変換サービスの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// ストレージのルート（`uploads/`と`results/`を含む）
    pub storage_dir: PathBuf,

    /// アップロードの最大サイズ（MB）
    pub max_file_size_mb: u64,

    /// ワーカー数（同時に実行するジョブの最大数）
    pub workers: usize,

    /// 成果物の保持日数
    pub file_retention_days: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            workers: default_workers(),
            file_retention_days: DEFAULT_FILE_RETENTION_DAYS,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.storage_dir.join("uploads")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.storage_dir.join("results")
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// `ServiceConfig`を構築するビルダー
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみを
/// オーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use excel2md::ServiceConfigBuilder;
///
/// # fn main() -> Result<(), excel2md::Excel2MdError> {
/// let config = ServiceConfigBuilder::new()
///     .with_storage_dir("/tmp/excel2md")
///     .with_max_file_size_mb(20)
///     .with_workers(4)
///     .build()?;
/// assert_eq!(config.max_file_size_bytes(), 20 * 1024 * 1024);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// デフォルト設定を持つビルダーを生成する
    ///
    /// # デフォルト設定
    ///
    /// - ストレージ: `storage`
    /// - 最大サイズ: 10MB
    /// - ワーカー数: 利用可能な並列度
    /// - 保持日数: 7日
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.storage_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_max_file_size_mb(mut self, size_mb: u64) -> Self {
        self.config.max_file_size_mb = size_mb;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn with_file_retention_days(mut self, days: u32) -> Self {
        self.config.file_retention_days = days;
        self
    }

    /// 設定を検証して`ServiceConfig`を生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(ServiceConfig)` - 設定が有効な場合
    /// * `Err(Excel2MdError::Config)` - 最大サイズまたはワーカー数が0の場合
    pub fn build(self) -> Result<ServiceConfig> {
        if self.config.max_file_size_mb == 0 {
            return Err(Excel2MdError::Config(
                "Maximum file size must be greater than 0".to_string(),
            ));
        }

        if self.config.workers == 0 {
            return Err(Excel2MdError::Config(
                "Worker count must be greater than 0".to_string(),
            ));
        }

        if self.config.storage_dir.as_os_str().is_empty() {
            return Err(Excel2MdError::Config(
                "Storage directory must not be empty".to_string(),
            ));
        }

        Ok(self.config)
    }
}
