//! Storage Module
//!
//! アップロードと変換結果を保存するファイルシステム上の領域を管理します。
//! 各ジョブは`<root>/<jobId>/`の下に隔離され、タスクには
//! ジョブ単位の`JobDirectory`だけが渡されます。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Excel2MdError, Result};
use crate::security::validate_entry_name;
use crate::types::JobId;

/// ストレージのルート（`uploads`と`results`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Storage {
    uploads_dir: PathBuf,
    results_dir: PathBuf,
}

impl Storage {
    pub fn new(uploads_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    /// 両方のルートディレクトリを作成（既に存在する場合は何もしない）
    pub fn ensure_roots(&self) -> Result<()> {
        fs::create_dir_all(&self.uploads_dir)?;
        fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }

    /// ジョブのアップロードディレクトリ
    pub fn uploads(&self, job_id: &JobId) -> JobDirectory {
        JobDirectory::new(self.uploads_dir.join(job_id.as_str()))
    }

    /// ジョブの結果ディレクトリ
    pub fn results(&self, job_id: &JobId) -> JobDirectory {
        JobDirectory::new(self.results_dir.join(job_id.as_str()))
    }
}

/// 1ジョブ分のディレクトリへのアクセス権
///
/// エントリ名は検証され、ディレクトリの外を指すことはできません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDirectory {
    root: PathBuf,
}

impl JobDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// ディレクトリ内のエントリのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(PathBuf)` - 検証済みのパス
    /// * `Err(Excel2MdError::InvalidFormat)` - 名前がディレクトリの外を指す場合
    pub fn entry_path(&self, name: &str) -> Result<PathBuf> {
        validate_entry_name(name).map_err(Excel2MdError::InvalidFormat)?;
        Ok(self.root.join(name))
    }

    /// ディレクトリを作成（冪等）
    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry_path(name).map(|path| path.is_file()).unwrap_or(false)
    }

    /// エントリを書き込む（ディレクトリがなければ作成）
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.entry_path(name)?;
        self.create()?;
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(name)?;
        if !path.is_file() {
            return Err(Excel2MdError::NotFound(format!("File not found: {}", name)));
        }
        Ok(fs::read(path)?)
    }

    /// ファイルエントリの名前を名前順で返す（ディレクトリがなければ空）
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// ディレクトリごと削除
    ///
    /// # 戻り値
    ///
    /// * `Ok(true)` - 削除した場合
    /// * `Ok(false)` - 存在しなかった場合
    pub fn remove(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.root)?;
        Ok(true)
    }
}
