//! Security Module
//!
//! アップロードと成果物に対する検証を実装するモジュール。
//! ファイルサイズ制限、拡張子チェック、パストラバーサル攻撃への対策を提供します。

use crate::api::SpreadsheetFormat;
use crate::error::{Excel2MdError, Result};

/// アップロードの制限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UploadLimits {
    /// アップロードの最大サイズ（MB）
    pub max_file_size_mb: u64,
}

impl UploadLimits {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }

    /// 最大サイズ（バイト）
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    fn too_large(&self) -> Excel2MdError {
        Excel2MdError::FileTooLarge(format!(
            "File size exceeds maximum allowed size of {}MB",
            self.max_file_size_mb
        ))
    }

    /// ジョブ作成前のアップロード検証
    ///
    /// # 引数
    ///
    /// * `filename` - アップロードされたファイル名
    /// * `declared_size` - クライアントが宣言したサイズ（不明な場合は`None`）
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 検証に成功した場合
    /// * `Err(Excel2MdError::InvalidFormat)` - ファイル名がない、または拡張子が未対応
    /// * `Err(Excel2MdError::FileTooLarge)` - 宣言サイズが上限を超える
    pub fn validate_upload(&self, filename: &str, declared_size: Option<u64>) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(Excel2MdError::InvalidFormat(
                "Filename is required".to_string(),
            ));
        }

        SpreadsheetFormat::detect(filename)?;

        if let Some(size) = declared_size {
            if size > self.max_file_size_bytes() {
                return Err(self.too_large());
            }
        }

        Ok(())
    }

    /// 実際に読み込んだバイト数の検証
    pub fn check_content_size(&self, len: usize) -> Result<()> {
        if len as u64 > self.max_file_size_bytes() {
            return Err(self.too_large());
        }
        Ok(())
    }
}

/// ジョブディレクトリ内のファイル名の検証
///
/// シート名やアップロードのファイル名がジョブディレクトリの外を指さないことを
/// 確認します。
///
/// # 戻り値
///
/// * `Ok(())` - 名前が安全な場合
/// * `Err(String)` - 名前が危険な場合（区切り文字、`..`、空文字列）
pub(crate) fn validate_entry_name(name: &str) -> std::result::Result<(), String> {
    // 空の名前は拒否
    if name.is_empty() {
        return Err("Empty file name is not allowed".to_string());
    }

    // パス区切り文字を含む名前を拒否
    if name.contains('/') || name.contains('\\') {
        return Err(format!("Path separator in file name is not allowed: {}", name));
    }

    // `.`と`..`を拒否（ディレクトリトラバーサル攻撃）
    if name == "." || name == ".." {
        return Err(format!("Path traversal detected: {}", name));
    }

    if name.contains('\0') {
        return Err(format!("NUL byte in file name is not allowed: {:?}", name));
    }

    Ok(())
}
