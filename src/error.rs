//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// excel2mdクレート全体で使用する結果型
pub type Result<T> = std::result::Result<T, Excel2MdError>;

/// excel2mdクレート全体で使用するエラー型
///
/// アップロードの検証、Excelファイルの読み込み、変換処理、成果物の取得中に
/// 発生するすべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `InvalidFormat`: サポートされていない拡張子、または解析できないファイル
/// - `FileTooLarge`: サイズ上限を超えたアップロード
/// - `EmptyFile` / `EmptySheet`: シートが存在しない、または有効なデータがない
/// - `TaskFailed`: ジョブが`FAILURE`に到達した（原因のテキストを保持）
/// - `NotFound`: ジョブ、結果、成果物が存在しない
///
/// # 使用例
///
/// ```rust,no_run
/// use excel2md::Excel2MdError;
/// use std::fs::File;
///
/// fn open_upload(path: &str) -> Result<(), Excel2MdError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Excel2MdError {
    /// サポートされていない拡張子、または解析できないファイル
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// アップロードがサイズ上限を超えた
    ///
    /// 宣言されたサイズと実際に読み込んだバイト数の両方で検査されます。
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// ファイルにシート、または有効なデータが存在しない
    #[error("Empty file: {0}")]
    EmptyFile(String),

    /// シートに有効なデータが存在しない
    #[error("Empty sheet: {0}")]
    EmptySheet(String),

    /// ジョブが`FAILURE`に到達した
    ///
    /// 非同期パイプライン内で発生したエラーのテキストをそのまま保持します。
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// 参照されたジョブ、結果、成果物が存在しない
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIPアーカイブの作成エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// JSONシリアライズエラー
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 設定の検証に失敗したエラー
    ///
    /// `ServiceConfigBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for Excel2MdError {
    fn from(err: zip::result::ZipError) -> Self {
        Excel2MdError::Zip(err.to_string())
    }
}

impl From<calamine::Error> for Excel2MdError {
    fn from(err: calamine::Error) -> Self {
        Excel2MdError::InvalidFormat(format!("Cannot read Excel file: {}", err))
    }
}
