//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Excel2MdError;

/// 出力フォーマット
///
/// ジョブの投入時に一度だけ選択され、変換タスクはこの値に対応する
/// レンダラーを使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdownテーブル形式（デフォルト）
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// |Header1|Header2|
    /// |-|-|
    /// |Data1|Data2|
    /// ```
    #[default]
    Markdown,

    /// JSON形式
    ///
    /// ヘッダーがある場合はレコードの配列、ない場合は行の配列として出力します。
    ///
    /// # 出力例
    ///
    /// ```json
    /// [
    ///   {
    ///     "Header1": "Data1",
    ///     "Header2": "Data2"
    ///   }
    /// ]
    /// ```
    Json,
}

impl OutputFormat {
    /// 成果物ファイルの拡張子（ドットなし）
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }

    /// フォーマット名（`markdown` / `json`）
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Excel2MdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(Excel2MdError::InvalidFormat(format!(
                "Unsupported output format: {}. Supported formats: markdown, json",
                other
            ))),
        }
    }
}

/// 入力スプレッドシートの形式
///
/// ファイル名の拡張子のみで判定されます（大文字小文字を区別しない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// 旧形式のバイナリワークブック（`.xls`）
    Legacy,

    /// ZIP + XML形式のワークブック（`.xlsx`）
    Modern,
}

impl SpreadsheetFormat {
    /// 受け付ける拡張子の一覧
    pub const ALLOWED_EXTENSIONS: [&'static str; 2] = [".xls", ".xlsx"];

    /// ファイル名から形式を判定する
    ///
    /// # 戻り値
    ///
    /// * `Ok(SpreadsheetFormat)` - `.xls`または`.xlsx`の場合
    /// * `Err(Excel2MdError::InvalidFormat)` - それ以外の拡張子、または拡張子なし
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use excel2md::SpreadsheetFormat;
    ///
    /// assert_eq!(
    ///     SpreadsheetFormat::detect("report.XLSX").unwrap(),
    ///     SpreadsheetFormat::Modern
    /// );
    /// assert!(SpreadsheetFormat::detect("data.csv").is_err());
    /// ```
    pub fn detect(filename: &str) -> Result<Self, Excel2MdError> {
        let ext = extension_of(filename);
        match ext.as_str() {
            ".xls" => Ok(SpreadsheetFormat::Legacy),
            ".xlsx" => Ok(SpreadsheetFormat::Modern),
            _ => Err(Excel2MdError::InvalidFormat(format!(
                "Unsupported file format: {}. Supported formats: {}",
                ext,
                Self::ALLOWED_EXTENSIONS.join(", ")
            ))),
        }
    }
}

/// ファイル名の拡張子を小文字・ドット付きで返す（拡張子なしは空文字列）
///
/// Windows形式の区切り文字を含むファイル名も扱います。
pub(crate) fn extension_of(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    Path::new(base)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}
