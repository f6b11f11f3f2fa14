//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::api::OutputFormat;

/// セルの値を表す列挙型
///
/// 数値・論理値はネイティブな表現のまま保持され、JSON出力でもそのまま
/// 数値・論理値としてシリアライズされます。
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 文字列
    String(String),

    /// 整数
    Int(i64),

    /// 浮動小数点数
    Float(f64),

    /// 論理値
    Bool(bool),

    /// 値なし（JSONでは`null`）
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            // 整数値の浮動小数点数は`1.0`のように小数部を残す
            CellValue::Float(n) => write!(f, "{:?}", n),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            CellValue::Float(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// 1枚のワークシートの正規化された表現
///
/// インジェスターがソースファイルを1回走査して構築し、以降は変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct TabularSheet {
    /// シート名（ワークブック内で一意、空でない）
    pub name: String,

    /// ヘッダー行（ヘッダーなしの場合は空）
    pub headers: Vec<String>,

    /// データ行
    pub rows: Vec<Vec<CellValue>>,
}

impl TabularSheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// データ行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 列数
    ///
    /// ヘッダーがあればその長さ、なければ先頭行の長さ、データもなければ0。
    pub fn column_count(&self) -> usize {
        if !self.headers.is_empty() {
            self.headers.len()
        } else {
            self.rows.first().map(Vec::len).unwrap_or(0)
        }
    }
}

/// ジョブの識別子
///
/// 投入側が処理開始前に生成し、ストレージのパス・進捗・結果の相関キーとして
/// 使用されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// 新しいランダムなIDを生成（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 1件の変換リクエスト
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub id: JobId,

    /// アップロードディレクトリ内の保存ファイル名
    pub upload_name: String,

    /// アップロード時の元のファイル名（形式判定に使用）
    pub original_filename: String,

    /// 先頭行をヘッダーとして扱うか
    pub use_headers: bool,

    pub output_format: OutputFormat,
}

/// 1シート分の変換結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    pub content: String,
    pub row_count: usize,
    pub column_count: usize,
}

/// シート名から変換結果への順序付きマップ
///
/// 挿入順（ソースファイルのシート順）を保持し、JSONオブジェクトとして
/// シリアライズされます。同名のシートは上書きされ、位置は維持されます。
pub type SheetResults = IndexMap<String, SheetResult>;

/// 成功したジョブの変換結果
///
/// 変換タスクが一度だけ生成し、以降は変更されません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub task_id: JobId,
    pub original_filename: String,

    /// ジョブの結果ディレクトリ
    pub result_dir: PathBuf,

    pub sheets: SheetResults,

    /// 出力されたシート数
    pub total_sheets: usize,

    /// 複数シートのアーカイブが作成されたか
    pub has_archive: bool,

    pub archive_path: Option<PathBuf>,
}

/// 実行中タスクが公開する進捗
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressInfo {
    /// 進捗率（0〜100）
    pub progress: u8,
    pub message: String,
    pub current_sheet: Option<String>,
    pub total_sheets: usize,
}

impl ProgressInfo {
    pub fn new(progress: u8, message: impl Into<String>, total_sheets: usize) -> Self {
        Self {
            progress,
            message: message.into(),
            current_sheet: None,
            total_sheets,
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.current_sheet = Some(sheet.into());
        self
    }
}
