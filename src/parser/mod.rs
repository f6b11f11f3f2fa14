//! Parser Module
//!
//! calamineを使用したスプレッドシートの読み込み（インジェスター）。
//! XLS（旧形式）とXLSX（新形式）を`TabularSheet`の列に正規化します。

mod workbook;

use std::path::Path;

use tracing::info;

use crate::api::SpreadsheetFormat;
use crate::error::{Excel2MdError, Result};
use crate::types::TabularSheet;

use workbook::WorkbookParser;

/// ファイル名の拡張子（大文字小文字を区別しない）から形式を判定する
pub fn detect_format(filename: &str) -> Result<SpreadsheetFormat> {
    SpreadsheetFormat::detect(filename)
}

/// スプレッドシートを読み込み、すべてのシートを抽出する
///
/// 形式はファイル名の拡張子のみで判定されます。
///
/// # 引数
///
/// * `content` - ファイルの内容
/// * `filename` - 元のファイル名（形式判定に使用）
/// * `use_headers` - 先頭行をヘッダーとして扱うか
///
/// # 戻り値
///
/// * `Ok(Vec<TabularSheet>)` - ソースファイルのシート順に並んだシート
/// * `Err(Excel2MdError::InvalidFormat)` - 拡張子が未対応、またはファイルが読み込めない
/// * `Err(Excel2MdError::EmptyFile)` - 有効なシートが1つもない
///
/// # 使用例
///
/// ```rust,no_run
/// use excel2md::ingest;
///
/// # fn main() -> Result<(), excel2md::Excel2MdError> {
/// let content = std::fs::read("report.xlsx")?;
/// let sheets = ingest(content, "report.xlsx", true)?;
/// for sheet in &sheets {
///     println!("{}: {} rows", sheet.name, sheet.row_count());
/// }
/// # Ok(())
/// # }
/// ```
pub fn ingest(content: Vec<u8>, filename: &str, use_headers: bool) -> Result<Vec<TabularSheet>> {
    let format = detect_format(filename)?;

    info!(filename, ?format, "Reading Excel file");

    let mut parser = WorkbookParser::open(content, format)?;
    let sheets = parser.read_sheets(use_headers)?;

    if sheets.is_empty() {
        return Err(Excel2MdError::EmptyFile(
            "Excel file contains no data".to_string(),
        ));
    }

    info!(filename, sheets = sheets.len(), "Successfully read sheet(s)");
    Ok(sheets)
}

/// ファイルパスからスプレッドシートを読み込む
///
/// 形式はパスのファイル名部分から判定されます。
pub fn ingest_path(path: &Path, use_headers: bool) -> Result<Vec<TabularSheet>> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = std::fs::read(path)?;
    ingest(content, &filename, use_headers)
}
