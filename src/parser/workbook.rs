//! Workbook Parser
//!
//! calamineのラッパーとして、ワークブックレベルの読み込みを提供します。
//! XLSとXLSXでは列数の決め方と空セルの扱いが異なります。

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};
use tracing::{debug, warn};

use crate::api::SpreadsheetFormat;
use crate::error::{Excel2MdError, Result};
use crate::formatter::CellFormatter;
use crate::types::{CellValue, TabularSheet};

/// ワークブックパーサー
///
/// 形式ごとのcalamineリーダーを保持します。
pub(crate) enum WorkbookParser {
    /// XLS（ワークブック全体を一括で解析）
    Legacy(Xls<Cursor<Vec<u8>>>),

    /// XLSX（シートごとに読み込み）
    Modern(Xlsx<Cursor<Vec<u8>>>),
}

impl WorkbookParser {
    /// ワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - 読み込みに成功した場合
    /// * `Err(Excel2MdError::InvalidFormat)` - 破損している、または形式が異なる場合
    pub fn open(content: Vec<u8>, format: SpreadsheetFormat) -> Result<Self> {
        match format {
            SpreadsheetFormat::Legacy => Xls::new(Cursor::new(content))
                .map(WorkbookParser::Legacy)
                .map_err(|e| Excel2MdError::InvalidFormat(format!("Cannot read .xls file: {}", e))),
            SpreadsheetFormat::Modern => Xlsx::new(Cursor::new(content))
                .map(WorkbookParser::Modern)
                .map_err(|e| {
                    Excel2MdError::InvalidFormat(format!("Error reading .xlsx file: {}", e))
                }),
        }
    }

    fn format(&self) -> SpreadsheetFormat {
        match self {
            WorkbookParser::Legacy(_) => SpreadsheetFormat::Legacy,
            WorkbookParser::Modern(_) => SpreadsheetFormat::Modern,
        }
    }

    /// すべてのシート名をワークブック内の順序で取得
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            WorkbookParser::Legacy(workbook) => workbook.sheet_names().to_vec(),
            WorkbookParser::Modern(workbook) => workbook.sheet_names().to_vec(),
        }
    }

    fn worksheet_range(&mut self, name: &str) -> Result<Range<Data>> {
        match self {
            WorkbookParser::Legacy(workbook) => workbook.worksheet_range(name).map_err(|e| {
                Excel2MdError::InvalidFormat(format!("Cannot read sheet '{}': {}", name, e))
            }),
            WorkbookParser::Modern(workbook) => workbook.worksheet_range(name).map_err(|e| {
                Excel2MdError::InvalidFormat(format!("Cannot read sheet '{}': {}", name, e))
            }),
        }
    }

    /// すべてのシートを読み込む
    ///
    /// データのないシートは警告を出してスキップします（エラーにはしません）。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<TabularSheet>)` - スキップされなかったシート（空の場合あり）
    /// * `Err(Excel2MdError::EmptyFile)` - ワークブックにシートが1つもない場合
    pub fn read_sheets(&mut self, use_headers: bool) -> Result<Vec<TabularSheet>> {
        let sheet_names = self.sheet_names();
        if sheet_names.is_empty() {
            return Err(Excel2MdError::EmptyFile(
                "Excel file contains no sheets".to_string(),
            ));
        }

        let formatter = CellFormatter::new(self.format());
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for sheet_name in &sheet_names {
            let range = self.worksheet_range(sheet_name)?;

            let sheet = match self.format() {
                SpreadsheetFormat::Legacy => {
                    read_legacy_sheet(sheet_name, &range, use_headers, &formatter)
                }
                SpreadsheetFormat::Modern => {
                    read_modern_sheet(sheet_name, &range, use_headers, &formatter)
                }
            };

            if let Some(sheet) = sheet {
                debug!(
                    sheet = %sheet.name,
                    rows = sheet.row_count(),
                    cols = sheet.column_count(),
                    "Sheet read"
                );
                sheets.push(sheet);
            }
        }

        Ok(sheets)
    }
}

/// シートの行列サイズ（A1を起点とした行数・列数）
///
/// calamineの範囲は最初の非空セルから始まるため、終端座標から計算します。
fn nominal_size(range: &Range<Data>) -> Option<(usize, usize)> {
    if range.is_empty() {
        return None;
    }
    range
        .end()
        .map(|(row, col)| (row as usize + 1, col as usize + 1))
}

/// A1を起点とした密な行列として行を取り出す
fn dense_rows(
    range: &Range<Data>,
    height: usize,
    width: usize,
    formatter: &CellFormatter,
) -> Vec<Vec<CellValue>> {
    (0..height)
        .map(|row| {
            (0..width)
                .map(|col| {
                    range
                        .get_value((row as u32, col as u32))
                        .map(|cell| formatter.format_cell(cell))
                        .unwrap_or(CellValue::Empty)
                })
                .collect()
        })
        .collect()
}

/// ヘッダーセルを文字列化（空セルは空文字列）
fn header_text(cell: &CellValue) -> String {
    cell.to_string()
}

/// 空セルを空文字列に正規化
fn blank_to_empty_string(cell: CellValue) -> CellValue {
    match cell {
        CellValue::Empty => CellValue::String(String::new()),
        other => other,
    }
}

/// XLSのシートを読み込む
///
/// 列数はシートの公称幅（最終列）をそのまま使用します。
fn read_legacy_sheet(
    name: &str,
    range: &Range<Data>,
    use_headers: bool,
    formatter: &CellFormatter,
) -> Option<TabularSheet> {
    let Some((height, width)) = nominal_size(range) else {
        warn!(sheet = name, "Empty sheet skipped");
        return None;
    };

    let mut rows = dense_rows(range, height, width, formatter).into_iter();

    let headers = if use_headers {
        rows.next()
            .map(|header_row| header_row.iter().map(header_text).collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let data = rows
        .map(|row| row.into_iter().map(blank_to_empty_string).collect())
        .collect();

    Some(TabularSheet::new(name, headers, data))
}

/// XLSXのシートを読み込む
///
/// 列数はすべての行を走査し、値を持つ最後の列までとします。
/// 末尾の空列は切り捨てられ、列数が0のシートはスキップされます。
fn read_modern_sheet(
    name: &str,
    range: &Range<Data>,
    use_headers: bool,
    formatter: &CellFormatter,
) -> Option<TabularSheet> {
    let Some((height, width)) = nominal_size(range) else {
        warn!(sheet = name, "Empty sheet skipped");
        return None;
    };

    let grid = dense_rows(range, height, width, formatter);

    let max_cols = grid
        .iter()
        .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
        .map(|last| last + 1)
        .max()
        .unwrap_or(0);

    if max_cols == 0 {
        warn!(sheet = name, "Sheet with no data skipped");
        return None;
    }

    let mut rows = grid.into_iter().map(|mut row| {
        row.truncate(max_cols);
        row
    });

    let headers = if use_headers {
        rows.next()
            .map(|header_row| header_row.iter().map(header_text).collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let data = rows
        .map(|row| row.into_iter().map(blank_to_empty_string).collect())
        .collect();

    Some(TabularSheet::new(name, headers, data))
}
