//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::CellValue;

/// Markdown形式のフォーマッター
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// ヘッダーと行からMarkdownテーブルを生成する
    ///
    /// - ヘッダーあり: ヘッダー行と区切り行を出力
    /// - ヘッダーなし・データあり: 最も長い行の列数だけ空白セルを並べたヘッダー行を出力
    /// - どちらもなし: 空文字列
    ///
    /// 最終行の後に改行は付きません。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use excel2md::{CellValue, MarkdownFormatter};
    ///
    /// let rows = vec![
    ///     vec![CellValue::Int(1), CellValue::Int(2)],
    ///     vec![CellValue::Int(3), CellValue::Int(4)],
    /// ];
    /// assert_eq!(
    ///     MarkdownFormatter.render(&[], &rows),
    ///     "| | |\n|-|-|\n|1|2|\n|3|4|"
    /// );
    /// ```
    pub fn render(&self, headers: &[String], rows: &[Vec<CellValue>]) -> String {
        let mut result = String::new();

        if !headers.is_empty() {
            let escaped: Vec<String> = headers.iter().map(|h| escape_markdown(h)).collect();
            result.push_str(&table_row(&escaped));
            result.push('\n');
            result.push_str(&separator_row(headers.len()));
        } else if !rows.is_empty() {
            let max_col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
            result.push_str(&table_row(&vec![" ".to_string(); max_col_count]));
            result.push('\n');
            result.push_str(&separator_row(max_col_count));
        }

        for row in rows {
            let escaped: Vec<String> = row.iter().map(escape_markdown_cell).collect();
            result.push('\n');
            result.push_str(&table_row(&escaped));
        }

        result
    }
}

fn table_row(cells: &[String]) -> String {
    format!("|{}|", cells.join("|"))
}

fn separator_row(columns: usize) -> String {
    table_row(&vec!["-".to_string(); columns])
}

/// セル値をMarkdownテーブル用にエスケープ
pub fn escape_markdown_cell(value: &CellValue) -> String {
    escape_markdown(&value.to_string())
}

/// `|`を`\|`に、改行を`<br>`に置換する
fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\r', '\n'], "<br>")
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    /// ヘッダーと行からJSON文字列を生成する
    ///
    /// - ヘッダーあり: 行ごとのレコード（ヘッダー順のキー）の配列。
    ///   空のヘッダーは`column_<index>`、行が短い場合の値は`null`
    /// - ヘッダーなし: 行の配列をそのまま出力
    ///
    /// インデントは2スペース、非ASCII文字はエスケープしません。
    pub fn render(&self, headers: &[String], rows: &[Vec<CellValue>]) -> Result<String> {
        if headers.is_empty() {
            return Ok(serde_json::to_string_pretty(rows)?);
        }

        let keys: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                if header.is_empty() {
                    format!("column_{}", index)
                } else {
                    header.clone()
                }
            })
            .collect();

        let records = rows
            .iter()
            .map(|row| -> Result<Value> {
                let mut record = Map::new();
                for (index, key) in keys.iter().enumerate() {
                    let value = match row.get(index) {
                        Some(cell) => serde_json::to_value(cell)?,
                        None => Value::Null,
                    };
                    record.insert(key.clone(), value);
                }
                Ok(Value::Object(record))
            })
            .collect::<Result<Vec<Value>>>()?;

        Ok(serde_json::to_string_pretty(&records)?)
    }
}
