//! Formatter Module
//!
//! calamineのセル値を`CellValue`へ正規化するモジュール。
//! 数値・論理値はネイティブな表現のまま、日付はISO 8601文字列に変換します。

use calamine::{Data, ExcelDateTime};
use chrono::{NaiveDateTime, Timelike};

use crate::api::SpreadsheetFormat;
use crate::types::CellValue;

/// セルフォーマッター
///
/// セル値の正規化処理のファサードとして機能します。
#[derive(Debug, Clone, Copy)]
pub(crate) struct CellFormatter {
    /// 入力ファイルの形式（数値の扱いが異なる）
    format: SpreadsheetFormat,

    /// 日付フォーマッター
    date_formatter: DateFormatter,
}

impl CellFormatter {
    pub fn new(format: SpreadsheetFormat) -> Self {
        Self {
            format,
            date_formatter: DateFormatter,
        }
    }

    /// セル値を正規化
    ///
    /// # 引数
    ///
    /// * `cell` - calamineのセルデータ
    ///
    /// # 戻り値
    ///
    /// 正規化されたセル値。空セルは`CellValue::Empty`になります。
    ///
    /// # 数値の扱い
    ///
    /// XLSXでは数値セルがすべて浮動小数点数として格納されるため、
    /// 小数部のない値は整数として扱います。XLSの数値は、RKレコードの整数も
    /// NUMBERレコードの値もすべて浮動小数点数として扱います（`5`は`5.0`）。
    pub fn format_cell(&self, cell: &Data) -> CellValue {
        match (cell, self.format) {
            (Data::Int(i), SpreadsheetFormat::Modern) => CellValue::Int(*i),
            (Data::Int(i), SpreadsheetFormat::Legacy) => CellValue::Float(*i as f64),
            (Data::Float(f), SpreadsheetFormat::Modern) => integral_or_float(*f),
            (Data::Float(f), SpreadsheetFormat::Legacy) => CellValue::Float(*f),
            (Data::String(s), _) => CellValue::String(s.clone()),
            (Data::Bool(b), _) => CellValue::Bool(*b),
            (Data::DateTime(dt), _) => match self.date_formatter.format(dt) {
                Some(text) => CellValue::String(text),
                None => CellValue::Float(dt.as_f64()),
            },
            (Data::DateTimeIso(s), _) | (Data::DurationIso(s), _) => CellValue::String(s.clone()),
            (Data::Error(e), _) => CellValue::String(e.to_string()),
            _ => CellValue::Empty,
        }
    }
}

fn integral_or_float(value: f64) -> CellValue {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        CellValue::Int(value as i64)
    } else {
        CellValue::Float(value)
    }
}

/// 日付フォーマッター
///
/// calamineの日付セルをISO 8601文字列に変換します。1900年・1904年の
/// どちらのエポックもセル側のフラグに従って解釈されます。
#[derive(Debug, Clone, Copy)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// 日付セルをフォーマット
    ///
    /// # 戻り値
    ///
    /// * 時刻成分がない場合: `YYYY-MM-DD`
    /// * 時刻成分がある場合: `YYYY-MM-DDTHH:MM:SS`
    /// * 経過時間（`[h]:mm`形式）・負の値・範囲外の値: `None`
    pub fn format(&self, datetime: &ExcelDateTime) -> Option<String> {
        let serial = datetime.as_f64();
        if !datetime.is_datetime() || !serial.is_finite() || serial < 0.0 {
            return None;
        }

        datetime.as_datetime().map(|dt| Self::to_iso(&dt))
    }

    fn to_iso(datetime: &NaiveDateTime) -> String {
        if datetime.num_seconds_from_midnight() == 0 {
            datetime.format("%Y-%m-%d").to_string()
        } else {
            datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
    }
}
