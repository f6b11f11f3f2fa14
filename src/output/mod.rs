//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。
//! 出力フォーマットはジョブの投入時に一度だけ選択され、`OutputFormat::render`が
//! 対応するフォーマッターへ振り分けます。

mod formatters;

use crate::api::OutputFormat;
use crate::error::Result;
use crate::types::TabularSheet;

pub use formatters::*;

impl OutputFormat {
    /// シートを指定されたフォーマットで文字列化する
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 出力に成功した場合
    /// * `Err(Excel2MdError)` - シリアライズに失敗した場合
    pub fn render(&self, sheet: &TabularSheet) -> Result<String> {
        match self {
            OutputFormat::Markdown => Ok(MarkdownFormatter.render(&sheet.headers, &sheet.rows)),
            OutputFormat::Json => JsonFormatter.render(&sheet.headers, &sheet.rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    #[test]
    fn test_render_dispatches_by_format() {
        let sheet = TabularSheet::new(
            "Sheet1",
            vec!["Name".into()],
            vec![vec![CellValue::from("x")]],
        );

        let markdown = OutputFormat::Markdown.render(&sheet).unwrap();
        assert_eq!(markdown, "|Name|\n|-|\n|x|");

        let json = OutputFormat::Json.render(&sheet).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"Name\": \"x\""));
    }
}
