//! Artifact Packager
//!
//! 複数シートの成果物を1つのZIPアーカイブにまとめるモジュール。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::storage::JobDirectory;

/// アーカイブのファイル名
pub const ARCHIVE_NAME: &str = "result.zip";

/// 成果物が2つ以上ある場合にアーカイブを作成する
///
/// アーカイブはジョブディレクトリ直下に作成され、エントリ名はファイル名の
/// まま（ディレクトリ接頭辞なし）です。
///
/// # 引数
///
/// * `dir` - ジョブの結果ディレクトリ
/// * `file_names` - アーカイブに含める成果物の名前
///
/// # 戻り値
///
/// * `Ok(Some(PathBuf))` - 作成したアーカイブのパス
/// * `Ok(None)` - 成果物が1つ以下のためアーカイブを作成しなかった場合
/// * `Err(Excel2MdError)` - 読み書きに失敗した場合（ジョブは失敗扱い）
pub fn package(dir: &JobDirectory, file_names: &[String]) -> Result<Option<PathBuf>> {
    if file_names.len() <= 1 {
        return Ok(None);
    }

    let archive_path = dir.entry_path(ARCHIVE_NAME)?;
    let file = File::create(&archive_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in file_names {
        let content = dir.read(name)?;
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&content)?;
    }

    let mut inner = writer.finish()?;
    inner.flush()?;

    info!(
        archive = %archive_path.display(),
        entries = file_names.len(),
        "Created ZIP archive"
    );

    Ok(Some(archive_path))
}
