// src/output/mod.rs
use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::table::Table;

/// Render a table as a text grid, header included.
pub fn render(table: &Table) -> Result<String> {
    let grid = pretty_format_batches(std::slice::from_ref(table.batch()))
        .context("formatting table")?;
    Ok(grid.to_string())
}

/// Write `table` to `<dir>/<name>.parquet`.
///
/// Written to a dotted tmp file first and renamed over the target, so a
/// reader never sees a half-written file.
pub fn write_parquet<P: AsRef<Path>>(table: &Table, dir: P, name: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("{}.parquet", name));
    let tmp_path = dir.join(format!(".{}.parquet.tmp", name));

    let file = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, table.schema(), Some(props))?;
    writer
        .write(table.batch())
        .with_context(|| format!("writing {}", name))?;
    writer.close().context("closing Parquet writer")?;

    fs::rename(&tmp_path, &path).with_context(|| {
        format!("renaming {} -> {}", tmp_path.display(), path.display())
    })?;
    debug!(path = %path.display(), rows = table.num_rows(), "wrote parquet");
    Ok(path)
}
