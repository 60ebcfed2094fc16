//! CSV output for the aggregate report and the custom emoji export

use crate::report::{AggregateTotal, ReportError, ReportResult};
use crate::CustomEmoji;
use csv::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

const REPORT_HEADER: [&str; 3] = ["index", "name", "count"];
const EMOJI_HEADER: [&str; 2] = ["name", "url"];

fn create_writer(path: &Path) -> ReportResult<Writer<BufWriter<File>>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ReportError::IoError(format!("Failed to create directory: {e}")))?;
        }
    }

    let file = File::create(path)
        .map_err(|e| ReportError::IoError(format!("Failed to create file: {e}")))?;
    Ok(Writer::from_writer(BufWriter::new(file)))
}

fn write_row<I, T>(writer: &mut Writer<BufWriter<File>>, row: I) -> ReportResult<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| ReportError::CsvError(format!("Failed to write row: {e}")))
}

fn finish(mut writer: Writer<BufWriter<File>>) -> ReportResult<()> {
    writer
        .flush()
        .map_err(|e| ReportError::IoError(format!("Failed to flush: {e}")))
}

/// Write the aggregate report as `index,name,count` with a 1-based index
///
/// The header is written even when there is nothing to report.
///
/// # Returns
/// Number of data rows written
pub fn write_report(path: &Path, total: &AggregateTotal) -> ReportResult<usize> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, REPORT_HEADER)?;

    let mut rows = 0;
    for (position, (name, count)) in total.iter().enumerate() {
        write_row(
            &mut writer,
            [(position + 1).to_string(), name.to_string(), count.to_string()],
        )?;
        rows += 1;
    }
    finish(writer)?;

    info!(path = %path.display(), rows = rows, "Report written");
    Ok(rows)
}

/// Write the custom emoji export as `name,url`
///
/// # Returns
/// Number of data rows written
pub fn write_custom_emoji(path: &Path, emoji: &[CustomEmoji]) -> ReportResult<usize> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, EMOJI_HEADER)?;

    for entry in emoji {
        write_row(&mut writer, [entry.name.as_str(), entry.url.as_str()])?;
    }
    finish(writer)?;

    info!(path = %path.display(), rows = emoji.len(), "Custom emoji export written");
    Ok(emoji.len())
}
