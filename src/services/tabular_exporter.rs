//! 表格导出服务 - 业务能力层
//!
//! 只负责"把一组导出行写成 CSV"，每次调用独立推导列结构

use crate::error::ExportError;
use crate::models::ExportRow;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STATUS_COLUMN: &str = "StatusMessage";
pub const JOB_ID_COLUMN: &str = "LIA-ID";
pub const FILE_PATH_COLUMN: &str = "FilePath";

/// 汇总文件使用的标签
pub const FULL_LABEL: &str = "full";

const FIXED_COLUMNS: [&str; 3] = [STATUS_COLUMN, JOB_ID_COLUMN, FILE_PATH_COLUMN];

/// 表格导出服务
pub struct TabularExporter {
    output_dir: PathBuf,
}

impl TabularExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 输出文件路径：`responses_{label}.csv`
    pub fn file_path(&self, label: &str) -> PathBuf {
        self.output_dir.join(format!("responses_{}.csv", label))
    }

    /// 导出一组行
    ///
    /// 列 = 三个固定列 + 所有行字段键的有序并集；缺失字段留空。
    pub fn export_batch(&self, rows: &[ExportRow], label: &str) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.file_path(label);
        let field_columns = field_columns(rows);
        debug!(
            "导出 {} 行到 {} ({} 个结果列)",
            rows.len(),
            path.display(),
            field_columns.len()
        );

        write_csv(&path, rows, &field_columns).map_err(|source| ExportError::Csv {
            path: path.clone(),
            source,
        })?;

        info!("💾 已写入 {}", path.display());
        Ok(path)
    }
}

/// 所有行字段键的有序并集（与固定列同名的键被忽略）
pub fn field_columns(rows: &[ExportRow]) -> Vec<String> {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.fields.keys().map(String::as_str))
        .filter(|key| !FIXED_COLUMNS.contains(key))
        .collect();
    columns.into_iter().map(str::to_string).collect()
}

fn write_csv(path: &Path, rows: &[ExportRow], field_columns: &[String]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;

    let header = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(field_columns.iter().map(String::as_str));
    writer.write_record(header)?;

    for row in rows {
        let mut record = vec![
            row.status_message.clone(),
            row.job_ref.clone(),
            row.file_path.clone(),
        ];
        record.extend(
            field_columns
                .iter()
                .map(|column| row.fields.get(column).map(render_cell).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// 单元格文本：字符串原样输出，null 留空，其余使用 JSON 文本
fn render_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlatRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(file: &str, job: &str, status: &str, fields: serde_json::Value) -> ExportRow {
        let fields: FlatRecord = match fields {
            JsonValue::Object(map) => map,
            _ => FlatRecord::new(),
        };
        ExportRow {
            file_path: file.to_string(),
            job_ref: job.to_string(),
            status_message: status.to_string(),
            fields,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_has_fixed_then_sorted_columns() {
        let dir = TempDir::new().unwrap();
        let exporter = TabularExporter::new(dir.path());
        let rows = vec![
            row("a.pdf", "1", "[SUCCESS]", json!({"z": "1", "amount": "10.00"})),
            row("b.pdf", "2", "[SUCCESS]", json!({"currency": "EUR"})),
        ];

        let path = exporter.export_batch(&rows, "0").unwrap();

        assert_eq!(path, dir.path().join("responses_0.csv"));
        let lines = read_lines(&path);
        assert_eq!(lines[0], "StatusMessage,LIA-ID,FilePath,amount,currency,z");
        assert_eq!(lines[1], "[SUCCESS],1,a.pdf,10.00,,1");
        assert_eq!(lines[2], "[SUCCESS],2,b.pdf,,EUR,");
    }

    #[test]
    fn test_failure_rows_leave_fields_blank() {
        let dir = TempDir::new().unwrap();
        let exporter = TabularExporter::new(dir.path());
        let rows = vec![
            row("a.pdf", "1", "[SUCCESS]", json!({"amount": "10.00"})),
            row(
                "b.pdf",
                "[FAILURE]",
                "[FAILURE] Err. Msg.: Failed to upload file",
                json!({}),
            ),
        ];

        let path = exporter.export_batch(&rows, FULL_LABEL).unwrap();

        assert!(path.ends_with("responses_full.csv"));
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            "[FAILURE] Err. Msg.: Failed to upload file,[FAILURE],b.pdf,"
        );
    }

    #[test]
    fn test_cells_render_values() {
        assert_eq!(render_cell(&json!("text")), "text");
        assert_eq!(render_cell(&JsonValue::Null), "");
        assert_eq!(render_cell(&json!(12.5)), "12.5");
        assert_eq!(render_cell(&json!(false)), "false");
        assert_eq!(render_cell(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_fixed_column_names_are_not_duplicated() {
        let rows = vec![row(
            "a.pdf",
            "1",
            "[SUCCESS]",
            json!({"FilePath": "other", "amount": "1"}),
        )];
        assert_eq!(field_columns(&rows), vec!["amount".to_string()]);
    }

    #[test]
    fn test_creates_output_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("out").join("csv");
        let exporter = TabularExporter::new(&nested);

        let path = exporter.export_batch(&[], "0").unwrap();

        assert_eq!(read_lines(&path), vec!["StatusMessage,LIA-ID,FilePath"]);
    }

    #[test]
    fn test_unwritable_destination_is_export_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let exporter = TabularExporter::new(blocker.join("sub"));

        let err = exporter.export_batch(&[], "0").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
