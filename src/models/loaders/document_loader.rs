use crate::error::ConfigError;
use crate::models::Document;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从文件夹中加载所有待提交的文档
///
/// 只收集普通文件，按路径排序保证批次划分稳定。
pub async fn load_documents(folder_path: &Path) -> Result<Vec<Document>, ConfigError> {
    if !folder_path.is_dir() {
        return Err(ConfigError::DirectoryNotFound {
            path: folder_path.to_path_buf(),
        });
    }

    let read_failed = |source| ConfigError::DirectoryReadFailed {
        path: folder_path.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = fs::read_dir(folder_path).await.map_err(read_failed)?;

    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let file_type = entry.file_type().await.map_err(read_failed)?;
        if file_type.is_file() {
            paths.push(entry.path());
        }
    }

    paths.sort();
    tracing::info!("在 {} 中找到 {} 个文档", folder_path.display(), paths.len());

    Ok(paths.into_iter().map(Document::new).collect())
}
