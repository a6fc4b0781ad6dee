//! 待提交文档

use std::path::{Path, PathBuf};

/// 待提交的文档
///
/// 以路径作为身份标识，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    display_name: String,
}

impl Document {
    /// 根据路径创建文档，显示名称取文件名
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { path, display_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// 上传时使用的 Content-Type，由扩展名推导
    pub fn content_type(&self) -> String {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => format!("application/{}", ext.to_lowercase()),
            _ => "application/octet-stream".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_is_file_name() {
        let doc = Document::new("/data/invoices/fatura 01.pdf");
        assert_eq!(doc.display_name(), "fatura 01.pdf");
        assert_eq!(doc.path(), Path::new("/data/invoices/fatura 01.pdf"));
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(Document::new("a/b.PDF").content_type(), "application/pdf");
        assert_eq!(Document::new("a/b.xml").content_type(), "application/xml");
        assert_eq!(
            Document::new("a/no_extension").content_type(),
            "application/octet-stream"
        );
    }
}
