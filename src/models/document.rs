//! 待上传文档与本地类型校验

use phf::phf_map;
use std::fmt;

/// 支持的文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Markdown,
}

/// 允许上传的 MIME 类型
static ACCEPTED_MIME_TYPES: phf::Map<&'static str, DocumentKind> = phf_map! {
    "application/pdf" => DocumentKind::Pdf,
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => DocumentKind::Docx,
    "text/plain" => DocumentKind::PlainText,
    "text/markdown" => DocumentKind::Markdown,
};

/// 校验失败时展示给用户的提示
pub const UNSUPPORTED_KIND_MESSAGE: &str = "仅支持 PDF、DOCX、TXT 和 MD 文件";

impl DocumentKind {
    /// 根据声明的 MIME 类型识别文档类型，`.md` 扩展名作为兜底
    ///
    /// # 参数
    /// - `mime_type`: 声明的 MIME 类型（可能缺失）
    /// - `file_name`: 文件名
    ///
    /// # 返回
    /// 不在白名单内时返回 `None`
    pub fn detect(mime_type: Option<&str>, file_name: &str) -> Option<Self> {
        if let Some(kind) = mime_type.and_then(|m| ACCEPTED_MIME_TYPES.get(m)) {
            return Some(*kind);
        }
        if file_name.to_ascii_lowercase().ends_with(".md") {
            return Some(DocumentKind::Markdown);
        }
        None
    }

    /// 上传时使用的 MIME 类型
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Markdown => "text/markdown",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::PlainText => "TXT",
            DocumentKind::Markdown => "Markdown",
        };
        f.write_str(name)
    }
}

/// 用户选择的一个文件
#[derive(Clone)]
pub struct DocumentFile {
    /// 显示名称（不保证唯一）
    pub file_name: String,
    /// 声明的 MIME 类型
    pub mime_type: Option<String>,
    /// 文件内容
    pub content: Vec<u8>,
}

impl DocumentFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: Option<&str>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.map(str::to_string),
            content: content.into(),
        }
    }

    /// 本地白名单校验
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::detect(self.mime_type.as_deref(), &self.file_name)
    }
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.content.len())
            .finish()
    }
}
