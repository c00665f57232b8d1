//! 远程服务返回的处理状态

use serde::{Deserialize, Serialize};

/// 远程处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStatus {
    /// 仍在后台处理
    Pending,
    /// 可以检索
    Ready,
    /// 处理失败
    Error,
}

impl RemoteStatus {
    /// 解析服务端的状态字符串
    ///
    /// 服务端用过 `ready` 和 `completed` 两种写法表示完成，未知状态按处理中对待
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "ready" | "completed" => RemoteStatus::Ready,
            "error" | "failed" => RemoteStatus::Error,
            _ => RemoteStatus::Pending,
        }
    }
}

/// 上传接口的回执
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// 上传接口只会返回 Ready 或 Pending
    pub status: RemoteStatus,
    pub document_id: Option<String>,
    pub text_length: Option<usize>,
    pub preview: Option<String>,
}

impl UploadReceipt {
    /// 立即可检索的回执
    pub fn ready(document_id: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Ready,
            document_id: Some(document_id.into()),
            text_length: None,
            preview: None,
        }
    }

    /// 需要后台处理的回执
    pub fn pending(document_id: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Pending,
            document_id: Some(document_id.into()),
            text_length: None,
            preview: None,
        }
    }
}

/// 状态查询接口的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStatus {
    pub status: RemoteStatus,
    /// 0-100
    pub progress: f64,
    /// 服务端给出的失败原因
    pub error: Option<String>,
}

impl ProcessingStatus {
    pub fn new(status: RemoteStatus, progress: f64) -> Self {
        Self {
            status,
            progress,
            error: None,
        }
    }
}

/// 知识库中已有的文档
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub chunk_count: Option<u64>,
}

/// 文档列表（分页）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentListing {
    pub total: usize,
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_wire() {
        assert_eq!(RemoteStatus::from_wire("ready"), RemoteStatus::Ready);
        assert_eq!(RemoteStatus::from_wire("Completed"), RemoteStatus::Ready);
        assert_eq!(RemoteStatus::from_wire("error"), RemoteStatus::Error);
        assert_eq!(RemoteStatus::from_wire("failed"), RemoteStatus::Error);
        assert_eq!(RemoteStatus::from_wire("embedding"), RemoteStatus::Pending);
        assert_eq!(RemoteStatus::from_wire("processing"), RemoteStatus::Pending);
    }
}
