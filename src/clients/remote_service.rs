//! 远程检索服务的调用契约
//!
//! 编排层只依赖这个 trait，测试里换成脚本化的实现即可

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    DocumentFile, ProcessingStatus, QueryOptions, QueryResponse, UploadReceipt,
};

/// 远程检索服务
///
/// 职责：
/// - 只做一次远程调用，不保存任何状态
/// - 不重试、不轮询（轮询由上传编排器负责）
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// 上传文档
    ///
    /// 失败时返回 `Transport`、`Validation`（服务端拒绝该类型）或 `Service`
    async fn upload(&self, file: &DocumentFile) -> AppResult<UploadReceipt>;

    /// 查询文档的后台处理状态
    async fn poll_status(&self, document_id: &str) -> AppResult<ProcessingStatus>;

    /// 提交问题
    async fn submit_question(
        &self,
        question: &str,
        options: &QueryOptions,
    ) -> AppResult<QueryResponse>;

    /// 存活探测
    ///
    /// 必须自带超时，任何失败都返回 `false`，不会报错
    async fn probe_liveness(&self) -> bool;
}
