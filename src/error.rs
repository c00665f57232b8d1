//! 错误类型
//!
//! 远程服务边界使用强类型错误（`ClientError`），查询会话额外有自己的拒绝原因
//! （`QueryError`）。应用层胶水代码（配置、文件加载、App）统一使用 `anyhow`。

use thiserror::Error;

/// 远程服务客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 文件类型不受支持（本地校验或服务端拒绝）
    #[error("不支持的文件类型 ({file_name}): {reason}")]
    Validation { file_name: String, reason: String },

    /// 网络/连接失败
    #[error("无法连接到检索服务 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 服务可达，但返回了错误响应 (4xx/5xx)
    #[error("检索服务返回错误 ({endpoint}): 状态码 {status}, {message}")]
    Service {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// 响应内容无法解析
    #[error("响应解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// 创建文件类型校验错误
    pub fn validation(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::Validation {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// 创建网络请求失败错误
    pub fn transport(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClientError::Transport {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建服务端错误
    pub fn service(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ClientError::Service {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// 是否为网络层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

/// 查询会话错误
#[derive(Debug, Error)]
pub enum QueryError {
    /// 上一个问题仍在处理中
    #[error("已有问题正在处理中，请等待当前回答完成")]
    InFlight,

    /// 问题为空
    #[error("问题不能为空")]
    EmptyQuestion,

    /// 问题超出长度限制
    #[error("问题过长: {len} 个字符 (最多 {max} 个)")]
    TooLong { len: usize, max: usize },

    /// 远程调用失败
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// 远程调用结果类型
pub type AppResult<T> = Result<T, ClientError>;
