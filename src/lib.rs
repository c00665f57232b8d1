//! # RAG Query Client
//!
//! 文档问答服务的客户端编排层：上传文档、跟踪后台处理进度、提交问题、监视服务连通性
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有 HTTP 连接，只暴露四个远程能力
//! - `RemoteService` - upload / poll_status / submit_question / probe_liveness
//! - `HttpRemoteService` - 基于 reqwest 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuerySessionController` - 同一时间只处理一个问题
//! - `HealthMonitor` - 定时探测服务存活，问答进行中时跳过
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整上传流程
//! - `UploadCtx` - 上下文封装（task_id + 批内序号）
//! - `UploadFlow` - 流程编排（upload → poll → 终态）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/upload_orchestrator` - 批量上传，严格顺序
//! - `orchestrator/app` - 应用生命周期
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpRemoteService, RemoteService};
pub use config::Config;
pub use error::{AppResult, ClientError, QueryError};
pub use models::{DocumentFile, HealthState, QueryResponse, UploadStatus, UploadTask};
pub use orchestrator::{App, BatchStats, UploadOrchestrator};
pub use services::{HealthMonitor, QuerySessionController};
pub use workflow::{UploadCtx, UploadFlow};
