//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量上传调度和应用生命周期，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用主结构
//! - 组装客户端、查询会话、健康监视器和上传编排器
//! - 驱动"上传文档 → 问答循环 → 清理"的完整流程
//!
//! ### `upload_orchestrator` - 上传编排器
//! - 本地校验文件类型
//! - 逐个处理文件（前一个到达终态后再开始下一个）
//! - 输出批次统计信息
//!
//! ### `task_board` - 任务看板
//! - 唯一持有上传任务列表的地方
//! - 每次变化后发布快照，关闭后丢弃所有写入
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! upload_orchestrator (处理 Vec<DocumentFile>)
//!     ↓
//! workflow::UploadFlow (处理单个文件)
//!     ↓
//! clients (能力层：upload / poll_status / submit_question / probe_liveness)
//! ```

pub mod app;
pub mod task_board;
pub mod upload_orchestrator;

// 重新导出主要类型
pub use app::App;
pub use task_board::TaskBoard;
pub use upload_orchestrator::{BatchStats, UploadOrchestrator};
