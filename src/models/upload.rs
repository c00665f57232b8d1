//! 上传任务 - 单个文件的生命周期状态机
//!
//! ```text
//! Uploading ──► Extracted ──► Embedding ──► Success
//!     │              │            │   ▲
//!     │              │            └───┘ (轮询进度)
//!     └──────────────┴────────────┴───► Error
//! ```
//!
//! 所有状态变化都经过 [`UploadTask::apply`]，状态只进不退，进度只增不减。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 开始上传时的进度
const STARTED_PROGRESS: u8 = 10;
/// 文本提取完成、进入后台处理时的进度
const EXTRACTED_PROGRESS: u8 = 50;
/// 未到终态前的进度上限
const MAX_PENDING_PROGRESS: u8 = 99;

/// 任务ID，会话内唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 任务ID生成器
///
/// ID 由提交时间和递增序号组成，同一毫秒内提交多个文件也不会重复
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    next: AtomicU64,
}

impl TaskIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> TaskId {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        TaskId(format!("{}-{}", chrono::Utc::now().timestamp_millis(), seq))
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Extracted,
    Embedding,
    Success,
    Error,
}

impl UploadStatus {
    /// 在生命周期中的先后位置
    fn stage(self) -> u8 {
        match self {
            UploadStatus::Uploading => 0,
            UploadStatus::Extracted => 1,
            UploadStatus::Embedding => 2,
            UploadStatus::Success | UploadStatus::Error => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UploadStatus::Uploading => "上传中",
            UploadStatus::Extracted => "文本已提取",
            UploadStatus::Embedding => "生成向量中",
            UploadStatus::Success => "可以检索",
            UploadStatus::Error => "失败",
        };
        f.write_str(text)
    }
}

/// 驱动状态机的事件
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// 开始调用上传接口
    Started,
    /// 服务端已接收文件，后台继续处理
    Extracted {
        document_id: String,
        text_length: Option<usize>,
        preview: Option<String>,
    },
    /// 服务端已接收文件，立即可用
    Ready {
        document_id: Option<String>,
        text_length: Option<usize>,
        preview: Option<String>,
    },
    /// 轮询得到的远程进度 (0-100)
    Progress { remote_progress: f64 },
    /// 轮询得到完成状态
    Processed,
    /// 轮询次数用尽，仍未得到终态
    CeilingReached,
    /// 失败
    Failed { message: String },
}

/// 单个文件的上传任务
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    pub id: TaskId,
    pub file_name: String,
    pub status: UploadStatus,
    pub progress: u8,
    pub document_id: Option<String>,
    pub error_message: Option<String>,
    pub text_length: Option<usize>,
    pub preview: Option<String>,
}

impl UploadTask {
    /// 新建一个等待上传的任务
    pub fn new(id: TaskId, file_name: impl Into<String>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            status: UploadStatus::Uploading,
            progress: 0,
            document_id: None,
            error_message: None,
            text_length: None,
            preview: None,
        }
    }

    /// 新建一个本地校验失败的任务（不会访问远程服务）
    pub fn rejected(id: TaskId, file_name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut task = Self::new(id, file_name);
        task.status = UploadStatus::Error;
        task.error_message = Some(message.into());
        task
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// 状态转移函数
    ///
    /// # 返回
    /// 任务是否发生了变化。终态任务、会导致状态倒退的事件一律忽略
    pub fn apply(&mut self, event: UploadEvent) -> bool {
        if self.is_terminal() {
            return false;
        }

        match event {
            UploadEvent::Started => self.raise_progress(STARTED_PROGRESS),
            UploadEvent::Extracted {
                document_id,
                text_length,
                preview,
            } => {
                if !self.advance(UploadStatus::Extracted) {
                    return false;
                }
                self.document_id = Some(document_id);
                self.text_length = text_length;
                self.preview = preview;
                self.raise_progress(EXTRACTED_PROGRESS);
                true
            }
            UploadEvent::Ready {
                document_id,
                text_length,
                preview,
            } => {
                if document_id.is_some() {
                    self.document_id = document_id;
                }
                if text_length.is_some() {
                    self.text_length = text_length;
                }
                if preview.is_some() {
                    self.preview = preview;
                }
                self.succeed()
            }
            UploadEvent::Progress { remote_progress } => {
                let advanced = self.advance(UploadStatus::Embedding);
                let raised = self.raise_progress(map_remote_progress(remote_progress));
                advanced || raised
            }
            UploadEvent::Processed | UploadEvent::CeilingReached => self.succeed(),
            UploadEvent::Failed { message } => {
                self.status = UploadStatus::Error;
                self.progress = 0;
                self.error_message = Some(message);
                true
            }
        }
    }

    /// 向前推进状态；目标状态在当前状态之前时拒绝
    fn advance(&mut self, to: UploadStatus) -> bool {
        if to.stage() < self.status.stage() {
            return false;
        }
        let changed = self.status != to;
        self.status = to;
        changed
    }

    fn raise_progress(&mut self, progress: u8) -> bool {
        if progress > self.progress {
            self.progress = progress;
            true
        } else {
            false
        }
    }

    fn succeed(&mut self) -> bool {
        self.status = UploadStatus::Success;
        self.progress = 100;
        true
    }
}

/// 远程进度映射到任务进度的后半段: 50 + 0.5 × remote，终态前最多 99
pub fn map_remote_progress(remote_progress: f64) -> u8 {
    let remote = if remote_progress.is_finite() {
        remote_progress.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let mapped = f64::from(EXTRACTED_PROGRESS) + remote * 0.5;
    (mapped.floor() as u8).min(MAX_PENDING_PROGRESS)
}

/// 上传后台处理的轮询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// 两次轮询之间的间隔
    pub interval: Duration,
    /// 最多轮询次数，用尽后按成功处理
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}
