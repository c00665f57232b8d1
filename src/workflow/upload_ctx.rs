//! 上传处理上下文
//!
//! 封装"我正在处理哪一批的第几个文件"这一信息

use crate::models::upload::TaskId;
use std::fmt::Display;

/// 上传处理上下文
#[derive(Debug, Clone)]
pub struct UploadCtx {
    /// 任务ID
    pub task_id: TaskId,

    /// 文件在本批中的序号（从1开始，仅用于日志显示）
    pub file_index: usize,

    /// 本批文件总数
    pub batch_size: usize,

    /// 文件名
    pub file_name: String,
}

impl UploadCtx {
    pub fn new(task_id: TaskId, file_index: usize, batch_size: usize, file_name: String) -> Self {
        Self {
            task_id,
            file_index,
            batch_size,
            file_name,
        }
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[上传 {}/{} {}]",
            self.file_index, self.batch_size, self.file_name
        )
    }
}
