//! 单个文件的上传流程 - 流程层
//!
//! 核心职责：把"一个文件"从 Uploading 推进到终态
//!
//! 流程顺序：
//! 1. upload → Ready ⇒ Success
//! 2. upload → Pending ⇒ Extracted → 按固定间隔轮询 → Success / Error
//! 3. 轮询次数用尽 ⇒ 按成功处理（上传本身已经成功）

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::RemoteService;
use crate::models::upload::{PollPolicy, UploadEvent, UploadStatus};
use crate::models::{DocumentFile, RemoteStatus};
use crate::orchestrator::task_board::TaskBoard;
use crate::workflow::upload_ctx::UploadCtx;

/// 单个文件的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded,
    Failed,
    /// 任务被用户移除或看板已关闭，结果无人关心
    Abandoned,
}

/// 轮询子循环的结束方式
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready,
    Failed(String),
    /// 次数用尽仍未得到终态
    CeilingReached,
    Abandoned,
}

/// 上传流程
///
/// - 只处理单个文件
/// - 所有状态变化都通过 `TaskBoard::apply` 写入，看板关闭后自动失效
/// - 不关心批次顺序（由编排层保证）
pub struct UploadFlow<S: RemoteService + ?Sized> {
    service: Arc<S>,
    policy: PollPolicy,
}

impl<S: RemoteService + ?Sized> UploadFlow<S> {
    pub fn new(service: Arc<S>, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    pub async fn run(&self, board: &TaskBoard, ctx: &UploadCtx, file: &DocumentFile) -> UploadOutcome {
        if board.apply(&ctx.task_id, UploadEvent::Started).is_none() {
            return UploadOutcome::Abandoned;
        }
        info!("{} 📤 开始上传 ({} 字节)", ctx, file.content.len());

        let receipt = match self.service.upload(file).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!("{} ❌ 上传失败: {}", ctx, e);
                return self.finish(
                    board,
                    ctx,
                    UploadEvent::Failed {
                        message: e.to_string(),
                    },
                );
            }
        };

        match (receipt.status, receipt.document_id) {
            (RemoteStatus::Ready, document_id) => {
                info!("{} ✓ 文档已可检索", ctx);
                self.finish(
                    board,
                    ctx,
                    UploadEvent::Ready {
                        document_id,
                        text_length: receipt.text_length,
                        preview: receipt.preview,
                    },
                )
            }
            (_, Some(document_id)) => {
                info!("{} ⏳ 文本已提取，等待后台处理 (文档 {})", ctx, document_id);
                let extracted = UploadEvent::Extracted {
                    document_id: document_id.clone(),
                    text_length: receipt.text_length,
                    preview: receipt.preview,
                };
                if board.apply(&ctx.task_id, extracted).is_none() {
                    return UploadOutcome::Abandoned;
                }

                match self.poll_until_done(board, ctx, &document_id).await {
                    PollOutcome::Ready => {
                        info!("{} ✓ 后台处理完成", ctx);
                        self.finish(board, ctx, UploadEvent::Processed)
                    }
                    PollOutcome::Failed(message) => {
                        error!("{} ❌ 后台处理失败: {}", ctx, message);
                        self.finish(board, ctx, UploadEvent::Failed { message })
                    }
                    PollOutcome::CeilingReached => {
                        // 上传已成功，长时间没有终态时按"已接收、状态未知"处理
                        warn!(
                            "{} ⚠️ 轮询 {} 次仍未完成，按成功处理",
                            ctx, self.policy.max_attempts
                        );
                        self.finish(board, ctx, UploadEvent::CeilingReached)
                    }
                    PollOutcome::Abandoned => UploadOutcome::Abandoned,
                }
            }
            (_, None) => {
                error!("{} ❌ 服务端未返回文档ID", ctx);
                self.finish(
                    board,
                    ctx,
                    UploadEvent::Failed {
                        message: "服务端未返回文档ID，无法跟踪处理进度".to_string(),
                    },
                )
            }
        }
    }

    /// 轮询子循环
    ///
    /// 单次查询失败不会结束循环，只有远程终态、次数用尽或任务失效才会结束
    pub async fn poll_until_done(
        &self,
        board: &TaskBoard,
        ctx: &UploadCtx,
        document_id: &str,
    ) -> PollOutcome {
        for attempt in 1..=self.policy.max_attempts {
            sleep(self.policy.interval).await;

            if board.is_cancelled() || !board.contains(&ctx.task_id) {
                debug!("{} 任务已失效，停止轮询", ctx);
                return PollOutcome::Abandoned;
            }

            let status = match self.service.poll_status(document_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(
                        "{} 状态查询失败 (尝试 {}/{}): {}",
                        ctx, attempt, self.policy.max_attempts, e
                    );
                    continue;
                }
            };

            debug!(
                "{} 轮询 {}/{}: {:?} {:.0}%",
                ctx, attempt, self.policy.max_attempts, status.status, status.progress
            );

            match status.status {
                RemoteStatus::Ready => return PollOutcome::Ready,
                RemoteStatus::Error => {
                    return PollOutcome::Failed(
                        status
                            .error
                            .unwrap_or_else(|| "文档处理失败".to_string()),
                    )
                }
                RemoteStatus::Pending => {
                    let progress = UploadEvent::Progress {
                        remote_progress: status.progress,
                    };
                    if board.apply(&ctx.task_id, progress).is_none() {
                        return PollOutcome::Abandoned;
                    }
                }
            }
        }

        PollOutcome::CeilingReached
    }

    fn finish(&self, board: &TaskBoard, ctx: &UploadCtx, event: UploadEvent) -> UploadOutcome {
        match board.apply(&ctx.task_id, event) {
            Some(UploadStatus::Success) => UploadOutcome::Succeeded,
            Some(UploadStatus::Error) => UploadOutcome::Failed,
            Some(status) => {
                // 终态事件不会留下非终态任务
                warn!("{} 任务停留在非终态: {}", ctx, status);
                UploadOutcome::Failed
            }
            None => UploadOutcome::Abandoned,
        }
    }
}
