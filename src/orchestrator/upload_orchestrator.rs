//! 上传编排器 - 编排层
//!
//! ## 职责
//!
//! 接收一批文件，逐个驱动它们走完上传生命周期，并在每次状态变化后发布任务快照。
//!
//! ## 核心规则
//!
//! 1. **本地校验**：不在白名单中的文件立即生成失败任务，不访问远程服务
//! 2. **严格顺序**：第 N+1 个文件的上传在第 N 个文件到达终态之后才开始
//! 3. **批次排队**：后提交的批次等前一批全部结束后再开始
//! 4. **失败隔离**：单个文件失败不影响同批其他文件
//! 5. **可关闭**：`shutdown` 之后所有迟到的结果都被丢弃

use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::clients::RemoteService;
use crate::models::document::UNSUPPORTED_KIND_MESSAGE;
use crate::models::upload::{PollPolicy, TaskId, TaskIdGenerator, UploadTask};
use crate::models::DocumentFile;
use crate::orchestrator::task_board::TaskBoard;
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::{UploadCtx, UploadFlow, UploadOutcome};

/// 批次处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 本地校验未通过
    pub rejected: usize,
    /// 处理途中被移除或关闭
    pub abandoned: usize,
}

/// 已登记到看板、等待处理的一批文件
struct PreparedBatch {
    accepted: Vec<(UploadCtx, DocumentFile)>,
    stats: BatchStats,
}

/// 上传编排器
pub struct UploadOrchestrator<S: RemoteService + ?Sized + 'static> {
    board: Arc<TaskBoard>,
    flow: Arc<UploadFlow<S>>,
    ids: TaskIdGenerator,
    ingest_lock: Arc<AsyncMutex<()>>,
    workers: Mutex<Vec<AbortHandle>>,
}

impl<S: RemoteService + ?Sized + 'static> UploadOrchestrator<S> {
    pub fn new(service: Arc<S>, policy: PollPolicy) -> Self {
        Self {
            board: Arc::new(TaskBoard::new()),
            flow: Arc::new(UploadFlow::new(service, policy)),
            ids: TaskIdGenerator::new(),
            ingest_lock: Arc::new(AsyncMutex::new(())),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// 订阅任务快照（展示层只读）
    pub fn subscribe(&self) -> watch::Receiver<Vec<UploadTask>> {
        self.board.subscribe()
    }

    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.board.snapshot()
    }

    pub fn task(&self, id: &TaskId) -> Option<UploadTask> {
        self.board.get(id)
    }

    /// 处理一批文件，等待全部结束
    ///
    /// # 返回
    /// 本批的统计结果
    pub async fn submit_batch(&self, files: Vec<DocumentFile>) -> BatchStats {
        let batch = self.prepare(files);
        run_batch(
            self.board.clone(),
            self.flow.clone(),
            self.ingest_lock.clone(),
            batch,
        )
        .await
    }

    /// 在后台处理一批文件
    ///
    /// 任务在返回前已经登记到看板；`shutdown` 会中止仍在运行的后台批次
    pub fn spawn_batch(&self, files: Vec<DocumentFile>) -> JoinHandle<BatchStats> {
        let batch = self.prepare(files);
        let handle = tokio::spawn(run_batch(
            self.board.clone(),
            self.flow.clone(),
            self.ingest_lock.clone(),
            batch,
        ));
        if let Ok(mut workers) = self.workers.lock() {
            workers.retain(|worker| !worker.is_finished());
            workers.push(handle.abort_handle());
        }
        handle
    }

    /// 移除任务（用户操作）
    pub fn remove(&self, id: &TaskId) -> bool {
        self.board.remove(id)
    }

    /// 清除已结束的任务（用户操作）
    pub fn clear_finished(&self) -> usize {
        self.board.clear_finished()
    }

    /// 关闭编排器：后续结果一律丢弃，后台批次被中止
    pub fn shutdown(&self) {
        self.board.cancel();
        if let Ok(mut workers) = self.workers.lock() {
            for worker in workers.drain(..) {
                worker.abort();
            }
        }
        info!("上传编排器已关闭");
    }

    /// 同步登记本批所有任务，并完成本地校验
    fn prepare(&self, files: Vec<DocumentFile>) -> PreparedBatch {
        let batch_size = files.len();
        let mut stats = BatchStats {
            total: batch_size,
            ..Default::default()
        };
        let mut accepted = Vec::with_capacity(batch_size);

        for (index, file) in files.into_iter().enumerate() {
            let id = self.ids.next_id();

            if file.kind().is_none() {
                warn!(
                    "[上传 {}/{} {}] ⚠️ 不支持的文件类型: {:?}",
                    index + 1,
                    batch_size,
                    file.file_name,
                    file.mime_type
                );
                let task = UploadTask::rejected(id, file.file_name.clone(), UNSUPPORTED_KIND_MESSAGE);
                if self.board.insert(task) {
                    stats.rejected += 1;
                } else {
                    stats.abandoned += 1;
                }
                continue;
            }

            if !self.board.insert(UploadTask::new(id.clone(), file.file_name.clone())) {
                stats.abandoned += 1;
                continue;
            }
            let ctx = UploadCtx::new(id, index + 1, batch_size, file.file_name.clone());
            accepted.push((ctx, file));
        }

        PreparedBatch { accepted, stats }
    }
}

impl<S: RemoteService + ?Sized + 'static> Drop for UploadOrchestrator<S> {
    fn drop(&mut self) {
        self.board.cancel();
        if let Ok(mut workers) = self.workers.lock() {
            for worker in workers.drain(..) {
                worker.abort();
            }
        }
    }
}

/// 逐个处理本批已通过校验的文件
async fn run_batch<S: RemoteService + ?Sized + 'static>(
    board: Arc<TaskBoard>,
    flow: Arc<UploadFlow<S>>,
    ingest_lock: Arc<AsyncMutex<()>>,
    batch: PreparedBatch,
) -> BatchStats {
    let PreparedBatch {
        accepted,
        mut stats,
    } = batch;

    if accepted.is_empty() {
        log_batch_complete(&stats);
        return stats;
    }

    // 同一时间只有一个批次在上传
    let _guard = ingest_lock.lock().await;
    log_batch_start(accepted.len(), stats.total);

    for (ctx, file) in &accepted {
        if board.is_cancelled() {
            stats.abandoned += 1;
            continue;
        }

        match flow.run(&board, ctx, file).await {
            UploadOutcome::Succeeded => stats.succeeded += 1,
            UploadOutcome::Failed => stats.failed += 1,
            UploadOutcome::Abandoned => stats.abandoned += 1,
        }
    }

    log_batch_complete(&stats);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::{ProcessingStatus, QueryOptions, QueryResponse, UploadReceipt};
    use async_trait::async_trait;

    /// 只接收本地校验不通过的文件，不会被真正调用
    struct OfflineService;

    #[async_trait]
    impl RemoteService for OfflineService {
        async fn upload(&self, _file: &DocumentFile) -> AppResult<UploadReceipt> {
            unreachable!("被拒绝的文件不应上传")
        }

        async fn poll_status(&self, _document_id: &str) -> AppResult<ProcessingStatus> {
            unreachable!("被拒绝的文件不应轮询")
        }

        async fn submit_question(
            &self,
            _question: &str,
            _options: &QueryOptions,
        ) -> AppResult<QueryResponse> {
            unreachable!()
        }

        async fn probe_liveness(&self) -> bool {
            false
        }
    }

    fn installer() -> DocumentFile {
        DocumentFile::new("setup.exe", Some("application/x-msdownload"), b"MZ".to_vec())
    }

    #[tokio::test]
    async fn test_finished_workers_are_pruned() {
        let orchestrator = UploadOrchestrator::new(Arc::new(OfflineService), PollPolicy::default());

        for _ in 0..5 {
            let stats = orchestrator.spawn_batch(vec![installer()]).await.unwrap();
            assert_eq!(stats.rejected, 1);
        }
        let last = orchestrator.spawn_batch(vec![installer()]);

        assert_eq!(orchestrator.workers.lock().unwrap().len(), 1);
        assert_eq!(last.await.unwrap().rejected, 1);
        assert_eq!(orchestrator.snapshot().len(), 6);
    }
}
