#![allow(dead_code)]

use async_trait::async_trait;
use rag_query_client::error::{AppResult, ClientError};
use rag_query_client::models::{
    Citation, DocumentFile, ProcessingStatus, QueryOptions, QueryResponse, RemoteStatus,
    UploadReceipt, UploadTask,
};
use rag_query_client::RemoteService;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// 记录下来的远程调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(String),
    Poll(String),
    Query(String),
    Probe,
}

/// 脚本化的远程服务
///
/// - 上传结果按调用顺序出队，队列为空时返回 Ready
/// - 状态查询按文档ID分别出队，队列为空时返回 Pending 0%
/// - 问答结果按顺序出队，队列为空时返回固定回答
/// - 可以用 `Notify` 卡住探测和问答，模拟慢请求
#[derive(Default)]
pub struct MockRemoteService {
    uploads: Mutex<VecDeque<AppResult<UploadReceipt>>>,
    polls: Mutex<HashMap<String, VecDeque<AppResult<ProcessingStatus>>>>,
    answers: Mutex<VecDeque<AppResult<QueryResponse>>>,
    probe_alive: AtomicBool,
    probe_gate: Mutex<Option<Arc<Notify>>>,
    query_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
    board: Mutex<Option<watch::Receiver<Vec<UploadTask>>>>,
    snapshots: Mutex<Vec<(Call, Vec<UploadTask>)>>,
}

impl MockRemoteService {
    pub fn new() -> Arc<Self> {
        let mock = Self::default();
        mock.probe_alive.store(true, Ordering::SeqCst);
        Arc::new(mock)
    }

    pub fn push_upload(&self, result: AppResult<UploadReceipt>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_poll(&self, document_id: &str, result: AppResult<ProcessingStatus>) {
        self.polls
            .lock()
            .unwrap()
            .entry(document_id.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn push_answer(&self, result: AppResult<QueryResponse>) {
        self.answers.lock().unwrap().push_back(result);
    }

    pub fn set_alive(&self, alive: bool) {
        self.probe_alive.store(alive, Ordering::SeqCst);
    }

    /// 之后的探测都要等 `Notify` 放行
    pub fn gate_probes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.probe_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// 之后的问答都要等 `Notify` 放行
    pub fn gate_queries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.query_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// 每次上传/轮询时记录看板快照
    pub fn watch_board(&self, rx: watch::Receiver<Vec<UploadTask>>) {
        *self.board.lock().unwrap() = Some(rx);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn probe_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Probe))
    }

    pub fn poll_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Poll(_)))
    }

    pub fn query_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Query(_)))
    }

    pub fn snapshots(&self) -> Vec<(Call, Vec<UploadTask>)> {
        self.snapshots.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        let board = self.board.lock().unwrap().as_ref().map(|rx| rx.borrow().clone());
        if let Some(tasks) = board {
            self.snapshots.lock().unwrap().push((call.clone(), tasks));
        }
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteService for MockRemoteService {
    async fn upload(&self, file: &DocumentFile) -> AppResult<UploadReceipt> {
        self.record(Call::Upload(file.file_name.clone()));
        let next = self.uploads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(UploadReceipt::ready(format!("doc_{}", file.file_name))))
    }

    async fn poll_status(&self, document_id: &str) -> AppResult<ProcessingStatus> {
        self.record(Call::Poll(document_id.to_string()));
        let next = self
            .polls
            .lock()
            .unwrap()
            .get_mut(document_id)
            .and_then(|queue| queue.pop_front());
        next.unwrap_or_else(|| Ok(ProcessingStatus::new(RemoteStatus::Pending, 0.0)))
    }

    async fn submit_question(
        &self,
        question: &str,
        _options: &QueryOptions,
    ) -> AppResult<QueryResponse> {
        self.record(Call::Query(question.to_string()));
        let gate = self.query_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let next = self.answers.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(answer("文档中提到了三个要点")))
    }

    async fn probe_liveness(&self) -> bool {
        self.record(Call::Probe);
        let gate = self.probe_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.probe_alive.load(Ordering::SeqCst)
    }
}

// ========== 构造辅助函数 ==========

pub fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, Some("application/pdf"), b"%PDF-1.7".to_vec())
}

pub fn pending(document_id: &str) -> AppResult<UploadReceipt> {
    Ok(UploadReceipt::pending(document_id))
}

pub fn ready(document_id: &str) -> AppResult<UploadReceipt> {
    Ok(UploadReceipt::ready(document_id))
}

pub fn status(status: RemoteStatus, progress: f64) -> AppResult<ProcessingStatus> {
    Ok(ProcessingStatus::new(status, progress))
}

pub fn failed_status(message: &str) -> AppResult<ProcessingStatus> {
    Ok(ProcessingStatus {
        status: RemoteStatus::Error,
        progress: 0.0,
        error: Some(message.to_string()),
    })
}

pub fn connection_refused(endpoint: &str) -> ClientError {
    ClientError::transport(
        endpoint,
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}

pub fn answer(text: &str) -> QueryResponse {
    QueryResponse {
        answer: text.to_string(),
        citations: vec![Citation {
            id: "chunk_0".to_string(),
            score: Some(0.92),
            metadata: HashMap::from([(
                "filename".to_string(),
                serde_json::json!("report.pdf"),
            )]),
        }],
        retrieved_count: 5,
        reranked_count: 3,
        confidence_score: 0.8,
        processing_time_ms: 1200.0,
    }
}

/// 反复让出执行权，直到条件满足
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub const SECOND: Duration = Duration::from_secs(1);
