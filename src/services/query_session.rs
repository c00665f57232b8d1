//! 查询会话控制器 - 业务能力层
//!
//! 同一时间只允许一个问题在处理中。控制器自己保证这一点，不依赖调用方禁用输入框。
//! 正在处理的标志通过只读的 [`QueryActivity`] 暴露给健康监视器。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::clients::RemoteService;
use crate::error::QueryError;
use crate::models::query::{QueryOptions, QueryResponse, QuerySession, QueryState, MAX_QUESTION_CHARS};
use crate::utils::logging::truncate_text;

/// 查询进行中标志的只读视图
#[derive(Debug, Clone)]
pub struct QueryActivity {
    in_flight: Arc<AtomicBool>,
    changes: watch::Receiver<bool>,
}

impl QueryActivity {
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 订阅进行中标志的变化（开始处理为 `true`，结束为 `false`）
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        let mut rx = self.changes.clone();
        rx.borrow_and_update();
        rx
    }
}

/// 查询会话控制器
pub struct QuerySessionController<S: RemoteService + ?Sized> {
    service: Arc<S>,
    options: QueryOptions,
    in_flight: Arc<AtomicBool>,
    activity: watch::Sender<bool>,
    session: watch::Sender<Option<QuerySession>>,
}

impl<S: RemoteService + ?Sized> QuerySessionController<S> {
    pub fn new(service: Arc<S>, options: QueryOptions) -> Self {
        let (session, _) = watch::channel(None);
        let (activity, _) = watch::channel(false);
        Self {
            service,
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
            activity,
            session,
        }
    }

    /// 供健康监视器读取的进行中标志
    pub fn activity(&self) -> QueryActivity {
        QueryActivity {
            in_flight: self.in_flight.clone(),
            changes: self.activity.subscribe(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 当前会话（可能为空）
    pub fn current(&self) -> Option<QuerySession> {
        self.session.borrow().clone()
    }

    /// 订阅会话快照
    pub fn subscribe(&self) -> watch::Receiver<Option<QuerySession>> {
        self.session.subscribe()
    }

    /// 提交问题
    ///
    /// # 参数
    /// - `question`: 问题文本
    ///
    /// # 返回
    /// 成功时返回回答；有问题正在处理时返回 `QueryError::InFlight`，当前会话不受影响
    pub async fn submit(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        let len = question.chars().count();
        if len > MAX_QUESTION_CHARS {
            return Err(QueryError::TooLong {
                len,
                max: MAX_QUESTION_CHARS,
            });
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("拒绝新问题: 上一个问题仍在处理中");
            return Err(QueryError::InFlight);
        }
        // 从这里开始由 guard 负责释放标志
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            activity: &self.activity,
            session: &self.session,
        };
        self.activity.send_replace(true);

        let mut session = QuerySession::new(question);
        session.state = QueryState::InFlight;
        self.session.send_replace(Some(session));
        info!("❓ 提交问题: {}", truncate_text(question, 80));

        let result = self.service.submit_question(question, &self.options).await;

        let state = match &result {
            Ok(response) => {
                info!(
                    "✓ 收到回答: 引用 {} 条, 置信度 {:.2}, 耗时 {:.0}ms",
                    response.citations.len(),
                    response.confidence_score,
                    response.processing_time_ms
                );
                QueryState::Completed(response.clone())
            }
            Err(e) => {
                warn!("❌ 问答失败: {}", e);
                QueryState::Failed(e.to_string())
            }
        };
        guard.finish(state);

        result.map_err(QueryError::from)
    }
}

/// 会话进行中的守卫
///
/// 正常结束时写入终态；提交的 future 被中途丢弃时记为失败。两种情况都会释放进行中标志。
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    activity: &'a watch::Sender<bool>,
    session: &'a watch::Sender<Option<QuerySession>>,
}

impl InFlightGuard<'_> {
    fn finish(self, state: QueryState) {
        self.set_terminal(state);
    }

    fn set_terminal(&self, state: QueryState) {
        self.session.send_if_modified(|current| match current {
            Some(session) if session.state.is_in_flight() => {
                session.state = state;
                true
            }
            _ => false,
        });
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        // finish() 之后会话已是终态，这里不会覆盖
        self.set_terminal(QueryState::Failed("查询已取消".to_string()));
        self.in_flight.store(false, Ordering::SeqCst);
        self.activity.send_replace(false);
    }
}
