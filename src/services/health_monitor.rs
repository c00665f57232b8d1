//! 健康监视器 - 业务能力层
//!
//! 按固定间隔探测检索服务是否存活，启动时立即探测一次。
//!
//! 问答请求可能持续几十秒，期间同时探测容易超时，产生误报的"离线"。
//! 因此有问题正在处理时，本轮探测直接跳过（不排队、不补做）。
//! 问答结束后立即补探一次，并从这一刻重新开始计时。

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clients::RemoteService;
use crate::models::HealthState;
use crate::services::query_session::QueryActivity;

/// 探测间隔下限
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// 单次检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 有问题正在处理，本轮跳过
    Suppressed,
    /// 探测完成并写入了状态
    Probed(HealthState),
    /// 探测结果被丢弃（监视器已关闭，或探测期间开始了新的问答）
    Discarded,
}

/// 健康监视器
pub struct HealthMonitor<S: RemoteService + ?Sized + 'static> {
    service: Arc<S>,
    activity: QueryActivity,
    check_interval: Duration,
    failure_threshold: u32,
    consecutive_failures: AtomicU32,
    state: watch::Sender<HealthState>,
    cancelled: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: RemoteService + ?Sized + 'static> HealthMonitor<S> {
    /// 创建健康监视器
    ///
    /// # 参数
    /// - `service`: 远程服务
    /// - `activity`: 查询会话的进行中标志
    /// - `check_interval`: 探测间隔
    /// - `failure_threshold`: 连续失败多少次后判定离线（至少为 1）
    pub fn new(
        service: Arc<S>,
        activity: QueryActivity,
        check_interval: Duration,
        failure_threshold: u32,
    ) -> Self {
        let (state, _) = watch::channel(HealthState::Unknown);
        Self {
            service,
            activity,
            check_interval: check_interval.max(MIN_CHECK_INTERVAL),
            failure_threshold: failure_threshold.max(1),
            consecutive_failures: AtomicU32::new(0),
            state,
            cancelled: AtomicBool::new(false),
            timer: Mutex::new(None),
        }
    }

    pub fn state(&self) -> HealthState {
        *self.state.borrow()
    }

    /// 订阅连通性变化
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.state.subscribe()
    }

    /// 启动后台定时探测
    ///
    /// 除了固定间隔外，问答结束（进行中 → 空闲）时也会立即探测一次并重置计时器
    pub fn start(self: &Arc<Self>) {
        let monitor = Arc::clone(self);
        let mut activity = self.activity.subscribe();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(monitor.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut watching = true;
            loop {
                tokio::select! {
                    // 第一次 tick 立即返回
                    _ = ticker.tick() => {}
                    changed = activity.changed(), if watching => {
                        if changed.is_err() {
                            // 查询控制器已释放，只剩定时探测
                            watching = false;
                            continue;
                        }
                        if *activity.borrow_and_update() {
                            continue;
                        }
                        debug!("问答结束，立即检查连通性");
                        ticker.reset();
                    }
                }
                if monitor.is_cancelled() {
                    break;
                }
                monitor.tick().await;
            }
        });

        if let Ok(mut timer) = self.timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }
        info!("🩺 健康监视器已启动 (间隔 {:?})", self.check_interval);
    }

    /// 执行一次检查
    pub async fn tick(&self) -> TickOutcome {
        if self.is_cancelled() {
            return TickOutcome::Discarded;
        }
        if self.activity.is_in_flight() {
            debug!("有问题正在处理，跳过本轮健康检查");
            return TickOutcome::Suppressed;
        }

        let alive = self.service.probe_liveness().await;

        if self.is_cancelled() {
            debug!("监视器已关闭，丢弃探测结果");
            return TickOutcome::Discarded;
        }
        if self.activity.is_in_flight() {
            debug!("探测期间开始了新的问答，丢弃探测结果");
            return TickOutcome::Discarded;
        }

        let next = if alive {
            self.consecutive_failures.store(0, Ordering::SeqCst);
            HealthState::Available
        } else {
            let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
            if failures >= self.failure_threshold {
                HealthState::Unavailable
            } else {
                debug!(
                    "存活探测失败 {}/{}，暂不判定离线",
                    failures, self.failure_threshold
                );
                self.state()
            }
        };

        let changed = self.state.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
        if changed {
            match next {
                HealthState::Available => info!("🟢 检索服务: {}", next),
                HealthState::Unavailable => warn!("🔴 检索服务: {}", next),
                HealthState::Unknown => debug!("检索服务: {}", next),
            }
        }

        TickOutcome::Probed(next)
    }

    /// 关闭监视器：取消定时器，之后到达的探测结果一律丢弃
    pub fn shutdown(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
        debug!("健康监视器已关闭");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
