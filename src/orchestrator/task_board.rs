//! 上传任务看板
//!
//! 持有全部 `UploadTask`，每次变化后通过 watch 通道发布一份快照给展示层。
//! 看板被关闭后，所有后续的状态写入都会被丢弃。

use crate::models::upload::{TaskId, UploadEvent, UploadStatus, UploadTask};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// 上传任务看板
pub struct TaskBoard {
    tasks: watch::Sender<Vec<UploadTask>>,
    cancelled: AtomicBool,
}

impl TaskBoard {
    pub fn new() -> Self {
        let (tasks, _) = watch::channel(Vec::new());
        Self {
            tasks,
            cancelled: AtomicBool::new(false),
        }
    }

    /// 订阅任务快照
    pub fn subscribe(&self) -> watch::Receiver<Vec<UploadTask>> {
        self.tasks.subscribe()
    }

    /// 当前全部任务（按提交顺序）
    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.tasks.borrow().clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<UploadTask> {
        self.tasks.borrow().iter().find(|t| &t.id == id).cloned()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.borrow().iter().any(|t| &t.id == id)
    }

    /// 加入新任务；看板关闭后不再接受
    pub fn insert(&self, task: UploadTask) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.tasks.send_modify(|tasks| tasks.push(task));
        true
    }

    /// 对单个任务应用事件
    ///
    /// # 返回
    /// 任务当前状态；任务已被移除或看板已关闭时返回 `None`
    pub fn apply(&self, id: &TaskId, event: UploadEvent) -> Option<UploadStatus> {
        if self.is_cancelled() {
            debug!("[上传 {}] 看板已关闭，丢弃事件 {:?}", id, event);
            return None;
        }

        let mut status = None;
        self.tasks.send_if_modified(|tasks| {
            match tasks.iter_mut().find(|t| &t.id == id) {
                Some(task) => {
                    let changed = task.apply(event);
                    status = Some(task.status);
                    changed
                }
                None => false,
            }
        });
        status
    }

    /// 移除任务（用户操作）
    pub fn remove(&self, id: &TaskId) -> bool {
        self.tasks.send_if_modified(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| &t.id != id);
            tasks.len() != before
        })
    }

    /// 清除所有已结束的任务（用户操作）
    ///
    /// # 返回
    /// 被清除的任务数
    pub fn clear_finished(&self) -> usize {
        let mut removed = 0;
        self.tasks.send_if_modified(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| !t.is_terminal());
            removed = before - tasks.len();
            removed > 0
        });
        removed
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::upload::TaskIdGenerator;

    #[test]
    fn test_apply_publishes_snapshot() {
        let ids = TaskIdGenerator::new();
        let board = TaskBoard::new();
        let mut rx = board.subscribe();
        let id = ids.next_id();
        board.insert(UploadTask::new(id.clone(), "a.txt"));
        rx.borrow_and_update();

        assert_eq!(
            board.apply(&id, UploadEvent::Processed),
            Some(UploadStatus::Success)
        );
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].progress, 100);

        // 终态后的事件不产生新快照
        board.apply(&id, UploadEvent::Started);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_cancelled_board_drops_writes() {
        let ids = TaskIdGenerator::new();
        let board = TaskBoard::new();
        let id = ids.next_id();
        board.insert(UploadTask::new(id.clone(), "a.txt"));
        board.cancel();

        assert_eq!(board.apply(&id, UploadEvent::Processed), None);
        assert_eq!(board.get(&id).unwrap().status, UploadStatus::Uploading);
        assert!(!board.insert(UploadTask::new(ids.next_id(), "b.txt")));
    }

    #[test]
    fn test_remove_and_clear_finished() {
        let ids = TaskIdGenerator::new();
        let board = TaskBoard::new();
        let done = ids.next_id();
        let running = ids.next_id();
        let failed = ids.next_id();
        board.insert(UploadTask::new(done.clone(), "a.txt"));
        board.insert(UploadTask::new(running.clone(), "b.txt"));
        board.insert(UploadTask::rejected(failed.clone(), "c.png", "unsupported"));
        board.apply(&done, UploadEvent::Processed);

        assert_eq!(board.clear_finished(), 2);
        assert_eq!(board.snapshot().len(), 1);
        assert!(board.remove(&running));
        assert!(!board.remove(&running));
        assert_eq!(board.apply(&running, UploadEvent::Started), None);
    }
}
