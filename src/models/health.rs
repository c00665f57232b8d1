use std::fmt;

/// 后端连通性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    /// 尚未完成任何一次探测
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HealthState::Unknown => "检测中...",
            HealthState::Available => "已连接",
            HealthState::Unavailable => "离线",
        };
        f.write_str(text)
    }
}
