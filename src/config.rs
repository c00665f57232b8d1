use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::query::QueryOptions;
use crate::models::upload::PollPolicy;

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 检索服务地址
    pub service_base_url: String,
    /// 存活探测超时（秒）
    pub liveness_timeout_secs: u64,
    /// 问答请求超时（秒），回答生成可能需要几十秒
    pub query_timeout_secs: u64,
    /// 上传状态轮询间隔（毫秒）
    pub upload_poll_interval_ms: u64,
    /// 上传状态轮询最大次数
    pub upload_poll_max_attempts: u32,
    /// 健康检查间隔（秒）
    pub health_check_interval_secs: u64,
    /// 连续失败多少次后才判定为离线
    pub health_failure_threshold: u32,
    /// 待上传文档目录
    pub upload_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 查询参数 ---
    pub top_k: u32,
    pub rerank_k: u32,
    pub use_hybrid_search: bool,
    pub include_sources: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://localhost:8000".to_string(),
            liveness_timeout_secs: 15,
            query_timeout_secs: 180,
            upload_poll_interval_ms: 1000,
            upload_poll_max_attempts: 30,
            health_check_interval_secs: 10,
            health_failure_threshold: 1,
            upload_folder: "documents".to_string(),
            verbose_logging: false,
            top_k: 5,
            rerank_k: 3,
            use_hybrid_search: true,
            include_sources: true,
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// 若设置了 `RAG_CLIENT_CONFIG`，先读取该 TOML 文件，再用环境变量覆盖。
    pub fn load() -> Result<Self> {
        let config = match std::env::var("RAG_CLIENT_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?.with_env_overrides(),
            Err(_) => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 检查取值范围
    ///
    /// 间隔为 0 会让定时器无法工作，轮询次数为 0 会跳过所有状态查询
    pub fn validate(&self) -> Result<()> {
        if self.health_check_interval_secs == 0 {
            bail!("health_check_interval_secs 必须大于 0");
        }
        if self.upload_poll_interval_ms == 0 {
            bail!("upload_poll_interval_ms 必须大于 0");
        }
        if self.upload_poll_max_attempts == 0 {
            bail!("upload_poll_max_attempts 必须大于 0");
        }
        if self.liveness_timeout_secs == 0 {
            bail!("liveness_timeout_secs 必须大于 0");
        }
        if self.query_timeout_secs == 0 {
            bail!("query_timeout_secs 必须大于 0");
        }
        Ok(())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            service_base_url: std::env::var("SERVICE_BASE_URL").unwrap_or(self.service_base_url),
            liveness_timeout_secs: env_parse("LIVENESS_TIMEOUT_SECS").unwrap_or(self.liveness_timeout_secs),
            query_timeout_secs: env_parse("QUERY_TIMEOUT_SECS").unwrap_or(self.query_timeout_secs),
            upload_poll_interval_ms: env_parse("UPLOAD_POLL_INTERVAL_MS").unwrap_or(self.upload_poll_interval_ms),
            upload_poll_max_attempts: env_parse("UPLOAD_POLL_MAX_ATTEMPTS").unwrap_or(self.upload_poll_max_attempts),
            health_check_interval_secs: env_parse("HEALTH_CHECK_INTERVAL_SECS").unwrap_or(self.health_check_interval_secs),
            health_failure_threshold: env_parse("HEALTH_FAILURE_THRESHOLD").unwrap_or(self.health_failure_threshold),
            upload_folder: std::env::var("UPLOAD_FOLDER").unwrap_or(self.upload_folder),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            top_k: env_parse("QUERY_TOP_K").unwrap_or(self.top_k),
            rerank_k: env_parse("QUERY_RERANK_K").unwrap_or(self.rerank_k),
            use_hybrid_search: env_parse("QUERY_USE_HYBRID_SEARCH").unwrap_or(self.use_hybrid_search),
            include_sources: env_parse("QUERY_INCLUDE_SOURCES").unwrap_or(self.include_sources),
        }
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// 上传轮询策略
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.upload_poll_interval_ms),
            max_attempts: self.upload_poll_max_attempts,
        }
    }

    /// 查询参数
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            top_k: self.top_k,
            rerank_k: self.rerank_k,
            use_hybrid_search: self.use_hybrid_search,
            include_sources: self.include_sources,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_policy() {
        let config = Config::default();
        assert_eq!(config.liveness_timeout(), Duration::from_secs(15));
        assert_eq!(config.health_check_interval(), Duration::from_secs(10));

        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 30);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            service_base_url = "http://rag.internal:9000"
            upload_poll_max_attempts = 5
            health_failure_threshold = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.service_base_url, "http://rag.internal:9000");
        assert_eq!(config.upload_poll_max_attempts, 5);
        assert_eq!(config.health_failure_threshold, 3);
        assert_eq!(config.upload_poll_interval_ms, 1000);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn test_zero_intervals_and_attempts_are_rejected() {
        for field in [
            "health_check_interval_secs",
            "upload_poll_interval_ms",
            "upload_poll_max_attempts",
            "liveness_timeout_secs",
            "query_timeout_secs",
        ] {
            let err = Config::from_toml_str(&format!("{} = 0", field)).unwrap_err();
            assert!(err.to_string().contains(field), "{}: {}", field, err);
        }
    }

    #[test]
    fn test_env_overrides_are_validated() {
        let config = Config {
            health_check_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("upload_poll_max_attempts = \"many\"").is_err());
    }
}
