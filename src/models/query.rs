//! 问答相关数据结构

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// 单个问题的最大长度（字符）
pub const MAX_QUESTION_CHARS: usize = 1000;

/// 检索参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub top_k: u32,
    pub rerank_k: u32,
    pub use_hybrid_search: bool,
    pub include_sources: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            rerank_k: 3,
            use_hybrid_search: true,
            include_sources: true,
        }
    }
}

/// 回答引用的文档片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl Citation {
    /// 引用来源文件名（服务端放在 metadata.filename 中）
    pub fn source_name(&self) -> Option<&str> {
        self.metadata.get("filename").and_then(|v| v.as_str())
    }
}

/// 检索服务给出的回答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "response")]
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub retrieved_count: u32,
    #[serde(default)]
    pub reranked_count: u32,
    /// 0-1
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub processing_time_ms: f64,
}

/// 会话状态
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Idle,
    InFlight,
    Completed(QueryResponse),
    Failed(String),
}

impl QueryState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, QueryState::InFlight)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Completed(_) | QueryState::Failed(_))
    }
}

/// 一次问答
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySession {
    question: String,
    pub state: QueryState,
}

impl QuerySession {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            state: QueryState::Idle,
        }
    }

    /// 提交的问题，创建后不可修改
    pub fn question(&self) -> &str {
        &self.question
    }
}
