/// 检索服务 HTTP 客户端
///
/// 封装所有与检索服务 REST 接口的交互
use crate::clients::remote_service::RemoteService;
use crate::config::Config;
use crate::error::{AppResult, ClientError};
use crate::models::{
    DocumentFile, DocumentListing, ProcessingStatus, QueryOptions, QueryResponse, RemoteStatus,
    UploadReceipt,
};
use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const UPLOAD_ENDPOINT: &str = "/documents/upload";
const DOCUMENTS_ENDPOINT: &str = "/documents";
const QUERY_ENDPOINT: &str = "/query";
const HEALTH_ENDPOINT: &str = "/health";

/// 检索服务 HTTP 客户端
#[derive(Clone)]
pub struct HttpRemoteService {
    http: reqwest::Client,
    base: Url,
    base_url: String,
    liveness_timeout: Duration,
    query_timeout: Duration,
}

impl HttpRemoteService {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_timeouts(
            &config.service_base_url,
            config.liveness_timeout(),
            config.query_timeout(),
        )
    }

    /// 使用自定义超时创建客户端
    ///
    /// # 参数
    /// - `base_url`: 服务地址，可以带路径前缀（如 `http://host/api/v1`）
    /// - `liveness_timeout`: 存活探测超时
    /// - `query_timeout`: 问答请求超时
    pub fn with_timeouts(
        base_url: &str,
        liveness_timeout: Duration,
        query_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("无效的服务地址: {}", base_url))?;
        if base.cannot_be_a_base() {
            bail!("服务地址不能作为基础路径: {}", base_url);
        }
        let http = reqwest::Client::builder()
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base,
            base_url: base_url.trim_end_matches('/').to_string(),
            liveness_timeout,
            query_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 处理状态地址，文档 ID 作为单个路径段编码
    fn status_url(&self, document_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["documents", document_id, "status"]);
        }
        url
    }

    /// 发送请求，返回状态码和响应体
    async fn execute(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> AppResult<(StatusCode, String)> {
        let response = req
            .send()
            .await
            .map_err(|e| ClientError::transport(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(endpoint, e))?;
        debug!("{} -> {} ({} 字节)", endpoint, status, body.len());
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> AppResult<T> {
        let (status, body) = self.execute(endpoint, req).await?;
        if !status.is_success() {
            return Err(ClientError::service(
                endpoint,
                status.as_u16(),
                error_detail(&body),
            ));
        }
        decode(endpoint, &body)
    }

    /// 分页列出知识库中的文档
    pub async fn list_documents(&self, skip: usize, limit: usize) -> AppResult<DocumentListing> {
        let req = self
            .http
            .get(self.url(DOCUMENTS_ENDPOINT))
            .query(&[("skip", skip), ("limit", limit)]);
        self.send_json(DOCUMENTS_ENDPOINT, req).await
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn upload(&self, file: &DocumentFile) -> AppResult<UploadReceipt> {
        let mime = file
            .mime_type
            .clone()
            .or_else(|| file.kind().map(|k| k.mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let part = Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(&mime)
            .map_err(|e| ClientError::validation(&file.file_name, e.to_string()))?;
        let form = Form::new().part("file", part);

        let req = self.http.post(self.url(UPLOAD_ENDPOINT)).multipart(form);
        let (status, body) = self.execute(UPLOAD_ENDPOINT, req).await?;

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => Err(
                ClientError::validation(&file.file_name, error_detail(&body)),
            ),
            s if !s.is_success() => Err(ClientError::service(
                UPLOAD_ENDPOINT,
                s.as_u16(),
                error_detail(&body),
            )),
            _ => {
                let wire: UploadWire = decode(UPLOAD_ENDPOINT, &body)?;
                Ok(wire.into())
            }
        }
    }

    async fn poll_status(&self, document_id: &str) -> AppResult<ProcessingStatus> {
        let endpoint = format!("{}/{}/status", DOCUMENTS_ENDPOINT, document_id);
        let req = self.http.get(self.status_url(document_id));
        let wire: StatusWire = self.send_json(&endpoint, req).await?;
        Ok(wire.into())
    }

    async fn submit_question(
        &self,
        question: &str,
        options: &QueryOptions,
    ) -> AppResult<QueryResponse> {
        let payload = QueryWire {
            query: question,
            options,
        };
        let req = self
            .http
            .post(self.url(QUERY_ENDPOINT))
            .timeout(self.query_timeout)
            .json(&payload);
        self.send_json(QUERY_ENDPOINT, req).await
    }

    async fn probe_liveness(&self) -> bool {
        let probe = self.http.get(self.url(HEALTH_ENDPOINT)).send();
        match tokio::time::timeout(self.liveness_timeout, probe).await {
            Ok(Ok(response)) => {
                let ok = response.status().is_success();
                if !ok {
                    debug!("存活探测返回 {}", response.status());
                }
                ok
            }
            Ok(Err(e)) => {
                debug!("存活探测失败: {}", e);
                false
            }
            Err(_) => {
                debug!("存活探测超时 ({:?})", self.liveness_timeout);
                false
            }
        }
    }
}

// ========== 请求/响应结构（与服务端接口对应） ==========

#[derive(Debug, Deserialize)]
struct UploadWire {
    status: String,
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    text_length: Option<usize>,
    #[serde(default)]
    preview: Option<String>,
}

impl From<UploadWire> for UploadReceipt {
    fn from(wire: UploadWire) -> Self {
        // 上传接口只区分"立即可用"和"后台处理中"
        let status = match RemoteStatus::from_wire(&wire.status) {
            RemoteStatus::Ready => RemoteStatus::Ready,
            _ => RemoteStatus::Pending,
        };
        UploadReceipt {
            status,
            document_id: wire.doc_id,
            text_length: wire.text_length,
            preview: wire.preview,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl From<StatusWire> for ProcessingStatus {
    fn from(wire: StatusWire) -> Self {
        ProcessingStatus {
            status: RemoteStatus::from_wire(wire.status.as_deref().unwrap_or_default()),
            progress: wire.progress.unwrap_or(0.0),
            error: wire.error,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryWire<'a> {
    query: &'a str,
    #[serde(flatten)]
    options: &'a QueryOptions,
}

#[derive(Debug, Deserialize)]
struct ErrorWire {
    detail: serde_json::Value,
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// 提取错误响应中的 `detail` 字段，没有则返回原始响应体
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorWire>(body) {
        Ok(ErrorWire {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorWire { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "空响应".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
