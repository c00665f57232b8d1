//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责组装各组件并管理它们的生命周期。
//!
//! ## 运行流程
//!
//! 1. **应用初始化**：创建 HTTP 客户端、查询会话控制器、健康监视器、上传编排器
//! 2. **健康监视**：启动后台探测
//! 3. **文档上传**：扫描文档目录，逐个上传并等待处理完成
//! 4. **问答循环**：从标准输入读取问题，打印回答和引用
//! 5. **资源清理**：关闭监视器和编排器，丢弃迟到的结果

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::clients::HttpRemoteService;
use crate::config::Config;
use crate::error::QueryError;
use crate::models::{load_documents_from_folder, DocumentListing};
use crate::orchestrator::upload_orchestrator::{BatchStats, UploadOrchestrator};
use crate::services::{HealthMonitor, QuerySessionController};
use crate::utils::logging::{log_answer, log_startup, print_final_stats};

const LISTING_PAGE_SIZE: usize = 100;

/// 应用主结构
pub struct App {
    config: Config,
    service: Arc<HttpRemoteService>,
    queries: QuerySessionController<HttpRemoteService>,
    monitor: Arc<HealthMonitor<HttpRemoteService>>,
    uploads: UploadOrchestrator<HttpRemoteService>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let service = Arc::new(HttpRemoteService::new(&config)?);
        let queries = QuerySessionController::new(service.clone(), config.query_options());
        let monitor = Arc::new(HealthMonitor::new(
            service.clone(),
            queries.activity(),
            config.health_check_interval(),
            config.health_failure_threshold,
        ));
        let uploads = UploadOrchestrator::new(service.clone(), config.poll_policy());

        Ok(Self {
            config,
            service,
            queries,
            monitor,
            uploads,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        self.monitor.start();

        self.report_existing_documents().await;

        let upload_stats = self.ingest_folder().await;

        let (answered, failed) = tokio::select! {
            counts = self.question_loop() => counts?,
            _ = tokio::signal::ctrl_c() => {
                warn!("⏹️ 收到中断信号，正在退出");
                (0, 0)
            }
        };

        self.shutdown();
        print_final_stats(&upload_stats, answered, failed);
        Ok(())
    }

    /// 列出服务端已有的文档
    async fn report_existing_documents(&self) {
        match self.service.list_documents(0, LISTING_PAGE_SIZE).await {
            Ok(DocumentListing { total, documents }) => {
                info!("📚 服务端已有 {} 个文档", total);
                for doc in &documents {
                    info!(
                        "  - {} ({})",
                        doc.filename.as_deref().unwrap_or(doc.id.as_str()),
                        doc.status.as_deref().unwrap_or("未知")
                    );
                }
            }
            Err(e) => warn!("⚠️ 无法获取文档列表: {}", e),
        }
    }

    /// 上传文档目录中的所有文件
    async fn ingest_folder(&self) -> BatchStats {
        let folder = &self.config.upload_folder;
        if !Path::new(folder).exists() {
            info!("📁 文档目录 {} 不存在，跳过上传", folder);
            return BatchStats::default();
        }

        info!("\n📁 正在扫描待上传的文档...");
        let files = match load_documents_from_folder(folder).await {
            Ok(files) => files,
            Err(e) => {
                error!("❌ 读取文档目录失败: {:#}", e);
                return BatchStats::default();
            }
        };
        if files.is_empty() {
            warn!("⚠️ 文档目录为空，跳过上传");
            return BatchStats::default();
        }

        match self.uploads.spawn_batch(files).await {
            Ok(stats) => stats,
            Err(e) => {
                error!("上传任务执行失败: {}", e);
                BatchStats::default()
            }
        }
    }

    /// 问答循环
    ///
    /// # 返回
    /// (成功回答数, 失败数)
    async fn question_loop(&self) -> Result<(usize, usize)> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut answered = 0;
        let mut failed = 0;

        info!("\n💡 请输入问题，输入 exit 或 quit 退出");
        while let Some(line) = lines.next_line().await? {
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            match self.queries.submit(question).await {
                Ok(response) => {
                    answered += 1;
                    log_answer(&response);
                }
                Err(QueryError::Client(e)) => {
                    failed += 1;
                    error!("❌ {}", e);
                    if e.is_transport() {
                        warn!("检索服务当前状态: {}", self.monitor.state());
                    }
                }
                Err(e) => warn!("⚠️ {}", e),
            }
        }

        Ok((answered, failed))
    }

    fn shutdown(&self) {
        self.monitor.shutdown();
        self.uploads.shutdown();
        info!("👋 已退出");
    }
}
