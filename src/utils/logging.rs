/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use crate::config::Config;
use crate::models::QueryResponse;
use crate::orchestrator::BatchStats;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档问答客户端");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 检索服务: {}", config.service_base_url);
    info!("📁 文档目录: {}", config.upload_folder);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `accepted`: 通过本地校验、需要上传的文件数
/// - `total`: 本批文件总数
pub fn log_batch_start(accepted: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始上传: {} 个文件 (共提交 {} 个)", accepted, total);
    info!("💡 文件将逐个上传，前一个完成后再开始下一个");
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(stats: &BatchStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 本批完成: 成功 {}/{}, 失败 {}, 类型不支持 {}",
        stats.succeeded, stats.total, stats.failed, stats.rejected
    );
    if stats.abandoned > 0 {
        info!("⏹️ 中途取消: {}", stats.abandoned);
    }
    info!("{}", "─".repeat(60));
}

/// 打印一次回答
pub fn log_answer(response: &QueryResponse) {
    info!("\n{}", "─".repeat(60));
    info!("💬 {}", response.answer);
    for (i, citation) in response.citations.iter().enumerate() {
        let source = citation.source_name().unwrap_or(citation.id.as_str());
        match citation.score {
            Some(score) => info!("  [{}] {} (相关度 {:.2})", i + 1, source, score),
            None => info!("  [{}] {}", i + 1, source),
        }
    }
    info!(
        "📊 检索 {} 条, 重排后 {} 条, 置信度 {:.0}%, 耗时 {:.0}ms",
        response.retrieved_count,
        response.reranked_count,
        response.confidence_score * 100.0,
        response.processing_time_ms
    );
    info!("{}", "─".repeat(60));
}

/// 打印会话统计信息
pub fn print_final_stats(stats: &BatchStats, answered: usize, failed_questions: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 会话结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 文档上传成功: {}/{}", stats.succeeded, stats.total);
    info!("❌ 文档上传失败: {}", stats.failed + stats.rejected);
    info!("💬 已回答问题: {}, 失败: {}", answered, failed_questions);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
