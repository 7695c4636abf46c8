use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(subject: &str, topics_num: usize, batch_size: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 大纲出题模式");
    info!("📚 学科: {}", subject);
    info!("📊 计划处理主题数: {} | 批次大小: {}", topics_num, batch_size);
    info!("{}", "=".repeat(60));
}

/// 记录大纲加载信息
pub fn log_topics_loaded(total: usize) {
    info!("✓ 大纲中找到 {} 个主题", total);
    info!("💡 每个主题按批次生成题目，上一批完成后再开始下一批\n");
}

/// 记录主题处理开始
pub fn log_topic_start(topic_index: usize, title: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理主题 {}: '{}'", topic_index, truncate_text(title, 60));
    info!("{}", "=".repeat(60));
}

/// 记录主题处理完成
pub fn log_topic_complete(topic_index: usize, questions: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 主题 {} 完成: 共生成 {} 道题目", topic_index, questions);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(topics: usize, questions: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 处理主题: {}", topics);
    info!("📝 生成题目: {}", questions);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
