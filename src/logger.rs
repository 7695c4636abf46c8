//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 通过 RUST_LOG 控制级别，默认 info。重复调用安全（测试中
/// 会多次初始化）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
