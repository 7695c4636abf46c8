//! 大纲文档解析 - 输入协作方
//!
//! 向流水线提供"下一个主题"的顺序访问能力：
//! 不支持回退、不支持预读，取尽后返回 `None`。

pub mod text_parser;

pub use text_parser::TextSyllabusParser;

use crate::models::SyllabusTopic;

/// 大纲解析器能力接口
///
/// 驱动层每次调用 `next_topic` 取一个主题并执行一次完整的
/// 流水线，`None` 表示文档取尽（正常终止信号，不是错误）。
pub trait SyllabusParser {
    /// 取下一个主题
    fn next_topic(&mut self) -> Option<SyllabusTopic>;
}
