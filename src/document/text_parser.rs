//! 纯文本/markdown 大纲解析器
//!
//! 支持常见大纲文档的结构：以主题标识行（默认包含 "Core element"）
//! 分隔主题，每个主题内为段落行和 `|` 分隔的表格行。
//!
//! 解析在构造时一次完成，之后按顺序逐个吐出主题。

use std::collections::VecDeque;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::document::SyllabusParser;
use crate::error::{AppError, AppResult, DocumentError};
use crate::models::{SyllabusElement, SyllabusTopic};

/// 纯文本大纲解析器
pub struct TextSyllabusParser {
    topics: VecDeque<SyllabusTopic>,
}

impl TextSyllabusParser {
    /// 从文件创建解析器
    ///
    /// # 参数
    /// - `file_path`: 大纲文件路径
    /// - `topic_identifier`: 标记主题起始的文本
    pub async fn from_file(
        file_path: impl AsRef<Path>,
        topic_identifier: &str,
    ) -> AppResult<Self> {
        let path = file_path.as_ref();

        if !path.exists() {
            return Err(AppError::Document(DocumentError::NotFound {
                path: path.display().to_string(),
            }));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::document_read_failed(path.display().to_string(), e))?;

        let parser = Self::from_text(&content, topic_identifier);
        info!(
            "✓ 大纲文件加载完成: {} (共 {} 个主题)",
            path.display(),
            parser.topics.len()
        );

        Ok(parser)
    }

    /// 从文本创建解析器
    pub fn from_text(text: &str, topic_identifier: &str) -> Self {
        let elements = parse_elements(text);

        let mut topics = VecDeque::new();
        let mut current_title: Option<String> = None;
        let mut current_elements: Vec<SyllabusElement> = Vec::new();

        for element in elements {
            // 检查该元素是否开启新主题
            if let Some(title) = topic_marker(&element, topic_identifier) {
                // 若已有主题在收集中，先收尾
                if let Some(finished) = current_title.take() {
                    topics.push_back(SyllabusTopic::new(finished, current_elements));
                    current_elements = Vec::new();
                }
                debug!("识别到主题标记: '{}'", title);
                current_title = Some(title);
                current_elements.push(element);
            } else if current_title.is_some() {
                current_elements.push(element);
            }
            // 首个主题标记之前的内容（封面、前言等）直接丢弃
        }

        // 收尾最后一个主题
        if let Some(finished) = current_title.take() {
            topics.push_back(SyllabusTopic::new(finished, current_elements));
        }

        Self { topics }
    }

    /// 剩余未消费的主题数
    pub fn remaining(&self) -> usize {
        self.topics.len()
    }
}

impl SyllabusParser for TextSyllabusParser {
    fn next_topic(&mut self) -> Option<SyllabusTopic> {
        self.topics.pop_front()
    }
}

/// 把原始文本切分成段落/表格元素序列
fn parse_elements(text: &str) -> Vec<SyllabusElement> {
    let mut elements = Vec::new();
    let mut table_rows: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            if let Some(cells) = parse_table_row(trimmed) {
                table_rows.push(cells);
            }
            continue;
        }

        // 非表格行：先收尾累积中的表格
        if !table_rows.is_empty() {
            elements.push(SyllabusElement::Table {
                rows: std::mem::take(&mut table_rows),
            });
        }

        if !trimmed.is_empty() {
            elements.push(SyllabusElement::Paragraph {
                text: trimmed.to_string(),
            });
        }
    }

    if !table_rows.is_empty() {
        elements.push(SyllabusElement::Table { rows: table_rows });
    }

    elements
}

/// 解析一行 `|` 分隔的表格行，分隔行（如 `|---|---|`）返回 None
fn parse_table_row(line: &str) -> Option<Vec<String>> {
    let cells: Vec<String> = line
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect();

    let is_separator = cells
        .iter()
        .all(|cell| !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':'))
        && !cells.is_empty();

    if is_separator {
        None
    } else {
        Some(cells)
    }
}

/// 判断元素是否为主题标记，是则返回清理后的标题
fn topic_marker(element: &SyllabusElement, topic_identifier: &str) -> Option<String> {
    let SyllabusElement::Paragraph { text } = element else {
        return None;
    };

    if !text.contains(topic_identifier) {
        return None;
    }

    // 去掉标识文本和 markdown 记号，清理常见分隔符
    let title = text
        .replace(topic_identifier, "")
        .replace(['*', '#'], "")
        .trim()
        .trim_matches(|c: char| c == ' ' || c == '-' || c == ':')
        .to_string();

    Some(title)
}
