//! 大纲主题数据结构
//!
//! 由文档解析器产出，抽取节点消费。序列化格式与提示词中嵌入的
//! JSON 保持一致：段落为 `{"type": "paragraph", "text": ...}`，
//! 表格为 `{"type": "table", "rows": [[...], ...]}`。

use serde::{Deserialize, Serialize};

/// 大纲中的一个内容元素（段落或表格）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyllabusElement {
    /// 段落文本
    Paragraph { text: String },
    /// 表格（有序行，每行为有序单元格文本）
    Table { rows: Vec<Vec<String>> },
}

/// 大纲中的一个主题
///
/// 一个主题对应源文档中的一个章节，创建后不可变，
/// 每次流水线执行消费一个主题。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusTopic {
    /// 主题标题
    pub title: String,
    /// 主题下的有序内容元素
    #[serde(default)]
    pub elements: Vec<SyllabusElement>,
}

impl SyllabusTopic {
    /// 创建新的主题
    pub fn new(title: impl Into<String>, elements: Vec<SyllabusElement>) -> Self {
        Self {
            title: title.into(),
            elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_json_shape() {
        let topic = SyllabusTopic::new(
            "Matter",
            vec![
                SyllabusElement::Paragraph {
                    text: "Introduction".to_string(),
                },
                SyllabusElement::Table {
                    rows: vec![vec!["a".to_string(), "b".to_string()]],
                },
            ],
        );

        let json = serde_json::to_value(&topic).unwrap();
        assert_eq!(json["title"], "Matter");
        assert_eq!(json["elements"][0]["type"], "paragraph");
        assert_eq!(json["elements"][0]["text"], "Introduction");
        assert_eq!(json["elements"][1]["type"], "table");
        assert_eq!(json["elements"][1]["rows"][0][1], "b");
    }
}
