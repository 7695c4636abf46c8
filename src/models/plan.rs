//! 出题计划数据结构
//!
//! 计划由规划节点一次性批量创建，批次选择节点将选中条目的
//! 状态置为 generating。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 计划条目状态
///
/// 注意：没有任何节点会把状态推进到 `Completed`——这是沿袭下来的
/// 缺口，调用方不要依赖该状态做过滤。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// 已规划，尚未分发
    #[default]
    Planned,
    /// 已进入某个批次
    Generating,
    /// 从未被任何节点赋值
    Completed,
}

/// 计划中的一道题
///
/// 描述一道尚未生成的题目的目标属性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlannedQuestion {
    /// 唯一标识
    pub question_id: String,
    /// 所属主题
    pub topic: String,
    /// 所属子主题名称
    pub subtopic: String,
    /// 目标难度
    pub difficulty: String,
    /// 该题要考察的概念点
    #[serde(default)]
    pub concept_area: String,
    /// 条目状态
    #[serde(default)]
    pub status: PlanStatus,
}

/// 出题计划
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionPlan {
    /// 有序的计划条目列表
    #[serde(default)]
    pub planned_questions: Vec<PlannedQuestion>,
    /// 声明的总题数（仅供参考，循环边界必须使用列表长度）
    #[serde(default)]
    pub total_questions: usize,
}

impl QuestionPlan {
    /// 计划是否为空
    pub fn is_empty(&self) -> bool {
        self.planned_questions.is_empty()
    }

    /// 计划条目数（循环边界请使用本方法，而不是 total_questions）
    pub fn len(&self) -> usize {
        self.planned_questions.len()
    }
}
