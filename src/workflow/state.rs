//! 流水线状态
//!
//! 单条状态记录贯穿整张图。节点不直接改写状态，而是返回
//! 带标签的局部更新（`StageUpdate`），由驱动器按固定合并规则
//! 应用：`questions` 追加，其余字段替换。
//!
//! 不变量：`plan_position` 始终落在 `[0, 计划长度]` 区间内，
//! 且单调不减；`plan_position >= 计划长度` 时流水线终止。

use crate::models::{PlanStatus, PlannedQuestion, Question, QuestionPlan, Subtopic, SyllabusTopic};

/// 默认批次大小
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// 流水线状态记录
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// 本次执行处理的主题
    pub topic: SyllabusTopic,
    /// 抽取出的子主题
    pub subtopics: Vec<Subtopic>,
    /// 累计生成的题目（单次主题执行内单调增长）
    pub questions: Vec<Question>,
    /// 最近一个批次的生成结果（每轮替换）
    pub current_questions: Vec<Question>,
    /// 出题计划
    pub question_plan: Option<QuestionPlan>,
    /// 计划游标：已分发进批次的题目数
    pub plan_position: usize,
    /// 批次大小（单次执行内固定）
    pub batch_size: usize,
    /// 当前批次（每轮替换）
    pub current_batch: Vec<PlannedQuestion>,
}

impl PipelineState {
    /// 从一个主题构造初始状态
    pub fn new(topic: SyllabusTopic, batch_size: usize) -> Self {
        Self {
            topic,
            subtopics: Vec::new(),
            questions: Vec::new(),
            current_questions: Vec::new(),
            question_plan: None,
            plan_position: 0,
            batch_size: batch_size.max(1),
            current_batch: Vec::new(),
        }
    }

    /// 计划条目数（无计划视为 0）
    pub fn plan_len(&self) -> usize {
        self.question_plan
            .as_ref()
            .map(|plan| plan.len())
            .unwrap_or(0)
    }

    /// 应用一个节点的局部更新
    ///
    /// 合并规则是确定性的：
    /// - `Saved` 把本批题目追加进累计列表
    /// - `Batch` 把选中区间的计划条目置为 generating 并推进游标
    ///   （游标只增不减）
    /// - 其余更新整字段替换
    pub fn apply(&mut self, update: StageUpdate) {
        match update {
            StageUpdate::Subtopics(subtopics) => {
                self.subtopics = subtopics;
            }
            StageUpdate::Plan(plan) => {
                self.question_plan = Some(plan);
            }
            StageUpdate::Batch {
                batch,
                plan_position,
            } => {
                let new_position = plan_position.max(self.plan_position);
                if let Some(plan) = self.question_plan.as_mut() {
                    let end = new_position.min(plan.planned_questions.len());
                    for planned in &mut plan.planned_questions[self.plan_position.min(end)..end] {
                        planned.status = PlanStatus::Generating;
                    }
                }
                self.current_batch = batch;
                self.plan_position = new_position;
            }
            StageUpdate::Generated(questions) => {
                self.current_questions = questions;
            }
            StageUpdate::Saved(appended) => {
                self.questions.extend(appended);
            }
        }
    }
}

/// 节点局部更新（每个节点只能改动自己变体中列出的字段）
#[derive(Debug, Clone)]
pub enum StageUpdate {
    /// 子主题抽取节点：替换 `subtopics`
    Subtopics(Vec<Subtopic>),
    /// 出题规划节点：替换 `question_plan`
    Plan(QuestionPlan),
    /// 批次选择节点：替换 `current_batch` 并推进 `plan_position`
    Batch {
        batch: Vec<PlannedQuestion>,
        plan_position: usize,
    },
    /// 批量生成节点：替换 `current_questions`
    Generated(Vec<Question>),
    /// 保存节点：向累计 `questions` 追加
    Saved(Vec<Question>),
}
