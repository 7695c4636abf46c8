//! 出题流水线节点实现 - 流程层
//!
//! 六个节点的具体实现：抽取/规划/生成各发起一次结构化请求，
//! 任何解析失败都降级为空结果并记录日志（空结果会沿图向下游
//! 级联，但不会中断执行）；选择是纯函数；保存调用持久化协作方，
//! 失败只记录不中断；决策按固定规则给出 next_batch / end。

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{
    PlannedQuestion, Question, QuestionPlan, QuestionsResponse, Subtopic, SubtopicsResponse,
    SyllabusTopic,
};
use crate::services::{
    format_instructions, request_structured, FileOutputManager, LlmBackend, LlmService,
    OutputManager,
};
use crate::workflow::batch::select_next_batch;
use crate::workflow::pipeline::{decide, BatchDecision, PipelineStages};
use crate::workflow::state::{PipelineState, StageUpdate};

/// 出题流水线
///
/// - 编排单个主题的完整出题流程所需的全部节点
/// - 只依赖能力接口（LlmBackend / OutputManager）
/// - 不持有跨主题状态（防死循环护栏归驱动器管）
pub struct QuestionPipeline {
    backend: Box<dyn LlmBackend>,
    output: Box<dyn OutputManager>,
    subject: String,
    academic_class: String,
    verbose_logging: bool,
}

impl QuestionPipeline {
    /// 从配置创建流水线（生产路径）
    pub fn new(config: &Config, output: FileOutputManager) -> Self {
        Self {
            backend: Box::new(LlmService::new(config)),
            output: Box::new(output),
            subject: config.subject.clone(),
            academic_class: config.academic_class.clone(),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 注入自定义后端与输出（测试与扩展路径）
    pub fn with_parts(
        backend: Box<dyn LlmBackend>,
        output: Box<dyn OutputManager>,
        subject: impl Into<String>,
        academic_class: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            output,
            subject: subject.into(),
            academic_class: academic_class.into(),
            verbose_logging: false,
        }
    }

    // ========== 提示词构建 ==========

    fn build_extraction_prompt(&self, topic: &SyllabusTopic) -> String {
        let topic_json = serde_json::to_string_pretty(topic).unwrap_or_default();

        format!(
            r#"You are an educational content analyzer. I'm going to provide you with {subject} syllabus content,
and I need you to extract subtopics along with their learning objectives and other metadata.

Here's the syllabus content for the topic:
{topic_json}

{format_instructions}

Analyze this content and identify distinct subtopics as specified in the format above.
For the topic title, prefer the title found in the theme/topic table over the supplied one."#,
            subject = self.subject,
            topic_json = topic_json,
            format_instructions = format_instructions::<SubtopicsResponse>(),
        )
    }

    fn build_planning_prompt(&self, subtopics: &[Subtopic]) -> String {
        let subtopics_json = serde_json::to_string_pretty(subtopics).unwrap_or_default();

        format!(
            r#"You are an educational assessment planner. I'm going to provide you with a set of {subject} subtopics,
and I need you to create a systematic plan for generating questions that cover these subtopics.

Here are the subtopics to cover:
{subtopics_json}

{format_instructions}

For each subtopic, create planned questions with the following considerations:
1. Balance easy, medium, and hard difficulty levels
2. Ensure coverage of all key concepts and learning objectives
3. Include at least 9 questions for each subtopic, with the option to add more if needed for comprehensive coverage.
4. Assign unique IDs to each planned question
5. Include a brief concept_area field describing what specific concept the question will test

Create a comprehensive plan that ensures the full curriculum is properly assessed."#,
            subject = self.subject,
            subtopics_json = subtopics_json,
            format_instructions = format_instructions::<QuestionPlan>(),
        )
    }

    fn build_generation_prompt(&self, subtopic: &Subtopic, batch: &[PlannedQuestion]) -> String {
        let planned_json = serde_json::to_string_pretty(batch).unwrap_or_default();

        format!(
            r#"Generate multiple-choice {subject} questions for {academic_class} students based on the following planned questions:

Subtopic: "{subtopic_name}" within the main topic "{topic_title}"

Here's information about this subtopic:
Learning objectives: {learning_objectives}
Key concepts: {key_concepts}
Assessment criteria: {assessment_criteria}

Now, generate questions according to this specific plan:
{planned_json}

{format_instructions}

For each question:
1. Include four answer choices (one correct, three incorrect)
2. Provide a detailed explanation for the correct answer
3. Include a helpful hint
4. Match the difficulty level exactly as specified in the plan
5. Address the specific concept area indicated in the plan

Make sure each question clearly tests the concept area indicated in the plan.
Use the exact same question_id as provided in the plan.

Generate exactly {batch_size} questions matching the specifications in the plan."#,
            subject = self.subject,
            academic_class = self.academic_class,
            subtopic_name = subtopic.subtopic_name,
            topic_title = subtopic.topic_title,
            learning_objectives = subtopic.learning_objectives.join("; "),
            key_concepts = subtopic.key_concepts.join("; "),
            assessment_criteria = subtopic.assessment_criteria.join("; "),
            planned_json = planned_json,
            format_instructions = format_instructions::<QuestionsResponse>(),
            batch_size = batch.len(),
        )
    }

    // ========== 生成结果整理 ==========

    /// 把返回题目的 ID 与批次计划对齐
    ///
    /// 模型没有回显计划 ID 时按位置回填；超出批次大小的多余
    /// 题目丢弃；不足时保留并记录，绝不凭空补位。ID 不匹配是
    /// 数据质量问题，只记录，不作为失败处理。
    fn reconcile_question_ids(
        batch: &[PlannedQuestion],
        mut questions: Vec<Question>,
    ) -> Vec<Question> {
        let planned_ids: HashSet<&str> = batch.iter().map(|p| p.question_id.as_str()).collect();

        if questions.len() > batch.len() {
            warn!(
                "模型返回 {} 道题，超出批次大小 {}，多余部分丢弃",
                questions.len(),
                batch.len()
            );
            questions.truncate(batch.len());
        } else if questions.len() < batch.len() {
            warn!(
                "模型返回 {} 道题，少于批次大小 {}（缺口不补位）",
                questions.len(),
                batch.len()
            );
        }

        for (index, question) in questions.iter_mut().enumerate() {
            if !planned_ids.contains(question.question_id.as_str()) {
                warn!(
                    "题目ID '{}' 不在计划内，按位置回填为 '{}'",
                    question.question_id, batch[index].question_id
                );
                question.question_id = batch[index].question_id.clone();
            }
        }

        questions
    }

    /// 按名称查找批次对应的子主题（取第一个匹配）
    ///
    /// 批次内条目默认同属一个子主题；发现混入其他子主题时只
    /// 告警，不中断。
    fn find_batch_subtopic<'a>(
        subtopics: &'a [Subtopic],
        batch: &[PlannedQuestion],
    ) -> Option<&'a Subtopic> {
        let subtopic_name = &batch[0].subtopic;

        for planned in &batch[1..] {
            if &planned.subtopic != subtopic_name {
                warn!(
                    "批次内出现多个子主题: '{}' 与 '{}'（按第一个处理）",
                    subtopic_name, planned.subtopic
                );
                break;
            }
        }

        subtopics
            .iter()
            .find(|subtopic| &subtopic.subtopic_name == subtopic_name)
    }
}

#[async_trait]
impl PipelineStages for QuestionPipeline {
    /// 子主题抽取节点
    async fn extract_subtopics(&self, state: &PipelineState) -> Result<StageUpdate> {
        let prompt = self.build_extraction_prompt(&state.topic);

        match request_structured::<SubtopicsResponse>(self.backend.as_ref(), &prompt, None).await {
            Ok(parsed) => {
                let mut subtopics = parsed.subtopics;

                // 模型漏填主题标题时回填
                for subtopic in &mut subtopics {
                    if subtopic.topic_title.is_empty() {
                        subtopic.topic_title = state.topic.title.clone();
                    }
                }

                info!(
                    "✓ 从主题 '{}' 中抽取到 {} 个子主题",
                    state.topic.title,
                    subtopics.len()
                );

                Ok(StageUpdate::Subtopics(subtopics))
            }
            Err(e) => {
                error!("解析子主题失败: {}", e);
                Ok(StageUpdate::Subtopics(Vec::new()))
            }
        }
    }

    /// 出题规划节点
    async fn plan_questions(&self, state: &PipelineState) -> Result<StageUpdate> {
        if state.subtopics.is_empty() {
            // 短路：没有子主题就不发起模型调用
            warn!("没有可用的子主题，跳过出题规划");
            return Ok(StageUpdate::Plan(QuestionPlan::default()));
        }

        let prompt = self.build_planning_prompt(&state.subtopics);

        match request_structured::<QuestionPlan>(self.backend.as_ref(), &prompt, None).await {
            Ok(plan) => {
                info!(
                    "✓ 出题计划创建完成，共 {} 道计划题目",
                    plan.planned_questions.len()
                );

                if self.verbose_logging {
                    for planned in &plan.planned_questions {
                        info!(
                            "  计划 {} | 子主题: {} | 难度: {} | 概念点: {}",
                            planned.question_id,
                            planned.subtopic,
                            planned.difficulty,
                            planned.concept_area
                        );
                    }
                }

                Ok(StageUpdate::Plan(plan))
            }
            Err(e) => {
                error!("创建出题计划失败: {}", e);
                Ok(StageUpdate::Plan(QuestionPlan::default()))
            }
        }
    }

    /// 批次选择节点
    fn select_batch(&self, state: &PipelineState) -> StageUpdate {
        let plan = state.question_plan.as_ref();

        if plan.map(|p| p.is_empty()).unwrap_or(true) {
            warn!("没有可用的出题计划，跳过批次选择");
        }

        let selection = select_next_batch(plan, state.plan_position, state.batch_size);

        if selection.batch.is_empty() {
            if state.plan_len() > 0 {
                info!("已到达出题计划末尾");
            }
        } else {
            info!(
                "✓ 选中批次: {} 道题 (位置 {}-{} / 共 {})",
                selection.batch.len(),
                state.plan_position + 1,
                selection.plan_position,
                state.plan_len()
            );
        }

        StageUpdate::Batch {
            batch: selection.batch,
            plan_position: selection.plan_position,
        }
    }

    /// 批量生成节点
    async fn generate_batch(&self, state: &PipelineState) -> Result<StageUpdate> {
        if state.current_batch.is_empty() {
            return Ok(StageUpdate::Generated(Vec::new()));
        }

        let Some(subtopic) = Self::find_batch_subtopic(&state.subtopics, &state.current_batch)
        else {
            error!(
                "找不到批次对应的子主题 '{}'，本批次跳过",
                state.current_batch[0].subtopic
            );
            return Ok(StageUpdate::Generated(Vec::new()));
        };

        let prompt = self.build_generation_prompt(subtopic, &state.current_batch);

        match request_structured::<QuestionsResponse>(self.backend.as_ref(), &prompt, None).await {
            Ok(parsed) => {
                let questions =
                    Self::reconcile_question_ids(&state.current_batch, parsed.questions);

                info!("✓ 本批次生成 {} 道题目", questions.len());

                Ok(StageUpdate::Generated(questions))
            }
            Err(e) => {
                error!("解析生成题目失败: {}", e);
                Ok(StageUpdate::Generated(Vec::new()))
            }
        }
    }

    /// 题目保存节点
    async fn save_questions(&self, state: &PipelineState) -> Result<StageUpdate> {
        if state.current_questions.is_empty() {
            return Ok(StageUpdate::Saved(Vec::new()));
        }

        // 持久化失败只记录：内存中的累计进度照常推进。
        // 这意味着存储故障时会静默丢数据，调用方需关注错误日志。
        if let Err(e) = self.output.save_output(&state.current_questions).await {
            error!("保存题目失败（继续执行，仅累计在内存中）: {}", e);
        }

        Ok(StageUpdate::Saved(state.current_questions.clone()))
    }

    /// 批次决策节点
    fn decide_next(
        &self,
        state: &PipelineState,
        previous_position: Option<usize>,
    ) -> BatchDecision {
        decide(state.plan_len(), state.plan_position, previous_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStatus, QuestionSolution};

    fn planned(id: &str, subtopic: &str) -> PlannedQuestion {
        PlannedQuestion {
            question_id: id.to_string(),
            topic: "Matter".to_string(),
            subtopic: subtopic.to_string(),
            difficulty: "easy".to_string(),
            concept_area: "states".to_string(),
            status: PlanStatus::Planned,
        }
    }

    fn generated(id: &str) -> Question {
        Question {
            question_id: id.to_string(),
            text: "q".to_string(),
            topic: "Matter".to_string(),
            category: "mcq".to_string(),
            academic_class: "Form 1".to_string(),
            examination_level: "JCE".to_string(),
            difficulty: "easy".to_string(),
            tags: vec![],
            choices: vec![],
            solution: QuestionSolution::default(),
            hint: String::new(),
            metadata: None,
        }
    }

    #[test]
    fn test_reconcile_backfills_unknown_ids() {
        let batch = vec![planned("plan-1", "s"), planned("plan-2", "s")];
        let questions = vec![generated("made-up-a"), generated("plan-2")];

        let reconciled = QuestionPipeline::reconcile_question_ids(&batch, questions);
        assert_eq!(reconciled[0].question_id, "plan-1");
        assert_eq!(reconciled[1].question_id, "plan-2");
    }

    #[test]
    fn test_reconcile_drops_extras() {
        let batch = vec![planned("plan-1", "s")];
        let questions = vec![generated("plan-1"), generated("extra")];

        let reconciled = QuestionPipeline::reconcile_question_ids(&batch, questions);
        assert_eq!(reconciled.len(), 1);
        assert_eq!(reconciled[0].question_id, "plan-1");
    }

    #[test]
    fn test_reconcile_keeps_shortfall() {
        let batch = vec![planned("plan-1", "s"), planned("plan-2", "s")];
        let questions = vec![generated("plan-1")];

        let reconciled = QuestionPipeline::reconcile_question_ids(&batch, questions);
        assert_eq!(reconciled.len(), 1);
    }

    #[test]
    fn test_find_batch_subtopic_first_match() {
        let subtopics = vec![
            Subtopic {
                subtopic_name: "States of matter".to_string(),
                topic_title: "Matter".to_string(),
                academic_class: "Form 1".to_string(),
                subject: "chemistry".to_string(),
                learning_objectives: vec![],
                key_concepts: vec![],
                assessment_criteria: vec![],
                suggested_activities: vec![],
            },
        ];

        let batch = vec![planned("q1", "States of matter")];
        let found = QuestionPipeline::find_batch_subtopic(&subtopics, &batch);
        assert_eq!(found.unwrap().subtopic_name, "States of matter");

        let batch = vec![planned("q1", "Nonexistent")];
        assert!(QuestionPipeline::find_batch_subtopic(&subtopics, &batch).is_none());
    }
}
