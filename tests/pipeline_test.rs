//! 流水线端到端测试
//!
//! 用脚本化的模型后端和可注入故障的输出管理器驱动完整状态机，
//! 覆盖三条关键路径：
//! - 正常多批次执行（12 道计划，批次 5 → 5/5/2）
//! - 抽取失败的级联降级（零题目、零多余模型调用）
//! - 持久化失败不阻断内存累计
//! 以及防死循环护栏的回归测试。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use syllabus_sense::models::{
    PlanStatus, PlannedQuestion, Question, QuestionChoice, QuestionPlan, QuestionSolution,
    QuestionsResponse, Subtopic, SubtopicsResponse, SyllabusElement, SyllabusTopic,
};
use syllabus_sense::workflow::{
    decide, BatchDecision, PipelineRunner, PipelineStages, PipelineState, QuestionPipeline,
    StageUpdate,
};
use syllabus_sense::{LlmBackend, OutputManager};

// ========== 测试替身 ==========

/// 脚本化模型后端：按顺序吐出预置响应，并统计调用次数
#[derive(Clone)]
struct ScriptedBackend {
    responses: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, _user: &str, _system: Option<&str>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("脚本响应已耗尽"))
    }
}

/// 记录型输出管理器：记录每次保存的批次大小，可注入故障
#[derive(Clone)]
struct RecordingOutput {
    saved_batches: Arc<Mutex<Vec<usize>>>,
    fail: bool,
}

impl RecordingOutput {
    fn new() -> Self {
        Self {
            saved_batches: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            saved_batches: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    fn batches(&self) -> Vec<usize> {
        self.saved_batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputManager for RecordingOutput {
    async fn save_output(&self, questions: &[Question]) -> Result<()> {
        if self.fail {
            anyhow::bail!("磁盘写入失败（模拟 I/O 错误）");
        }
        self.saved_batches.lock().unwrap().push(questions.len());
        Ok(())
    }
}

// ========== 测试数据构造 ==========

fn sample_topic() -> SyllabusTopic {
    SyllabusTopic::new(
        "Matter",
        vec![SyllabusElement::Paragraph {
            text: "Core element - Matter".to_string(),
        }],
    )
}

fn subtopic(name: &str) -> Subtopic {
    Subtopic {
        subtopic_name: name.to_string(),
        topic_title: "Matter".to_string(),
        academic_class: "Form 1".to_string(),
        subject: "chemistry".to_string(),
        learning_objectives: vec!["objective".to_string()],
        key_concepts: vec!["concept".to_string()],
        assessment_criteria: vec!["criterion".to_string()],
        suggested_activities: vec![],
    }
}

fn planned(id: &str, subtopic: &str) -> PlannedQuestion {
    PlannedQuestion {
        question_id: id.to_string(),
        topic: "Matter".to_string(),
        subtopic: subtopic.to_string(),
        difficulty: "easy".to_string(),
        concept_area: "concept".to_string(),
        status: PlanStatus::Planned,
    }
}

fn question(id: &str) -> Question {
    Question {
        question_id: id.to_string(),
        text: format!("Question {}", id),
        topic: "Matter".to_string(),
        category: "multiple_choice".to_string(),
        academic_class: "Form 1".to_string(),
        examination_level: "JCE".to_string(),
        difficulty: "easy".to_string(),
        tags: vec![],
        choices: vec![
            QuestionChoice {
                text: "right".to_string(),
                is_correct: true,
            },
            QuestionChoice {
                text: "wrong".to_string(),
                is_correct: false,
            },
        ],
        solution: QuestionSolution {
            explanation: "because".to_string(),
            steps: vec![],
        },
        hint: "hint".to_string(),
        metadata: None,
    }
}

fn subtopics_response(names: &[&str]) -> String {
    let response = SubtopicsResponse {
        subtopics: names.iter().map(|n| subtopic(n)).collect(),
    };
    serde_json::to_string(&response).unwrap()
}

fn plan_response(items: &[(&str, &str)]) -> String {
    let plan = QuestionPlan {
        planned_questions: items.iter().map(|(id, s)| planned(id, s)).collect(),
        total_questions: items.len(),
    };
    serde_json::to_string(&plan).unwrap()
}

fn questions_response(ids: &[&str]) -> String {
    let response = QuestionsResponse {
        questions: ids.iter().map(|id| question(id)).collect(),
    };
    serde_json::to_string(&response).unwrap()
}

fn build_pipeline(backend: &ScriptedBackend, output: &RecordingOutput) -> QuestionPipeline {
    QuestionPipeline::with_parts(
        Box::new(backend.clone()),
        Box::new(output.clone()),
        "chemistry",
        "Form 1",
    )
}

// ========== 场景 A：正常多批次执行 ==========

#[tokio::test]
async fn test_scenario_a_full_run_partitions_plan() {
    syllabus_sense::logger::init();

    // 2 个子主题，12 道计划题：前 10 道属 A，后 2 道属 B
    let mut plan_items: Vec<(String, String)> = Vec::new();
    for i in 1..=10 {
        plan_items.push((format!("q{}", i), "States of matter".to_string()));
    }
    plan_items.push(("q11".to_string(), "Changes of state".to_string()));
    plan_items.push(("q12".to_string(), "Changes of state".to_string()));
    let plan_refs: Vec<(&str, &str)> = plan_items
        .iter()
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect();

    let backend = ScriptedBackend::new(vec![
        subtopics_response(&["States of matter", "Changes of state"]),
        plan_response(&plan_refs),
        questions_response(&["q1", "q2", "q3", "q4", "q5"]),
        questions_response(&["q6", "q7", "q8", "q9", "q10"]),
        questions_response(&["q11", "q12"]),
    ]);
    let output = RecordingOutput::new();

    let runner = PipelineRunner::new(build_pipeline(&backend, &output));
    let final_state = runner.run(sample_topic(), 5).await.unwrap();

    // 三个批次：5 + 5 + 2
    assert_eq!(output.batches(), vec![5, 5, 2]);
    // 累计题目 12 道，保持原顺序
    assert_eq!(final_state.questions.len(), 12);
    assert_eq!(final_state.questions[0].question_id, "q1");
    assert_eq!(final_state.questions[11].question_id, "q12");
    // 游标收敛在计划长度
    assert_eq!(final_state.plan_position, 12);
    // 模型调用：抽取 1 + 规划 1 + 生成 3
    assert_eq!(backend.call_count(), 5);
    // 所有计划条目都被分发过
    let plan = final_state.question_plan.as_ref().unwrap();
    assert!(plan
        .planned_questions
        .iter()
        .all(|p| p.status == PlanStatus::Generating));
}

// ========== 场景 B：抽取失败的级联降级 ==========

#[tokio::test]
async fn test_scenario_b_unparsable_extraction_degrades_to_nothing() {
    syllabus_sense::logger::init();

    let backend = ScriptedBackend::new(vec![
        "I'm sorry, I cannot analyze this content.".to_string(),
    ]);
    let output = RecordingOutput::new();

    let runner = PipelineRunner::new(build_pipeline(&backend, &output));
    let final_state = runner.run(sample_topic(), 5).await.unwrap();

    // 执行"成功"完成，但产出为零
    assert!(final_state.subtopics.is_empty());
    assert!(final_state.questions.is_empty());
    assert_eq!(final_state.plan_position, 0);
    // 规划被短路，生成从未发起：只有抽取那一次模型调用
    assert_eq!(backend.call_count(), 1);
    // 持久化从未被调用
    assert!(output.batches().is_empty());
}

// ========== 场景 C：持久化失败不阻断内存累计 ==========

#[tokio::test]
async fn test_scenario_c_persistence_failure_keeps_in_memory_progress() {
    syllabus_sense::logger::init();

    let backend = ScriptedBackend::new(vec![
        subtopics_response(&["States of matter"]),
        plan_response(&[("q1", "States of matter"), ("q2", "States of matter")]),
        questions_response(&["q1", "q2"]),
    ]);
    let output = RecordingOutput::failing();

    let runner = PipelineRunner::new(build_pipeline(&backend, &output));
    let final_state = runner.run(sample_topic(), 5).await.unwrap();

    // 写盘失败被记录，但内存累计照常推进
    assert_eq!(final_state.questions.len(), 2);
    assert!(output.batches().is_empty());
}

// ========== 生成失败：批次被消费但不重发 ==========

#[tokio::test]
async fn test_failed_generation_batch_is_not_redelivered() {
    syllabus_sense::logger::init();

    // 第一批生成返回垃圾文本，第二批正常
    let backend = ScriptedBackend::new(vec![
        subtopics_response(&["States of matter"]),
        plan_response(&[
            ("q1", "States of matter"),
            ("q2", "States of matter"),
            ("q3", "States of matter"),
        ]),
        "not json".to_string(),
        questions_response(&["q3"]),
    ]);
    let output = RecordingOutput::new();

    let runner = PipelineRunner::new(build_pipeline(&backend, &output));
    let final_state = runner.run(sample_topic(), 2).await.unwrap();

    // 第一批（q1, q2）的位置已被消费，失败不重发——只有 q3 产出
    assert_eq!(final_state.questions.len(), 1);
    assert_eq!(final_state.questions[0].question_id, "q3");
    assert_eq!(final_state.plan_position, 3);
    assert_eq!(output.batches(), vec![1]);
}

// ========== 防死循环护栏回归 ==========

/// 故意不推进游标的节点实现：选择节点每次都停在位置 1
struct StallingStages {
    generate_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PipelineStages for StallingStages {
    async fn extract_subtopics(&self, _state: &PipelineState) -> Result<StageUpdate> {
        Ok(StageUpdate::Subtopics(vec![subtopic("States of matter")]))
    }

    async fn plan_questions(&self, _state: &PipelineState) -> Result<StageUpdate> {
        let items: Vec<PlannedQuestion> = (1..=10)
            .map(|i| planned(&format!("q{}", i), "States of matter"))
            .collect();
        Ok(StageUpdate::Plan(QuestionPlan {
            planned_questions: items,
            total_questions: 10,
        }))
    }

    fn select_batch(&self, state: &PipelineState) -> StageUpdate {
        // 游标卡死：永远只交付第一道题、位置停在 1
        let batch = state.question_plan.as_ref().unwrap().planned_questions[..1].to_vec();
        StageUpdate::Batch {
            batch,
            plan_position: 1,
        }
    }

    async fn generate_batch(&self, _state: &PipelineState) -> Result<StageUpdate> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StageUpdate::Generated(vec![]))
    }

    async fn save_questions(&self, _state: &PipelineState) -> Result<StageUpdate> {
        Ok(StageUpdate::Saved(vec![]))
    }

    fn decide_next(
        &self,
        state: &PipelineState,
        previous_position: Option<usize>,
    ) -> BatchDecision {
        decide(
            state.question_plan.as_ref().map(|p| p.len()).unwrap_or(0),
            state.plan_position,
            previous_position,
        )
    }
}

#[tokio::test]
async fn test_stalled_selection_terminates_within_one_extra_iteration() {
    syllabus_sense::logger::init();

    let generate_calls = Arc::new(AtomicUsize::new(0));
    let stages = StallingStages {
        generate_calls: generate_calls.clone(),
    };

    let runner = PipelineRunner::new(stages);
    let final_state = runner.run(sample_topic(), 5).await.unwrap();

    // 剩余 9 道题未处理也必须终止：第一次经过决策点记录位置 1，
    // 第二次发现位置未变即收尾——总共恰好两轮
    assert_eq!(generate_calls.load(Ordering::SeqCst), 2);
    assert_eq!(final_state.plan_position, 1);
    assert!(final_state.questions.is_empty());
}
