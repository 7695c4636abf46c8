//! 流水线状态机 - 流程层核心
//!
//! 五个节点的有向图，除一条条件回边外严格线性：
//!
//! ```text
//! 子主题抽取 → 出题规划 → 批次选择 → 批量生成 → 题目保存
//!                              ↑                      │
//!                              └──── next_batch ──────┤ (决策)
//!                                                 end ↓
//!                                                   终止
//! ```
//!
//! 驱动器只依赖 `PipelineStages` 能力接口；节点返回带标签的
//! 局部更新，由驱动器合并进状态。防死循环护栏（上次观察到的
//! 游标位置）是驱动器自己的显式状态，每次主题执行开始时重建，
//! 绝不跨执行泄漏。

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::SyllabusTopic;
use crate::workflow::state::{PipelineState, StageUpdate};

/// 决策节点的两个出边
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchDecision {
    /// 回到批次选择，处理下一批
    NextBatch,
    /// 终止本次执行
    End,
}

/// 流水线节点能力接口
///
/// 一个完整实现提供全部六个操作；抽取/规划/生成内部把模型
/// 响应的解析失败降级为空结果（记录日志，不让执行中断），
/// 真正意外的错误才通过 `Err` 向上传播。
#[async_trait]
pub trait PipelineStages: Send + Sync {
    /// 子主题抽取（入口节点）
    async fn extract_subtopics(&self, state: &PipelineState) -> Result<StageUpdate>;

    /// 出题规划
    async fn plan_questions(&self, state: &PipelineState) -> Result<StageUpdate>;

    /// 批次选择（纯函数，无外部调用）
    fn select_batch(&self, state: &PipelineState) -> StageUpdate;

    /// 批量生成
    async fn generate_batch(&self, state: &PipelineState) -> Result<StageUpdate>;

    /// 题目保存
    async fn save_questions(&self, state: &PipelineState) -> Result<StageUpdate>;

    /// 批次决策：继续下一批还是终止
    ///
    /// `previous_position` 是上次经过决策点时的游标位置，
    /// 由驱动器维护并传入。
    fn decide_next(&self, state: &PipelineState, previous_position: Option<usize>)
        -> BatchDecision;
}

/// 决策规则（供具体节点实现复用）
///
/// - 无计划或计划为空 → end
/// - 游标已到计划尾部 → end
/// - 游标与上次经过决策点时相同 → end（防死循环护栏）
/// - 否则 → next_batch
pub fn decide(plan_len: usize, position: usize, previous_position: Option<usize>) -> BatchDecision {
    if plan_len == 0 {
        warn!("没有可用的出题计划，流水线终止");
        return BatchDecision::End;
    }

    if position >= plan_len {
        info!("所有计划题目均已处理，流水线完成");
        return BatchDecision::End;
    }

    if previous_position == Some(position) {
        warn!(
            "计划游标连续两次停在 {} 处未推进，强制终止以防止死循环",
            position
        );
        return BatchDecision::End;
    }

    info!("继续下一批次：已处理 {}/{} 道计划题目", position, plan_len);
    BatchDecision::NextBatch
}

/// 防死循环护栏
///
/// 记录上次经过决策点时的游标位置。作用域是单次主题执行：
/// 每次 `run` 开始时重新构造。
#[derive(Debug, Default)]
struct LoopGuard {
    last_position: Option<usize>,
}

impl LoopGuard {
    fn previous(&self) -> Option<usize> {
        self.last_position
    }

    fn record(&mut self, position: usize) {
        self.last_position = Some(position);
    }
}

/// 流水线驱动器
///
/// 持有一个节点实现，按图的拓扑驱动一次完整执行。
pub struct PipelineRunner<P: PipelineStages> {
    stages: P,
}

impl<P: PipelineStages> PipelineRunner<P> {
    /// 创建驱动器
    pub fn new(stages: P) -> Self {
        Self { stages }
    }

    /// 节点实现的只读访问
    pub fn stages(&self) -> &P {
        &self.stages
    }

    /// 对一个主题执行一次完整的流水线
    ///
    /// 返回终态（其中 `questions` 为本次累计生成的全部题目）。
    pub async fn run(&self, topic: SyllabusTopic, batch_size: usize) -> Result<PipelineState> {
        let mut state = PipelineState::new(topic, batch_size);

        // 护栏每次执行重建，避免跨主题误判
        let mut guard = LoopGuard::default();

        // ========== 线性段：抽取 → 规划 ==========
        let update = self.stages.extract_subtopics(&state).await?;
        state.apply(update);

        let update = self.stages.plan_questions(&state).await?;
        state.apply(update);

        // ========== 批次循环：选择 → 生成 → 保存 → 决策 ==========
        loop {
            let update = self.stages.select_batch(&state);
            state.apply(update);

            let update = self.stages.generate_batch(&state).await?;
            state.apply(update);

            let update = self.stages.save_questions(&state).await?;
            state.apply(update);

            match self.stages.decide_next(&state, guard.previous()) {
                BatchDecision::End => break,
                BatchDecision::NextBatch => guard.record(state.plan_position),
            }
        }

        Ok(state)
    }
}
