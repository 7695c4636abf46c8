//! 流程层（Workflow Layer）
//!
//! ## 职责
//!
//! 本层定义"一个主题"的完整出题流程：批式流水线状态机。
//!
//! ## 模块划分
//!
//! ### `state` - 流水线状态
//! - 贯穿整张图的单条状态记录
//! - 节点局部更新（StageUpdate）与固定合并规则
//!
//! ### `batch` - 计划分批
//! - 纯函数：取下一段连续切片并推进游标
//! - 游标单调不减，收敛在计划长度上
//!
//! ### `pipeline` - 状态机驱动
//! - 节点能力接口（PipelineStages，六个操作）
//! - 驱动器（PipelineRunner）与防死循环护栏
//!
//! ### `question_pipeline` - 节点实现
//! - 抽取 / 规划 / 生成：各一次结构化模型请求，解析失败降级为空
//! - 保存：调用持久化协作方，失败只记录不中断
//!
//! ## 图结构
//!
//! ```text
//! 子主题抽取 → 出题规划 → 批次选择 → 批量生成 → 题目保存
//!                              ↑                      │
//!                              └──── next_batch ──────┤ (决策)
//!                                                 end ↓
//!                                                   终止
//! ```
//!
//! ## 设计原则
//!
//! 1. **节点无副作用于状态**：只返回局部更新，由驱动器合并
//! 2. **游标只进不退**：批次选择是唯一推进游标的地方
//! 3. **降级而非中断**：模型输出不可用时以空结果向下游级联
//! 4. **护栏显式化**：防死循环状态归驱动器所有，每次执行重建

pub mod batch;
pub mod pipeline;
pub mod question_pipeline;
pub mod state;

pub use batch::{select_next_batch, BatchSelection};
pub use pipeline::{decide, BatchDecision, PipelineRunner, PipelineStages};
pub use question_pipeline::QuestionPipeline;
pub use state::{PipelineState, StageUpdate, DEFAULT_BATCH_SIZE};
