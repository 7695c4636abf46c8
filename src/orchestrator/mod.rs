//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责主题迭代和流程调度，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (迭代 Vec<SyllabusTopic>)
//!     ↓
//! workflow::PipelineRunner (驱动单个主题的状态机)
//!     ↓
//! workflow::QuestionPipeline (六个节点的具体实现)
//!     ↓
//! services (能力层：llm / structured / output)
//!     ↓
//! document (输入协作方：大纲解析)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：App 管迭代与统计，PipelineRunner 管单个主题
//! 2. **资源所有者**：只有编排层持有解析器和流水线
//! 3. **向下依赖**：编排层 → workflow → services
//! 4. **无业务逻辑**：只做调度和统计，不做具体出题判断

pub mod syllabus_processor;

// 重新导出主要类型
pub use syllabus_processor::{App, RunStats};
