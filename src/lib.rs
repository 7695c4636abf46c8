//! # Syllabus Sense
//!
//! 一个从教学大纲自动生成多选题的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 输入层（Document）
//! - `document/` - 大纲文档解析，顺序吐出主题
//! - `TextSyllabusParser` - 纯文本/markdown 大纲解析器
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单次调用
//! - `LlmService` - 模型调用能力
//! - `structured` - 结构化请求/解析能力
//! - `FileOutputManager` - 题目落盘能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个主题"的完整出题流程
//! - `PipelineState` / `StageUpdate` - 状态记录与局部更新
//! - `PipelineRunner` - 状态机驱动（抽取 → 规划 → 批次循环）
//! - `QuestionPipeline` - 六个节点的具体实现
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 主题迭代驱动，管理资源和统计
//!
//! ## 模块结构

pub mod config;
pub mod document;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use document::{SyllabusParser, TextSyllabusParser};
pub use error::{AppError, AppResult};
pub use models::{Question, QuestionPlan, Subtopic, SyllabusTopic};
pub use orchestrator::{App, RunStats};
pub use services::{FileOutputManager, LlmBackend, LlmService, OutputManager};
pub use workflow::{
    BatchDecision, PipelineRunner, PipelineStages, PipelineState, QuestionPipeline, StageUpdate,
};
