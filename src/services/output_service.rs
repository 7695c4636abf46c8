//! 题目输出服务 - 业务能力层
//!
//! 只负责"把一个批次的题目落盘"能力，不关心流程
//!
//! 写入语义是"追加或创建"：按批次第一道题的主题命名文件，
//! 读出已有内容（缺失或损坏按空处理）、追加、整体写回。
//! 对重复追加不做幂等保护。

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, OutputError};
use crate::models::Question;

/// 持久化能力接口
///
/// 保存节点每完成一个非空批次调用一次。
#[async_trait]
pub trait OutputManager: Send + Sync {
    /// 保存一个批次的题目
    async fn save_output(&self, questions: &[Question]) -> Result<()>;
}

/// 基于文件的输出管理器
///
/// 每个主题一个 JSON 文件：`<输出目录>/<主题>.json`。
pub struct FileOutputManager {
    dir: PathBuf,
}

impl FileOutputManager {
    /// 创建输出管理器
    ///
    /// 目录不存在则创建；路径存在但不是目录属于致命配置错误，
    /// 在任何流水线执行开始之前就报告。
    pub fn new(directory: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = directory.into();
        Self::ensure_valid_directory(&dir)?;
        Ok(Self { dir })
    }

    fn ensure_valid_directory(dir: &Path) -> AppResult<()> {
        if !dir.exists() {
            info!("创建输出目录: {}", dir.display());
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::Output(OutputError::CreateDirFailed {
                    path: dir.display().to_string(),
                    source: Box::new(e),
                })
            })?;
        } else if !dir.is_dir() {
            return Err(AppError::Output(OutputError::InvalidOutputDirectory {
                path: dir.display().to_string(),
            }));
        }
        Ok(())
    }

    /// 目标文件路径（按批次第一道题的主题命名）
    fn output_file(&self, topic: &str) -> PathBuf {
        self.dir.join(format!("{}.json", topic))
    }
}

#[async_trait]
impl OutputManager for FileOutputManager {
    async fn save_output(&self, questions: &[Question]) -> Result<()> {
        let Some(first) = questions.first() else {
            // 空批次无事可做
            return Ok(());
        };

        let output_file = self.output_file(&first.topic);

        // 读出已有题目；文件缺失或损坏都按空列表处理
        let existing: Vec<serde_json::Value> = match fs::read_to_string(&output_file).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(
                        "输出文件内容损坏，按空处理: {} ({})",
                        output_file.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        debug!(
            "输出文件 {} 已有 {} 条，追加 {} 条",
            output_file.display(),
            existing.len(),
            questions.len()
        );

        let mut all_saved = existing;
        for question in questions {
            all_saved.push(serde_json::to_value(question)?);
        }

        let serialized = serde_json::to_string_pretty(&all_saved)?;
        fs::write(&output_file, serialized).await.map_err(|e| {
            AppError::Output(OutputError::WriteFailed {
                path: output_file.display().to_string(),
                source: Box::new(e),
            })
        })?;

        info!(
            "✓ 已保存 {} 道题目到 '{}' (主题: '{}')",
            questions.len(),
            output_file.display(),
            first.topic
        );

        Ok(())
    }
}
