//! 大纲处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责逐主题驱动流水线并管理资源。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、校验输出目录、加载大纲
//! 2. **主题迭代**：从解析器顺序取主题，按请求数量逐个处理
//! 3. **流水线调度**：每个主题执行一次完整的状态机
//! 4. **错误策略**：主题取尽是正常提前结束；其他错误记录后
//!    向上传播，中止整批请求（不做单主题重试）
//! 5. **全局统计**：汇总处理的主题数与生成的题目数

use anyhow::Result;
use tracing::{error, info};

use crate::config::Config;
use crate::document::{SyllabusParser, TextSyllabusParser};
use crate::services::FileOutputManager;
use crate::utils::logging;
use crate::workflow::{PipelineRunner, QuestionPipeline};

/// 运行统计
#[derive(Debug, Default)]
pub struct RunStats {
    /// 完整处理的主题数
    pub topics_processed: usize,
    /// 累计生成的题目数
    pub questions_generated: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    parser: TextSyllabusParser,
    runner: PipelineRunner<QuestionPipeline>,
}

impl App {
    /// 初始化应用
    ///
    /// 输出目录非法属于致命配置错误，在任何流水线执行开始之前
    /// 就在这里报告。
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config.subject, config.topics_num, config.batch_size);

        // 校验/创建输出目录（失败即终止，不进入任何主题执行）
        let output = FileOutputManager::new(&config.output_dir)?;

        // 加载并解析大纲文档
        let parser =
            TextSyllabusParser::from_file(&config.syllabus_file, &config.topic_identifier).await?;
        logging::log_topics_loaded(parser.remaining());

        // 组装流水线与驱动器
        let pipeline = QuestionPipeline::new(&config, output);
        let runner = PipelineRunner::new(pipeline);

        Ok(Self {
            config,
            parser,
            runner,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let topics_num = self.config.topics_num;
        let stats = self.process(topics_num).await?;

        logging::print_final_stats(
            stats.topics_processed,
            stats.questions_generated,
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 处理至多 `topics_num` 个主题
    ///
    /// 大纲取尽时静默提前结束（不是错误）；流水线内的意外错误
    /// 记录后原样向上传播。
    pub async fn process(&mut self, topics_num: usize) -> Result<RunStats> {
        let mut stats = RunStats::default();

        while stats.topics_processed < topics_num {
            // 取下一个主题；取尽即正常结束
            let Some(topic) = self.parser.next_topic() else {
                info!(
                    "大纲主题已取尽，提前结束（已处理 {}/{}）",
                    stats.topics_processed, topics_num
                );
                break;
            };

            let topic_index = stats.topics_processed + 1;
            let title = topic.title.clone();
            logging::log_topic_start(topic_index, &title);

            match self.runner.run(topic, self.config.batch_size).await {
                Ok(final_state) => {
                    logging::log_topic_complete(topic_index, final_state.questions.len());
                    stats.questions_generated += final_state.questions.len();
                    stats.topics_processed += 1;
                }
                Err(e) => {
                    // 记录后向上传播：单主题失败中止整批请求
                    error!("[主题 {}] ❌ 处理 '{}' 时发生错误: {}", topic_index, title, e);
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }
}
