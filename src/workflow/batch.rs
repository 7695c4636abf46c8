//! 计划分批 - 纯函数
//!
//! 给定有序计划、游标和批次大小，取出下一段连续切片并给出
//! 新游标。这是整张图里唯一推进游标的地方：一旦取走非空切片，
//! 推进无条件生效，下游怎么处理这个批次都不会导致重发。

use crate::models::{PlanStatus, PlannedQuestion, QuestionPlan};

/// 一次批次选择的结果
#[derive(Debug, Clone)]
pub struct BatchSelection {
    /// 选中的计划条目（状态已置为 generating）
    pub batch: Vec<PlannedQuestion>,
    /// 新的计划游标
    pub plan_position: usize,
}

/// 选择下一个批次
///
/// - 计划缺失/为空，或游标已到尾部：返回空批次，游标收在计划
///   长度上（只收不退）
/// - 否则取 `[position, min(position + batch_size, len))` 区间
pub fn select_next_batch(
    plan: Option<&QuestionPlan>,
    position: usize,
    batch_size: usize,
) -> BatchSelection {
    let Some(plan) = plan else {
        return BatchSelection {
            batch: Vec::new(),
            plan_position: 0,
        };
    };

    let total = plan.planned_questions.len();

    if total == 0 || position >= total {
        return BatchSelection {
            batch: Vec::new(),
            plan_position: total,
        };
    }

    let end = (position + batch_size.max(1)).min(total);

    let batch: Vec<PlannedQuestion> = plan.planned_questions[position..end]
        .iter()
        .cloned()
        .map(|mut planned| {
            planned.status = PlanStatus::Generating;
            planned
        })
        .collect();

    BatchSelection {
        batch,
        plan_position: end,
    }
}
