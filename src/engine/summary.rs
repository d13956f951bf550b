// ==========================================
// 儿童生长数据校验系统 - 汇总统计
// ==========================================
// 职责: 全任务校验结果 → AnalysisSummary
// 红线: 纯归约；missing 只看状态字段，不看校验等级
// ==========================================

use crate::domain::job::AnalysisSummary;
use crate::domain::measurement::{ValidatedChild, ValidatedMeasurement};
use crate::domain::types::ValidationLevel;

pub struct SummaryAggregator;

impl SummaryAggregator {
    /// 单条记录的贡献（不计儿童数）
    pub fn record_summary(record: &ValidatedMeasurement) -> AnalysisSummary {
        let mut summary = AnalysisSummary {
            total_records: 1,
            ..AnalysisSummary::default()
        };
        match record.validation_level {
            ValidationLevel::Ok => summary.valid = 1,
            ValidationLevel::Warning => summary.warning = 1,
            ValidationLevel::Error => summary.error = 1,
        }
        if record.has_missing() {
            summary.missing = 1;
        }
        summary
    }

    /// 记录列表汇总
    pub fn summarize_records<'a, I>(total_children: usize, records: I) -> AnalysisSummary
    where
        I: IntoIterator<Item = &'a ValidatedMeasurement>,
    {
        let base = AnalysisSummary {
            total_children,
            ..AnalysisSummary::default()
        };
        records
            .into_iter()
            .map(Self::record_summary)
            .fold(base, AnalysisSummary::merge)
    }

    /// 按儿童汇总（每个儿童计 1，即使没有测量记录）
    pub fn summarize(children: &[ValidatedChild]) -> AnalysisSummary {
        children
            .iter()
            .map(|child| Self::summarize_records(1, &child.measurements))
            .fold(AnalysisSummary::default(), AnalysisSummary::merge)
    }
}
