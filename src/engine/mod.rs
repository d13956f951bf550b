// ==========================================
// 儿童生长数据校验系统 - 引擎层
// ==========================================
// 职责: 参考表构建、逐儿童规则校验、严重度兜底、汇总统计、任务编排
// 红线: Engine 不拼 SQL, 每条异常都必须写入 remark
// ==========================================

pub mod analyzer;
pub mod child_validator;
pub mod error;
pub mod reference_table;
pub mod severity;
pub mod summary;

// 重导出核心引擎
pub use analyzer::{AnalysisOutcome, GrowthAnalyzer, GrowthAnalyzerImpl};
pub use child_validator::{
    sort_by_age, validate_child_measurements, ChildValidator, GrowthHistory,
    ValidationThresholds,
};
pub use error::{AnalysisError, AnalysisResult};
pub use reference_table::{build_reference_table, parse_range};
pub use severity::reconcile_severity;
pub use summary::SummaryAggregator;
