// ==========================================
// 儿童生长数据校验系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod job;
pub mod measurement;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use job::{AnalysisJob, AnalysisSummary, ReportPaths, ResultPreviewRow};
pub use measurement::{ChildRecord, Measurement, ValidatedChild, ValidatedMeasurement};
pub use reference::{IdealRange, ReferenceRow, ReferenceTable};
pub use types::{
    Gender, GenderSetting, JobStatus, MeasurementType, MonthLabel, ValidationLevel, WeightStatus,
};
