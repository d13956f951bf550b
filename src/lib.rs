// ==========================================
// 儿童生长数据校验系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 现场测量数据导入、规则校验与报告生成
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 校验规则与任务编排
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 报告层 - 结果表与文本报告
pub mod report;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Gender, GenderSetting, JobStatus, MeasurementType, MonthLabel, ValidationLevel, WeightStatus,
};

// 领域实体
pub use domain::{
    AnalysisJob, AnalysisSummary, ChildRecord, IdealRange, Measurement, ReferenceRow,
    ReferenceTable, ValidatedChild, ValidatedMeasurement,
};

// 引擎
pub use engine::{
    build_reference_table, validate_child_measurements, ChildValidator, GrowthAnalyzer,
    GrowthAnalyzerImpl, SummaryAggregator,
};

// API
pub use api::AnalysisApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SiTracking 儿童生长数据校验系统";
