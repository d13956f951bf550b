// ==========================================
// 儿童生长数据校验系统 - 分析引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 任一错误都会把任务标记为 failed，并原样记录错误信息
// ==========================================

use crate::importer::error::ImportError;
use crate::report::error::ReportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid reference file format: {0}")]
    InvalidReference(String),

    #[error("invalid field data: {0}")]
    InvalidFieldData(#[source] ImportError),

    #[error("文件过大: {path} ({size_mb:.1} MB，上限 {limit_mb} MB)")]
    FileTooLarge {
        path: String,
        size_mb: f64,
        limit_mb: u64,
    },

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("结果持久化失败: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("报告生成失败: {0}")]
    Report(#[from] ReportError),

    #[error("校验任务执行失败: {0}")]
    TaskJoin(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
