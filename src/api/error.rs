// ==========================================
// 儿童生长数据校验系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将引擎/仓储错误转换为用户可读的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::AnalysisError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 分析错误
    // ==========================================
    /// 参考表格式错误（缺少必需列等）
    #[error("{0}")]
    ReferenceFormat(String),

    /// 现场数据格式错误，附带已识别的列名
    #[error("{message}")]
    FieldDataFormat {
        message: String,
        found_columns: Vec<String>,
    },

    #[error("数据集为空: {0}")]
    EmptyDataset(String),

    #[error("分析失败: {0}")]
    AnalysisFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InternalError(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 AnalysisError 转换
// ==========================================
impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidReference(_) => ApiError::ReferenceFormat(err.to_string()),
            AnalysisError::InvalidFieldData(ImportError::FieldDataFormatError { missing, found }) => {
                ApiError::FieldDataFormat {
                    message: format!(
                        "invalid field data: missing columns [{}]; found columns [{}]",
                        missing.join(", "),
                        found.join(", ")
                    ),
                    found_columns: found,
                }
            }
            AnalysisError::InvalidFieldData(ImportError::EmptyDatasetError) => {
                ApiError::EmptyDataset(err.to_string())
            }
            AnalysisError::InvalidFieldData(inner) => ApiError::InvalidInput(inner.to_string()),
            AnalysisError::FileTooLarge { .. } => ApiError::InvalidInput(err.to_string()),
            AnalysisError::Persistence(repo_err) => repo_err.into(),
            AnalysisError::Other(err) => ApiError::Other(err),
            other => ApiError::AnalysisFailed(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
