// ==========================================
// 儿童生长数据校验系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 单元格级解析失败不是错误（降级为 None），只有结构性问题才报错
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构性错误（任务级致命）=====
    #[error("参考文件格式错误: {0}")]
    ReferenceFormatError(String),

    #[error("必填列缺失: {missing:?}。已发现的列: {found:?}。请确认存在儿童姓名列（如 'Nama Anak'、'NAMA BALITA'）")]
    FieldDataFormatError {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("现场数据为空，没有可分析的儿童记录")]
    EmptyDatasetError,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
