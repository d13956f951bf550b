// ==========================================
// 儿童生长数据校验系统 - 报告层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报告文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("工作簿写入失败: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type ReportResult<T> = Result<T, ReportError>;
