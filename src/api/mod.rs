// ==========================================
// 儿童生长数据校验系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 外部调用方使用
// ==========================================

pub mod analysis_api;
pub mod error;

// 重导出核心类型
pub use analysis_api::{AnalysisApi, JobStatusResponse, SubmitAnalysisResponse, PREVIEW_ROWS};
pub use error::{ApiError, ApiResult};
