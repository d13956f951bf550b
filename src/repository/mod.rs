// ==========================================
// 儿童生长数据校验系统 - 数据仓储层
// ==========================================
// 职责: 数据访问抽象,隔离数据库实现
// 红线: Repository 不含业务规则
// ==========================================

pub mod analysis_repo;
pub mod analysis_repo_impl;
pub mod error;

// 重导出核心类型
pub use analysis_repo::AnalysisRepository;
pub use analysis_repo_impl::AnalysisRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
