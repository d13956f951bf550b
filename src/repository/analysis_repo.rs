// ==========================================
// 儿童生长数据校验系统 - 分析结果 Repository Trait
// ==========================================
// 职责: 定义任务 / 儿童 / 测量结果的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::job::{AnalysisJob, AnalysisSummary, ReportPaths, ResultPreviewRow};
use crate::domain::measurement::ValidatedChild;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// AnalysisRepository Trait
// ==========================================
// 实现者: AnalysisRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    // ===== 任务生命周期 =====

    /// 创建任务记录（status = processing）
    async fn create_job(&self, job: &AnalysisJob) -> RepositoryResult<()>;

    /// 写入儿童与测量结果并标记任务完成（单事务，全部成功或全部回滚）
    ///
    /// # 返回
    /// - Ok(usize): 写入的测量记录数
    /// - Err(NotFound): 任务不存在，结果不落库
    async fn complete_job(
        &self,
        job_id: &str,
        children: &[ValidatedChild],
        summary: &AnalysisSummary,
        paths: &ReportPaths,
    ) -> RepositoryResult<usize>;

    /// 标记任务失败
    async fn mark_failed(&self, job_id: &str, error_message: &str) -> RepositoryResult<()>;

    // ===== 查询 =====

    async fn get_job(&self, job_id: &str) -> RepositoryResult<Option<AnalysisJob>>;

    /// 最近的任务（按创建时间倒序）
    async fn list_recent_jobs(&self, limit: usize) -> RepositoryResult<Vec<AnalysisJob>>;

    /// 结果预览（按儿童顺序、月龄顺序）
    async fn list_preview_rows(
        &self,
        job_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ResultPreviewRow>>;

    async fn count_children(&self, job_id: &str) -> RepositoryResult<usize>;

    async fn count_measurements(&self, job_id: &str) -> RepositoryResult<usize>;
}
