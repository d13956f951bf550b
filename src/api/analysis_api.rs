// ==========================================
// 儿童生长数据校验系统 - 分析任务 API
// ==========================================
// 职责: 提交分析任务、查询任务状态与结果预览、读写配置
// ==========================================

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::job::{AnalysisJob, AnalysisSummary, ReportPaths, ResultPreviewRow};
use crate::domain::types::{GenderSetting, JobStatus};
use crate::engine::{GrowthAnalyzer, GrowthAnalyzerImpl};
use crate::repository::{AnalysisRepository, AnalysisRepositoryImpl};

/// 状态查询返回的预览行数
pub const PREVIEW_ROWS: usize = 10;

/// 提交任务响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnalysisResponse {
    /// 任务ID
    pub job_id: String,
    /// 最终状态（成功时 completed）
    pub status: JobStatus,
    /// 汇总统计
    pub summary: AnalysisSummary,
    /// 报告文件
    pub paths: ReportPaths,
    /// 耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 任务状态响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job: AnalysisJob,
    /// 已持久化的儿童数
    pub child_count: usize,
    /// 前 N 条测量结果
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preview: Vec<ResultPreviewRow>,
}

/// 分析任务API
pub struct AnalysisApi {
    analyzer: Arc<GrowthAnalyzerImpl<AnalysisRepositoryImpl, ConfigManager>>,
    repo: Arc<AnalysisRepositoryImpl>,
    config_manager: Arc<ConfigManager>,
}

impl AnalysisApi {
    /// 创建新的AnalysisApi实例
    pub fn new(repo: Arc<AnalysisRepositoryImpl>, config_manager: Arc<ConfigManager>) -> Self {
        let analyzer = Arc::new(GrowthAnalyzerImpl::new(
            Arc::clone(&repo),
            Arc::clone(&config_manager),
        ));
        Self {
            analyzer,
            repo,
            config_manager,
        }
    }

    /// 提交并执行一次分析
    ///
    /// # 参数
    /// - field_path: 现场数据文件（.xlsx/.xls/.csv）
    /// - reference_path: 参考数据文件
    /// - default_gender: "L" / "P" / "AUTO"；None 时使用配置
    ///
    /// # 返回
    /// - Ok(SubmitAnalysisResponse): 任务已完成
    /// - Err(ApiError): 任务已标记失败（任务记录可通过 get_job_status 查询）
    #[instrument(skip(self))]
    pub async fn submit_analysis(
        &self,
        field_path: &str,
        reference_path: &str,
        default_gender: Option<&str>,
    ) -> ApiResult<SubmitAnalysisResponse> {
        if field_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("现场数据文件路径不能为空".to_string()));
        }
        if reference_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("参考数据文件路径不能为空".to_string()));
        }

        let setting = match default_gender {
            Some(raw) => Some(GenderSetting::parse(raw).ok_or_else(|| {
                ApiError::InvalidInput(format!("无效的性别设置: {}，应为 L/P/AUTO", raw))
            })?),
            None => None,
        };

        let job_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        let outcome = self
            .analyzer
            .run_analysis(
                &job_id,
                Path::new(field_path),
                Path::new(reference_path),
                setting,
            )
            .await?;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        info!(job_id = %outcome.job_id, elapsed_ms, "分析任务已提交并完成");

        Ok(SubmitAnalysisResponse {
            job_id: outcome.job_id,
            status: JobStatus::Completed,
            summary: outcome.summary,
            paths: outcome.paths,
            elapsed_ms,
        })
    }

    /// 查询任务状态（含前 10 条结果预览）
    ///
    /// # 返回
    /// - Err(NotFound): 任务不存在
    pub async fn get_job_status(&self, job_id: &str) -> ApiResult<JobStatusResponse> {
        let job = self
            .repo
            .get_job(job_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("分析任务(id={})不存在", job_id)))?;

        let preview = if job.status == JobStatus::Completed {
            self.repo.list_preview_rows(job_id, PREVIEW_ROWS).await?
        } else {
            Vec::new()
        };
        let child_count = self.repo.count_children(job_id).await?;

        Ok(JobStatusResponse {
            job,
            child_count,
            preview,
        })
    }

    /// 任务状态 JSON（供 CLI / 外部调用方直接输出）
    pub async fn get_job_status_json(&self, job_id: &str) -> ApiResult<String> {
        let status = self.get_job_status(job_id).await?;
        serde_json::to_string_pretty(&status)
            .map_err(|e| ApiError::InternalError(format!("序列化失败: {}", e)))
    }

    /// 最近的任务列表
    pub async fn list_recent_jobs(&self, limit: usize) -> ApiResult<Vec<AnalysisJob>> {
        let limit = limit.clamp(1, 100); // 限制在 1-100 之间
        Ok(self.repo.list_recent_jobs(limit).await?)
    }

    /// 更新全局配置
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        self.config_manager
            .set_global_config_value(key.trim(), value.trim())
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        info!(key, value, "配置已更新");
        Ok(())
    }

    /// 获取配置快照
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }
}
