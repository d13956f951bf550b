// ==========================================
// 儿童生长数据校验系统 - 分析任务编排
// ==========================================
// 流程:
// 1. 解析参考表 → ReferenceTable
// 2. 解析现场数据 → Vec<ChildRecord>
// 3. 空数据集 → 失败
// 4. 逐个儿童并发校验（blocking 线程池，保持输入顺序）
// 5. 汇总统计
// 6. 写出报告
// 7. 单事务持久化儿童 + 测量，并在同一事务内标记任务完成
// 8. 任一步失败 → 标记失败并返回错误（失败任务不保留任何测量结果）
// ==========================================

use crate::config::AnalysisConfigReader;
use crate::domain::job::{AnalysisJob, AnalysisSummary, ReportPaths};
use crate::domain::measurement::{ChildRecord, ValidatedChild};
use crate::domain::reference::ReferenceTable;
use crate::domain::types::{Gender, GenderSetting, MeasurementType};
use crate::engine::child_validator::ChildValidator;
use crate::engine::error::{AnalysisError, AnalysisResult};
use crate::engine::reference_table::build_reference_table;
use crate::engine::summary::SummaryAggregator;
use crate::importer::error::ImportError;
use crate::importer::{
    FieldDataImporter, FieldDataMapper, FileParser, ReferenceImporter, ReferenceMapper,
    UniversalFileParser,
};
use crate::report::{write_all_reports, ReportContext};
use crate::repository::AnalysisRepository;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ==========================================
// AnalysisOutcome - 任务产出
// ==========================================
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub job_id: String,
    pub summary: AnalysisSummary,
    pub paths: ReportPaths,
    pub children: Vec<ValidatedChild>,
}

// ==========================================
// GrowthAnalyzer Trait
// ==========================================
#[async_trait]
pub trait GrowthAnalyzer: Send + Sync {
    /// 执行一次完整分析
    ///
    /// # 参数
    /// - job_id: 任务 ID（调用方生成）
    /// - default_gender: None 时使用配置 default_gender
    ///
    /// # 返回
    /// - Ok(AnalysisOutcome): 任务已标记 completed
    /// - Err(AnalysisError): 任务已标记 failed（任务创建本身失败除外）
    async fn run_analysis(
        &self,
        job_id: &str,
        field_path: &Path,
        reference_path: &Path,
        default_gender: Option<GenderSetting>,
    ) -> AnalysisResult<AnalysisOutcome>;
}

// ==========================================
// GrowthAnalyzerImpl
// ==========================================
pub struct GrowthAnalyzerImpl<R, C>
where
    R: AnalysisRepository,
    C: AnalysisConfigReader,
{
    repo: Arc<R>,
    config: Arc<C>,
    file_parser: Box<dyn FileParser>,
    reference_importer: Box<dyn ReferenceImporter>,
    field_importer: Box<dyn FieldDataImporter>,
}

impl<R, C> GrowthAnalyzerImpl<R, C>
where
    R: AnalysisRepository,
    C: AnalysisConfigReader,
{
    /// 使用默认解析器组装
    pub fn new(repo: Arc<R>, config: Arc<C>) -> Self {
        Self::with_components(
            repo,
            config,
            Box::new(UniversalFileParser),
            Box::new(ReferenceMapper),
            Box::new(FieldDataMapper),
        )
    }

    pub fn with_components(
        repo: Arc<R>,
        config: Arc<C>,
        file_parser: Box<dyn FileParser>,
        reference_importer: Box<dyn ReferenceImporter>,
        field_importer: Box<dyn FieldDataImporter>,
    ) -> Self {
        Self {
            repo,
            config,
            file_parser,
            reference_importer,
            field_importer,
        }
    }

    async fn check_file_size(&self, path: &Path) -> AnalysisResult<()> {
        let limit_mb = self
            .config
            .get_max_upload_mb()
            .await
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        // 文件不存在交给解析器报错
        let Ok(metadata) = std::fs::metadata(path) else {
            return Ok(());
        };
        let size_mb = metadata.len() as f64 / BYTES_PER_MB;
        if size_mb > limit_mb as f64 {
            return Err(AnalysisError::FileTooLarge {
                path: path.display().to_string(),
                size_mb,
                limit_mb,
            });
        }
        Ok(())
    }

    fn load_reference(&self, reference_path: &Path) -> AnalysisResult<ReferenceTable> {
        let sheet = self
            .file_parser
            .parse_to_raw_sheet(reference_path)
            .map_err(|e| AnalysisError::InvalidReference(e.to_string()))?;
        let rows = self
            .reference_importer
            .map_reference_rows(&sheet)
            .map_err(|e| AnalysisError::InvalidReference(e.to_string()))?;

        // 列齐全但内容全部无效时不失败：无区间 = 不设约束
        let table = build_reference_table(&rows);
        if table.is_empty() {
            warn!(rows = rows.len(), "参考表中没有可用的理想区间，所有测量按 Ideal 处理");
        }
        Ok(table)
    }

    fn load_children(&self, field_path: &Path) -> AnalysisResult<Vec<ChildRecord>> {
        let sheet = self
            .file_parser
            .parse_to_raw_sheet(field_path)
            .map_err(AnalysisError::InvalidFieldData)?;
        let children = self
            .field_importer
            .map_children(&sheet)
            .map_err(AnalysisError::InvalidFieldData)?;

        if children.is_empty() {
            return Err(AnalysisError::InvalidFieldData(ImportError::EmptyDatasetError));
        }
        Ok(children)
    }

    /// 并发校验所有儿童，结果顺序与输入一致
    async fn validate_children(
        &self,
        children: Vec<ChildRecord>,
        reference: Arc<ReferenceTable>,
        setting: GenderSetting,
        fallback: Gender,
        validator: ChildValidator,
    ) -> AnalysisResult<Vec<ValidatedChild>> {
        let tasks = children.into_iter().map(|child| {
            let reference = Arc::clone(&reference);
            let validator = validator.clone();
            let gender = setting.resolve(child.gender).unwrap_or_else(|| {
                warn!(
                    child = %child.name,
                    row = child.row_number,
                    fallback = %fallback,
                    "性别无法确定，使用兜底性别"
                );
                fallback
            });

            tokio::task::spawn_blocking(move || {
                let measurements = validator.validate(&child.measurements, &reference, gender);
                ValidatedChild {
                    nik: child.nik,
                    name: child.name,
                    birth_date: child.birth_date,
                    gender,
                    measurements,
                }
            })
        });

        try_join_all(tasks)
            .await
            .map_err(|e| AnalysisError::TaskJoin(e.to_string()))
    }

    async fn execute(
        &self,
        job: &AnalysisJob,
        field_path: &Path,
        reference_path: &Path,
    ) -> AnalysisResult<AnalysisOutcome> {
        let job_id = job.job_id.as_str();
        let setting = job.default_gender;

        self.check_file_size(field_path).await?;
        self.check_file_size(reference_path).await?;

        // === 步骤 1: 解析参考表 ===
        debug!("步骤 1: 解析参考表");
        let reference = self.load_reference(reference_path)?;
        info!(
            male_weight_ages = reference.series_len(MeasurementType::Weight, Gender::Male),
            female_weight_ages = reference.series_len(MeasurementType::Weight, Gender::Female),
            "参考表解析完成"
        );

        // === 步骤 2-3: 解析现场数据 ===
        debug!("步骤 2: 解析现场数据");
        let children = self.load_children(field_path)?;
        info!(children = children.len(), "现场数据解析完成");

        // === 步骤 4: 并发校验 ===
        debug!("步骤 4: 逐个儿童校验");
        let thresholds = self
            .config
            .get_validation_thresholds()
            .await
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        let fallback = self
            .config
            .get_fallback_gender()
            .await
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        let validated = self
            .validate_children(
                children,
                Arc::new(reference),
                setting,
                fallback,
                ChildValidator::with_thresholds(thresholds),
            )
            .await?;

        // === 步骤 5: 汇总 ===
        let summary = SummaryAggregator::summarize(&validated);
        info!(
            total_records = summary.total_records,
            valid = summary.valid,
            warning = summary.warning,
            error = summary.error,
            missing = summary.missing,
            "校验汇总完成"
        );

        // === 步骤 6: 报告 ===
        debug!("步骤 6: 生成报告");
        let output_dir = self
            .config
            .get_output_dir()
            .await
            .map_err(|e| AnalysisError::Config(e.to_string()))?;
        let ctx = ReportContext {
            job_id,
            children: &validated,
            summary: &summary,
            default_gender: setting,
            generated_at: chrono::Local::now().naive_local(),
        };
        let paths = write_all_reports(&output_dir, &ctx)?;

        // === 步骤 7-8: 持久化 + 完成（单事务）===
        debug!("步骤 7: 持久化校验结果并标记完成");
        let saved = match self
            .repo
            .complete_job(job_id, &validated, &summary, &paths)
            .await
        {
            Ok(saved) => saved,
            Err(e) => {
                // 结果未落库，已写出的报告一并清理
                let job_dir = output_dir.join(job_id);
                if let Err(rm_err) = std::fs::remove_dir_all(&job_dir) {
                    warn!(dir = %job_dir.display(), error = %rm_err, "报告目录清理失败");
                }
                return Err(e.into());
            }
        };
        debug!(measurements = saved, "持久化完成");

        Ok(AnalysisOutcome {
            job_id: job_id.to_string(),
            summary,
            paths,
            children: validated,
        })
    }
}

#[async_trait]
impl<R, C> GrowthAnalyzer for GrowthAnalyzerImpl<R, C>
where
    R: AnalysisRepository + Send + Sync,
    C: AnalysisConfigReader + Send + Sync,
{
    #[instrument(skip_all, fields(job_id = %job_id))]
    async fn run_analysis(
        &self,
        job_id: &str,
        field_path: &Path,
        reference_path: &Path,
        default_gender: Option<GenderSetting>,
    ) -> AnalysisResult<AnalysisOutcome> {
        let setting = match default_gender {
            Some(setting) => setting,
            None => self
                .config
                .get_default_gender()
                .await
                .map_err(|e| AnalysisError::Config(e.to_string()))?,
        };

        info!(
            field = %field_path.display(),
            reference = %reference_path.display(),
            default_gender = %setting,
            "开始分析任务"
        );

        let mut job = AnalysisJob::new(
            job_id.to_string(),
            setting,
            field_path.display().to_string(),
            reference_path.display().to_string(),
        );
        // 快照失败不影响任务
        job.config_snapshot_json = self.config.get_config_snapshot_json().await.ok();
        self.repo.create_job(&job).await?;

        match self.execute(&job, field_path, reference_path).await {
            Ok(outcome) => {
                info!(total_records = outcome.summary.total_records, "分析任务完成");
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "分析任务失败");
                if let Err(mark_err) = self.repo.mark_failed(job_id, &e.to_string()).await {
                    error!(error = %mark_err, "任务失败状态写入失败");
                }
                Err(e)
            }
        }
    }
}
