// ==========================================
// 儿童生长数据校验系统 - 分析任务领域模型
// ==========================================
// 职责: 分析任务元信息 + 汇总统计
// 对齐: jobs 表
// ==========================================

use crate::domain::types::{GenderSetting, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// AnalysisJob - 分析任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub job_id: String,                      // 任务 ID（UUID）
    pub status: JobStatus,                   // processing / completed / failed
    pub default_gender: GenderSetting,       // 任务默认性别
    pub field_data_path: String,             // 现场数据文件
    pub reference_path: String,              // 参考数据文件
    pub summary: Option<AnalysisSummary>,    // 完成后写入
    pub result_sheet_path: Option<String>,   // 结果表（CSV）
    pub summary_sheet_path: Option<String>,  // 汇总表（CSV）
    pub workbook_path: Option<String>,       // 着色工作簿（xlsx）
    pub report_path: Option<String>,         // 文本报告
    pub context_path: Option<String>,        // 完整上下文报告
    pub error_message: Option<String>,       // 失败原因
    pub config_snapshot_json: Option<String>, // 创建时生效的配置快照
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn new(
        job_id: String,
        default_gender: GenderSetting,
        field_data_path: String,
        reference_path: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Processing,
            default_gender,
            field_data_path,
            reference_path,
            summary: None,
            result_sheet_path: None,
            summary_sheet_path: None,
            workbook_path: None,
            report_path: None,
            context_path: None,
            error_message: None,
            config_snapshot_json: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// ReportPaths - 任务产出文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPaths {
    pub result_sheet_path: String,
    pub summary_sheet_path: String,
    pub workbook_path: String,
    pub report_path: String,
    pub context_path: String,
}

// ==========================================
// ResultPreviewRow - 结果预览行（状态查询用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPreviewRow {
    pub nik: Option<String>,
    pub child_name: String,
    pub month_label: String,
    pub age_months: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_status: String,
    pub height_status: String,
    pub validation_level: String,
    pub remark: String,
}

// ==========================================
// AnalysisSummary - 汇总统计
// ==========================================
// 纯归约结果，merge 满足交换律与结合律
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_children: usize,
    pub total_records: usize,
    pub valid: usize,
    pub warning: usize,
    pub error: usize,
    pub missing: usize, // 任一状态为 Missing 的记录数
}

impl AnalysisSummary {
    pub fn merge(self, other: AnalysisSummary) -> AnalysisSummary {
        AnalysisSummary {
            total_children: self.total_children + other.total_children,
            total_records: self.total_records + other.total_records,
            valid: self.valid + other.valid,
            warning: self.warning + other.warning,
            error: self.error + other.error,
            missing: self.missing + other.missing,
        }
    }

    /// 占比（百分比）；无记录时为 0
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            count as f64 / self.total_records as f64 * 100.0
        }
    }
}
