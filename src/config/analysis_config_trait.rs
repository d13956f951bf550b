// ==========================================
// 儿童生长数据校验系统 - 分析配置读取 Trait
// ==========================================
// 职责: 定义分析任务所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::{Gender, GenderSetting};
use crate::engine::child_validator::ValidationThresholds;
use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

// ==========================================
// AnalysisConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AnalysisConfigReader: Send + Sync {
    // ===== 性别配置 =====

    /// 任务未指定性别时使用的默认设置
    ///
    /// # 默认值
    /// - L
    async fn get_default_gender(&self) -> Result<GenderSetting, Box<dyn Error>>;

    /// AUTO 且儿童自身性别缺失时的兜底性别
    ///
    /// # 默认值
    /// - L
    async fn get_fallback_gender(&self) -> Result<Gender, Box<dyn Error>>;

    // ===== 输出配置 =====

    /// 报告输出根目录（任务结果写入 `<output_dir>/<job_id>/`）
    ///
    /// # 默认值
    /// - ./data/outputs
    async fn get_output_dir(&self) -> Result<PathBuf, Box<dyn Error>>;

    /// 单个上传文件大小上限（MB）
    ///
    /// # 默认值
    /// - 10
    async fn get_max_upload_mb(&self) -> Result<u64, Box<dyn Error>>;

    // ===== 规则阈值 =====

    /// 校验规则阈值（月龄间隔 / 身高骤增 / 体重骤降）
    ///
    /// # 默认值
    /// - 1 个月 / 5.0 cm / 10.0 %
    async fn get_validation_thresholds(&self) -> Result<ValidationThresholds, Box<dyn Error>>;

    // ===== 快照 =====

    /// 当前生效配置的 JSON 快照（写入任务记录，便于追溯）
    async fn get_config_snapshot_json(&self) -> Result<String, Box<dyn Error>>;
}
