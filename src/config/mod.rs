// ==========================================
// 儿童生长数据校验系统 - 配置层
// ==========================================
// 职责: 系统配置管理（默认性别、输出目录、规则阈值）
// 存储: config_kv 表
// ==========================================

pub mod analysis_config_trait;
pub mod config_manager;

// 重导出核心配置管理器
pub use analysis_config_trait::AnalysisConfigReader;
pub use config_manager::{config_keys, ConfigManager, DEFAULT_OUTPUT_DIR};
