// ==========================================
// 儿童生长数据校验系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::analysis_config_trait::AnalysisConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::{Gender, GenderSetting};
use crate::engine::child_validator::ValidationThresholds;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析数值配置；格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + std::fmt::Display + Copy,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 创建分析任务时记录当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// AnalysisConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AnalysisConfigReader for ConfigManager {
    async fn get_default_gender(&self) -> Result<GenderSetting, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_GENDER, "L")?;
        Ok(GenderSetting::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_GENDER,
                raw_value = %value,
                "默认性别配置无法识别，使用 L"
            );
            GenderSetting::Fixed(Gender::Male)
        }))
    }

    async fn get_fallback_gender(&self) -> Result<Gender, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::FALLBACK_GENDER, "L")?;
        Ok(Gender::parse(&value).unwrap_or(Gender::Male)) // 默认 L
    }

    async fn get_output_dir(&self) -> Result<PathBuf, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::OUTPUT_DIR, DEFAULT_OUTPUT_DIR)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(PathBuf::from(DEFAULT_OUTPUT_DIR))
        } else {
            Ok(PathBuf::from(trimmed))
        }
    }

    async fn get_max_upload_mb(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed_or_default(config_keys::MAX_UPLOAD_MB, 10u64)
    }

    async fn get_validation_thresholds(&self) -> Result<ValidationThresholds, Box<dyn Error>> {
        let defaults = ValidationThresholds::default();
        Ok(ValidationThresholds {
            max_age_gap_months: self
                .get_parsed_or_default(config_keys::MAX_AGE_GAP_MONTHS, defaults.max_age_gap_months)?,
            max_height_increase_cm: self.get_parsed_or_default(
                config_keys::MAX_HEIGHT_INCREASE_CM,
                defaults.max_height_increase_cm,
            )?,
            max_weight_drop_pct: self
                .get_parsed_or_default(config_keys::MAX_WEIGHT_DROP_PCT, defaults.max_weight_drop_pct)?,
        })
    }

    async fn get_config_snapshot_json(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_snapshot()
    }
}

pub const DEFAULT_OUTPUT_DIR: &str = "./data/outputs";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 性别
    pub const DEFAULT_GENDER: &str = "default_gender";
    pub const FALLBACK_GENDER: &str = "fallback_gender";

    // 输出
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const MAX_UPLOAD_MB: &str = "max_upload_mb";

    // 规则阈值
    pub const MAX_AGE_GAP_MONTHS: &str = "max_age_gap_months";
    pub const MAX_HEIGHT_INCREASE_CM: &str = "max_height_increase_cm";
    pub const MAX_WEIGHT_DROP_PCT: &str = "max_weight_drop_pct";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use tempfile::NamedTempFile;

    fn manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&path).unwrap();
        init_schema(&conn).unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let (_tmp, manager) = manager();

        assert_eq!(
            manager.get_default_gender().await.unwrap(),
            GenderSetting::Fixed(Gender::Male)
        );
        assert_eq!(manager.get_fallback_gender().await.unwrap(), Gender::Male);
        assert_eq!(
            manager.get_output_dir().await.unwrap(),
            PathBuf::from(DEFAULT_OUTPUT_DIR)
        );
        assert_eq!(manager.get_max_upload_mb().await.unwrap(), 10);
        assert_eq!(
            manager.get_validation_thresholds().await.unwrap(),
            ValidationThresholds::default()
        );
    }

    #[tokio::test]
    async fn test_overrides_and_malformed_values() {
        let (_tmp, manager) = manager();
        manager.set_global_config_value(config_keys::DEFAULT_GENDER, "auto").unwrap();
        manager.set_global_config_value(config_keys::FALLBACK_GENDER, "P").unwrap();
        manager.set_global_config_value(config_keys::MAX_HEIGHT_INCREASE_CM, "3.5").unwrap();
        manager.set_global_config_value(config_keys::MAX_AGE_GAP_MONTHS, "abc").unwrap();

        assert_eq!(manager.get_default_gender().await.unwrap(), GenderSetting::Auto);
        assert_eq!(manager.get_fallback_gender().await.unwrap(), Gender::Female);

        let thresholds = manager.get_validation_thresholds().await.unwrap();
        assert_eq!(thresholds.max_height_increase_cm, 3.5);
        assert_eq!(thresholds.max_age_gap_months, 1); // 格式错误回退默认值

        let snapshot = manager.get_config_snapshot().unwrap();
        assert!(snapshot.contains("max_height_increase_cm"));
    }
}
