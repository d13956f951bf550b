// ==========================================
// 儿童生长数据校验系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::AnalysisApi;
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::AnalysisRepositoryImpl;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SITRACKING_DB_PATH";

/// 应用状态
///
/// Repository 与 ConfigManager 共享同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 分析任务API
    pub analysis_api: Arc<AnalysisApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动建库建表）
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let repo = Arc::new(
            AnalysisRepositoryImpl::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("无法初始化AnalysisRepository: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(Arc::clone(&conn))
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );

        let analysis_api = Arc::new(AnalysisApi::new(repo, Arc::clone(&config_manager)));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            analysis_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: SITRACKING_DB_PATH → 用户数据目录/sitracking/sitracking.db → ./sitracking.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sitracking.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sitracking");
        // 目录创建失败时保留当前目录回退值
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sitracking.db");
        }
    }

    path.to_string_lossy().to_string()
}
