// ==========================================
// 儿童生长数据校验系统 - 分析结果 Repository 实现
// ==========================================
// 职责: 实现任务 / 儿童 / 测量结果的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::job::{AnalysisJob, AnalysisSummary, ReportPaths, ResultPreviewRow};
use crate::domain::measurement::ValidatedChild;
use crate::domain::types::{GenderSetting, JobStatus};
use crate::repository::analysis_repo::AnalysisRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const JOB_COLUMNS: &str = "job_id, status, default_gender, field_data_path, reference_path, \
     summary_json, config_snapshot_json, result_sheet_path, summary_sheet_path, workbook_path, \
     report_path, context_path, error_message, created_at, updated_at";

fn map_job_row(row: &Row<'_>) -> rusqlite::Result<AnalysisJob> {
    let status: String = row.get(1)?;
    let default_gender: String = row.get(2)?;
    let summary_json: Option<String> = row.get(5)?;

    Ok(AnalysisJob {
        job_id: row.get(0)?,
        status: JobStatus::from_str(&status),
        default_gender: GenderSetting::parse(&default_gender).unwrap_or(GenderSetting::Auto),
        field_data_path: row.get(3)?,
        reference_path: row.get(4)?,
        // 汇总 JSON 损坏时视为无汇总
        summary: summary_json.and_then(|s| serde_json::from_str(&s).ok()),
        config_snapshot_json: row.get(6)?,
        result_sheet_path: row.get(7)?,
        summary_sheet_path: row.get(8)?,
        workbook_path: row.get(9)?,
        report_path: row.get(10)?,
        context_path: row.get(11)?,
        error_message: row.get(12)?,
        created_at: row.get::<_, DateTime<Utc>>(13)?,
        updated_at: row.get::<_, DateTime<Utc>>(14)?,
    })
}

// ==========================================
// AnalysisRepositoryImpl
// ==========================================
pub struct AnalysisRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl AnalysisRepositoryImpl {
    /// 创建新的 Repository 实例（自动建库）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))?;
            crate::db::configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
    }

    /// 在事务中写入单个儿童及其测量
    fn insert_child_tx(
        tx: &Transaction,
        job_id: &str,
        seq_no: usize,
        child: &ValidatedChild,
    ) -> RepositoryResult<usize> {
        tx.execute(
            r#"
            INSERT INTO child (job_id, seq_no, nik, name, birth_date, gender)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                job_id,
                seq_no as i64,
                child.nik,
                child.name,
                child.birth_date,
                child.gender.code(),
            ],
        )?;
        let child_id = tx.last_insert_rowid();

        let mut stmt = tx.prepare_cached(
            r#"
            INSERT INTO measurement (
                child_id, seq_no, month_label, measured_date, age_months,
                weight_kg, height_cm, measurement_method,
                weight_status, height_status, validation_level, remark
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )?;

        let mut count = 0;
        for (idx, record) in child.measurements.iter().enumerate() {
            let m = &record.measurement;
            stmt.execute(params![
                child_id,
                idx as i64,
                m.month_label.name(),
                m.measured_date,
                m.age_months,
                m.weight_kg,
                m.height_cm,
                m.measurement_method,
                record.weight_status.to_db_str(),
                record.height_status.to_db_str(),
                record.validation_level.to_db_str(),
                record.remark,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn count_by(&self, sql: &str, job_id: &str) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(sql, params![job_id], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }
}

#[async_trait]
impl AnalysisRepository for AnalysisRepositoryImpl {
    async fn create_job(&self, job: &AnalysisJob) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let summary_json = job.summary.as_ref().map(serde_json::to_string).transpose()?;

        conn.execute(
            r#"
            INSERT INTO analysis_job (
                job_id, status, default_gender, field_data_path, reference_path,
                summary_json, config_snapshot_json, result_sheet_path, summary_sheet_path,
                workbook_path, report_path, context_path, error_message, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                job.job_id,
                job.status.to_db_str(),
                job.default_gender.to_db_str(),
                job.field_data_path,
                job.reference_path,
                summary_json,
                job.config_snapshot_json,
                job.result_sheet_path,
                job.summary_sheet_path,
                job.workbook_path,
                job.report_path,
                job.context_path,
                job.error_message,
                job.created_at,
                job.updated_at,
            ],
        )?;

        Ok(())
    }

    async fn complete_job(
        &self,
        job_id: &str,
        children: &[ValidatedChild],
        summary: &AnalysisSummary,
        paths: &ReportPaths,
    ) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let summary_json = serde_json::to_string(summary)?;
        let tx = conn.unchecked_transaction()?;

        // 重复完成同一任务时先清理旧结果（measurement 级联删除）
        tx.execute("DELETE FROM child WHERE job_id = ?1", params![job_id])?;

        let mut total = 0;
        for (seq_no, child) in children.iter().enumerate() {
            total += Self::insert_child_tx(&tx, job_id, seq_no, child)?;
        }

        let affected = tx.execute(
            r#"
            UPDATE analysis_job
            SET status = ?2, summary_json = ?3, result_sheet_path = ?4,
                summary_sheet_path = ?5, workbook_path = ?6, report_path = ?7,
                context_path = ?8, error_message = NULL, updated_at = ?9
            WHERE job_id = ?1
            "#,
            params![
                job_id,
                JobStatus::Completed.to_db_str(),
                summary_json,
                paths.result_sheet_path,
                paths.summary_sheet_path,
                paths.workbook_path,
                paths.report_path,
                paths.context_path,
                Utc::now(),
            ],
        )?;

        // tx 未提交即丢弃 → 回滚
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AnalysisJob".to_string(),
                id: job_id.to_string(),
            });
        }

        tx.commit()?;
        debug!(job_id, children = children.len(), measurements = total, "校验结果已写入");
        Ok(total)
    }

    async fn mark_failed(&self, job_id: &str, error_message: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE analysis_job SET status = ?2, error_message = ?3, updated_at = ?4 WHERE job_id = ?1",
            params![job_id, JobStatus::Failed.to_db_str(), error_message, Utc::now()],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AnalysisJob".to_string(),
                id: job_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> RepositoryResult<Option<AnalysisJob>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM analysis_job WHERE job_id = ?1", JOB_COLUMNS);
        let job = conn
            .query_row(&sql, params![job_id], map_job_row)
            .optional()?;
        Ok(job)
    }

    async fn list_recent_jobs(&self, limit: usize) -> RepositoryResult<Vec<AnalysisJob>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM analysis_job ORDER BY created_at DESC LIMIT ?1",
            JOB_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params![limit as i64], map_job_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    async fn list_preview_rows(
        &self,
        job_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ResultPreviewRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.nik, c.name, m.month_label, m.age_months, m.weight_kg, m.height_cm,
                   m.weight_status, m.height_status, m.validation_level, m.remark
            FROM measurement m
            JOIN child c ON c.child_id = m.child_id
            WHERE c.job_id = ?1
            ORDER BY c.seq_no, m.seq_no
            LIMIT ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![job_id, limit as i64], |row| {
                Ok(ResultPreviewRow {
                    nik: row.get(0)?,
                    child_name: row.get(1)?,
                    month_label: row.get(2)?,
                    age_months: row.get(3)?,
                    weight_kg: row.get(4)?,
                    height_cm: row.get(5)?,
                    weight_status: row.get(6)?,
                    height_status: row.get(7)?,
                    validation_level: row.get(8)?,
                    remark: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    async fn count_children(&self, job_id: &str) -> RepositoryResult<usize> {
        self.count_by("SELECT COUNT(*) FROM child WHERE job_id = ?1", job_id)
    }

    async fn count_measurements(&self, job_id: &str) -> RepositoryResult<usize> {
        self.count_by(
            "SELECT COUNT(*) FROM measurement m JOIN child c ON c.child_id = m.child_id WHERE c.job_id = ?1",
            job_id,
        )
    }
}
