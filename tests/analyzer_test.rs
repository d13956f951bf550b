// ==========================================
// GrowthAnalyzer 端到端测试
// ==========================================
// 测试目标: 文件 → 校验 → 持久化 → 报告 → 任务状态
// ==========================================


use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sitracking::api::{AnalysisApi, ApiError};
use sitracking::config::{config_keys, ConfigManager};
use sitracking::domain::job::{AnalysisJob, AnalysisSummary, ReportPaths, ResultPreviewRow};
use sitracking::domain::measurement::ValidatedChild;
use sitracking::domain::types::{Gender, GenderSetting, JobStatus, ValidationLevel, WeightStatus};
use sitracking::engine::{AnalysisError, GrowthAnalyzer, GrowthAnalyzerImpl};
use sitracking::importer::{FileParser, ImportError, UniversalFileParser};
use sitracking::logging;
use sitracking::report::text_report::ALL_VALID_LINE;
use sitracking::report::RESULT_HEADERS;
use sitracking::repository::{
    AnalysisRepository, AnalysisRepositoryImpl, RepositoryError, RepositoryResult,
};
use tempfile::{NamedTempFile, TempDir};
use test_helpers::{
    create_test_db, insert_test_config, month_cells, read_to_string, write_csv, write_field_csv,
    write_reference_csv,
};

struct Fixture {
    _db_file: NamedTempFile,
    db_path: String,
    dir: TempDir,
    repo: Arc<AnalysisRepositoryImpl>,
    analyzer: GrowthAnalyzerImpl<AnalysisRepositoryImpl, ConfigManager>,
}

fn setup() -> Fixture {
    logging::init_test();

    let (db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("outputs");
    insert_test_config(&db_path, config_keys::OUTPUT_DIR, output_dir.to_str().unwrap()).unwrap();

    let repo = Arc::new(AnalysisRepositoryImpl::new(&db_path).unwrap());
    let config = Arc::new(ConfigManager::new(&db_path).unwrap());
    let analyzer = GrowthAnalyzerImpl::new(Arc::clone(&repo), config);

    Fixture {
        _db_file: db_file,
        db_path,
        dir,
        repo,
        analyzer,
    }
}

fn child_row(nik: &str, name: &str, gender: &str, blocks: &[(&str, &str, &str)]) -> Vec<String> {
    let mut row = vec![
        nik.to_string(),
        name.to_string(),
        "01/12/2022".to_string(),
        gender.to_string(),
    ];
    for (age, weight, height) in blocks {
        row.extend(month_cells(age, weight, height));
    }
    row
}

/// 三个儿童:
/// - Budi: 三个月全部正常
/// - Siti: 二月身高下降（Error），三月空
/// - Ani: 性别缺失，一月体重缺失，二月断档
fn write_standard_field(dir: &Path) -> std::path::PathBuf {
    write_field_csv(
        dir,
        &["JANUARI", "FEBRUARI", "MARET"],
        &[
            child_row(
                "3201",
                "Budi",
                "L",
                &[("1", "3.5", "52"), ("2", "4.0", "54"), ("3", "4.5", "56")],
            ),
            child_row("3202", "Siti", "P", &[("1", "3.5", "55"), ("2", "4.0", "53"), ("", "", "")]),
            child_row("3203", "Ani", "", &[("1", "", "52"), ("3", "4.5", "56"), ("", "", "")]),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn test_full_analysis_success() {
    let fx = setup();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());

    let outcome = fx
        .analyzer
        .run_analysis("job-ok", &field, &reference, None)
        .await
        .unwrap();

    let s = outcome.summary;
    assert_eq!(s.total_children, 3);
    assert_eq!(s.total_records, 7);
    assert_eq!(s.valid, 4);
    assert_eq!(s.warning, 2);
    assert_eq!(s.error, 1);
    assert_eq!(s.missing, 1);

    // 子女顺序与输入一致；性别缺失按默认 L
    assert_eq!(outcome.children[0].name, "Budi");
    assert_eq!(outcome.children[2].name, "Ani");
    assert_eq!(outcome.children[2].gender, Gender::Male);
    assert_eq!(
        outcome.children[1].measurements[1].validation_level,
        ValidationLevel::Error
    );

    // 持久化
    let job = fx.repo.get_job("job-ok").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.summary, Some(s));
    assert!(job.config_snapshot_json.is_some());
    assert_eq!(fx.repo.count_children("job-ok").await.unwrap(), 3);
    assert_eq!(fx.repo.count_measurements("job-ok").await.unwrap(), 7);

    // 报告
    for path in [
        &outcome.paths.result_sheet_path,
        &outcome.paths.summary_sheet_path,
        &outcome.paths.workbook_path,
        &outcome.paths.report_path,
        &outcome.paths.context_path,
    ] {
        assert!(Path::new(path).exists(), "missing report file {}", path);
        assert!(path.contains("job-ok"));
    }

    let sheet = read_to_string(&outcome.paths.result_sheet_path);
    let mut lines = sheet.lines();
    assert_eq!(lines.next().unwrap(), RESULT_HEADERS.join(","));
    assert_eq!(lines.count(), 7);
    assert!(sheet.contains("FF0000"));

    // 工作簿首个 sheet 即结果表（颜色体现在填充上，无 Color 列）
    let workbook = UniversalFileParser
        .parse_to_raw_sheet(Path::new(&outcome.paths.workbook_path))
        .unwrap();
    assert_eq!(workbook.headers, RESULT_HEADERS[..RESULT_HEADERS.len() - 1].to_vec());
    assert_eq!(workbook.rows.len(), 7);
    assert_eq!(workbook.rows[0]["Child Name"], "Budi");
    assert_eq!(job.workbook_path.as_deref(), Some(outcome.paths.workbook_path.as_str()));

    let report = read_to_string(&outcome.paths.report_path);
    assert!(report.contains(ALL_VALID_LINE));
    assert!(report.contains("height decreased"));
    assert!(report.contains("Siti"));
}

#[tokio::test]
async fn test_auto_gender_uses_fallback() {
    let fx = setup();
    insert_test_config(&fx.db_path, config_keys::FALLBACK_GENDER, "P").unwrap();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());

    let outcome = fx
        .analyzer
        .run_analysis("job-auto", &field, &reference, Some(GenderSetting::Auto))
        .await
        .unwrap();

    assert_eq!(outcome.children[0].gender, Gender::Male);
    assert_eq!(outcome.children[1].gender, Gender::Female);
    assert_eq!(outcome.children[2].gender, Gender::Female);

    let job = fx.repo.get_job("job-auto").await.unwrap().unwrap();
    assert_eq!(job.default_gender, GenderSetting::Auto);
}

#[tokio::test]
async fn test_missing_name_column_marks_job_failed() {
    let fx = setup();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_csv(
        fx.dir.path(),
        "no_name.csv",
        &["NIK", "Alamat", "JANUARI_UMUR", "JANUARI_BERAT"],
        &[vec!["3201".into(), "Jl. Mawar".into(), "1".into(), "4.0".into()]],
    )
    .unwrap();

    let result = fx
        .analyzer
        .run_analysis("job-no-name", &field, &reference, None)
        .await;

    assert!(matches!(
        result,
        Err(AnalysisError::InvalidFieldData(ImportError::FieldDataFormatError { .. }))
    ));

    let job = fx.repo.get_job("job-no-name").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let message = job.error_message.unwrap();
    assert!(message.contains("Nama Anak"));
    assert!(message.contains("Alamat"));
}

#[tokio::test]
async fn test_invalid_reference_marks_job_failed() {
    let fx = setup();
    let reference = write_csv(
        fx.dir.path(),
        "ref_bad.csv",
        &["Umur", "BB L"],
        &[vec!["0".into(), "2.5-4.4".into()]],
    )
    .unwrap();
    let field = write_standard_field(fx.dir.path());

    let result = fx
        .analyzer
        .run_analysis("job-bad-ref", &field, &reference, None)
        .await;

    assert!(matches!(result, Err(AnalysisError::InvalidReference(_))));
    let job = fx.repo.get_job("job-bad-ref").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error_message
        .unwrap()
        .starts_with("invalid reference file format:"));
    assert_eq!(fx.repo.count_children("job-bad-ref").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reference_without_usable_ranges_still_completes() {
    let fx = setup();
    let reference = write_csv(
        fx.dir.path(),
        "ref_empty_ranges.csv",
        test_helpers::REFERENCE_HEADERS,
        &[vec!["0".into(), "bad".into(), "".into(), "x-y".into(), "n/a".into()]],
    )
    .unwrap();
    let field = write_field_csv(
        fx.dir.path(),
        &["JANUARI"],
        &[child_row("3201", "Budi", "L", &[("0", "40.0", "120")])],
    )
    .unwrap();

    let outcome = fx
        .analyzer
        .run_analysis("job-no-ranges", &field, &reference, None)
        .await
        .unwrap();

    // 无区间 → 不设约束
    let record = &outcome.children[0].measurements[0];
    assert_eq!(record.weight_status, WeightStatus::Ideal);
    assert_eq!(record.height_status, WeightStatus::Ideal);
    assert_eq!(record.validation_level, ValidationLevel::Ok);

    let job = fx.repo.get_job("job-no-ranges").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(fx.repo.count_measurements("job-no-ranges").await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_dataset_marks_job_failed() {
    let fx = setup();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_field_csv(fx.dir.path(), &["JANUARI"], &[]).unwrap();

    let result = fx
        .analyzer
        .run_analysis("job-empty", &field, &reference, None)
        .await;

    assert!(matches!(
        result,
        Err(AnalysisError::InvalidFieldData(ImportError::EmptyDatasetError))
    ));
    let job = fx.repo.get_job("job-empty").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_report_failure_leaves_no_persisted_results() {
    let fx = setup();
    // 输出目录指向一个普通文件 → 建目录失败
    let blocker = NamedTempFile::new_in(fx.dir.path()).unwrap();
    insert_test_config(
        &fx.db_path,
        config_keys::OUTPUT_DIR,
        blocker.path().to_str().unwrap(),
    )
    .unwrap();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());

    let result = fx
        .analyzer
        .run_analysis("job-no-report", &field, &reference, None)
        .await;

    assert!(matches!(result, Err(AnalysisError::Report(_))));
    let job = fx.repo.get_job("job-no-report").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(fx.repo.count_children("job-no-report").await.unwrap(), 0);
    assert_eq!(fx.repo.count_measurements("job-no-report").await.unwrap(), 0);
}

/// 委托真实仓储，可按需让完成/失败写入报错
struct FlakyRepo {
    inner: Arc<AnalysisRepositoryImpl>,
    fail_complete: bool,
    fail_mark_failed: bool,
}

#[async_trait]
impl AnalysisRepository for FlakyRepo {
    async fn create_job(&self, job: &AnalysisJob) -> RepositoryResult<()> {
        self.inner.create_job(job).await
    }

    async fn complete_job(
        &self,
        job_id: &str,
        children: &[ValidatedChild],
        summary: &AnalysisSummary,
        paths: &ReportPaths,
    ) -> RepositoryResult<usize> {
        if self.fail_complete {
            return Err(RepositoryError::DatabaseTransactionError("disk I/O error".to_string()));
        }
        self.inner.complete_job(job_id, children, summary, paths).await
    }

    async fn mark_failed(&self, job_id: &str, error_message: &str) -> RepositoryResult<()> {
        if self.fail_mark_failed {
            return Err(RepositoryError::LockError("锁获取失败: poisoned".to_string()));
        }
        self.inner.mark_failed(job_id, error_message).await
    }

    async fn get_job(&self, job_id: &str) -> RepositoryResult<Option<AnalysisJob>> {
        self.inner.get_job(job_id).await
    }

    async fn list_recent_jobs(&self, limit: usize) -> RepositoryResult<Vec<AnalysisJob>> {
        self.inner.list_recent_jobs(limit).await
    }

    async fn list_preview_rows(
        &self,
        job_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ResultPreviewRow>> {
        self.inner.list_preview_rows(job_id, limit).await
    }

    async fn count_children(&self, job_id: &str) -> RepositoryResult<usize> {
        self.inner.count_children(job_id).await
    }

    async fn count_measurements(&self, job_id: &str) -> RepositoryResult<usize> {
        self.inner.count_measurements(job_id).await
    }
}

fn flaky_analyzer(
    fx: &Fixture,
    fail_complete: bool,
    fail_mark_failed: bool,
) -> GrowthAnalyzerImpl<FlakyRepo, ConfigManager> {
    let repo = Arc::new(FlakyRepo {
        inner: Arc::clone(&fx.repo),
        fail_complete,
        fail_mark_failed,
    });
    let config = Arc::new(ConfigManager::new(&fx.db_path).unwrap());
    GrowthAnalyzerImpl::new(repo, config)
}

#[tokio::test]
async fn test_report_failure_with_unwritable_status_persists_nothing() {
    let fx = setup();
    let blocker = NamedTempFile::new_in(fx.dir.path()).unwrap();
    insert_test_config(
        &fx.db_path,
        config_keys::OUTPUT_DIR,
        blocker.path().to_str().unwrap(),
    )
    .unwrap();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());
    let analyzer = flaky_analyzer(&fx, false, true);

    let result = analyzer
        .run_analysis("job-stuck", &field, &reference, None)
        .await;

    assert!(matches!(result, Err(AnalysisError::Report(_))));
    // 失败状态写不进去时，任务停在 processing，但不留任何测量
    let job = fx.repo.get_job("job-stuck").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(fx.repo.count_children("job-stuck").await.unwrap(), 0);
    assert_eq!(fx.repo.count_measurements("job-stuck").await.unwrap(), 0);
}

#[tokio::test]
async fn test_completion_failure_removes_written_reports() {
    let fx = setup();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());
    let analyzer = flaky_analyzer(&fx, true, false);

    let result = analyzer
        .run_analysis("job-no-commit", &field, &reference, None)
        .await;

    assert!(matches!(result, Err(AnalysisError::Persistence(_))));
    let job = fx.repo.get_job("job-no-commit").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.result_sheet_path.is_none());
    assert_eq!(fx.repo.count_children("job-no-commit").await.unwrap(), 0);
    assert!(!fx.dir.path().join("outputs").join("job-no-commit").exists());
}

#[tokio::test]
async fn test_upload_size_limit() {
    let fx = setup();
    insert_test_config(&fx.db_path, config_keys::MAX_UPLOAD_MB, "0").unwrap();
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());

    let result = fx
        .analyzer
        .run_analysis("job-too-large", &field, &reference, None)
        .await;

    assert!(matches!(result, Err(AnalysisError::FileTooLarge { .. })));
    let job = fx.repo.get_job("job-too-large").await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
}

// ==========================================
// API 层
// ==========================================

#[tokio::test]
async fn test_api_submit_and_status_preview() {
    let fx = setup();
    let config = Arc::new(ConfigManager::new(&fx.db_path).unwrap());
    let api = AnalysisApi::new(Arc::clone(&fx.repo), config);
    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_standard_field(fx.dir.path());

    let response = api
        .submit_analysis(field.to_str().unwrap(), reference.to_str().unwrap(), Some("L"))
        .await
        .unwrap();
    assert_eq!(response.status, JobStatus::Completed);
    assert_eq!(response.summary.total_records, 7);

    let status = api.get_job_status(&response.job_id).await.unwrap();
    assert_eq!(status.job.status, JobStatus::Completed);
    assert_eq!(status.child_count, 3);
    assert_eq!(status.preview.len(), 7);
    assert_eq!(status.preview[0].child_name, "Budi");
    assert_eq!(status.preview[4].validation_level, "ERROR");

    let json = api.get_job_status_json(&response.job_id).await.unwrap();
    assert!(json.contains("\"status\": \"completed\""));

    let recent = api.list_recent_jobs(10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn test_api_rejects_bad_input() {
    let fx = setup();
    let config = Arc::new(ConfigManager::new(&fx.db_path).unwrap());
    let api = AnalysisApi::new(Arc::clone(&fx.repo), config);

    let result = api.submit_analysis("a.csv", "b.csv", Some("X")).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = api.get_job_status("no-such-job").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let reference = write_reference_csv(fx.dir.path()).unwrap();
    let field = write_csv(
        fx.dir.path(),
        "no_name.csv",
        &["NIK", "Alamat"],
        &[vec!["3201".into(), "Jl. Mawar".into()]],
    )
    .unwrap();
    let result = api
        .submit_analysis(field.to_str().unwrap(), reference.to_str().unwrap(), None)
        .await;
    match result {
        Err(ApiError::FieldDataFormat { found_columns, .. }) => {
            assert_eq!(found_columns, vec!["NIK", "Alamat"]);
        }
        other => panic!("Expected FieldDataFormat, got {:?}", other.map(|r| r.job_id)),
    }
}
