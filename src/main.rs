// ==========================================
// 儿童生长数据校验系统 - 命令行入口
// ==========================================
// 用法:
//   sitracking <field-data> <reference> [L|P|auto] [db_path]
//   sitracking status <job_id> [db_path]
// ==========================================

use std::process::ExitCode;

use sitracking::app::{get_default_db_path, AppState};
use sitracking::logging;

const USAGE: &str = "用法:\n  sitracking <field-data> <reference> [L|P|auto] [db_path]\n  sitracking status <job_id> [db_path]";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            ExitCode::SUCCESS
        }
        Some("status") => match args.get(1) {
            Some(job_id) => run_status(job_id, args.get(2).cloned()).await,
            None => {
                eprintln!("{}", USAGE);
                ExitCode::from(2)
            }
        },
        Some(_) if args.len() < 2 => {
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
        Some(field_path) => {
            run_analysis(
                field_path,
                &args[1],
                args.get(2).map(String::as_str),
                args.get(3).cloned(),
            )
            .await
        }
    }
}

fn open_state(db_path: Option<String>) -> Result<AppState, String> {
    let db_path = db_path.unwrap_or_else(get_default_db_path);
    tracing::info!("{} v{}", sitracking::APP_NAME, sitracking::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    AppState::new(db_path)
}

async fn run_analysis(
    field_path: &str,
    reference_path: &str,
    default_gender: Option<&str>,
    db_path: Option<String>,
) -> ExitCode {
    let state = match open_state(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match state
        .analysis_api
        .submit_analysis(field_path, reference_path, default_gender)
        .await
    {
        Ok(response) => {
            let s = &response.summary;
            println!("job_id: {}", response.job_id);
            println!(
                "children: {}  records: {}  OK: {}  WARNING: {}  ERROR: {}  missing: {}",
                s.total_children, s.total_records, s.valid, s.warning, s.error, s.missing
            );
            println!("result sheet:   {}", response.paths.result_sheet_path);
            println!("summary sheet:  {}", response.paths.summary_sheet_path);
            println!("workbook:       {}", response.paths.workbook_path);
            println!("text report:    {}", response.paths.report_path);
            println!("context report: {}", response.paths.context_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("分析失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_status(job_id: &str, db_path: Option<String>) -> ExitCode {
    let state = match open_state(db_path) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match state.analysis_api.get_job_status_json(job_id).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("查询失败: {}", e);
            ExitCode::FAILURE
        }
    }
}
