// ==========================================
// 儿童生长数据校验系统 - 报告层
// ==========================================
// 职责: 校验结果 → 结果表 / 汇总表 / 着色工作簿 / 文本报告 / 上下文报告
// 输出目录: <output_dir>/<job_id>/
// ==========================================

pub mod color_band;
pub mod error;
pub mod result_sheet;
pub mod text_report;
pub mod workbook;

pub use color_band::ColorBand;
pub use error::{ReportError, ReportResult};
pub use result_sheet::{write_result_sheet, write_summary_sheet, RESULT_HEADERS};
pub use text_report::{write_context_report, write_text_report, ChildFindings, ReportContext};
pub use workbook::{write_workbook, RESULT_SHEET_NAME, SUMMARY_SHEET_NAME};

use crate::domain::job::ReportPaths;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, instrument};

pub const RESULT_SHEET_FILE: &str = "hasil_validasi.csv";
pub const SUMMARY_SHEET_FILE: &str = "ringkasan.csv";
pub const WORKBOOK_FILE: &str = "hasil_validasi.xlsx";
pub const TEXT_REPORT_FILE: &str = "laporan_validasi.txt";
pub const CONTEXT_REPORT_FILE: &str = "konteks_lengkap.txt";

fn create(path: &Path) -> ReportResult<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// 写出全部报告文件（目录不存在时自动创建）
#[instrument(skip(ctx), fields(job_id = %ctx.job_id))]
pub fn write_all_reports(output_dir: &Path, ctx: &ReportContext<'_>) -> ReportResult<ReportPaths> {
    let job_dir = output_dir.join(ctx.job_id);
    fs::create_dir_all(&job_dir)?;

    let result_path = job_dir.join(RESULT_SHEET_FILE);
    let summary_path = job_dir.join(SUMMARY_SHEET_FILE);
    let workbook_path = job_dir.join(WORKBOOK_FILE);
    let report_path = job_dir.join(TEXT_REPORT_FILE);
    let context_path = job_dir.join(CONTEXT_REPORT_FILE);

    let rows = write_result_sheet(create(&result_path)?, ctx.children)?;
    write_summary_sheet(
        create(&summary_path)?,
        ctx.children,
        ctx.summary,
        ctx.default_gender,
        ctx.generated_at,
    )?;
    write_workbook(
        &workbook_path,
        ctx.children,
        ctx.summary,
        ctx.default_gender,
        ctx.generated_at,
    )?;
    write_text_report(create(&report_path)?, ctx)?;
    write_context_report(create(&context_path)?, ctx)?;

    info!(rows, dir = %job_dir.display(), "报告已生成");

    Ok(ReportPaths {
        result_sheet_path: result_path.display().to_string(),
        summary_sheet_path: summary_path.display().to_string(),
        workbook_path: workbook_path.display().to_string(),
        report_path: report_path.display().to_string(),
        context_path: context_path.display().to_string(),
    })
}
