// ==========================================
// 儿童生长数据校验系统 - 着色工作簿（xlsx）
// ==========================================
// Sheet "Hasil Validasi": 结果表，整行按 ColorBand 填充
// Sheet "Ringkasan": 汇总表，首列加粗
// 列宽: 最长内容 + 2，上限 50
// ==========================================

use crate::domain::job::AnalysisSummary;
use crate::domain::measurement::ValidatedChild;
use crate::domain::types::GenderSetting;
use crate::report::color_band::ColorBand;
use crate::report::error::ReportResult;
use crate::report::result_sheet::{result_rows, summary_rows, RESULT_HEADERS};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::Path;

pub const RESULT_SHEET_NAME: &str = "Hasil Validasi";
pub const SUMMARY_SHEET_NAME: &str = "Ringkasan";

const HEADER_FILL: u32 = 0x2196F3;
const MAX_COLUMN_WIDTH: usize = 50;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
}

fn band_format(band: ColorBand) -> Format {
    Format::new()
        .set_background_color(Color::RGB(band.rgb()))
        .set_border(FormatBorder::Thin)
}

/// 按列最长内容设置列宽
fn fit_columns(sheet: &mut Worksheet, widths: &[usize]) -> ReportResult<()> {
    for (col, width) in widths.iter().enumerate() {
        let width = (*width + 2).min(MAX_COLUMN_WIDTH);
        sheet.set_column_width(col as u16, width as f64)?;
    }
    Ok(())
}

fn track_width(widths: &mut [usize], col: usize, value: &str) {
    if let Some(w) = widths.get_mut(col) {
        *w = (*w).max(value.chars().count());
    }
}

/// 写出工作簿（结果表 + 汇总表）
///
/// # 返回
/// - Ok(usize): 结果表数据行数
pub fn write_workbook(
    path: &Path,
    children: &[ValidatedChild],
    summary: &AnalysisSummary,
    default_gender: GenderSetting,
    generated_at: NaiveDateTime,
) -> ReportResult<usize> {
    let mut workbook = Workbook::new();
    let header = header_format();

    // 结果表不含 Color 列，颜色体现在填充上
    let headers = &RESULT_HEADERS[..RESULT_HEADERS.len() - 1];
    let rows = result_rows(children);

    let result_sheet = workbook.add_worksheet();
    result_sheet.set_name(RESULT_SHEET_NAME)?;
    let mut widths = vec![0usize; headers.len()];
    for (col, title) in headers.iter().enumerate() {
        result_sheet.write_string_with_format(0, col as u16, *title, &header)?;
        track_width(&mut widths, col, title);
    }
    for (idx, row) in rows.iter().enumerate() {
        let format = band_format(row.band);
        let row_no = idx as u32 + 1;
        for (col, value) in row.cells.iter().enumerate() {
            result_sheet.write_string_with_format(row_no, col as u16, value, &format)?;
            track_width(&mut widths, col, value);
        }
    }
    fit_columns(result_sheet, &widths)?;

    let summary_sheet = workbook.add_worksheet();
    summary_sheet.set_name(SUMMARY_SHEET_NAME)?;
    let label = Format::new().set_bold();
    let plain = Format::new();
    let mut widths = vec![0usize; 3];
    for (idx, row) in summary_rows(children, summary, default_gender, generated_at)
        .iter()
        .enumerate()
    {
        for (col, value) in row.iter().enumerate() {
            let format = match (idx, col) {
                (0, _) => &header,
                (_, 0) => &label,
                _ => &plain,
            };
            summary_sheet.write_string_with_format(idx as u32, col as u16, value, format)?;
            track_width(&mut widths, col, value);
        }
    }
    fit_columns(summary_sheet, &widths)?;

    workbook.save(path)?;
    Ok(rows.len())
}
