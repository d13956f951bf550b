// ==========================================
// 儿童生长数据校验系统 - 结果表 / 汇总表
// ==========================================
// 结果表: 每条测量一行，儿童身份信息只出现在该儿童第一行
// 汇总表: 总数 / 各等级占比 / 缺失统计 / 任务信息
// ==========================================

use crate::domain::job::AnalysisSummary;
use crate::domain::measurement::ValidatedChild;
use crate::domain::types::{GenderSetting, WeightStatus};
use crate::report::color_band::ColorBand;
use crate::report::error::ReportResult;
use chrono::NaiveDateTime;
use std::io::Write;

pub const RESULT_HEADERS: [&str; 15] = [
    "No",
    "NIK",
    "Child Name",
    "Birth Date",
    "Month",
    "Measured Date",
    "Age (months)",
    "Weight (kg)",
    "Height (cm)",
    "Method",
    "Weight Status",
    "Height Status",
    "Validation",
    "Remark",
    "Color",
];

pub(crate) const DATE_FMT: &str = "%d/%m/%Y";
pub(crate) const DATETIME_FMT: &str = "%d/%m/%Y %H:%M:%S";

pub(crate) fn fmt_decimal(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

fn fmt_percent(summary: &AnalysisSummary, count: usize) -> String {
    format!("{:.1}%", summary.percentage(count))
}

/// 结果表单行: 前 14 列单元格 + 着色
pub(crate) struct ResultRow {
    pub cells: Vec<String>,
    pub band: ColorBand,
}

/// 展开结果表数据行（不含表头与 Color 列）
pub(crate) fn result_rows(children: &[ValidatedChild]) -> Vec<ResultRow> {
    let mut rows = Vec::new();
    for child in children {
        for (idx, record) in child.measurements.iter().enumerate() {
            let first = idx == 0;
            let m = &record.measurement;

            let identity = |value: String| if first { value } else { String::new() };

            let cells = vec![
                (rows.len() + 1).to_string(),
                identity(child.nik.clone().unwrap_or_default()),
                identity(child.name.clone()),
                identity(
                    child
                        .birth_date
                        .map(|d| d.format(DATE_FMT).to_string())
                        .unwrap_or_default(),
                ),
                m.month_label.to_string(),
                m.measured_date
                    .map(|d| d.format(DATE_FMT).to_string())
                    .unwrap_or_default(),
                m.age_months.map(|a| a.to_string()).unwrap_or_default(),
                fmt_decimal(m.weight_kg),
                fmt_decimal(m.height_cm),
                m.measurement_method.clone().unwrap_or_default(),
                record.weight_status.to_string(),
                record.height_status.to_string(),
                record.validation_level.to_string(),
                record.remark.clone(),
            ];
            rows.push(ResultRow {
                cells,
                band: ColorBand::for_record(record),
            });
        }
    }
    rows
}

/// 汇总表行（首行为表头）
pub(crate) fn summary_rows(
    children: &[ValidatedChild],
    summary: &AnalysisSummary,
    default_gender: GenderSetting,
    generated_at: NaiveDateTime,
) -> Vec<[String; 3]> {
    let records = children.iter().flat_map(|c| c.measurements.iter());
    let (missing_weight, missing_height) = records.fold((0usize, 0usize), |(w, h), r| {
        (
            w + usize::from(r.weight_status == WeightStatus::Missing),
            h + usize::from(r.height_status == WeightStatus::Missing),
        )
    });
    let missing_total = missing_weight + missing_height;

    vec![
        ["Parameter".into(), "Count".into(), "Percentage".into()],
        ["Total Children".into(), summary.total_children.to_string(), "100%".into()],
        ["Total Records".into(), summary.total_records.to_string(), "100%".into()],
        ["Valid (OK)".into(), summary.valid.to_string(), fmt_percent(summary, summary.valid)],
        ["Warning".into(), summary.warning.to_string(), fmt_percent(summary, summary.warning)],
        ["Error".into(), summary.error.to_string(), fmt_percent(summary, summary.error)],
        ["Missing Weight".into(), missing_weight.to_string(), fmt_percent(summary, missing_weight)],
        ["Missing Height".into(), missing_height.to_string(), fmt_percent(summary, missing_height)],
        ["Total Missing".into(), missing_total.to_string(), fmt_percent(summary, missing_total)],
        ["Default Gender".into(), default_gender.to_string(), "-".into()],
        ["Generated At".into(), generated_at.format(DATETIME_FMT).to_string(), "-".into()],
    ]
}

/// 写入结果表
pub fn write_result_sheet<W: Write>(writer: W, children: &[ValidatedChild]) -> ReportResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(RESULT_HEADERS)?;

    let rows = result_rows(children);
    for row in &rows {
        csv_writer.write_record(row.cells.iter().map(String::as_str).chain([row.band.hex()]))?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

/// 写入汇总表
pub fn write_summary_sheet<W: Write>(
    writer: W,
    children: &[ValidatedChild],
    summary: &AnalysisSummary,
    default_gender: GenderSetting,
    generated_at: NaiveDateTime,
) -> ReportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in summary_rows(children, summary, default_gender, generated_at) {
        csv_writer.write_record(row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::measurement::{Measurement, ValidatedMeasurement};
    use crate::domain::types::{Gender, MonthLabel, ValidationLevel};
    use chrono::NaiveDate;

    fn record(age: u32, weight: Option<f64>, level: ValidationLevel) -> ValidatedMeasurement {
        ValidatedMeasurement {
            measurement: Measurement {
                month_label: MonthLabel::ALL[age as usize % 12],
                measured_date: None,
                age_months: Some(age),
                weight_kg: weight,
                height_cm: Some(60.0),
                measurement_method: Some("Berdiri".to_string()),
            },
            weight_status: if weight.is_some() {
                WeightStatus::Ideal
            } else {
                WeightStatus::Missing
            },
            height_status: WeightStatus::Ideal,
            validation_level: level,
            remark: String::new(),
        }
    }

    fn child() -> ValidatedChild {
        ValidatedChild {
            nik: Some("3201".to_string()),
            name: "Budi".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2023, 1, 15),
            gender: Gender::Male,
            measurements: vec![
                record(1, Some(4.3), ValidationLevel::Ok),
                record(2, None, ValidationLevel::Warning),
            ],
        }
    }

    #[test]
    fn test_result_sheet_identity_on_first_row_only() {
        let mut buf = Vec::new();
        let rows = write_result_sheet(&mut buf, &[child()]).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,3201,Budi,15/01/2023,FEBRUARI,,1,4.3,60.0,Berdiri,Ideal,Ideal,OK,,4CAF50"));
        assert!(lines[2].starts_with("2,,,,MARET,,2,,60.0"));
        assert!(lines[2].ends_with("FFEB3B"));
    }

    #[test]
    fn test_summary_sheet_zero_records() {
        let mut buf = Vec::new();
        let summary = AnalysisSummary {
            total_children: 1,
            ..AnalysisSummary::default()
        };
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        write_summary_sheet(&mut buf, &[], &summary, GenderSetting::Auto, at).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Valid (OK),0,0.0%"));
        assert!(text.contains("Default Gender,AUTO,-"));
        assert!(text.contains("Generated At,01/05/2024 08:30:00,-"));
    }
}
