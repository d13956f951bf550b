// ==========================================
// 儿童生长数据校验系统 - 文本报告 / 完整上下文报告
// ==========================================
// 文本报告: 汇总 + 每个儿童的问题清单（无问题时输出 ALL DATA VALID）
// 上下文报告: 文本报告内容 + 每条测量明细
// ==========================================

use crate::domain::job::AnalysisSummary;
use crate::domain::measurement::{ValidatedChild, ValidatedMeasurement};
use crate::domain::types::{GenderSetting, WeightStatus};
use crate::engine::child_validator::REMARK_SEPARATOR;
use crate::report::error::ReportResult;
use crate::report::result_sheet::{fmt_decimal, DATETIME_FMT, DATE_FMT};
use chrono::NaiveDateTime;
use std::io::Write;

pub const ALL_VALID_LINE: &str = "ALL DATA VALID";

const HEIGHT_DECREASE_PREFIX: &str = "height decreased";
const WEIGHT_ANOMALY_PREFIX: &str = "weight anomaly";
const GAP_PREFIX: &str = "gap:";

const RULE_WIDE: usize = 50;
const RULE_NARROW: usize = 20;

// ==========================================
// ChildFindings - 单个儿童的问题归类
// ==========================================
#[derive(Debug, Default, PartialEq)]
pub struct ChildFindings {
    pub missing_months: Vec<String>,
    pub height_issues: Vec<String>,
    pub weight_issues: Vec<String>,
    pub out_of_range: Vec<String>,
    pub gap_warnings: Vec<String>,
}

impl ChildFindings {
    /// 从校验说明片段中归类问题
    pub fn collect(child: &ValidatedChild) -> Self {
        let mut findings = ChildFindings::default();

        for record in &child.measurements {
            let m = &record.measurement;
            let month = m.month_label.name();

            if record.has_missing() {
                findings.missing_months.push(month.to_string());
            }

            for fragment in record.remark.split(REMARK_SEPARATOR) {
                let fragment = fragment.trim();
                if fragment.starts_with(HEIGHT_DECREASE_PREFIX) {
                    findings.height_issues.push(format!("{} (month: {})", fragment, month));
                } else if fragment.starts_with(WEIGHT_ANOMALY_PREFIX) {
                    findings.weight_issues.push(format!("{} (month: {})", fragment, month));
                } else if fragment.starts_with(GAP_PREFIX) {
                    findings.gap_warnings.push(format!("{} before {}", fragment, month));
                }
            }

            if record.weight_status == WeightStatus::NotIdeal {
                findings.out_of_range.push(format!(
                    "weight not ideal: {}kg (month: {})",
                    fmt_decimal(m.weight_kg),
                    month
                ));
            }
            if record.height_status == WeightStatus::NotIdeal {
                findings.out_of_range.push(format!(
                    "height not ideal: {}cm (month: {})",
                    fmt_decimal(m.height_cm),
                    month
                ));
            }
        }

        findings
    }

    pub fn is_clean(&self) -> bool {
        self.missing_months.is_empty()
            && self.height_issues.is_empty()
            && self.weight_issues.is_empty()
            && self.out_of_range.is_empty()
            && self.gap_warnings.is_empty()
    }
}

// ==========================================
// ReportContext - 报告输入
// ==========================================
pub struct ReportContext<'a> {
    pub job_id: &'a str,
    pub children: &'a [ValidatedChild],
    pub summary: &'a AnalysisSummary,
    pub default_gender: GenderSetting,
    pub generated_at: NaiveDateTime,
}

fn write_header<W: Write>(out: &mut W, title: &str, ctx: &ReportContext<'_>) -> ReportResult<()> {
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDE))?;
    writeln!(out)?;
    writeln!(out, "Job ID: {}", ctx.job_id)?;
    writeln!(out, "Generated At: {}", ctx.generated_at.format(DATETIME_FMT))?;
    writeln!(out, "Default Gender: {}", ctx.default_gender)?;
    writeln!(out)?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: &AnalysisSummary) -> ReportResult<()> {
    writeln!(out, "ANALYSIS SUMMARY")?;
    writeln!(out, "{}", "-".repeat(RULE_NARROW))?;
    writeln!(out, "Total Children: {}", summary.total_children)?;
    writeln!(out, "Total Records: {}", summary.total_records)?;
    writeln!(
        out,
        "Valid (OK): {} ({:.1}%)",
        summary.valid,
        summary.percentage(summary.valid)
    )?;
    writeln!(
        out,
        "Warning: {} ({:.1}%)",
        summary.warning,
        summary.percentage(summary.warning)
    )?;
    writeln!(
        out,
        "Error: {} ({:.1}%)",
        summary.error,
        summary.percentage(summary.error)
    )?;
    writeln!(out, "Missing Data: {}", summary.missing)?;
    writeln!(out)?;
    Ok(())
}

fn write_child_identity<W: Write>(out: &mut W, child: &ValidatedChild) -> ReportResult<()> {
    writeln!(out, "NAME: {}", child.name)?;
    if let Some(nik) = &child.nik {
        writeln!(out, "NIK: {}", nik)?;
    }
    if let Some(birth_date) = child.birth_date {
        writeln!(out, "BIRTH DATE: {}", birth_date.format(DATE_FMT))?;
    }
    writeln!(out, "GENDER: {}", child.gender)?;
    writeln!(out, "{}", "-".repeat(RULE_NARROW))?;
    Ok(())
}

fn write_section<W: Write>(out: &mut W, title: &str, items: &[String]) -> ReportResult<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{}:", title)?;
    for item in items {
        writeln!(out, "- {}", item)?;
    }
    Ok(())
}

fn write_findings<W: Write>(out: &mut W, findings: &ChildFindings) -> ReportResult<()> {
    if findings.is_clean() {
        writeln!(out, "{}", ALL_VALID_LINE)?;
        return Ok(());
    }
    if !findings.missing_months.is_empty() {
        writeln!(out, "Not measured in: {}", findings.missing_months.join(", "))?;
    }
    write_section(out, "HEIGHT ISSUES", &findings.height_issues)?;
    write_section(out, "WEIGHT ANOMALIES", &findings.weight_issues)?;
    write_section(out, "OUT OF IDEAL RANGE", &findings.out_of_range)?;
    write_section(out, "WARNINGS", &findings.gap_warnings)?;
    Ok(())
}

fn measurement_line(index: usize, record: &ValidatedMeasurement) -> String {
    let m = &record.measurement;
    format!(
        "{:>3}. {:<9} date={} age={} weight={} height={} method={} | weight={} height={} | {} | {}",
        index + 1,
        m.month_label.name(),
        m.measured_date
            .map(|d| d.format(DATE_FMT).to_string())
            .unwrap_or_else(|| "-".to_string()),
        m.age_months
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string()),
        fmt_decimal(m.weight_kg),
        fmt_decimal(m.height_cm),
        m.measurement_method.as_deref().unwrap_or("-"),
        record.weight_status,
        record.height_status,
        record.validation_level,
        if record.remark.is_empty() { "-" } else { record.remark.as_str() },
    )
}

/// 写入文本报告
pub fn write_text_report<W: Write>(mut out: W, ctx: &ReportContext<'_>) -> ReportResult<()> {
    write_header(&mut out, "CHILD GROWTH DATA VALIDATION REPORT", ctx)?;
    write_summary(&mut out, ctx.summary)?;

    writeln!(out, "DETAILED ANALYSIS PER CHILD")?;
    writeln!(out, "{}", "=".repeat(30))?;
    writeln!(out)?;

    for child in ctx.children {
        write_child_identity(&mut out, child)?;
        write_findings(&mut out, &ChildFindings::collect(child))?;
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(RULE_WIDE))?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// 写入完整上下文报告（含每条测量明细）
pub fn write_context_report<W: Write>(mut out: W, ctx: &ReportContext<'_>) -> ReportResult<()> {
    write_header(&mut out, "CHILD GROWTH DATA VALIDATION - FULL CONTEXT", ctx)?;
    write_summary(&mut out, ctx.summary)?;

    for (child_idx, child) in ctx.children.iter().enumerate() {
        writeln!(out, "[CHILD {}]", child_idx + 1)?;
        write_child_identity(&mut out, child)?;

        writeln!(out, "MEASUREMENTS ({}):", child.measurements.len())?;
        for (idx, record) in child.measurements.iter().enumerate() {
            writeln!(out, "{}", measurement_line(idx, record))?;
        }
        writeln!(out)?;

        write_findings(&mut out, &ChildFindings::collect(child))?;
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(RULE_WIDE))?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}
