// ==========================================
// 儿童生长数据校验系统 - 现场数据映射器
// ==========================================
// 职责: 宽表（每个儿童一行，每月一组子列）→ ChildRecord
// 红线: 月份块所有子列均为空时不产生测量记录
// ==========================================

use crate::domain::measurement::{ChildRecord, Measurement};
use crate::domain::types::{Gender, MonthLabel};
use crate::importer::cell_parser::{parse_age_months, parse_date, parse_float, parse_text};
use crate::importer::column_matcher::{
    classify_identity, classify_month_column, IdentityField, MonthSubColumn,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawSheet;
use crate::importer::importer_trait::FieldDataImporter;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

// ==========================================
// FieldLayout - 列布局（表头分类结果）
// ==========================================
#[derive(Debug, Default)]
pub struct FieldLayout {
    identity: HashMap<IdentityField, String>,
    months: BTreeMap<MonthLabel, HashMap<MonthSubColumn, String>>,
}

impl FieldLayout {
    /// 对表头逐列分类；同一逻辑字段以第一次出现的列为准
    pub fn detect(headers: &[String]) -> Self {
        let mut layout = FieldLayout::default();
        for header in headers {
            if let Some(field) = classify_identity(header) {
                layout.identity.entry(field).or_insert_with(|| header.clone());
            } else if let Some((month, sub)) = classify_month_column(header) {
                layout
                    .months
                    .entry(month)
                    .or_default()
                    .entry(sub)
                    .or_insert_with(|| header.clone());
            }
        }
        layout
    }

    pub fn identity_column(&self, field: IdentityField) -> Option<&str> {
        self.identity.get(&field).map(String::as_str)
    }

    pub fn month_count(&self) -> usize {
        self.months.len()
    }
}

fn cell_text<'a>(row: &'a HashMap<String, String>, column: Option<&str>) -> &'a str {
    column
        .and_then(|c| row.get(c))
        .map(String::as_str)
        .unwrap_or("")
}

pub struct FieldDataMapper;

impl FieldDataImporter for FieldDataMapper {
    fn map_children(&self, sheet: &RawSheet) -> ImportResult<Vec<ChildRecord>> {
        let layout = FieldLayout::detect(&sheet.headers);

        let Some(name_col) = layout.identity_column(IdentityField::ChildName) else {
            return Err(ImportError::FieldDataFormatError {
                missing: vec!["Nama Anak".to_string()],
                found: sheet.headers.clone(),
            });
        };

        debug!(
            identity = ?layout.identity,
            months = layout.month_count(),
            "现场数据列布局识别完成"
        );

        let mut children = Vec::with_capacity(sheet.rows.len());
        for (idx, row) in sheet.rows.iter().enumerate() {
            // 行号含表头（1 起算）
            let row_number = idx + 2;
            let Some(name) = parse_text(cell_text(row, Some(name_col))) else {
                warn!(row = row_number, "儿童姓名为空，跳过该行");
                continue;
            };

            let child = ChildRecord {
                nik: parse_text(cell_text(row, layout.identity_column(IdentityField::Nik))),
                name,
                gender: Gender::parse(cell_text(row, layout.identity_column(IdentityField::Gender))),
                birth_date: parse_date(cell_text(row, layout.identity_column(IdentityField::BirthDate))),
                measurements: self.extract_measurements(&layout, row),
                row_number,
            };
            children.push(child);
        }

        info!(
            children = children.len(),
            measurements = children.iter().map(|c| c.measurements.len()).sum::<usize>(),
            "现场数据解析完成"
        );

        Ok(children)
    }
}

impl FieldDataMapper {
    /// 按日历月份顺序展开月份块
    fn extract_measurements(
        &self,
        layout: &FieldLayout,
        row: &HashMap<String, String>,
    ) -> Vec<Measurement> {
        layout
            .months
            .iter()
            .filter_map(|(month, columns)| {
                let cell = |sub: MonthSubColumn| {
                    columns
                        .get(&sub)
                        .and_then(|col| row.get(col))
                        .map(String::as_str)
                        .unwrap_or("")
                };

                let has_data = MonthSubColumn::ALL
                    .iter()
                    .any(|sub| parse_text(cell(*sub)).is_some());
                if !has_data {
                    return None;
                }

                Some(Measurement {
                    month_label: *month,
                    measured_date: parse_date(cell(MonthSubColumn::MeasuredDate)),
                    age_months: parse_age_months(cell(MonthSubColumn::Age)),
                    weight_kg: parse_float(cell(MonthSubColumn::Weight)),
                    height_cm: parse_float(cell(MonthSubColumn::Height)),
                    measurement_method: parse_text(cell(MonthSubColumn::Method)),
                })
            })
            .collect()
    }
}
