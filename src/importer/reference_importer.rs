// ==========================================
// 儿童生长数据校验系统 - 参考表映射器
// ==========================================
// 职责: 原始表 → ReferenceRow（区间文本保留原文）
// 红线: 任一必需列缺失即为格式错误；单行月龄无效只跳过该行
// ==========================================

use crate::domain::reference::ReferenceRow;
use crate::importer::cell_parser::{parse_age_months, parse_text};
use crate::importer::column_matcher::{
    find_column, AGE_ALIASES, FEMALE_HEIGHT_ALIASES, FEMALE_WEIGHT_ALIASES, MALE_HEIGHT_ALIASES,
    MALE_WEIGHT_ALIASES,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawSheet;
use crate::importer::importer_trait::ReferenceImporter;
use tracing::{debug, warn};

pub struct ReferenceMapper;

impl ReferenceImporter for ReferenceMapper {
    fn map_reference_rows(&self, sheet: &RawSheet) -> ImportResult<Vec<ReferenceRow>> {
        let locate = |label: &str, aliases: &[&str]| {
            find_column(&sheet.headers, aliases).cloned().ok_or_else(|| {
                ImportError::ReferenceFormatError(format!(
                    "未找到{}列（候选: {:?}；已发现: {:?}）",
                    label, aliases, sheet.headers
                ))
            })
        };

        let age_col = locate("月龄", AGE_ALIASES)?;
        let male_weight_col = locate("男童体重", MALE_WEIGHT_ALIASES)?;
        let male_height_col = locate("男童身高", MALE_HEIGHT_ALIASES)?;
        let female_weight_col = locate("女童体重", FEMALE_WEIGHT_ALIASES)?;
        let female_height_col = locate("女童身高", FEMALE_HEIGHT_ALIASES)?;

        debug!(
            age = %age_col,
            male_weight = %male_weight_col,
            male_height = %male_height_col,
            female_weight = %female_weight_col,
            female_height = %female_height_col,
            "参考表列定位完成"
        );

        let cell = |row: &std::collections::HashMap<String, String>, col: &str| {
            row.get(col).and_then(|v| parse_text(v))
        };

        let mut rows = Vec::with_capacity(sheet.rows.len());
        for (idx, row) in sheet.rows.iter().enumerate() {
            let raw_age = row.get(&age_col).map(String::as_str).unwrap_or("");
            let Some(age_months) = parse_age_months(raw_age) else {
                // 表头下方第 idx+2 行（1 起算，含表头）
                warn!(row = idx + 2, value = %raw_age, "参考表月龄无效，跳过该行");
                continue;
            };

            rows.push(ReferenceRow {
                age_months,
                male_weight: cell(row, &male_weight_col),
                male_height: cell(row, &male_height_col),
                female_weight: cell(row, &female_weight_col),
                female_height: cell(row, &female_height_col),
            });
        }

        Ok(rows)
    }
}
