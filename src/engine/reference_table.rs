// ==========================================
// 儿童生长数据校验系统 - 参考表构建器
// ==========================================
// 职责: 参考原始行 → ReferenceTable
// 红线: 单个字段解析失败不影响同行其他字段；格式错误不报错，仅不产生条目
// ==========================================

use crate::domain::reference::{IdealRange, ReferenceRow, ReferenceTable};
use crate::domain::types::{Gender, MeasurementType};
use tracing::{debug, instrument};

/// 解析 "min-max" 区间字符串，例如 "7.1-9.9" → (7.1, 9.9)
///
/// 必须恰好一个 '-' 分隔两个数值，其余情况返回 None。
pub fn parse_range(raw: &str) -> Option<IdealRange> {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 2 {
        return None;
    }

    let min = parts[0].trim().parse::<f64>().ok()?;
    let max = parts[1].trim().parse::<f64>().ok()?;
    Some(IdealRange::new(min, max))
}

/// 构建参考查找表
///
/// 行按文件顺序处理，同一月龄后出现的行覆盖前面的行（按字段独立覆盖）。
/// 不校验区间随月龄的单调性。
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn build_reference_table(rows: &[ReferenceRow]) -> ReferenceTable {
    let mut table = ReferenceTable::new();

    for row in rows {
        let fields = [
            (MeasurementType::Weight, Gender::Male, &row.male_weight),
            (MeasurementType::Height, Gender::Male, &row.male_height),
            (MeasurementType::Weight, Gender::Female, &row.female_weight),
            (MeasurementType::Height, Gender::Female, &row.female_height),
        ];

        for (measurement_type, gender, raw) in fields {
            match raw.as_deref().and_then(parse_range) {
                Some(range) => table.insert(measurement_type, gender, row.age_months, range),
                None => debug!(
                    age = row.age_months,
                    series = %format!("{}_{}", measurement_type, gender),
                    "区间缺失或格式错误，该月龄不设约束"
                ),
            }
        }
    }

    table
}
