// ==========================================
// 儿童生长数据校验系统 - 参考表领域模型
// ==========================================
// 职责: (测量类型, 性别) → 月龄 → [min, max] 理想区间
// 红线: 区间两端均为闭区间
// ==========================================

use crate::domain::types::{Gender, MeasurementType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// IdealRange - 理想区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 闭区间判定
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for IdealRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

// ==========================================
// ReferenceRow - 参考表原始行
// ==========================================
// 四个区间字段保留原文，由构建器逐个解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub age_months: u32,
    pub male_weight: Option<String>,
    pub male_height: Option<String>,
    pub female_weight: Option<String>,
    pub female_height: Option<String>,
}

// ==========================================
// ReferenceTable - 参考查找表
// ==========================================
// 元组键不能映射为 JSON 对象键，因此不实现 serde
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    series: HashMap<(MeasurementType, Gender), HashMap<u32, IdealRange>>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入区间（同一月龄后写覆盖前写）
    pub fn insert(
        &mut self,
        measurement_type: MeasurementType,
        gender: Gender,
        age_months: u32,
        range: IdealRange,
    ) {
        self.series
            .entry((measurement_type, gender))
            .or_default()
            .insert(age_months, range);
    }

    /// 查询区间；无记录表示该月龄不设约束
    pub fn lookup(
        &self,
        measurement_type: MeasurementType,
        gender: Gender,
        age_months: u32,
    ) -> Option<IdealRange> {
        self.series
            .get(&(measurement_type, gender))
            .and_then(|by_age| by_age.get(&age_months))
            .copied()
    }

    /// 某条序列的条目数
    pub fn series_len(&self, measurement_type: MeasurementType, gender: Gender) -> usize {
        self.series
            .get(&(measurement_type, gender))
            .map_or(0, HashMap::len)
    }

    /// 某条序列覆盖的最大月龄
    pub fn max_age(&self, measurement_type: MeasurementType, gender: Gender) -> Option<u32> {
        self.series
            .get(&(measurement_type, gender))
            .and_then(|by_age| by_age.keys().max().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(HashMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ideal_range_inclusive() {
        let range = IdealRange::new(9.0, 11.0);
        assert!(range.contains(9.0));
        assert!(range.contains(11.0));
        assert!(!range.contains(11.01));
        assert!(!range.contains(8.99));
    }

    #[test]
    fn test_lookup_is_keyed_by_type_and_gender() {
        let mut table = ReferenceTable::new();
        table.insert(MeasurementType::Weight, Gender::Male, 2, IdealRange::new(9.0, 11.0));

        assert!(table.lookup(MeasurementType::Weight, Gender::Male, 2).is_some());
        assert!(table.lookup(MeasurementType::Weight, Gender::Female, 2).is_none());
        assert!(table.lookup(MeasurementType::Height, Gender::Male, 2).is_none());
        assert_eq!(table.max_age(MeasurementType::Weight, Gender::Male), Some(2));
    }
}
