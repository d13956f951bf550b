// ==========================================
// 儿童生长数据校验系统 - 单个儿童测量校验引擎
// ==========================================
// 职责: 按月龄顺序逐条校验测量记录
// 输入: 单个儿童的测量序列 + 参考表 + 有效性别
// 输出: 等长的 ValidatedMeasurement 序列
// ==========================================
// 规则顺序（等级只升不降）:
// 1. 缺失数据   2. 月龄断档   3. 身高一致性   4. 体重异常
// 5. 参考区间   6. 文本兜底校正   7. 状态默认值   8. 拼接说明
// 9. 更新历史（仅用非缺失值）
// 红线: 历史状态按值传递（fold），不在引擎上保存可变字段
// ==========================================

use crate::domain::measurement::{Measurement, ValidatedMeasurement};
use crate::domain::reference::ReferenceTable;
use crate::domain::types::{Gender, MeasurementType, ValidationLevel, WeightStatus};
use crate::engine::severity::reconcile_severity;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

/// 双值缺失时的固定说明
pub const BOTH_MISSING_REMARK: &str = "both weight and height missing";

/// 说明片段分隔符
pub const REMARK_SEPARATOR: &str = "; ";

// ==========================================
// ValidationThresholds - 规则阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    pub max_age_gap_months: u32,     // 月龄差超过此值视为断档
    pub max_height_increase_cm: f64, // 单步身高增幅上限
    pub max_weight_drop_pct: f64,    // 单步体重降幅上限（百分比）
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            max_age_gap_months: 1,
            max_height_increase_cm: 5.0,
            max_weight_drop_pct: 10.0,
        }
    }
}

// ==========================================
// GrowthHistory - 历史累积状态
// ==========================================
// 每个值都是"至今最后一个非缺失值"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthHistory {
    pub previous_height: Option<f64>,
    pub previous_weight: Option<f64>,
    pub previous_age: Option<u32>,
}

impl GrowthHistory {
    /// 用当前记录的非缺失值推进历史
    pub fn advance(self, measurement: &Measurement) -> GrowthHistory {
        GrowthHistory {
            previous_height: measurement.height_cm.or(self.previous_height),
            previous_weight: measurement.weight_kg.or(self.previous_weight),
            previous_age: measurement.age_months.or(self.previous_age),
        }
    }
}

// ==========================================
// RecordBuilder - 单条记录的规则结果收集器
// ==========================================
#[derive(Debug, Default)]
struct RecordBuilder {
    weight_status: Option<WeightStatus>,
    height_status: Option<WeightStatus>,
    level: ValidationLevel,
    remarks: Vec<String>,
}

impl RecordBuilder {
    fn raise(&mut self, level: ValidationLevel) {
        self.level = self.level.raise(level);
    }

    fn flag(&mut self, level: ValidationLevel, remark: String) {
        self.raise(level);
        self.remarks.push(remark);
    }

    /// 规则 6-8: 文本兜底校正 → 状态默认值 → 拼接说明
    fn finish(self, measurement: &Measurement) -> ValidatedMeasurement {
        let remark = self.remarks.join(REMARK_SEPARATOR);
        let validation_level = reconcile_severity(self.level, &remark);

        let weight_status = self.weight_status.unwrap_or(default_status(measurement.weight_kg));
        let height_status = self.height_status.unwrap_or(default_status(measurement.height_cm));

        ValidatedMeasurement {
            measurement: measurement.clone(),
            weight_status,
            height_status,
            validation_level,
            remark,
        }
    }
}

fn default_status(value: Option<f64>) -> WeightStatus {
    if value.is_some() {
        WeightStatus::Ideal
    } else {
        WeightStatus::Missing
    }
}

/// 稳定排序: 按月龄升序，缺失月龄视为 0
pub fn sort_by_age(measurements: &[Measurement]) -> Vec<Measurement> {
    let mut sorted = measurements.to_vec();
    sorted.sort_by_key(Measurement::sort_age);
    sorted
}

/// 便捷入口: 先排序再校验（默认阈值）
pub fn validate_child_measurements(
    measurements: &[Measurement],
    reference: &ReferenceTable,
    gender: Gender,
) -> Vec<ValidatedMeasurement> {
    ChildValidator::new().validate(measurements, reference, gender)
}

// ==========================================
// ChildValidator - 校验引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ChildValidator {
    thresholds: ValidationThresholds,
}

impl ChildValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    /// 排序后校验（推荐入口）
    #[instrument(skip_all, fields(count = measurements.len(), gender = %gender))]
    pub fn validate(
        &self,
        measurements: &[Measurement],
        reference: &ReferenceTable,
        gender: Gender,
    ) -> Vec<ValidatedMeasurement> {
        let sorted = sort_by_age(measurements);
        self.validate_sorted(&sorted, reference, gender)
    }

    /// 按输入顺序校验
    ///
    /// 前置条件: 输入已按月龄升序。未排序输入的"前值"比较没有意义。
    pub fn validate_sorted(
        &self,
        measurements: &[Measurement],
        reference: &ReferenceTable,
        gender: Gender,
    ) -> Vec<ValidatedMeasurement> {
        let (validated, _) = measurements.iter().fold(
            (Vec::with_capacity(measurements.len()), GrowthHistory::default()),
            |(mut out, history), measurement| {
                let (record, next) = self.evaluate(measurement, history, reference, gender);
                out.push(record);
                (out, next)
            },
        );
        validated
    }

    /// 校验单条记录，返回结果与推进后的历史
    pub fn evaluate(
        &self,
        measurement: &Measurement,
        history: GrowthHistory,
        reference: &ReferenceTable,
        gender: Gender,
    ) -> (ValidatedMeasurement, GrowthHistory) {
        let age = measurement.age_months;
        let weight = measurement.weight_kg;
        let height = measurement.height_cm;

        // 规则 1: 双值缺失 → 直接返回，历史不变
        if weight.is_none() && height.is_none() {
            trace!(month = %measurement.month_label, "体重身高均缺失");
            let record = ValidatedMeasurement {
                measurement: measurement.clone(),
                weight_status: WeightStatus::Missing,
                height_status: WeightStatus::Missing,
                validation_level: ValidationLevel::Warning,
                remark: BOTH_MISSING_REMARK.to_string(),
            };
            return (record, history);
        }

        let mut builder = RecordBuilder::default();

        // 规则 1: 单值缺失
        if weight.is_none() {
            builder.weight_status = Some(WeightStatus::Missing);
            builder.flag(ValidationLevel::Warning, "weight missing".to_string());
        } else if height.is_none() {
            builder.height_status = Some(WeightStatus::Missing);
            builder.flag(ValidationLevel::Warning, "height missing".to_string());
        }

        // 规则 2: 月龄断档
        if let (Some(current), Some(previous)) = (age, history.previous_age) {
            let gap = i64::from(current) - i64::from(previous);
            if gap > i64::from(self.thresholds.max_age_gap_months) {
                builder.flag(
                    ValidationLevel::Warning,
                    format!("gap: no measurement for {} months", gap - 1),
                );
            }
        }

        // 规则 3: 身高一致性
        if let (Some(current), Some(previous)) = (height, history.previous_height) {
            if current < previous {
                builder.flag(
                    ValidationLevel::Error,
                    format!("height decreased: {}→{}", previous, current),
                );
            } else if builder.level == ValidationLevel::Ok
                && current - previous > self.thresholds.max_height_increase_cm
            {
                builder.flag(
                    ValidationLevel::Warning,
                    format!("height increased sharply: +{:.1}cm", current - previous),
                );
            }
        }

        // 规则 4: 体重异常（降幅）
        if let (Some(current), Some(previous)) = (weight, history.previous_weight) {
            let change = current - previous;
            if change < 0.0 && previous > 0.0 {
                let loss_pct = change.abs() / previous * 100.0;
                if loss_pct > self.thresholds.max_weight_drop_pct {
                    builder.flag(
                        ValidationLevel::Warning,
                        format!("weight anomaly: dropped {:.1}%", loss_pct),
                    );
                }
            }
        }

        // 规则 5: 参考区间
        if let Some(age) = age {
            if let Some(value) = weight {
                let status = self.check_range(
                    &mut builder,
                    reference,
                    MeasurementType::Weight,
                    gender,
                    age,
                    value,
                );
                builder.weight_status = Some(status);
            }
            if let Some(value) = height {
                let status = self.check_range(
                    &mut builder,
                    reference,
                    MeasurementType::Height,
                    gender,
                    age,
                    value,
                );
                builder.height_status = Some(status);
            }
        }

        let record = builder.finish(measurement);
        (record, history.advance(measurement))
    }

    /// 单项参考区间判定
    ///
    /// 无参考条目 → Ideal（不设约束）。
    /// 超出区间 → Tidak Ideal；仅当当前等级仍为 Ok 时抬升为 Warning 并追加说明。
    fn check_range(
        &self,
        builder: &mut RecordBuilder,
        reference: &ReferenceTable,
        measurement_type: MeasurementType,
        gender: Gender,
        age: u32,
        value: f64,
    ) -> WeightStatus {
        let Some(range) = reference.lookup(measurement_type, gender, age) else {
            return WeightStatus::Ideal;
        };

        if range.contains(value) {
            return WeightStatus::Ideal;
        }

        if builder.level == ValidationLevel::Ok {
            let (label, unit) = match measurement_type {
                MeasurementType::Weight => ("weight", "kg"),
                MeasurementType::Height => ("height", "cm"),
            };
            builder.flag(
                ValidationLevel::Warning,
                format!(
                    "{} not ideal: {}{} (range: {}-{}{})",
                    label, value, unit, range.min, range.max, unit
                ),
            );
        }
        WeightStatus::NotIdeal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reference::IdealRange;
    use crate::domain::types::MonthLabel;

    fn m(age: Option<u32>, weight: Option<f64>, height: Option<f64>) -> Measurement {
        Measurement {
            month_label: MonthLabel::Januari,
            measured_date: None,
            age_months: age,
            weight_kg: weight,
            height_cm: height,
            measurement_method: None,
        }
    }

    #[test]
    fn test_history_keeps_last_present_value() {
        let history = GrowthHistory::default()
            .advance(&m(Some(1), Some(4.0), Some(54.0)))
            .advance(&m(Some(2), None, Some(55.0)));

        assert_eq!(history.previous_weight, Some(4.0));
        assert_eq!(history.previous_height, Some(55.0));
        assert_eq!(history.previous_age, Some(2));
    }

    #[test]
    fn test_both_missing_does_not_touch_history() {
        let validator = ChildValidator::new();
        let reference = ReferenceTable::new();
        let history = GrowthHistory {
            previous_height: Some(50.0),
            previous_weight: Some(4.0),
            previous_age: Some(1),
        };

        let (record, next) =
            validator.evaluate(&m(Some(5), None, None), history, &reference, Gender::Male);

        assert_eq!(record.validation_level, ValidationLevel::Warning);
        assert_eq!(record.remark, BOTH_MISSING_REMARK);
        assert_eq!(next, history);
    }

    #[test]
    fn test_missing_weight_does_not_reset_previous_weight() {
        let records = validate_child_measurements(
            &[
                m(Some(1), Some(10.0), Some(70.0)),
                m(Some(2), None, Some(71.0)),
                m(Some(3), Some(8.0), Some(72.0)),
            ],
            &ReferenceTable::new(),
            Gender::Male,
        );

        assert_eq!(records[1].weight_status, WeightStatus::Missing);
        assert_eq!(records[1].remark, "weight missing");
        // 8.0 与 10.0 比较: 降幅 20%
        assert!(records[2].remark.contains("weight anomaly: dropped 20.0%"));
        assert_eq!(records[2].validation_level, ValidationLevel::Warning);
    }

    #[test]
    fn test_sharp_height_increase_only_when_still_ok() {
        let validator = ChildValidator::new();
        let reference = ReferenceTable::new();

        let ok_case = validator.validate_sorted(
            &[m(Some(1), Some(4.0), Some(50.0)), m(Some(2), Some(4.5), Some(56.0))],
            &reference,
            Gender::Male,
        );
        assert_eq!(ok_case[1].remark, "height increased sharply: +6.0cm");

        // 已有断档警告时不再追加增幅说明
        let gap_case = validator.validate_sorted(
            &[m(Some(1), Some(4.0), Some(50.0)), m(Some(4), Some(4.5), Some(56.0))],
            &reference,
            Gender::Male,
        );
        assert_eq!(gap_case[1].remark, "gap: no measurement for 2 months");
    }

    #[test]
    fn test_range_remark_only_when_level_ok() {
        let mut reference = ReferenceTable::new();
        reference.insert(MeasurementType::Weight, Gender::Female, 6, IdealRange::new(6.0, 8.0));
        reference.insert(MeasurementType::Height, Gender::Female, 6, IdealRange::new(60.0, 70.0));

        let records = validate_child_measurements(
            &[m(Some(6), Some(9.0), Some(80.0))],
            &reference,
            Gender::Female,
        );

        assert_eq!(records[0].weight_status, WeightStatus::NotIdeal);
        assert_eq!(records[0].height_status, WeightStatus::NotIdeal);
        assert_eq!(records[0].remark, "weight not ideal: 9kg (range: 6-8kg)");
    }

    #[test]
    fn test_missing_age_skips_range_and_gap() {
        let mut reference = ReferenceTable::new();
        reference.insert(MeasurementType::Weight, Gender::Male, 0, IdealRange::new(2.5, 4.0));

        let records = validate_child_measurements(
            &[m(None, Some(20.0), Some(50.0))],
            &reference,
            Gender::Male,
        );

        assert_eq!(records[0].weight_status, WeightStatus::Ideal);
        assert_eq!(records[0].validation_level, ValidationLevel::Ok);
        assert_eq!(records[0].remark, "");
    }

    #[test]
    fn test_custom_thresholds() {
        let validator = ChildValidator::with_thresholds(ValidationThresholds {
            max_age_gap_months: 3,
            max_height_increase_cm: 10.0,
            max_weight_drop_pct: 50.0,
        });

        let records = validator.validate(
            &[m(Some(1), Some(10.0), Some(50.0)), m(Some(4), Some(8.0), Some(58.0))],
            &ReferenceTable::new(),
            Gender::Male,
        );

        assert_eq!(records[1].validation_level, ValidationLevel::Ok);
    }
}
