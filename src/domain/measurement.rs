// ==========================================
// 儿童生长数据校验系统 - 测量领域模型
// ==========================================
// 职责: 测量记录 / 校验结果 / 儿童记录
// 用途: 导入层写入,引擎层只读
// ==========================================

use crate::domain::types::{Gender, MonthLabel, ValidationLevel, WeightStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Measurement - 单次测量（解析后不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub month_label: MonthLabel,              // 月份块标签
    pub measured_date: Option<NaiveDate>,     // 测量日期
    pub age_months: Option<u32>,              // 月龄
    pub weight_kg: Option<f64>,               // 体重（kg）
    pub height_cm: Option<f64>,               // 身高（cm）
    pub measurement_method: Option<String>,   // 测量方式（卧位/立位等原文）
}

impl Measurement {
    /// 排序键: 缺失月龄按 0 处理
    pub fn sort_age(&self) -> u32 {
        self.age_months.unwrap_or(0)
    }
}

// ==========================================
// ValidatedMeasurement - 校验结果
// ==========================================
// 红线: weight_status = Missing 当且仅当 weight_kg 缺失（身高同理）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedMeasurement {
    pub measurement: Measurement,
    pub weight_status: WeightStatus,
    pub height_status: WeightStatus,
    pub validation_level: ValidationLevel,
    pub remark: String,
}

impl ValidatedMeasurement {
    /// 任一状态缺失
    pub fn has_missing(&self) -> bool {
        self.weight_status == WeightStatus::Missing || self.height_status == WeightStatus::Missing
    }
}

// ==========================================
// ChildRecord - 儿童记录（宽表一行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub nik: Option<String>,            // 身份证号
    pub name: String,                   // 儿童姓名
    pub gender: Option<Gender>,         // 儿童自身性别（可缺失）
    pub birth_date: Option<NaiveDate>,  // 出生日期
    pub measurements: Vec<Measurement>, // 月份块展开后的测量列表
    pub row_number: usize,              // 原始文件行号
}

// ==========================================
// ValidatedChild - 单个儿童的校验输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedChild {
    pub nik: Option<String>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,                         // 实际使用的性别
    pub measurements: Vec<ValidatedMeasurement>, // 按月龄升序
}
