// ==========================================
// 儿童生长数据校验系统 - 领域类型定义
// ==========================================
// 职责: 性别 / 测量类型 / 状态 / 校验等级 / 月份 / 任务状态
// 红线: 校验等级是"等级制",最终等级取各规则结果的最大值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 性别 (Gender)
// ==========================================
// 编码: L = 男 (Laki-laki), P = 女 (Perempuan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// 解析性别字段（宽松匹配，无法识别返回 None）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "L" | "LAKI-LAKI" | "LAKI LAKI" | "LAKI" | "M" | "MALE" => Some(Gender::Male),
            "P" | "PEREMPUAN" | "F" | "FEMALE" | "W" => Some(Gender::Female),
            _ => None,
        }
    }

    /// 数据库 / 参考表键使用的单字母编码
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "L",
            Gender::Female => "P",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 默认性别设置 (Gender Setting)
// ==========================================
// 用途: 任务级默认值；AUTO 表示不指定，由调用方兜底
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderSetting {
    Fixed(Gender),
    Auto,
}

impl GenderSetting {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Some(GenderSetting::Auto);
        }
        Gender::parse(trimmed).map(GenderSetting::Fixed)
    }

    /// 解析单个儿童的有效性别
    ///
    /// 优先级: 儿童自身性别 > 任务默认性别 > None (AUTO)
    pub fn resolve(&self, child_gender: Option<Gender>) -> Option<Gender> {
        match (child_gender, self) {
            (Some(g), _) => Some(g),
            (None, GenderSetting::Fixed(g)) => Some(*g),
            (None, GenderSetting::Auto) => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            GenderSetting::Fixed(g) => g.code(),
            GenderSetting::Auto => "AUTO",
        }
    }
}

impl fmt::Display for GenderSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 测量类型 (Measurement Type)
// ==========================================
// BB = 体重 (berat badan), PB = 身长/身高 (panjang badan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    Weight,
    Height,
}

impl MeasurementType {
    pub fn series_key(&self) -> &'static str {
        match self {
            MeasurementType::Weight => "BB",
            MeasurementType::Height => "PB",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.series_key())
    }
}

// ==========================================
// 体重 / 身高状态 (Weight Status)
// ==========================================
// 身高状态复用同一枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightStatus {
    #[serde(rename = "Ideal")]
    Ideal,
    #[serde(rename = "Tidak Ideal")]
    NotIdeal,
    #[serde(rename = "Missing")]
    Missing,
}

impl WeightStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "Ideal" => Some(WeightStatus::Ideal),
            "Tidak Ideal" => Some(WeightStatus::NotIdeal),
            "Missing" => Some(WeightStatus::Missing),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeightStatus::Ideal => "Ideal",
            WeightStatus::NotIdeal => "Tidak Ideal",
            WeightStatus::Missing => "Missing",
        }
    }
}

impl fmt::Display for WeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 校验等级 (Validation Level)
// ==========================================
// 顺序: Ok < Warning < Error
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationLevel {
    #[default]
    Ok,
    Warning,
    Error,
}

impl ValidationLevel {
    /// 抬升等级（永不降级）
    pub fn raise(self, other: ValidationLevel) -> ValidationLevel {
        self.max(other)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OK" => Some(ValidationLevel::Ok),
            "WARNING" => Some(ValidationLevel::Warning),
            "ERROR" => Some(ValidationLevel::Error),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ValidationLevel::Ok => "OK",
            ValidationLevel::Warning => "WARNING",
            ValidationLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 月份标签 (Month Label)
// ==========================================
// 印尼语月份名，解析不区分大小写
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonthLabel {
    Januari,
    Februari,
    Maret,
    April,
    Mei,
    Juni,
    Juli,
    Agustus,
    September,
    Oktober,
    November,
    Desember,
}

impl MonthLabel {
    pub const ALL: [MonthLabel; 12] = [
        MonthLabel::Januari,
        MonthLabel::Februari,
        MonthLabel::Maret,
        MonthLabel::April,
        MonthLabel::Mei,
        MonthLabel::Juni,
        MonthLabel::Juli,
        MonthLabel::Agustus,
        MonthLabel::September,
        MonthLabel::Oktober,
        MonthLabel::November,
        MonthLabel::Desember,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MonthLabel::Januari => "JANUARI",
            MonthLabel::Februari => "FEBRUARI",
            MonthLabel::Maret => "MARET",
            MonthLabel::April => "APRIL",
            MonthLabel::Mei => "MEI",
            MonthLabel::Juni => "JUNI",
            MonthLabel::Juli => "JULI",
            MonthLabel::Agustus => "AGUSTUS",
            MonthLabel::September => "SEPTEMBER",
            MonthLabel::Oktober => "OKTOBER",
            MonthLabel::November => "NOVEMBER",
            MonthLabel::Desember => "DESEMBER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        Self::ALL.iter().copied().find(|m| m.name() == upper)
    }

    /// 1..=12
    pub fn ordinal(&self) -> u32 {
        *self as u32 + 1
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ==========================================
// 分析任务状态 (Job Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Processing, // 默认值
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_level_ordering() {
        assert!(ValidationLevel::Ok < ValidationLevel::Warning);
        assert!(ValidationLevel::Warning < ValidationLevel::Error);
        assert_eq!(
            ValidationLevel::Error.raise(ValidationLevel::Warning),
            ValidationLevel::Error
        );
        assert_eq!(
            ValidationLevel::Ok.raise(ValidationLevel::Warning),
            ValidationLevel::Warning
        );
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse(" l "), Some(Gender::Male));
        assert_eq!(Gender::parse("Perempuan"), Some(Gender::Female));
        assert_eq!(Gender::parse("x"), None);
    }

    #[test]
    fn test_gender_setting_resolve() {
        let fixed = GenderSetting::Fixed(Gender::Male);
        assert_eq!(fixed.resolve(Some(Gender::Female)), Some(Gender::Female));
        assert_eq!(fixed.resolve(None), Some(Gender::Male));
        assert_eq!(GenderSetting::Auto.resolve(None), None);
        assert_eq!(GenderSetting::parse("auto"), Some(GenderSetting::Auto));
    }

    #[test]
    fn test_month_label_parse() {
        assert_eq!(MonthLabel::parse("januari"), Some(MonthLabel::Januari));
        assert_eq!(MonthLabel::parse("DESEMBER").map(|m| m.ordinal()), Some(12));
        assert_eq!(MonthLabel::parse("january"), None);
    }

    #[test]
    fn test_status_db_round_trip() {
        for status in [WeightStatus::Ideal, WeightStatus::NotIdeal, WeightStatus::Missing] {
            assert_eq!(WeightStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(JobStatus::from_str("failed"), JobStatus::Failed);
    }
}
