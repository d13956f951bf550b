// ==========================================
// 儿童生长数据校验系统 - 结果着色
// ==========================================
// ERROR → 红；含体重异常的 WARNING → 橙；其他 WARNING → 黄；OK → 绿
// ==========================================

use crate::domain::measurement::ValidatedMeasurement;
use crate::domain::types::ValidationLevel;
use crate::engine::severity::WEIGHT_ANOMALY_MARKER;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBand {
    Red,
    Orange,
    Yellow,
    Green,
}

impl ColorBand {
    pub fn for_record(record: &ValidatedMeasurement) -> Self {
        match record.validation_level {
            ValidationLevel::Error => ColorBand::Red,
            ValidationLevel::Warning
                if record.remark.to_lowercase().contains(WEIGHT_ANOMALY_MARKER) =>
            {
                ColorBand::Orange
            }
            ValidationLevel::Warning => ColorBand::Yellow,
            ValidationLevel::Ok => ColorBand::Green,
        }
    }

    pub fn rgb(&self) -> u32 {
        match self {
            ColorBand::Red => 0xFF0000,
            ColorBand::Orange => 0xFF9800,
            ColorBand::Yellow => 0xFFEB3B,
            ColorBand::Green => 0x4CAF50,
        }
    }

    /// RGB 十六进制
    pub fn hex(&self) -> &'static str {
        match self {
            ColorBand::Red => "FF0000",
            ColorBand::Orange => "FF9800",
            ColorBand::Yellow => "FFEB3B",
            ColorBand::Green => "4CAF50",
        }
    }
}

impl fmt::Display for ColorBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}
