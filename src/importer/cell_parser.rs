// ==========================================
// 儿童生长数据校验系统 - 单元格宽松解析
// ==========================================
// 红线: 解析失败一律返回 None，不产生错误
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// Excel 序列日期上限（9999-12-31）
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "-" {
        None
    } else {
        Some(trimmed)
    }
}

/// 宽松日期解析: 文本格式 → 日期时间格式 → Excel 序列号
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = non_empty(raw)?;

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }

    let serial = value.parse::<f64>().ok()?;
    excel_serial_to_date(serial)
}

/// Excel 序列号（纪元 1899-12-30）→ 日期，小数部分（时间）丢弃
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// 宽松浮点解析（接受小数逗号）
pub fn parse_float(raw: &str) -> Option<f64> {
    let value = non_empty(raw)?;
    let normalized = if value.contains(',') && !value.contains('.') {
        value.replace(',', ".")
    } else {
        value.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 宽松整数解析（"3.0" → 3，截断）
pub fn parse_int(raw: &str) -> Option<i64> {
    let value = non_empty(raw)?;
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    parse_float(value).map(|f| f.trunc() as i64)
}

/// 月龄解析: 负数视为无效
pub fn parse_age_months(raw: &str) -> Option<u32> {
    parse_int(raw).and_then(|v| u32::try_from(v).ok())
}

/// 文本字段: 空白视为缺失
pub fn parse_text(raw: &str) -> Option<String> {
    non_empty(raw).map(|s| s.to_string())
}
