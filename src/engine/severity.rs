// ==========================================
// 儿童生长数据校验系统 - 等级文本兜底校正
// ==========================================
// 职责: 基于已拼接的说明文本再次校正校验等级
// 红线: 只看文本，不看结构化规则结果；保持现有字符串匹配行为
// ==========================================

use crate::domain::types::ValidationLevel;

/// 错误标记（区分大小写）
pub const ERROR_MARKER: &str = "ERROR";

/// 警告标记（不区分大小写）
pub const WEIGHT_ANOMALY_MARKER: &str = "weight anomaly";
pub const NOT_IDEAL_MARKER: &str = "not ideal";

/// 根据说明文本校正等级
///
/// 1. 文本包含 `ERROR` → 强制 Error
/// 2. 否则文本包含 `weight anomaly` 或 `not ideal`（不区分大小写）且当前为 Ok → Warning
/// 3. 其他情况保持不变
pub fn reconcile_severity(level: ValidationLevel, remark: &str) -> ValidationLevel {
    if remark.contains(ERROR_MARKER) {
        return ValidationLevel::Error;
    }

    let lowered = remark.to_lowercase();
    if (lowered.contains(WEIGHT_ANOMALY_MARKER) || lowered.contains(NOT_IDEAL_MARKER))
        && level == ValidationLevel::Ok
    {
        return ValidationLevel::Warning;
    }

    level
}
