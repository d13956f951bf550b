// ==========================================
// 儿童生长数据校验系统 - 列名匹配
// ==========================================
// 职责: 表头 → 逻辑字段（参考表列 / 身份列 / 月份子列）
// 规则: 不区分大小写；精确匹配优先于包含匹配
// ==========================================

use crate::domain::types::MonthLabel;

// ==========================================
// 参考表列别名
// ==========================================
pub const AGE_ALIASES: &[&str] = &["Umur", "Age", "Bulan", "usia"];
pub const MALE_WEIGHT_ALIASES: &[&str] = &["BB Ideal (L)", "BB L", "Berat Ideal L", "BB Laki-laki"];
pub const MALE_HEIGHT_ALIASES: &[&str] = &[
    "PB Ideal (L)",
    "TB Ideal (L)",
    "PB L",
    "Tinggi Ideal L",
    "PB Laki-laki",
];
pub const FEMALE_WEIGHT_ALIASES: &[&str] = &["BB Ideal (P)", "BB P", "Berat Ideal P", "BB Perempuan"];
pub const FEMALE_HEIGHT_ALIASES: &[&str] = &[
    "PB Ideal (P)",
    "TB Ideal (P)",
    "PB P",
    "Tinggi Ideal P",
    "PB Perempuan",
];

/// 按别名顺序查找列
///
/// 每个别名先尝试精确匹配（忽略大小写与首尾空白），再尝试包含匹配
pub fn find_column<'a>(headers: &'a [String], aliases: &[&str]) -> Option<&'a String> {
    aliases.iter().find_map(|alias| {
        let target = alias.trim().to_lowercase();
        headers
            .iter()
            .find(|h| h.trim().to_lowercase() == target)
            .or_else(|| headers.iter().find(|h| h.trim().to_lowercase().contains(&target)))
    })
}

// ==========================================
// 现场数据身份列
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    ChildName,
    Nik,
    BirthDate,
    Gender,
}

/// 按关键字识别身份列
pub fn classify_identity(header: &str) -> Option<IdentityField> {
    let upper = header.trim().to_uppercase();
    let has = |kw: &str| upper.contains(kw);

    if has("NAMA") && (has("ANAK") || has("BALITA") || has("BAYI")) {
        Some(IdentityField::ChildName)
    } else if matches!(upper.as_str(), "NIK" | "NO_NIK" | "NOMOR_NIK" | "NO NIK" | "NOMOR NIK") {
        Some(IdentityField::Nik)
    } else if has("TANGGAL") && (has("LAHIR") || has("LHR")) {
        Some(IdentityField::BirthDate)
    } else if has("JENIS") && (has("KELAMIN") || has("SEX") || has("GENDER")) {
        Some(IdentityField::Gender)
    } else {
        None
    }
}

// ==========================================
// 月份块子列
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonthSubColumn {
    MeasuredDate, // TANGGALUKUR
    Age,          // UMUR
    Weight,       // BERAT
    Height,       // TINGGI
    Method,       // CARAUKUR
}

impl MonthSubColumn {
    pub const ALL: [MonthSubColumn; 5] = [
        MonthSubColumn::MeasuredDate,
        MonthSubColumn::Age,
        MonthSubColumn::Weight,
        MonthSubColumn::Height,
        MonthSubColumn::Method,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            MonthSubColumn::MeasuredDate => "TANGGALUKUR",
            MonthSubColumn::Age => "UMUR",
            MonthSubColumn::Weight => "BERAT",
            MonthSubColumn::Height => "TINGGI",
            MonthSubColumn::Method => "CARAUKUR",
        }
    }
}

fn compact_upper(header: &str) -> String {
    header
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect()
}

/// 识别月份块列，如 "JANUARI_BERAT"、"Berat Januari"、"JANUARI TANGGAL UKUR"
pub fn classify_month_column(header: &str) -> Option<(MonthLabel, MonthSubColumn)> {
    let compact = compact_upper(header);
    let month = MonthLabel::ALL
        .iter()
        .copied()
        .find(|m| compact.contains(m.name()))?;
    let sub = MonthSubColumn::ALL
        .iter()
        .copied()
        .find(|s| compact.contains(s.keyword()))?;
    Some((month, sub))
}
