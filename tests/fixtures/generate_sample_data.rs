// ==========================================
// 样例数据生成器
// ==========================================
// 用途: 生成现场数据与参考数据 CSV，供手工运行 CLI
// 输出: <dir>/lapangan_sample.csv, <dir>/referensi_sample.csv
//       （默认 dir = tests/fixtures/datasets）
// ==========================================

use chrono::{Datelike, NaiveDate};
use csv::Writer;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

const MONTHS: [&str; 12] = [
    "JANUARI", "FEBRUARI", "MARET", "APRIL", "MEI", "JUNI", "JULI", "AGUSTUS", "SEPTEMBER",
    "OKTOBER", "NOVEMBER", "DESEMBER",
];

const SUB_COLUMNS: [&str; 5] = ["TANGGALUKUR", "UMUR", "BERAT", "TINGGI", "CARAUKUR"];

// 儿童样例: (NIK, 姓名, 出生日期, 性别, 场景)
const CHILDREN: &[(&str, &str, &str, &str, Scenario)] = &[
    ("3201010101230001", "Budi Santoso", "15/01/2023", "L", Scenario::Normal),
    ("3201010101230002", "Siti Aminah", "02/02/2023", "P", Scenario::HeightDrop),
    ("3201010101230003", "Agus Pratama", "20/12/2022", "L", Scenario::WeightDrop),
    ("3201010101230004", "Dewi Lestari", "05/03/2023", "", Scenario::Gaps),
    ("3201010101230005", "Rina Wati", "11/11/2022", "P", Scenario::Missing),
];

#[derive(Clone, Copy)]
enum Scenario {
    Normal,
    HeightDrop,
    WeightDrop,
    Gaps,
    Missing,
}

// 参考区间近似值（仅用于样例，不代表任何标准）
fn reference_row(age: u32) -> [String; 5] {
    let a = age as f64;
    let male_w = (3.3 + 0.55 * a, 0.9 + 0.1 * a);
    let female_w = (3.2 + 0.5 * a, 0.9 + 0.1 * a);
    let male_h = (49.9 + 2.1 * a, 4.0);
    let female_h = (49.1 + 2.0 * a, 4.0);
    let range = |(mid, half): (f64, f64)| format!("{:.1}-{:.1}", mid - half, mid + half);

    [
        age.to_string(),
        range(male_w),
        range(male_h),
        range(female_w),
        range(female_h),
    ]
}

fn write_reference(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["Umur", "BB Ideal (L)", "PB Ideal (L)", "BB Ideal (P)", "PB Ideal (P)"])?;
    for age in 0..=24 {
        wtr.write_record(reference_row(age))?;
    }
    wtr.flush()?;
    Ok(())
}

fn month_block(scenario: Scenario, birth: NaiveDate, month_idx: u32) -> [String; 5] {
    let year = birth.year() + 1;
    let Some(measured) = NaiveDate::from_ymd_opt(year, month_idx + 1, 10) else {
        return Default::default();
    };
    let age = ((measured.year() - birth.year()) * 12 + measured.month() as i32
        - birth.month() as i32)
        .max(0) as f64;

    let mut weight = Some(3.3 + 0.55 * age);
    let mut height = Some(49.9 + 2.1 * age);

    match scenario {
        Scenario::Normal => {}
        Scenario::HeightDrop if month_idx == 4 => height = height.map(|h| h - 3.0),
        Scenario::HeightDrop => {}
        Scenario::WeightDrop if month_idx == 6 => weight = weight.map(|w| w * 0.8),
        Scenario::WeightDrop => {}
        Scenario::Gaps if month_idx % 3 != 0 => return Default::default(),
        Scenario::Gaps => {}
        Scenario::Missing if month_idx == 2 => {
            weight = None;
            height = None;
        }
        Scenario::Missing if month_idx == 5 => weight = None,
        Scenario::Missing => {}
    }

    [
        measured.format("%d/%m/%Y").to_string(),
        format!("{}", age as u32),
        weight.map(|w| format!("{:.1}", w)).unwrap_or_default(),
        height.map(|h| format!("{:.1}", h)).unwrap_or_default(),
        if age < 24.0 { "Terlentang" } else { "Berdiri" }.to_string(),
    ]
}

fn write_field_data(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(path)?;

    let mut header = vec![
        "NIK".to_string(),
        "Nama Anak".to_string(),
        "Tanggal Lahir".to_string(),
        "Jenis Kelamin".to_string(),
    ];
    for month in MONTHS {
        for sub in SUB_COLUMNS {
            header.push(format!("{}_{}", month, sub));
        }
    }
    wtr.write_record(&header)?;

    for (nik, name, birth, gender, scenario) in CHILDREN {
        let birth_date = NaiveDate::parse_from_str(birth, "%d/%m/%Y")?;
        let mut row = vec![
            nik.to_string(),
            name.to_string(),
            birth.to_string(),
            gender.to_string(),
        ];
        for month_idx in 0..12 {
            row.extend(month_block(*scenario, birth_date, month_idx));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/datasets"));
    fs::create_dir_all(&out_dir)?;

    let field_path = out_dir.join("lapangan_sample.csv");
    let reference_path = out_dir.join("referensi_sample.csv");

    write_reference(&reference_path)?;
    write_field_data(&field_path)?;

    println!("参考数据: {}", reference_path.display());
    println!("现场数据: {}", field_path.display());
    Ok(())
}
