// ==========================================
// 儿童生长数据校验系统 - 导入接口 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::measurement::ChildRecord;
use crate::domain::reference::ReferenceRow;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::RawSheet;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser / ExcelParser / UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表（首行为表头）
    ///
    /// # 返回
    /// - Ok(RawSheet): 表头 + 去除空白行后的数据行
    /// - Err: 文件不存在 / 格式不支持 / 解析失败
    fn parse_to_raw_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

// ==========================================
// ReferenceImporter Trait
// ==========================================
// 实现者: ReferenceImporterImpl
pub trait ReferenceImporter: Send + Sync {
    /// 原始表 → 参考行
    ///
    /// # 返回
    /// - Err(ReferenceFormatError): 月龄列或四个理想区间列缺失
    fn map_reference_rows(&self, sheet: &RawSheet) -> ImportResult<Vec<ReferenceRow>>;
}

// ==========================================
// FieldDataImporter Trait
// ==========================================
// 实现者: FieldDataImporterImpl
pub trait FieldDataImporter: Send + Sync {
    /// 原始宽表 → 儿童记录（月份块展开为测量列表）
    ///
    /// # 返回
    /// - Err(FieldDataFormatError): 儿童姓名列缺失
    fn map_children(&self, sheet: &RawSheet) -> ImportResult<Vec<ChildRecord>>;
}
