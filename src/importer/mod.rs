// ==========================================
// 儿童生长数据校验系统 - 导入层
// ==========================================
// 职责: 外部文件导入，生成参考行与儿童记录
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod cell_parser;
pub mod column_matcher;
pub mod error;
pub mod field_data_importer;
pub mod file_parser;
pub mod importer_trait;
pub mod reference_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_data_importer::{FieldDataMapper, FieldLayout};
pub use file_parser::{CsvParser, ExcelParser, RawSheet, UniversalFileParser};
pub use reference_importer::ReferenceMapper;

// 重导出 Trait 接口
pub use importer_trait::{FieldDataImporter, FileParser, ReferenceImporter};
