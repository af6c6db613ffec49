// ==========================================
// 销售导入 - 导入层
// ==========================================
// 职责: 销售导出表格 → 标准化销售记录 + 行级诊断
// 支持: CSV / TSV / Excel 工作表
// 流程: 解析 → 表头识别 → 值标准化 → 员工对账 → 汇集
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod header_matcher;
pub mod ingestion;
pub mod pipeline;
pub mod row_reconciler;
pub mod staff_resolver;
pub mod summary;
pub mod value_normalizer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, SourceRow, SourceTable, UniversalFileParser};
pub use header_matcher::{ColumnBinding, HeaderMap};
pub use ingestion::{ingest, IngestedTable};
pub use pipeline::SalesImportPipeline;
pub use row_reconciler::{RowOutcome, RowReconciler};
pub use staff_resolver::{StaffLookup, StaffResolver};
pub use summary::summarize;
