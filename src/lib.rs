// ==========================================
// 销售导入 - 核心库
// ==========================================
// 职责: 销售导出文件导入与员工对账
// 输入: CSV / Excel 销售导出 + 员工名册
// 输出: 标准化销售记录 + 行级警告/错误
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析与对账
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CanonicalHeader, CellValue, Diagnostic, DiagnosticKind, NormalizedSaleRecord, RawRow,
    Roster, RosterEntry, RunResult, SalesSummary, StaffTotal,
};

// 配置
pub use config::{ConfigManager, DateOrder, DelimiterSetting, ImportSettings};

// 导入
pub use importer::{summarize, ImportError, ImportResult, SalesImportPipeline};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "sales-ledger-import";
