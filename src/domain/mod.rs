// ==========================================
// 销售导入 - 领域模型层
// ==========================================
// 职责: 定义销售记录、诊断、名册等领域实体
// 红线: 不含文件读取逻辑，不含对账逻辑
// ==========================================

pub mod roster;
pub mod sale;

// 重导出核心类型
pub use roster::{Roster, RosterEntry};
pub use sale::{
    CanonicalHeader, CellValue, Diagnostic, DiagnosticKind, NormalizedSaleRecord, RawRow,
    RunResult, SalesSummary, StaffTotal,
};
