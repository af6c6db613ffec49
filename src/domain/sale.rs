// ==========================================
// 销售导入 - 销售领域模型
// ==========================================
// 职责: 原始行 / 标准化销售记录 / 诊断 / 运行结果
// 生命周期: 每次导入新建，导入结束后交给持久化层
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
// 表格单元格可能是文本或数值（Excel 日期序列号也是数值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// 空白文本视为空
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 非空时返回去空白后的文本形式
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) => write!(f, "{}", s.trim()),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// 整数值不带小数点输出（1001 而非 1001.0）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// CanonicalHeader - 标准列名
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalHeader {
    Date,
    Salesperson,
    Product,
    Category,
    Quantity,
    UnitPrice,
    Total,
    NetSales,
    GrossSales,
    Refund,
    Customer,
    OrderReference,
    Tags,
}

impl CanonicalHeader {
    pub const ALL: [CanonicalHeader; 13] = [
        CanonicalHeader::Date,
        CanonicalHeader::Salesperson,
        CanonicalHeader::Product,
        CanonicalHeader::Category,
        CanonicalHeader::Quantity,
        CanonicalHeader::UnitPrice,
        CanonicalHeader::Total,
        CanonicalHeader::NetSales,
        CanonicalHeader::GrossSales,
        CanonicalHeader::Refund,
        CanonicalHeader::Customer,
        CanonicalHeader::OrderReference,
        CanonicalHeader::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalHeader::Date => "Date",
            CanonicalHeader::Salesperson => "Salesperson",
            CanonicalHeader::Product => "Product",
            CanonicalHeader::Category => "Category",
            CanonicalHeader::Quantity => "Quantity",
            CanonicalHeader::UnitPrice => "UnitPrice",
            CanonicalHeader::Total => "Total",
            CanonicalHeader::NetSales => "NetSales",
            CanonicalHeader::GrossSales => "GrossSales",
            CanonicalHeader::Refund => "Refund",
            CanonicalHeader::Customer => "Customer",
            CanonicalHeader::OrderReference => "OrderReference",
            CanonicalHeader::Tags => "Tags",
        }
    }

    /// 金额/数量类列（结构校验：至少存在一个）
    pub fn is_measure(&self) -> bool {
        matches!(
            self,
            CanonicalHeader::Quantity
                | CanonicalHeader::UnitPrice
                | CanonicalHeader::Total
                | CanonicalHeader::NetSales
                | CanonicalHeader::GrossSales
        )
    }
}

impl fmt::Display for CanonicalHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// RawRow - 导入中间结构体
// ==========================================
// 用途: 摄取层产出，对账层立即消费
// row_index: 源文件中的 1-based 行号（含表头偏移）
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_index: usize,
    pub values: BTreeMap<CanonicalHeader, CellValue>,
    /// 未识别列: (源列名, 值)，保持源列顺序
    pub unrecognized: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(row_index: usize) -> Self {
        Self {
            row_index,
            values: BTreeMap::new(),
            unrecognized: Vec::new(),
        }
    }

    /// 取值，空单元格视为缺失
    pub fn get(&self, key: CanonicalHeader) -> Option<&CellValue> {
        self.values.get(&key).filter(|v| !v.is_empty())
    }

    pub fn get_text(&self, key: CanonicalHeader) -> Option<String> {
        self.values.get(&key).and_then(CellValue::as_text)
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(CellValue::is_empty)
            && self.unrecognized.iter().all(|(_, v)| v.is_empty())
    }
}

// ==========================================
// NormalizedSaleRecord - 标准化销售记录
// ==========================================
// 红线: total_amount 恒为正；退款走 refund_amount，不并入 total_amount
// 金额统一为两位小数字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSaleRecord {
    pub user_id: i64,
    pub staff_name: String,
    pub sale_date: String,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
    pub quantity: u32,
    pub unit_price: Option<String>,
    pub total_amount: String,
    pub gross_amount: Option<String>,
    pub refund_amount: Option<String>,
    pub customer_name: Option<String>,
    pub order_reference: Option<String>,
    pub row_index: usize,
}

// ==========================================
// Diagnostic - 行级诊断
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub row_index: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(row_index: usize, message: impl Into<String>) -> Self {
        Self {
            row_index,
            kind: DiagnosticKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(row_index: usize, message: impl Into<String>) -> Self {
        Self {
            row_index,
            kind: DiagnosticKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Error => "error",
        };
        write!(f, "[{} row {}] {}", kind, self.row_index, self.message)
    }
}

// ==========================================
// RunResult - 导入运行结果
// ==========================================
// success=false 仅当结构校验失败；行级问题不影响 success
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub records: Vec<NormalizedSaleRecord>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl RunResult {
    /// 结构性失败：无部分输出
    pub fn structural_failure(error: Diagnostic) -> Self {
        Self {
            success: false,
            records: Vec::new(),
            warnings: Vec::new(),
            errors: vec![error],
        }
    }
}

// ==========================================
// SalesSummary - 汇总视图（只读派生）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffTotal {
    pub user_id: i64,
    pub staff_name: String,
    pub record_count: usize,
    pub total_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub staff: Vec<StaffTotal>,
    pub record_count: usize,
    pub grand_total: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_trim() {
        assert_eq!(CellValue::from("  Alice ").as_text(), Some("Alice".to_string()));
        assert_eq!(CellValue::from("   "), CellValue::Empty);
        assert_eq!(CellValue::Number(1001.0).as_text(), Some("1001".to_string()));
        assert_eq!(CellValue::Number(12.5).as_text(), Some("12.5".to_string()));
    }

    #[test]
    fn test_raw_row_get_skips_empty() {
        let mut row = RawRow::new(2);
        row.values.insert(CanonicalHeader::Product, CellValue::Text("  ".to_string()));
        row.values.insert(CanonicalHeader::Total, CellValue::Number(5.0));

        assert!(row.get(CanonicalHeader::Product).is_none());
        assert!(row.get(CanonicalHeader::Total).is_some());
        assert!(!row.is_blank());
    }

    #[test]
    fn test_run_result_serializes_camel_case() {
        let result = RunResult {
            success: true,
            records: Vec::new(),
            warnings: vec![Diagnostic::warning(3, "Unknown salesperson: Bob")],
            errors: Vec::new(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["warnings"][0]["rowIndex"], 3);
        assert_eq!(json["warnings"][0]["kind"], "warning");
    }
}
