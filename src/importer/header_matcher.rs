// ==========================================
// 销售导入 - 表头匹配器
// ==========================================
// 职责: 源表头 → 标准列名（大小写不敏感、空白折叠、同义词表精确匹配）
// 规则: 同一标准列出现多次时保留首列，其余产生警告
// ==========================================

use crate::domain::sale::{CanonicalHeader, Diagnostic};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeMap;

// ==========================================
// 同义词表（键已规范化：小写 + 单空格）
// ==========================================
const SYNONYMS: &[(&str, CanonicalHeader)] = &[
    // 日期
    ("date", CanonicalHeader::Date),
    ("sale date", CanonicalHeader::Date),
    ("sales date", CanonicalHeader::Date),
    ("order date", CanonicalHeader::Date),
    ("transaction date", CanonicalHeader::Date),
    ("created at", CanonicalHeader::Date),
    ("paid at", CanonicalHeader::Date),
    ("processed at", CanonicalHeader::Date),
    ("day", CanonicalHeader::Date),
    // 销售员
    ("salesperson", CanonicalHeader::Salesperson),
    ("sales person", CanonicalHeader::Salesperson),
    ("sales rep", CanonicalHeader::Salesperson),
    ("staff", CanonicalHeader::Salesperson),
    ("staff name", CanonicalHeader::Salesperson),
    ("staff member", CanonicalHeader::Salesperson),
    ("employee", CanonicalHeader::Salesperson),
    ("employee name", CanonicalHeader::Salesperson),
    ("seller", CanonicalHeader::Salesperson),
    ("sold by", CanonicalHeader::Salesperson),
    ("cashier", CanonicalHeader::Salesperson),
    ("served by", CanonicalHeader::Salesperson),
    // 商品
    ("product", CanonicalHeader::Product),
    ("product name", CanonicalHeader::Product),
    ("item", CanonicalHeader::Product),
    ("item name", CanonicalHeader::Product),
    ("lineitem name", CanonicalHeader::Product),
    ("product title", CanonicalHeader::Product),
    // 品类
    ("category", CanonicalHeader::Category),
    ("product category", CanonicalHeader::Category),
    ("product type", CanonicalHeader::Category),
    ("item category", CanonicalHeader::Category),
    // 数量
    ("quantity", CanonicalHeader::Quantity),
    ("qty", CanonicalHeader::Quantity),
    ("lineitem quantity", CanonicalHeader::Quantity),
    ("units", CanonicalHeader::Quantity),
    ("units sold", CanonicalHeader::Quantity),
    ("items sold", CanonicalHeader::Quantity),
    // 单价
    ("unitprice", CanonicalHeader::UnitPrice),
    ("unit price", CanonicalHeader::UnitPrice),
    ("price", CanonicalHeader::UnitPrice),
    ("item price", CanonicalHeader::UnitPrice),
    ("lineitem price", CanonicalHeader::UnitPrice),
    // 总额
    ("total", CanonicalHeader::Total),
    ("total sales", CanonicalHeader::Total),
    ("total amount", CanonicalHeader::Total),
    ("amount", CanonicalHeader::Total),
    ("sale amount", CanonicalHeader::Total),
    ("sales", CanonicalHeader::Total),
    ("line total", CanonicalHeader::Total),
    // 净额 / 毛额 / 退款
    ("net sales", CanonicalHeader::NetSales),
    ("net total", CanonicalHeader::NetSales),
    ("net amount", CanonicalHeader::NetSales),
    ("gross sales", CanonicalHeader::GrossSales),
    ("gross total", CanonicalHeader::GrossSales),
    ("gross amount", CanonicalHeader::GrossSales),
    ("refund", CanonicalHeader::Refund),
    ("refunds", CanonicalHeader::Refund),
    ("returns", CanonicalHeader::Refund),
    ("refunded amount", CanonicalHeader::Refund),
    ("refund amount", CanonicalHeader::Refund),
    // 客户
    ("customer", CanonicalHeader::Customer),
    ("customer name", CanonicalHeader::Customer),
    ("billing name", CanonicalHeader::Customer),
    ("client", CanonicalHeader::Customer),
    // 订单号
    ("orderreference", CanonicalHeader::OrderReference),
    ("order reference", CanonicalHeader::OrderReference),
    ("order ref", CanonicalHeader::OrderReference),
    ("order name", CanonicalHeader::OrderReference),
    ("order id", CanonicalHeader::OrderReference),
    ("order number", CanonicalHeader::OrderReference),
    ("order no", CanonicalHeader::OrderReference),
    ("order", CanonicalHeader::OrderReference),
    ("receipt", CanonicalHeader::OrderReference),
    ("receipt number", CanonicalHeader::OrderReference),
    ("transaction id", CanonicalHeader::OrderReference),
    // 平台标签（内嵌员工标识）
    ("tags", CanonicalHeader::Tags),
    ("customer tags", CanonicalHeader::Tags),
    ("order tags", CanonicalHeader::Tags),
];

/// 规范化表头：去首尾空白、折叠内部空白、小写
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 单个表头匹配
pub fn match_header(raw: &str) -> Option<CanonicalHeader> {
    let key = normalize_header(raw);
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|(_, canonical)| *canonical)
}

// ==========================================
// ColumnBinding - 源列绑定结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnBinding {
    Canonical(CanonicalHeader),
    /// 与先出现的列重名，忽略
    Duplicate(CanonicalHeader),
    Unrecognized(String),
    /// 空表头列
    Blank,
}

// ==========================================
// HeaderMap - 整行表头匹配结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    /// 与源列一一对应
    pub bindings: Vec<ColumnBinding>,
    /// 标准列 → 源列名（首次出现）
    pub recognized: BTreeMap<CanonicalHeader, String>,
    /// 表头所在源行号（1 基）
    pub header_line: usize,
}

impl HeaderMap {
    /// 匹配表头行；重复映射产生警告（行号为表头所在行）
    pub fn build(headers: &[String], header_line: usize) -> (Self, Vec<Diagnostic>) {
        let mut bindings = Vec::with_capacity(headers.len());
        let mut recognized: BTreeMap<CanonicalHeader, String> = BTreeMap::new();
        let mut warnings = Vec::new();

        for header in headers {
            let trimmed = header.trim();
            if trimmed.is_empty() {
                bindings.push(ColumnBinding::Blank);
                continue;
            }

            match match_header(trimmed) {
                Some(canonical) => {
                    if let Some(first) = recognized.get(&canonical) {
                        warnings.push(Diagnostic::warning(
                            header_line,
                            format!(
                                "Duplicate column '{}' maps to {} (already mapped from '{}'); ignoring it",
                                trimmed, canonical, first
                            ),
                        ));
                        bindings.push(ColumnBinding::Duplicate(canonical));
                    } else {
                        recognized.insert(canonical, trimmed.to_string());
                        bindings.push(ColumnBinding::Canonical(canonical));
                    }
                }
                None => bindings.push(ColumnBinding::Unrecognized(trimmed.to_string())),
            }
        }

        (
            Self {
                bindings,
                recognized,
                header_line,
            },
            warnings,
        )
    }

    pub fn contains(&self, key: CanonicalHeader) -> bool {
        self.recognized.contains_key(&key)
    }

    /// 结构校验
    ///
    /// - Date 必须存在
    /// - Salesperson 或 Tags（内嵌员工标识）必须存在
    /// - 至少一个数量/金额列
    pub fn validate_required(&self) -> ImportResult<()> {
        let mut missing = Vec::new();

        if !self.contains(CanonicalHeader::Date) {
            missing.push(CanonicalHeader::Date.to_string());
        }
        if !self.contains(CanonicalHeader::Salesperson) && !self.contains(CanonicalHeader::Tags) {
            missing.push(CanonicalHeader::Salesperson.to_string());
        }
        if !self.recognized.keys().any(CanonicalHeader::is_measure) {
            missing.push("Quantity/Total/UnitPrice".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingRequiredHeaders {
                missing,
                header_line: self.header_line,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_match_is_case_and_whitespace_insensitive() {
        assert_eq!(match_header("  TOTAL   Sales "), Some(CanonicalHeader::Total));
        assert_eq!(match_header("order\tname"), Some(CanonicalHeader::OrderReference));
        assert_eq!(match_header("Order Ref"), Some(CanonicalHeader::OrderReference));
        assert_eq!(match_header("Net Sales"), Some(CanonicalHeader::NetSales));
        assert_eq!(match_header("Customer Tags"), Some(CanonicalHeader::Tags));
        assert_eq!(match_header("Shipping Method"), None);
    }

    #[test]
    fn test_duplicate_keeps_first_and_warns() {
        let (map, warnings) =
            HeaderMap::build(&headers(&["Date", "Staff", "Total", "Amount"]), 1);

        assert_eq!(map.recognized.get(&CanonicalHeader::Total), Some(&"Total".to_string()));
        assert_eq!(map.bindings[3], ColumnBinding::Duplicate(CanonicalHeader::Total));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row_index, 1);
        assert!(warnings[0].message.contains("Amount"));
    }

    #[test]
    fn test_unrecognized_and_blank_columns() {
        let (map, warnings) = HeaderMap::build(&headers(&["Date", "", "Notes"]), 1);

        assert_eq!(map.bindings[1], ColumnBinding::Blank);
        assert_eq!(map.bindings[2], ColumnBinding::Unrecognized("Notes".to_string()));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_validate_required_reports_missing_date() {
        let (map, _) = HeaderMap::build(&headers(&["Salesperson", "Total"]), 1);
        let err = map.validate_required().unwrap_err();

        assert!(err.to_string().contains("Date"));
    }

    #[test]
    fn test_validate_required_accepts_tags_as_salesperson() {
        let (map, _) = HeaderMap::build(&headers(&["Created at", "Customer Tags", "Net Sales"]), 1);
        assert!(map.validate_required().is_ok());
    }

    #[test]
    fn test_validate_required_reports_header_line() {
        let (map, _) = HeaderMap::build(&headers(&["Salesperson", "Total"]), 4);
        let err = map.validate_required().unwrap_err();

        assert_eq!(err.structural_row(), 4);
    }

    #[test]
    fn test_validate_required_needs_a_measure() {
        let (map, _) = HeaderMap::build(&headers(&["Date", "Salesperson", "Product"]), 1);
        let err = map.validate_required().unwrap_err();

        assert!(err.to_string().contains("Quantity/Total/UnitPrice"));
    }
}
