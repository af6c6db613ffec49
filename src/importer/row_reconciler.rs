// ==========================================
// 销售导入 - 行对账
// ==========================================
// 阶段 2: RawRow + 名册 → 标准化销售记录 / 警告跳过 / 错误拒绝
// 顺序（遇拒绝即止）:
//   员工解析 → 日期 → 金额 → 数量 → 总额派生 → 净额覆盖 → 接受
// 红线: 纯函数，不修改已产出记录，不猜测缺失员工
// ==========================================

use crate::config::ImportSettings;
use crate::domain::roster::Roster;
use crate::domain::sale::{CanonicalHeader, Diagnostic, NormalizedSaleRecord, RawRow};
use crate::importer::staff_resolver::{StaffLookup, StaffResolver};
use crate::importer::value_normalizer::{
    format_money, format_sale_date, max_money, normalize_date, normalize_money,
    normalize_quantity, round_money,
};
use rust_decimal::Decimal;

// ==========================================
// RowOutcome - 单行对账结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// 接受；可附带不阻断的警告（如单价与总额不一致）
    Accepted {
        record: NormalizedSaleRecord,
        warnings: Vec<Diagnostic>,
    },
    /// 警告并排除（未知员工、非正销售额）
    Skipped(Diagnostic),
    /// 错误并排除（日期/金额无法解析、无法得到总额）
    Rejected(Diagnostic),
}

// 金额列的解析结果
struct Amounts {
    total: Option<Decimal>,
    unit_price: Option<Decimal>,
    net: Option<Decimal>,
    gross: Option<Decimal>,
    refund: Option<Decimal>,
}

pub struct RowReconciler<'a> {
    resolver: StaffResolver<'a>,
    settings: ImportSettings,
}

impl<'a> RowReconciler<'a> {
    pub fn new(roster: &'a Roster, settings: ImportSettings) -> Self {
        Self {
            resolver: StaffResolver::new(roster),
            settings,
        }
    }

    pub fn reconcile(&self, row: &RawRow) -> RowOutcome {
        let n = row.row_index;

        // === 步骤 1: 员工解析 ===
        let staff = match self.resolver.resolve(
            row.get_text(CanonicalHeader::Salesperson).as_deref(),
            row.get_text(CanonicalHeader::Tags).as_deref(),
        ) {
            StaffLookup::Resolved(entry) => entry,
            StaffLookup::Unknown(value) => {
                return RowOutcome::Skipped(Diagnostic::warning(
                    n,
                    format!("Row {}: Unknown salesperson: {}", n, value),
                ))
            }
            StaffLookup::Missing => {
                return RowOutcome::Skipped(Diagnostic::warning(
                    n,
                    format!("Row {}: Unknown salesperson: (empty Salesperson)", n),
                ))
            }
        };

        // === 步骤 2: 日期 ===
        let sale_date = match row.get(CanonicalHeader::Date) {
            None => {
                return RowOutcome::Rejected(Diagnostic::error(
                    n,
                    format!("Row {}: Missing Date value", n),
                ))
            }
            Some(value) => match normalize_date(value, self.settings.date_order) {
                Ok(dt) => format_sale_date(&dt),
                Err(reason) => {
                    return RowOutcome::Rejected(Diagnostic::error(
                        n,
                        format!("Row {}: Invalid Date '{}': {}", n, value, reason),
                    ))
                }
            },
        };

        // === 步骤 3: 金额 ===
        let amounts = match self.parse_amounts(row) {
            Ok(amounts) => amounts,
            Err(diagnostic) => return RowOutcome::Rejected(diagnostic),
        };

        // === 步骤 4: 数量（缺失或非法 → 1） ===
        let quantity = normalize_quantity(row.get(CanonicalHeader::Quantity)).unwrap_or(1);

        // === 步骤 5/6: 总额派生与净额覆盖 ===
        let unit_price = amounts.unit_price.map(round_money);
        let explicit_total = amounts.total.or(amounts.gross);

        let (source, stated, gross_amount) = match (amounts.net, explicit_total) {
            (Some(net), None) => ("net sales", Some(net), None),
            (Some(net), Some(gross)) if self.settings.prefer_net_over_gross => {
                ("net sales", Some(net), Some(gross))
            }
            (_, Some(total)) => {
                // 同时存在 Total 与 GrossSales 列时，毛额作为辅助信息保留
                let gross = amounts.total.and(amounts.gross);
                ("Total", Some(total), gross)
            }
            (None, None) => ("Total", None, None),
        };

        let (total_amount, derived) = match (stated, unit_price) {
            (Some(total), _) => (round_money(total), false),
            (None, Some(unit)) => match checked_line_total(unit, quantity) {
                Some(total) => (total, true),
                None => {
                    return RowOutcome::Rejected(Diagnostic::error(
                        n,
                        format!(
                            "Row {}: UnitPrice {} x Quantity {} exceeds the supported amount range",
                            n,
                            format_money(unit),
                            quantity
                        ),
                    ))
                }
            },
            (None, None) => {
                return RowOutcome::Rejected(Diagnostic::error(
                    n,
                    format!(
                        "Row {}: Missing monetary value: no Total, net sales or UnitPrice to derive from",
                        n
                    ),
                ))
            }
        };

        if total_amount <= Decimal::ZERO {
            let source = if derived { "derived Total" } else { source };
            return RowOutcome::Skipped(Diagnostic::warning(
                n,
                format!(
                    "Row {}: Non-positive {} {}; row is not counted as a sale",
                    n,
                    source,
                    format_money(total_amount)
                ),
            ));
        }

        // 单价 × 数量 必须与总额一致，否则单价置空
        let mut warnings = Vec::new();
        let unit_price = match unit_price {
            Some(unit) if !derived => match checked_line_total(unit, quantity) {
                Some(expected) if expected == total_amount => Some(unit),
                Some(expected) => {
                    warnings.push(Diagnostic::warning(
                        n,
                        format!(
                            "Row {}: UnitPrice {} x Quantity {} = {} does not match {} {}; UnitPrice left empty",
                            n,
                            format_money(unit),
                            quantity,
                            format_money(expected),
                            source,
                            format_money(total_amount)
                        ),
                    ));
                    None
                }
                None => {
                    warnings.push(Diagnostic::warning(
                        n,
                        format!(
                            "Row {}: UnitPrice {} x Quantity {} exceeds the supported amount range; UnitPrice left empty",
                            n,
                            format_money(unit),
                            quantity
                        ),
                    ));
                    None
                }
            },
            other => other,
        };

        // === 步骤 7: 接受 ===
        RowOutcome::Accepted {
            record: NormalizedSaleRecord {
                user_id: staff.user_id,
                staff_name: staff.display_name.clone(),
                sale_date,
                product_name: row.get_text(CanonicalHeader::Product),
                product_category: row.get_text(CanonicalHeader::Category),
                quantity,
                unit_price: unit_price.map(format_money),
                total_amount: format_money(total_amount),
                gross_amount: gross_amount.map(format_money),
                refund_amount: amounts.refund.map(format_money),
                customer_name: row.get_text(CanonicalHeader::Customer),
                order_reference: row.get_text(CanonicalHeader::OrderReference),
                row_index: n,
            },
            warnings,
        }
    }

    // 解析全部金额列；任一列有残留字符即拒绝整行
    fn parse_amounts(&self, row: &RawRow) -> Result<Amounts, Diagnostic> {
        let parse = |key: CanonicalHeader| -> Result<Option<Decimal>, Diagnostic> {
            match row.get(key) {
                None => Ok(None),
                Some(value) => normalize_money(value).map(Some).map_err(|reason| {
                    Diagnostic::error(
                        row.row_index,
                        format!(
                            "Row {}: Invalid {} value '{}': {}",
                            row.row_index, key, value, reason
                        ),
                    )
                }),
            }
        };

        Ok(Amounts {
            total: parse(CanonicalHeader::Total)?,
            unit_price: parse(CanonicalHeader::UnitPrice)?,
            net: parse(CanonicalHeader::NetSales)?,
            gross: parse(CanonicalHeader::GrossSales)?,
            refund: parse(CanonicalHeader::Refund)?,
        })
    }
}

// 单价 × 数量（两位小数）；溢出或超出金额上限时返回 None
fn checked_line_total(unit: Decimal, quantity: u32) -> Option<Decimal> {
    unit.checked_mul(Decimal::from(quantity))
        .map(round_money)
        .filter(|total| total.abs() <= max_money())
}
