// ==========================================
// 销售导入 - 员工业绩汇总
// ==========================================
// 只读派生视图: 标准化记录 → 按员工合计
// 排序: 合计降序，相同时按 user_id 升序
// ==========================================

use crate::domain::sale::{NormalizedSaleRecord, SalesSummary, StaffTotal};
use crate::importer::value_normalizer::format_money;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

pub fn summarize(records: &[NormalizedSaleRecord]) -> SalesSummary {
    // user_id → (展示名, 笔数, 合计)
    let mut per_staff: BTreeMap<i64, (String, usize, Decimal)> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;

    for record in records {
        // total_amount 由本模块的上游产出，格式恒定；解析失败视为 0
        let amount = Decimal::from_str(&record.total_amount).unwrap_or(Decimal::ZERO);
        let entry = per_staff
            .entry(record.user_id)
            .or_insert_with(|| (record.staff_name.clone(), 0, Decimal::ZERO));
        entry.1 += 1;
        entry.2 = saturating_sum(entry.2, amount);
        grand_total = saturating_sum(grand_total, amount);
    }

    let mut staff: Vec<(i64, String, usize, Decimal)> = per_staff
        .into_iter()
        .map(|(user_id, (name, count, total))| (user_id, name, count, total))
        .collect();
    staff.sort_by(|a, b| b.3.cmp(&a.3).then(a.0.cmp(&b.0)));

    SalesSummary {
        staff: staff
            .into_iter()
            .map(|(user_id, staff_name, record_count, total)| StaffTotal {
                user_id,
                staff_name,
                record_count,
                total_amount: format_money(total),
            })
            .collect(),
        record_count: records.len(),
        grand_total: format_money(grand_total),
    }
}

// 单条金额受上限约束，实际不会触顶；越界时封顶而非中止汇总
fn saturating_sum(acc: Decimal, amount: Decimal) -> Decimal {
    acc.checked_add(amount).unwrap_or_else(|| {
        warn!(%acc, %amount, "汇总合计超出 Decimal 范围，按上限封顶");
        if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}
