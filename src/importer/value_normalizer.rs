// ==========================================
// 销售导入 - 值规范化
// ==========================================
// 职责: 日期 / 金额 / 数量 解析与标准化
// 日期: ISO / 区域格式 D/M/Y 或 M/D/Y / 表格日期序列号（1899-12-30 起）
// 金额: 去货币符号与千分位，四舍五入（half-up）到两位小数
// ==========================================

use crate::config::DateOrder;
use crate::domain::sale::CellValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// 输出时间戳格式（UTC）
pub const SALE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// 表格日期序列号上限（9999-12-31）
const MAX_DATE_SERIAL: f64 = 2_958_465.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

// 低于此值的纯数字（如单独的年份 2024）不按序列号解释，约为 1927-05-18
const MIN_PLAUSIBLE_DATE_SERIAL: f64 = 10_000.0;

// 金额绝对值上限（10^15）
const MAX_MONEY_UNITS: i64 = 1_000_000_000_000_000;

// 货币代码白名单；地区前缀仅在紧跟货币符号时剥离（HK$、US$）
const CURRENCY_CODES: &str = "HKD|USD|EUR|GBP|JPY|CNY|RMB|AUD|CAD|NZD|SGD|TWD|CHF|MOP";

static CURRENCY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?:{})\s*\p{{Sc}}?|(?:HK|US|AU|CA|NZ|SG|NT)?\p{{Sc}})\s*",
        CURRENCY_CODES
    ))
    .expect("valid currency prefix regex")
});
static CURRENCY_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\s*(?:\p{{Sc}}|{})$", CURRENCY_CODES))
        .expect("valid currency suffix regex")
});

// ==========================================
// 日期
// ==========================================

/// 解析销售日期，返回 UTC 等效的无时区时间
///
/// # 规则
/// - 数值 / 纯数字文本: 表格日期序列号，小数部分为当日时间
/// - 8 位纯数字: YYYYMMDD
/// - ISO 日期 / 日期时间（带时区偏移时换算为 UTC）
/// - D/M/YYYY 或 M/D/YYYY（分隔符 / - .）: 某一分量 > 12 时唯一确定，
///   均 <= 12 时按 `order` 解释，均 > 12 时无法解析
pub fn normalize_date(value: &CellValue, order: DateOrder) -> Result<NaiveDateTime, String> {
    match value {
        CellValue::Empty => Err("value is empty".to_string()),
        CellValue::Number(serial) => plausible_date_serial(*serial),
        CellValue::Text(raw) => parse_date_text(raw.trim(), order),
    }
}

pub fn format_sale_date(value: &NaiveDateTime) -> String {
    value.format(SALE_DATE_FORMAT).to_string()
}

/// 表格日期序列号 → 日期时间（纪元 1899-12-30）
pub fn from_date_serial(serial: f64) -> Result<NaiveDateTime, String> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_DATE_SERIAL {
        return Err(format!("date serial {} is out of range", serial));
    }

    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * SECONDS_PER_DAY).round() as i64;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| "invalid serial epoch".to_string())?;

    epoch
        .checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
        .ok_or_else(|| format!("date serial {} is out of range", serial))
}

// 日期列中的小数值（年份、数量）不静默解释为 1900 年代的日期
fn plausible_date_serial(serial: f64) -> Result<NaiveDateTime, String> {
    if serial.is_finite() && serial < MIN_PLAUSIBLE_DATE_SERIAL {
        return Err(format!(
            "'{}' is a bare number, not a recognizable date or date serial",
            serial
        ));
    }
    from_date_serial(serial)
}

fn parse_date_text(text: &str, order: DateOrder) -> Result<NaiveDateTime, String> {
    if text.is_empty() {
        return Err("value is empty".to_string());
    }

    // 纯数字：YYYYMMDD 或日期序列号
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y%m%d") {
            return Ok(date.and_time(NaiveTime::default()));
        }
    }
    if let Ok(serial) = text.parse::<f64>() {
        return plausible_date_serial(serial);
    }

    // 带时区偏移
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Ok(dt.with_timezone(&Utc).naive_utc());
        }
    }
    if let Some(stripped) = text.strip_suffix(" UTC").or_else(|| text.strip_suffix('Z')) {
        if let Ok(dt) = parse_iso_naive(stripped.trim_end()) {
            return Ok(dt);
        }
    }

    if let Ok(dt) = parse_iso_naive(text) {
        return Ok(dt);
    }

    parse_locale_date(text, order)
}

fn parse_iso_naive(text: &str) -> Result<NaiveDateTime, ()> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date.and_time(NaiveTime::default()));
        }
    }
    Err(())
}

// D/M/YYYY、M/D/YYYY，可带时间
fn parse_locale_date(text: &str, order: DateOrder) -> Result<NaiveDateTime, String> {
    let unparseable = || format!("unrecognized date format '{}'", text);

    let (date_part, time_part) = match text.split_once(char::is_whitespace) {
        Some((date, time)) => (date, time.trim()),
        None => (text, ""),
    };

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return Err(unparseable());
    }
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|_| unparseable())?;
    let (first, second, year) = (numbers[0], numbers[1], numbers[2] as i32);

    let (day, month) = if first > 12 && second > 12 {
        return Err(format!(
            "date '{}' has no valid month component (both {} and {} exceed 12)",
            text, first, second
        ));
    } else if first > 12 {
        (first, second)
    } else if second > 12 {
        (second, first)
    } else {
        match order {
            DateOrder::DayFirst => (first, second),
            DateOrder::MonthFirst => (second, first),
        }
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("date '{}' is not a valid calendar date", text))?;

    let time = if time_part.is_empty() {
        NaiveTime::default()
    } else {
        parse_time(time_part).ok_or_else(unparseable)?
    };

    Ok(date.and_time(time))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

// ==========================================
// 金额
// ==========================================

/// 解析金额
///
/// # 规则
/// - 去除前缀货币符号/代码（$、HK$、US$、€、HKD …）及后缀符号/大写代码
/// - 负号可在符号前后；会计括号 (12.50) 视为负数
/// - 逗号为千分位；仅当逗号位于小数点之后，或唯一逗号后跟 1-2 位数字时视为小数逗号
/// - 剥离后仍有非数字残留 → Err
pub fn normalize_money(value: &CellValue) -> Result<Decimal, String> {
    match value {
        CellValue::Empty => Err("value is empty".to_string()),
        CellValue::Number(n) => Decimal::from_f64(*n)
            .ok_or_else(|| format!("'{}' is not a finite number", n))
            .and_then(check_money_range),
        CellValue::Text(raw) => parse_money_text(raw.trim()),
    }
}

fn parse_money_text(raw: &str) -> Result<Decimal, String> {
    let mut negative = false;
    let mut text = raw;

    if text.len() >= 2 && text.starts_with('(') && text.ends_with(')') {
        negative = true;
        text = text[1..text.len() - 1].trim();
    }
    if let Some(rest) = text.strip_prefix('-') {
        negative = !negative;
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix('+') {
        text = rest.trim_start();
    }

    let body = CURRENCY_PREFIX.replace(text, "");
    let body = CURRENCY_SUFFIX.replace(&body, "");
    let mut body = body.trim();

    if let Some(rest) = body.strip_prefix('-') {
        negative = !negative;
        body = rest.trim_start();
    } else if let Some(rest) = body.strip_suffix('-') {
        negative = !negative;
        body = rest.trim_end();
    }

    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = normalize_separators(&compact);

    if digits.is_empty()
        || !digits.chars().any(|c| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return Err(format!("'{}' is not a monetary amount", raw));
    }

    let amount =
        Decimal::from_str(&digits).map_err(|_| format!("'{}' is not a monetary amount", raw))?;
    check_money_range(if negative { -amount } else { amount })
}

/// 金额绝对值上限
pub fn max_money() -> Decimal {
    Decimal::from(MAX_MONEY_UNITS)
}

fn check_money_range(amount: Decimal) -> Result<Decimal, String> {
    if amount.abs() > max_money() {
        Err(format!(
            "{} exceeds the supported amount range (max {})",
            amount,
            max_money()
        ))
    } else {
        Ok(amount)
    }
}

fn normalize_separators(text: &str) -> String {
    let last_comma = text.rfind(',');
    let last_dot = text.rfind('.');

    match (last_comma, last_dot) {
        // 1.234,56
        (Some(comma), Some(dot)) if comma > dot => text.replace('.', "").replace(',', "."),
        // 12,50
        (Some(comma), None)
            if text.matches(',').count() == 1 && (1..=2).contains(&(text.len() - comma - 1)) =>
        {
            text.replace(',', ".")
        }
        _ => text.replace(',', ""),
    }
}

/// 两位小数 half-up 舍入
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// 格式化为固定两位小数字符串
pub fn format_money(value: Decimal) -> String {
    let mut rounded = round_money(value);
    rounded.rescale(2);
    rounded.to_string()
}

// ==========================================
// 数量
// ==========================================

/// 解析数量；缺失、非整数或 <= 0 时返回 None（调用方默认 1）
pub fn normalize_quantity(value: Option<&CellValue>) -> Option<u32> {
    match value? {
        CellValue::Empty => None,
        CellValue::Number(n) => whole_positive(*n),
        CellValue::Text(raw) => {
            let text: String = raw.trim().chars().filter(|c| *c != ',').collect();
            match text.parse::<u32>() {
                Ok(q) if q > 0 => Some(q),
                Ok(_) => None,
                Err(_) => text.parse::<f64>().ok().and_then(whole_positive),
            }
        }
    }
}

fn whole_positive(n: f64) -> Option<u32> {
    if n.is_finite() && n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn date(s: &str, order: DateOrder) -> String {
        format_sale_date(&normalize_date(&text(s), order).unwrap())
    }

    #[test]
    fn test_date_serial_midnight() {
        let dt = normalize_date(&CellValue::Number(44958.0), DateOrder::DayFirst).unwrap();
        assert_eq!(format_sale_date(&dt), "2023-02-01T00:00:00Z");
    }

    #[test]
    fn test_date_serial_fraction_is_time_of_day() {
        let dt = from_date_serial(44958.75).unwrap();
        assert_eq!(format_sale_date(&dt), "2023-02-01T18:00:00Z");

        // 文本形式的序列号
        assert_eq!(date("44958", DateOrder::DayFirst), "2023-02-01T00:00:00Z");
    }

    #[test]
    fn test_date_serial_out_of_range() {
        assert!(from_date_serial(0.0).is_err());
        assert!(from_date_serial(-5.0).is_err());
        assert!(from_date_serial(f64::NAN).is_err());
    }

    #[test]
    fn test_iso_formats() {
        assert_eq!(date("2024-03-01", DateOrder::DayFirst), "2024-03-01T00:00:00Z");
        assert_eq!(date("20240301", DateOrder::DayFirst), "2024-03-01T00:00:00Z");
        assert_eq!(date("2024-03-01T10:15:30", DateOrder::DayFirst), "2024-03-01T10:15:30Z");
        assert_eq!(date("2024-03-01 10:15", DateOrder::DayFirst), "2024-03-01T10:15:00Z");
        assert_eq!(date("2024-03-01T10:15:30Z", DateOrder::DayFirst), "2024-03-01T10:15:30Z");
    }

    #[test]
    fn test_offsets_converted_to_utc() {
        assert_eq!(
            date("2024-03-01 10:15:00 +0800", DateOrder::DayFirst),
            "2024-03-01T02:15:00Z"
        );
        assert_eq!(
            date("2024-03-01T01:00:00+08:00", DateOrder::DayFirst),
            "2024-02-29T17:00:00Z"
        );
    }

    #[test]
    fn test_locale_dates_resolved_unambiguously() {
        // 第一分量 > 12 → 日在前
        assert_eq!(date("25/03/2024", DateOrder::MonthFirst), "2024-03-25T00:00:00Z");
        // 第二分量 > 12 → 月在前
        assert_eq!(date("03/25/2024", DateOrder::DayFirst), "2024-03-25T00:00:00Z");
        assert_eq!(date("25.03.2024 14:30", DateOrder::DayFirst), "2024-03-25T14:30:00Z");
    }

    #[test]
    fn test_ambiguous_dates_follow_configured_order() {
        assert_eq!(date("04/05/2024", DateOrder::DayFirst), "2024-05-04T00:00:00Z");
        assert_eq!(date("04/05/2024", DateOrder::MonthFirst), "2024-04-05T00:00:00Z");
    }

    #[test]
    fn test_unparseable_dates() {
        assert!(normalize_date(&text("25/13/2024"), DateOrder::DayFirst).is_err());
        assert!(normalize_date(&text("31/02/2024"), DateOrder::DayFirst).is_err());
        assert!(normalize_date(&text("yesterday"), DateOrder::DayFirst).is_err());
        // 单独的年份不按序列号解释
        assert!(normalize_date(&text("2024"), DateOrder::DayFirst).is_err());
        assert!(normalize_date(&CellValue::Number(2024.0), DateOrder::DayFirst).is_err());
        assert!(normalize_date(&CellValue::Empty, DateOrder::DayFirst).is_err());
    }

    #[test]
    fn test_money_currency_stripping() {
        let parse = |s: &str| format_money(normalize_money(&text(s)).unwrap());

        assert_eq!(parse("HK$50.00"), "50.00");
        assert_eq!(parse("$1,234.5"), "1234.50");
        assert_eq!(parse("USD 12"), "12.00");
        assert_eq!(parse("€ 9,99"), "9.99");
        assert_eq!(parse("1.234,56 EUR"), "1234.56");
        assert_eq!(parse("HKD 1 200.00"), "1200.00");
        assert_eq!(parse("US$ 8"), "8.00");
        assert_eq!(parse("12 hkd"), "12.00");
    }

    #[test]
    fn test_money_signs() {
        let parse = |s: &str| format_money(normalize_money(&text(s)).unwrap());

        assert_eq!(parse("-$5.00"), "-5.00");
        assert_eq!(parse("$-5.00"), "-5.00");
        assert_eq!(parse("(12.50)"), "-12.50");
    }

    #[test]
    fn test_money_residue_rejected() {
        assert!(normalize_money(&text("N/A")).is_err());
        assert!(normalize_money(&text("12abc")).is_err());
        assert!(normalize_money(&text("$")).is_err());
        assert!(normalize_money(&text("1.2.3")).is_err());
        // 任意字母前缀不是货币代码
        assert!(normalize_money(&text("abc12")).is_err());
        assert!(normalize_money(&text("ca 10")).is_err());
        assert!(normalize_money(&text("12 abc")).is_err());
    }

    #[test]
    fn test_money_outside_supported_range() {
        let err = normalize_money(&text("70000000000000000000000000000")).unwrap_err();
        assert!(err.contains("exceeds the supported amount range"));
        assert!(normalize_money(&CellValue::Number(7e28)).is_err());
        assert!(normalize_money(&text("-1000000000000001")).is_err());
        assert_eq!(
            format_money(normalize_money(&text("1000000000000000")).unwrap()),
            "1000000000000000.00"
        );
    }

    #[test]
    fn test_money_rounding_half_up() {
        assert_eq!(format_money(Decimal::from_str("2.345").unwrap()), "2.35");
        assert_eq!(format_money(Decimal::from_str("2.344").unwrap()), "2.34");
        assert_eq!(format_money(Decimal::from(100)), "100.00");
        assert_eq!(format_money(normalize_money(&CellValue::Number(19.9)).unwrap()), "19.90");
    }

    #[test]
    fn test_quantity() {
        assert_eq!(normalize_quantity(Some(&text("3"))), Some(3));
        assert_eq!(normalize_quantity(Some(&text("1,200"))), Some(1200));
        assert_eq!(normalize_quantity(Some(&CellValue::Number(2.0))), Some(2));
        assert_eq!(normalize_quantity(Some(&text("2.0"))), Some(2));
        assert_eq!(normalize_quantity(Some(&text("2.5"))), None);
        assert_eq!(normalize_quantity(Some(&text("0"))), None);
        assert_eq!(normalize_quantity(Some(&text("-1"))), None);
        assert_eq!(normalize_quantity(Some(&text("three"))), None);
        assert_eq!(normalize_quantity(None), None);
    }
}
