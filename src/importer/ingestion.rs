// ==========================================
// 销售导入 - 表格摄取
// ==========================================
// 阶段 1: SourceTable → 表头识别 → RawRow 序列
// 规则: 首个非空行为表头；完全空白的数据行跳过（行号保留）
// ==========================================

use crate::domain::sale::{CellValue, Diagnostic, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::SourceTable;
use crate::importer::header_matcher::{ColumnBinding, HeaderMap};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub header_line: usize,
    pub header_map: HeaderMap,
    pub rows: Vec<RawRow>,
    /// 表头级警告（重复映射）
    pub warnings: Vec<Diagnostic>,
}

/// 摄取整张表
///
/// # 返回
/// - Err(EmptyInput): 无任何非空行
/// - Err(MissingRequiredHeaders): 缺少 Date / 销售员 / 数量金额列
pub fn ingest(table: &SourceTable) -> ImportResult<IngestedTable> {
    let header_pos = table
        .rows
        .iter()
        .position(|row| !row.is_blank())
        .ok_or(ImportError::EmptyInput)?;
    let header_row = &table.rows[header_pos];

    let headers: Vec<String> = header_row
        .cells
        .iter()
        .map(|cell| cell.as_text().unwrap_or_default())
        .collect();

    let (header_map, warnings) = HeaderMap::build(&headers, header_row.line);
    debug!(
        header_line = header_row.line,
        recognized = ?header_map.recognized.keys().collect::<Vec<_>>(),
        "表头识别完成"
    );

    header_map.validate_required()?;

    let rows = table.rows[header_pos + 1..]
        .iter()
        .filter(|row| !row.is_blank())
        .map(|row| bind_row(&header_map, row.line, &row.cells))
        .collect();

    Ok(IngestedTable {
        header_line: header_row.line,
        header_map,
        rows,
        warnings,
    })
}

// 按表头绑定单元格；超出表头宽度的单元格归入未识别
fn bind_row(header_map: &HeaderMap, line: usize, cells: &[CellValue]) -> RawRow {
    let mut row = RawRow::new(line);

    for (col_idx, cell) in cells.iter().enumerate() {
        match header_map.bindings.get(col_idx) {
            Some(ColumnBinding::Canonical(key)) => {
                row.values.insert(*key, cell.clone());
            }
            Some(ColumnBinding::Unrecognized(name)) => {
                row.unrecognized.push((name.clone(), cell.clone()));
            }
            Some(ColumnBinding::Duplicate(_)) | Some(ColumnBinding::Blank) => {}
            None => {
                if !cell.is_empty() {
                    row.unrecognized
                        .push((format!("Column {}", col_idx + 1), cell.clone()));
                }
            }
        }
    }

    row
}
