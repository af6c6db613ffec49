// ==========================================
// 销售导入 - 导入编排器
// ==========================================
// 流程: 解析 → 表头识别/结构校验 → 逐行对账 → 汇集结果
// 红线:
//   - 同一输入 + 同一名册 + 同一配置 → 完全相同的输出
//   - 结构性失败 → success=false 且无部分记录
//   - 行级问题只产生诊断，不影响 success
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::roster::Roster;
use crate::domain::sale::{Diagnostic, RunResult};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, ExcelParser, SourceTable, UniversalFileParser};
use crate::importer::ingestion::ingest;
use crate::importer::row_reconciler::{RowOutcome, RowReconciler};
use calamine::{Data, Range};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

// ==========================================
// SalesImportPipeline - 销售导入编排器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SalesImportPipeline {
    settings: ImportSettings,
}

impl SalesImportPipeline {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    /// 从配置读取器构建（缺失键取默认值）
    pub fn from_config<C: ImportConfigReader + ?Sized>(config: &C) -> ImportResult<Self> {
        Ok(Self::new(ImportSettings::load(config)?))
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// 分隔文本导入
    pub fn run_csv(&self, text: &str, roster: &Roster) -> ImportResult<RunResult> {
        let table = CsvParser::new(self.settings.delimiter).parse_text(text)?;
        self.run(&table, roster)
    }

    /// 工作表导入（已由调用方打开的单元格区域）
    pub fn run_sheet(&self, range: &Range<Data>, roster: &Roster) -> ImportResult<RunResult> {
        let table = ExcelParser::parse_range(range);
        self.run(&table, roster)
    }

    /// 磁盘文件导入（按扩展名选择解析器）
    pub fn run_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        sheet_name: Option<String>,
        roster: &Roster,
    ) -> ImportResult<RunResult> {
        let parser = UniversalFileParser {
            delimiter: self.settings.delimiter,
            sheet_name,
        };
        let table = parser.parse(file_path)?;
        self.run(&table, roster)
    }

    /// 对已解析的表格执行一次完整导入
    ///
    /// # 返回
    /// - Ok(RunResult): 包括结构性失败（success=false）
    /// - Err(RosterEmpty): 名册为空，属调用方错误
    #[instrument(skip_all, fields(source_rows = table.rows.len(), roster_size = roster.len()))]
    pub fn run(&self, table: &SourceTable, roster: &Roster) -> ImportResult<RunResult> {
        if roster.is_empty() {
            return Err(ImportError::RosterEmpty);
        }
        let start_time = Instant::now();

        // === 步骤 1: 表头识别与结构校验 ===
        let ingested = match ingest(table) {
            Ok(ingested) => ingested,
            Err(e) if e.is_structural() => {
                warn!(error = %e, "结构校验失败，整次导入作废");
                return Ok(RunResult::structural_failure(Diagnostic::error(
                    e.structural_row(),
                    e.to_string(),
                )));
            }
            Err(e) => return Err(e),
        };
        debug!(
            header_line = ingested.header_line,
            data_rows = ingested.rows.len(),
            "表头识别完成"
        );

        // === 步骤 2: 逐行对账（按行号顺序） ===
        let reconciler = RowReconciler::new(roster, self.settings);
        let mut result = RunResult {
            success: true,
            records: Vec::with_capacity(ingested.rows.len()),
            warnings: ingested.warnings,
            errors: Vec::new(),
        };

        for row in &ingested.rows {
            match reconciler.reconcile(row) {
                RowOutcome::Accepted { record, warnings } => {
                    result.records.push(record);
                    result.warnings.extend(warnings);
                }
                RowOutcome::Skipped(diagnostic) => {
                    debug!(row = row.row_index, message = %diagnostic.message, "行已跳过");
                    result.warnings.push(diagnostic);
                }
                RowOutcome::Rejected(diagnostic) => {
                    debug!(row = row.row_index, message = %diagnostic.message, "行已拒绝");
                    result.errors.push(diagnostic);
                }
            }
        }

        info!(
            accepted = result.records.len(),
            warnings = result.warnings.len(),
            errors = result.errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "销售导入完成"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::RosterEntry;
    use crate::domain::sale::DiagnosticKind;

    fn roster() -> Roster {
        Roster::from_entries(vec![
            RosterEntry {
                identifier: "alice@shop.hk".to_string(),
                display_name: "alice".to_string(),
                user_id: 1,
            },
            RosterEntry {
                identifier: "bob@shop.hk".to_string(),
                display_name: "bob".to_string(),
                user_id: 2,
            },
        ])
    }

    #[test]
    fn test_empty_roster_is_caller_error() {
        let result = SalesImportPipeline::default().run_csv("Date,Staff,Total\n", &Roster::default());
        assert!(matches!(result, Err(ImportError::RosterEmpty)));
    }

    #[test]
    fn test_structural_failure_has_no_records() {
        let result = SalesImportPipeline::default()
            .run_csv("Staff,Total\nalice,10\n", &roster())
            .unwrap();

        assert!(!result.success);
        assert!(result.records.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, DiagnosticKind::Error);
        assert_eq!(result.errors[0].row_index, 1);
        assert!(result.errors[0].message.contains("Date"));
    }

    #[test]
    fn test_structural_failure_points_at_header_line() {
        // 首行全空单元格，表头在第 2 行
        let result = SalesImportPipeline::default()
            .run_csv(",,\nStaff,Total\nalice,10\n", &roster())
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.errors[0].row_index, 2);
    }

    #[test]
    fn test_empty_input_points_at_first_line() {
        let result = SalesImportPipeline::default().run_csv("", &roster()).unwrap();

        assert!(!result.success);
        assert_eq!(result.errors[0].row_index, 1);
    }

    #[test]
    fn test_diagnostics_follow_row_order() {
        let csv = "Date,Staff,Total,Amount\n\
                   2024-03-01,carol,10,\n\
                   not a date,alice,10,\n\
                   2024-03-03,alice,12,\n";
        let result = SalesImportPipeline::default().run_csv(csv, &roster()).unwrap();

        assert!(result.success);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].row_index, 4);
        // 表头警告在前，行警告随后
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].row_index, 1);
        assert_eq!(result.warnings[1].row_index, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row_index, 3);
    }
}
