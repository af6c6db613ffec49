// ==========================================
// 销售导入 - 文件解析器实现
// ==========================================
// 阶段 0: 源数据 → SourceTable（未识别表头的原始单元格网格）
// 支持: 分隔文本（, ; TAB |）/ 工作表（.xlsx/.xls/.xlsm/.ods）
// ==========================================

use crate::config::DelimiterSetting;
use crate::domain::sale::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

// ==========================================
// SourceTable - 原始单元格网格
// ==========================================
// line: 源文件中的 1-based 行号（多行引号字段不影响编号）
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub line: usize,
    pub cells: Vec<CellValue>,
}

impl SourceRow {
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTable {
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    /// 由内存行构建，行号按 1 起连续编号
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(idx, cells)| SourceRow {
                    line: idx + 1,
                    cells,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(SourceRow::is_blank)
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 外部读取协作方（CLI）从磁盘加载源文件
pub trait FileParser: Send + Sync {
    fn parse_file(&self, file_path: &Path) -> ImportResult<SourceTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser {
    delimiter: DelimiterSetting,
}

impl CsvParser {
    pub fn new(delimiter: DelimiterSetting) -> Self {
        Self { delimiter }
    }

    /// 解析分隔文本；引号内的分隔符不拆分字段
    pub fn parse_text(&self, text: &str) -> ImportResult<SourceTable> {
        // 去除 UTF-8 BOM
        let text = text.trim_start_matches('\u{FEFF}');

        let delimiter = match self.delimiter {
            DelimiterSetting::Fixed(d) => d,
            DelimiterSetting::Auto => detect_delimiter(text),
        };
        debug!(delimiter = %(delimiter as char).escape_default(), "分隔符确定");

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 1);
            let cells = record.iter().map(CellValue::from).collect();
            rows.push(SourceRow { line, cells });
        }

        Ok(SourceTable { rows })
    }
}

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<SourceTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let bytes = std::fs::read(file_path)?;
        let text = String::from_utf8_lossy(&bytes);
        self.parse_text(&text)
    }
}

/// 按首个非空行中引号外的出现次数选择分隔符，持平时取逗号
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = match text.lines().find(|l| !l.trim().is_empty()) {
        Some(line) => line,
        None => return b',',
    };

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in first_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(pos) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte) {
            counts[pos] += 1;
        }
    }

    let mut best = 0;
    for (idx, count) in counts.iter().enumerate() {
        if *count > counts[best] {
            best = idx;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExcelParser {
    /// 指定工作表；为空时读取第一个
    sheet_name: Option<String>,
}

impl ExcelParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }

    /// 已解码的工作表 → SourceTable，行号取工作表绝对行号
    pub fn parse_range(range: &Range<Data>) -> SourceTable {
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let rows = range
            .rows()
            .enumerate()
            .map(|(idx, cells)| SourceRow {
                line: first_row + idx + 1,
                cells: cells.iter().map(cell_value).collect(),
            })
            .collect();

        SourceTable { rows }
    }
}

impl FileParser for ExcelParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<SourceTable> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = match &self.sheet_name {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(Self::parse_range(&range))
    }
}

// 日期单元格按序列号输出，交给日期规范化统一处理
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::DateTime(dt) => CellValue::Number(sheet_date_serial(dt.as_f64(), dt.is_1904())),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::Text(b.to_string().to_uppercase()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

// 1904 日期系统的工作簿序列号统一换算到 1900 系统
const DATE_1904_OFFSET_DAYS: f64 = 1462.0;

fn sheet_date_serial(serial: f64, is_1904: bool) -> f64 {
    if is_1904 {
        serial + DATE_1904_OFFSET_DAYS
    } else {
        serial
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UniversalFileParser {
    pub delimiter: DelimiterSetting,
    pub sheet_name: Option<String>,
}

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<SourceTable> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => CsvParser::new(self.delimiter).parse_file(path),
            "tsv" => {
                let delimiter = match self.delimiter {
                    DelimiterSetting::Auto => DelimiterSetting::Fixed(b'\t'),
                    fixed => fixed,
                };
                CsvParser::new(delimiter).parse_file(path)
            }
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => {
                ExcelParser::new(self.sheet_name.clone()).parse_file(path)
            }
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
