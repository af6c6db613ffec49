// ==========================================
// 销售导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 结构性错误由编排器转为诊断；RosterEmpty 属调用方编程错误
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 结构性错误 =====
    #[error("Input is empty: no header row found")]
    EmptyInput,

    #[error("Missing required column(s): {}", .missing.join(", "))]
    MissingRequiredHeaders {
        missing: Vec<String>,
        header_line: usize,
    },

    // ===== 文件相关错误（外部读取协作方） =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (expected .csv/.tsv/.txt/.xlsx/.xls/.xlsm/.ods)")]
    UnsupportedFormat(String),

    #[error("File read failed: {0}")]
    FileReadError(String),

    #[error("Workbook parse failed: {0}")]
    ExcelParseError(String),

    #[error("Delimited text parse failed: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error("Invalid config value (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    #[error("Config parse failed: {0}")]
    ConfigParseError(String),

    // ===== 调用方错误 =====
    #[error("Roster is empty: no staff to reconcile against")]
    RosterEmpty,

    #[error("Roster parse failed: {0}")]
    RosterParseError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 结构性错误：整次导入作废，但以诊断形式返回
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyInput | ImportError::MissingRequiredHeaders { .. }
        )
    }

    /// 结构性诊断所指的源行号（1 基）：缺列指向表头行，空输入指向第 1 行
    pub fn structural_row(&self) -> usize {
        match self {
            ImportError::MissingRequiredHeaders { header_line, .. } => (*header_line).max(1),
            _ => 1,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ConfigParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_headers_message_lists_columns() {
        let err = ImportError::MissingRequiredHeaders {
            missing: vec!["Date".to_string(), "Salesperson".to_string()],
            header_line: 3,
        };
        assert_eq!(err.to_string(), "Missing required column(s): Date, Salesperson");
        assert!(err.is_structural());
        assert_eq!(err.structural_row(), 3);
    }

    #[test]
    fn test_empty_input_points_at_first_line() {
        assert_eq!(ImportError::EmptyInput.structural_row(), 1);
    }

    #[test]
    fn test_anyhow_error_is_wrapped_transparently() {
        let err: ImportError = anyhow::anyhow!("roster service unavailable").into();

        assert!(matches!(err, ImportError::Other(_)));
        assert_eq!(err.to_string(), "roster service unavailable");
        assert!(!err.is_structural());
    }

    #[test]
    fn test_roster_empty_is_not_structural() {
        assert!(!ImportError::RosterEmpty.is_structural());
        assert!(ImportError::EmptyInput.to_string().contains("empty"));
    }
}
