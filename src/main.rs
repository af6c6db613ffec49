// ==========================================
// 销售导入 - 命令行入口
// ==========================================
// 用法:
//   sales-import <FILE> --roster <roster.json> [--config <config.json>] [--sheet <name>]
// 输出: RunResult + 员工汇总（JSON，stdout）
// 退出码: 结构性失败时为 1
// ==========================================

use anyhow::{Context, Result};
use clap::Parser;
use sales_import::config::ConfigManager;
use sales_import::domain::{Roster, RunResult, SalesSummary};
use sales_import::importer::{summarize, SalesImportPipeline};
use sales_import::logging;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "sales-import", version, about = "Import a sales export and reconcile it against a staff roster")]
struct Cli {
    /// 销售导出文件（.csv/.tsv/.txt/.xlsx/.xls/.xlsm/.ods）
    file: PathBuf,

    /// 员工名册 JSON：条目数组或 "标识 → 用户 ID" 对象
    #[arg(long)]
    roster: PathBuf,

    /// 导入配置 JSON（import.* 键）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 工作表名（缺省取第一个工作表）
    #[arg(long)]
    sheet: Option<String>,

    /// 紧凑 JSON 输出
    #[arg(long)]
    compact: bool,

    /// JSON 行格式日志
    #[arg(long)]
    log_json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    #[serde(flatten)]
    result: &'a RunResult,
    summary: SalesSummary,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(version = sales_import::VERSION, file = %cli.file.display(), "sales-import 启动");

    let config = match &cli.config {
        Some(path) => ConfigManager::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ConfigManager::new(),
    };
    let pipeline = SalesImportPipeline::from_config(&config)?;

    let roster_json = std::fs::read_to_string(&cli.roster)
        .with_context(|| format!("failed to read roster {}", cli.roster.display()))?;
    let roster = Roster::from_json_str(&roster_json)?;

    let result = pipeline
        .run_file(&cli.file, cli.sheet.clone(), &roster)
        .with_context(|| format!("failed to import {}", cli.file.display()))?;

    let report = Report {
        result: &result,
        summary: summarize(&result.records),
    };
    let output = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", output);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
