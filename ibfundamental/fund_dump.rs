// fund_dump.rs
// Use it like this:
// fund_dump revenue --dir ./reports/AAPL --report-type TTM --pretty
// fund_dump all --fin-summary ReportsFinSummary.xml --snapshot ReportSnapshot.xml
// With --dir, files are looked up as <ReportName>.xml (ReportsOwnership.xml, RESC.xml, ...).

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use ibfundamental::{
  data::{FundamentalReportType, Period, ReportType},
  DocumentBundle, FundamentalParser, ParserConfig, Table, TableRecord,
};
use log::{debug, error, info};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

// --- CLI Argument Parsing ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Dump extracted IBKR fundamental data as JSON", long_about = None)]
struct Args {
  /// Extraction to run, or "all".
  #[arg(value_enum)]
  operation: Operation,

  /// Directory holding <ReportName>.xml files.
  #[arg(long)]
  dir: Option<PathBuf>,

  /// ReportsOwnership document (overrides --dir).
  #[arg(long)]
  ownership: Option<PathBuf>,

  /// ReportsFinSummary document (overrides --dir).
  #[arg(long)]
  fin_summary: Option<PathBuf>,

  /// ReportSnapshot document (overrides --dir).
  #[arg(long)]
  snapshot: Option<PathBuf>,

  /// RESC document (overrides --dir).
  #[arg(long)]
  resc: Option<PathBuf>,

  /// Keep only entries with this reportType (A, TTM, R, P).
  #[arg(long)]
  report_type: Option<ReportType>,

  /// Keep only entries with this period (12M, 3M).
  #[arg(long)]
  period: Option<Period>,

  /// Disable result memoization.
  #[arg(long)]
  no_cache: bool,

  /// Pretty-print the JSON output.
  #[arg(long)]
  pretty: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
  Ownership,
  Dividends,
  DividendPerShare,
  Revenue,
  Eps,
  Forecast,
  Ratios,
  FyEstimates,
  FyActuals,
  All,
}

impl Operation {
  const EXTRACTIONS: [Operation; 9] = [
    Operation::Ownership,
    Operation::Dividends,
    Operation::DividendPerShare,
    Operation::Revenue,
    Operation::Eps,
    Operation::Forecast,
    Operation::Ratios,
    Operation::FyEstimates,
    Operation::FyActuals,
  ];

  fn name(&self) -> &'static str {
    match self {
      Operation::Ownership => "ownership",
      Operation::Dividends => "dividends",
      Operation::DividendPerShare => "dividend-per-share",
      Operation::Revenue => "revenue",
      Operation::Eps => "eps",
      Operation::Forecast => "forecast",
      Operation::Ratios => "ratios",
      Operation::FyEstimates => "fy-estimates",
      Operation::FyActuals => "fy-actuals",
      Operation::All => "all",
    }
  }
}

// --- Bundle assembly ---

fn load_report(bundle: DocumentBundle, kind: FundamentalReportType, path: &Path) -> Result<DocumentBundle> {
  let xml_data = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read {} report from {:?}", kind, path))?;
  info!("Loaded {} report from {:?} ({} bytes)", kind, path, xml_data.len());
  bundle
    .with_xml(kind, &xml_data)
    .with_context(|| format!("Failed to parse {} report from {:?}", kind, path))
}

fn build_bundle(args: &Args) -> Result<DocumentBundle> {
  let mut bundle = match &args.dir {
    Some(dir) => DocumentBundle::from_dir(dir).with_context(|| format!("Failed to load reports from {:?}", dir))?,
    None => DocumentBundle::new(),
  };
  let overrides = [
    (FundamentalReportType::ReportsOwnership, &args.ownership),
    (FundamentalReportType::ReportsFinSummary, &args.fin_summary),
    (FundamentalReportType::ReportSnapshot, &args.snapshot),
    (FundamentalReportType::RESC, &args.resc),
  ];
  for (kind, path) in overrides {
    if let Some(path) = path {
      bundle = load_report(bundle, kind, path)?;
    }
  }
  if bundle.available().is_empty() {
    return Err(anyhow!("No reports supplied; use --dir or one of the per-report flags"));
  }
  Ok(bundle)
}

// --- Extraction ---

fn table<T: TableRecord>(records: &[T]) -> Result<Value> {
  Ok(serde_json::to_value(Table::from_records(records)?)?)
}

fn run(parser: &FundamentalParser, op: Operation, args: &Args) -> Result<Value> {
  let (rt, period) = (args.report_type, args.period);
  debug!("Running {} (report_type={:?}, period={:?})", op.name(), rt, period);
  let value = match op {
    Operation::Ownership => {
      let report = parser.ownership_report()?;
      json!({
        "company": report.company,
        "owners": table(&report.ownership_details)?,
      })
    }
    Operation::Dividends => match parser.dividends()? {
      Some(dividends) => table(&dividends)?,
      None => Value::Null,
    },
    Operation::DividendPerShare => match parser.dividend_per_share(rt, period)? {
      Some(dps) => table(&dps)?,
      None => Value::Null,
    },
    Operation::Revenue => table(&parser.revenue(rt, period)?)?,
    Operation::Eps => table(&parser.eps(rt, period)?)?,
    Operation::Forecast => Value::Object(parser.analyst_forecast()?.to_row()?),
    Operation::Ratios => Value::Object(parser.ratio_snapshot()?.to_row()?),
    Operation::FyEstimates => table(&parser.forward_estimates()?)?,
    Operation::FyActuals => table(&parser.forward_actuals()?)?,
    Operation::All => return Err(anyhow!("'all' is not a single extraction")),
  };
  Ok(value)
}

// --- Main Execution Logic ---
fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let args = Args::parse();

  let bundle = build_bundle(&args)?;
  let config = ParserConfig { memoize: !args.no_cache, ..Default::default() };
  let parser = FundamentalParser::with_config(bundle, config);

  let output = if args.operation == Operation::All {
    // Extractions whose report is missing are reported inline rather than aborting the run.
    let mut results = Map::new();
    let mut failures = 0;
    for op in Operation::EXTRACTIONS {
      let value = match run(&parser, op, &args) {
        Ok(v) => v,
        Err(e) => {
          error!("{} FAILED: {:#}", op.name(), e);
          failures += 1;
          json!({ "error": format!("{:#}", e) })
        }
      };
      results.insert(op.name().to_string(), value);
    }
    info!("Ran {} extractions, {} failed", Operation::EXTRACTIONS.len(), failures);
    Value::Object(results)
  } else {
    run(&parser, args.operation, &args).with_context(|| format!("{} extraction failed", args.operation.name()))?
  };

  let text = if args.pretty {
    serde_json::to_string_pretty(&output)?
  } else {
    serde_json::to_string(&output)?
  };
  println!("{}", text);
  Ok(())
}
