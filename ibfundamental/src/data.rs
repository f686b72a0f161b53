// ibfundamental/src/data.rs
// Typed records produced by the extraction engine

use crate::base::FundamentalError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// --- Report kinds and dimensions ---

/// The provider reports a bundle can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FundamentalReportType {
  /// Issuer float and beneficial owners. TWS String: "ReportsOwnership"
  ReportsOwnership,
  /// Dividends, DPS, revenue and EPS history. TWS String: "ReportsFinSummary"
  ReportsFinSummary,
  /// Company overview, ratios, forecast data. TWS String: "ReportSnapshot"
  ReportSnapshot,
  /// Analyst estimates and fiscal-year actuals. TWS String: "RESC"
  RESC,
}

impl FundamentalReportType {
  pub const ALL: [FundamentalReportType; 4] = [
    FundamentalReportType::ReportsOwnership,
    FundamentalReportType::ReportsFinSummary,
    FundamentalReportType::ReportSnapshot,
    FundamentalReportType::RESC,
  ];

  /// Returns the string representation used by the TWS API for this report type.
  pub fn as_tws_str(&self) -> &'static str {
    match self {
      FundamentalReportType::ReportsOwnership => "ReportsOwnership",
      FundamentalReportType::ReportsFinSummary => "ReportsFinSummary",
      FundamentalReportType::ReportSnapshot => "ReportSnapshot",
      FundamentalReportType::RESC => "RESC",
    }
  }
}

impl fmt::Display for FundamentalReportType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_tws_str())
  }
}

impl FromStr for FundamentalReportType {
  type Err = FundamentalError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    FundamentalReportType::ALL
      .into_iter()
      .find(|kind| kind.as_tws_str() == s)
      .ok_or_else(|| FundamentalError::Format(format!("Unknown report type: '{}'", s)))
  }
}

/// `reportType` attribute of a dimensioned financial-summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
  A,   // Annual
  TTM, // Trailing twelve months
  R,   // Reported (interim)
  P,   // Preliminary
}

impl ReportType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReportType::A => "A",
      ReportType::TTM => "TTM",
      ReportType::R => "R",
      ReportType::P => "P",
    }
  }
}

impl fmt::Display for ReportType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReportType {
  type Err = FundamentalError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "A" => Ok(ReportType::A),
      "TTM" => Ok(ReportType::TTM),
      "R" => Ok(ReportType::R),
      "P" => Ok(ReportType::P),
      _ => Err(FundamentalError::Format(format!("Unknown reportType: '{}'", s))),
    }
  }
}

/// `period` attribute of a dimensioned financial-summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
  #[serde(rename = "12M")]
  TwelveMonths,
  #[serde(rename = "3M")]
  ThreeMonths,
}

impl Period {
  pub fn as_str(&self) -> &'static str {
    match self {
      Period::TwelveMonths => "12M",
      Period::ThreeMonths => "3M",
    }
  }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Period {
  type Err = FundamentalError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "12M" => Ok(Period::TwelveMonths),
      "3M" => Ok(Period::ThreeMonths),
      _ => Err(FundamentalError::Format(format!("Unknown period: '{}'", s))),
    }
  }
}

// --- Structures for "ReportsOwnership" ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipCompany {
  pub isin: String,
  pub float_shares: u64,
  /// None when the provider sent the sentinel date "0".
  pub as_of_date: Option<NaiveDate>,
}

/// One beneficial-owner row of the ownership report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnershipDetails {
  pub owner_id: String,
  /// Taken from the first child element that carries an `asofDate` attribute.
  pub as_of_date: Option<NaiveDate>,
  #[serde(rename = "type")]
  pub owner_type: Option<String>,
  pub name: Option<String>,
  pub quantity: Option<f64>,
  pub currency: Option<String>,
  /// Any further child tags, by tag name, as text.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub other_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipReport {
  pub company: OwnershipCompany,
  pub ownership_details: Vec<OwnershipDetails>,
}

// --- Structures for "ReportsFinSummary" ---

/// An individual announced dividend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
  #[serde(rename = "type")]
  pub dividend_type: Option<String>, // e.g., "CD" (Cash Dividend)
  pub ex_date: Option<NaiveDate>,
  pub record_date: Option<NaiveDate>,
  pub pay_date: Option<NaiveDate>,
  pub declaration_date: Option<NaiveDate>,
  pub currency: String, // From parent <Dividends currency="USD">
  pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendPerShare {
  pub as_of_date: NaiveDate,
  pub report_type: ReportType,
  pub period: Period,
  pub currency: String,
  pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
  pub as_of_date: NaiveDate,
  pub report_type: ReportType,
  pub period: Period,
  pub currency: String,
  pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsPerShare {
  pub as_of_date: NaiveDate,
  pub report_type: ReportType,
  pub period: Period,
  pub currency: String,
  pub eps: f64,
}

// --- Structures for "ReportSnapshot" ---

/// Consensus forecast ratios keyed by snake-case field name (e.g. `target_price`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalystForecast {
  pub fields: BTreeMap<String, f64>,
}

impl AnalystForecast {
  pub fn get(&self, field: &str) -> Option<f64> {
    self.fields.get(field).copied()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatioValue {
  Number(f64),
  Date(NaiveDate),
}

impl RatioValue {
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      RatioValue::Number(v) => Some(*v),
      RatioValue::Date(_) => None,
    }
  }

  pub fn as_date(&self) -> Option<NaiveDate> {
    match self {
      RatioValue::Date(d) => Some(*d),
      RatioValue::Number(_) => None,
    }
  }
}

/// Company ratios keyed by lower-cased field name (e.g. `nprice`, `pdate`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatioSnapshot {
  pub fields: BTreeMap<String, RatioValue>,
}

impl RatioSnapshot {
  pub fn get(&self, field: &str) -> Option<&RatioValue> {
    self.fields.get(field)
  }
}

// --- Structures for "RESC" ---

/// Distinguishes consensus estimates from reported actuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForwardYearKind {
  Estimate {
    est_type: String, // "High", "Low", "Mean", "Median", "NumOfEst", "StdDev"
  },
  Actual {
    updated: DateTime<Utc>,
  },
}

/// A single fiscal-year data point from the RESC report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardYear {
  pub item: String,        // FYEstimate/FYActual `type`, e.g. "EPS", "Revenue"
  pub unit: String,        // "U" or "M"
  pub period_type: String, // "A" or "Q"
  pub fyear: i32,
  pub end_month: i32,
  pub end_cal_year: i32,
  pub value: f64,
  #[serde(flatten)]
  pub kind: ForwardYearKind,
}

impl ForwardYear {
  pub fn record_type(&self) -> &'static str {
    match self.kind {
      ForwardYearKind::Estimate { .. } => "Estimate",
      ForwardYearKind::Actual { .. } => "Actual",
    }
  }

  pub fn est_type(&self) -> Option<&str> {
    match &self.kind {
      ForwardYearKind::Estimate { est_type } => Some(est_type),
      ForwardYearKind::Actual { .. } => None,
    }
  }

  pub fn updated(&self) -> Option<DateTime<Utc>> {
    match self.kind {
      ForwardYearKind::Actual { updated } => Some(updated),
      ForwardYearKind::Estimate { .. } => None,
    }
  }
}
