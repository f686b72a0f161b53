// ibfundamental/src/financial_report_parser.rs
//! Extraction of typed records from the report trees of a `DocumentBundle`.
//!
//! Every function here is a pure read of the bundle. Results keep document
//! order. A function either returns a fully built value or fails; nothing is
//! partially populated.

use crate::base::FundamentalError;
use crate::bundle::DocumentBundle;
use crate::coerce::{normalize_field_name, parse_count, parse_date, parse_float, parse_int, parse_timestamp};
use crate::data::{
  AnalystForecast, Dividend, DividendPerShare, EarningsPerShare, ForwardYear, ForwardYearKind,
  FundamentalReportType, OwnershipCompany, OwnershipDetails, OwnershipReport, Period, RatioSnapshot,
  RatioValue, ReportType, Revenue,
};
use crate::xml_tree::XmlElement;
use chrono::NaiveDate;
use log::{debug, trace, warn};

/// Selection along the two report dimensions. `None` on an axis means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DimensionFilter {
  pub report_type: Option<ReportType>,
  pub period: Option<Period>,
}

impl DimensionFilter {
  pub fn new(report_type: Option<ReportType>, period: Option<Period>) -> Self {
    DimensionFilter { report_type, period }
  }

  /// Compares raw attribute tokens, so excluded siblings are never coerced.
  pub fn matches(&self, node: &XmlElement) -> bool {
    let type_ok = self.report_type.map_or(true, |rt| node.attr("reportType") == Some(rt.as_str()));
    let period_ok = self.period.map_or(true, |p| node.attr("period") == Some(p.as_str()));
    type_ok && period_ok
  }
}

// --- Node helpers ---

fn required_attr<'a>(node: &'a XmlElement, key: &str) -> Result<&'a str, FundamentalError> {
  node.attr(key).ok_or_else(|| {
    FundamentalError::MissingField(format!("<{}> has no '{}' attribute", node.name(), key))
  })
}

fn required_date_attr(node: &XmlElement, key: &str) -> Result<NaiveDate, FundamentalError> {
  parse_date(required_attr(node, key)?)?.ok_or_else(|| {
    FundamentalError::MissingField(format!("<{}> has an empty '{}' date", node.name(), key))
  })
}

fn optional_date_attr(node: &XmlElement, key: &str) -> Result<Option<NaiveDate>, FundamentalError> {
  match node.attr(key) {
    Some(token) => parse_date(token),
    None => Ok(None),
  }
}

fn i32_attr(node: &XmlElement, key: &str) -> Result<i32, FundamentalError> {
  let raw = parse_int(required_attr(node, key)?)?;
  i32::try_from(raw)
    .map_err(|_| FundamentalError::Format(format!("<{}> '{}' out of range: {}", node.name(), key, raw)))
}

fn non_empty(text: &str) -> Option<String> {
  if text.is_empty() { None } else { Some(text.to_string()) }
}

/// The single direct child `tag` of `parent`; zero or several is a structural failure.
fn exactly_one<'a>(parent: &'a XmlElement, tag: &str) -> Result<&'a XmlElement, FundamentalError> {
  let mut matches = parent.children_named(tag);
  match (matches.next(), matches.next()) {
    (Some(node), None) => Ok(node),
    (None, _) => Err(FundamentalError::MissingSection(format!("<{}> not found in <{}>", tag, parent.name()))),
    (Some(_), Some(_)) => Err(FundamentalError::MissingSection(format!(
      "Expected exactly one <{}> in <{}>, found {}",
      tag, parent.name(), parent.children_named(tag).count()
    ))),
  }
}

fn section_currency(section: &XmlElement) -> Result<String, FundamentalError> {
  required_attr(section, "currency").map(str::to_string)
}

// --- ReportsOwnership ---

pub fn extract_ownership_report(bundle: &DocumentBundle) -> Result<OwnershipReport, FundamentalError> {
  let root = bundle.require(FundamentalReportType::ReportsOwnership)?;
  debug!("Extracting ownership report from <{}>", root.name());

  let isin_node = exactly_one(root, "ISIN")?;
  let float_node = exactly_one(root, "floatShares")?;
  let isin = non_empty(isin_node.text())
    .ok_or_else(|| FundamentalError::MissingField("<ISIN> is empty".into()))?;
  let company = OwnershipCompany {
    isin,
    float_shares: parse_count(float_node.text())?,
    as_of_date: parse_date(required_attr(float_node, "asofDate")?)?,
  };

  let ownership_details = root
    .children_named("Owner")
    .map(parse_owner)
    .collect::<Result<Vec<_>, _>>()?;
  debug!("Ownership report for {}: {} owners", company.isin, ownership_details.len());

  Ok(OwnershipReport { company, ownership_details })
}

fn parse_owner(owner: &XmlElement) -> Result<OwnershipDetails, FundamentalError> {
  let mut details = OwnershipDetails {
    owner_id: required_attr(owner, "ownerId")?.to_string(),
    ..Default::default()
  };
  // Only the first dated child decides the row's date; later dates are ignored.
  let mut date_taken = false;

  for field in owner.children() {
    if !date_taken {
      if let Some(token) = field.attr("asofDate") {
        details.as_of_date = parse_date(token)?;
        date_taken = true;
      }
    }
    match field.name() {
      "quantity" => details.quantity = Some(parse_float(field.text())?),
      "type" => details.owner_type = non_empty(field.text()),
      "name" => details.name = non_empty(field.text()),
      "currency" => details.currency = non_empty(field.text()),
      other => {
        trace!("Owner {}: keeping extra field <{}>", details.owner_id, other);
        details.other_fields.insert(other.to_string(), field.text().to_string());
      }
    }
  }
  Ok(details)
}

// --- ReportsFinSummary ---

/// One `asofDate`/`reportType`/`period`-tagged value, before it is given its record type.
struct DimensionedRow {
  as_of_date: NaiveDate,
  report_type: ReportType,
  period: Period,
  currency: String,
  value: f64,
}

fn collect_dimensioned(
  section: &XmlElement,
  item_tag: &str,
  filter: DimensionFilter,
) -> Result<Vec<DimensionedRow>, FundamentalError> {
  let currency = section_currency(section)?;
  let rows = section
    .children_named(item_tag)
    .filter(|node| filter.matches(node))
    .map(|node| -> Result<DimensionedRow, FundamentalError> {
      Ok(DimensionedRow {
        as_of_date: required_date_attr(node, "asofDate")?,
        report_type: required_attr(node, "reportType")?.parse()?,
        period: required_attr(node, "period")?.parse()?,
        currency: currency.clone(),
        value: parse_float(node.text())?,
      })
    })
    .collect::<Result<Vec<_>, _>>()?;
  debug!("<{}>: {} rows match {:?}", section.name(), rows.len(), filter);
  Ok(rows)
}

/// The financial-summary container `tag`, or None when the section or the whole report is missing.
fn optional_summary_section<'a>(bundle: &'a DocumentBundle, tag: &str) -> Option<&'a XmlElement> {
  let Some(root) = bundle.tree(FundamentalReportType::ReportsFinSummary) else {
    warn!("ReportsFinSummary not available; no <{}> section", tag);
    return None;
  };
  let section = root.child(tag);
  if section.is_none() {
    debug!("<{}> section absent from financial summary", tag);
  }
  section
}

fn required_summary_section<'a>(bundle: &'a DocumentBundle, tag: &str) -> Result<&'a XmlElement, FundamentalError> {
  let root = bundle.require(FundamentalReportType::ReportsFinSummary)?;
  root.child(tag).ok_or_else(|| {
    FundamentalError::MissingSection(format!("<{}> not found in financial summary", tag))
  })
}

/// Announced dividends, or None when the report has no `Dividends` section.
pub fn extract_dividends(bundle: &DocumentBundle) -> Result<Option<Vec<Dividend>>, FundamentalError> {
  let Some(section) = optional_summary_section(bundle, "Dividends") else {
    return Ok(None);
  };
  let currency = section_currency(section)?;
  let dividends = section
    .children_named("Dividend")
    .map(|node| -> Result<Dividend, FundamentalError> {
      Ok(Dividend {
        dividend_type: node.attr("type").and_then(non_empty),
        ex_date: optional_date_attr(node, "exDate")?,
        record_date: optional_date_attr(node, "recordDate")?,
        pay_date: optional_date_attr(node, "payDate")?,
        declaration_date: optional_date_attr(node, "declarationDate")?,
        currency: currency.clone(),
        value: match node.text() {
          "" => None,
          text => Some(parse_float(text)?),
        },
      })
    })
    .collect::<Result<Vec<_>, _>>()?;
  debug!("Extracted {} dividends", dividends.len());
  Ok(Some(dividends))
}

/// Dividend-per-share history, or None when the report has no `DividendPerShares` section.
pub fn extract_dividend_per_share(
  bundle: &DocumentBundle,
  report_type: Option<ReportType>,
  period: Option<Period>,
) -> Result<Option<Vec<DividendPerShare>>, FundamentalError> {
  let Some(section) = optional_summary_section(bundle, "DividendPerShares") else {
    return Ok(None);
  };
  let rows = collect_dimensioned(section, "DividendPerShare", DimensionFilter::new(report_type, period))?;
  Ok(Some(
    rows
      .into_iter()
      .map(|r| DividendPerShare {
        as_of_date: r.as_of_date,
        report_type: r.report_type,
        period: r.period,
        currency: r.currency,
        value: r.value,
      })
      .collect(),
  ))
}

pub fn extract_revenue(
  bundle: &DocumentBundle,
  report_type: Option<ReportType>,
  period: Option<Period>,
) -> Result<Vec<Revenue>, FundamentalError> {
  let section = required_summary_section(bundle, "TotalRevenues")?;
  let rows = collect_dimensioned(section, "TotalRevenue", DimensionFilter::new(report_type, period))?;
  Ok(
    rows
      .into_iter()
      .map(|r| Revenue {
        as_of_date: r.as_of_date,
        report_type: r.report_type,
        period: r.period,
        currency: r.currency,
        revenue: r.value,
      })
      .collect(),
  )
}

pub fn extract_eps(
  bundle: &DocumentBundle,
  report_type: Option<ReportType>,
  period: Option<Period>,
) -> Result<Vec<EarningsPerShare>, FundamentalError> {
  let section = required_summary_section(bundle, "EPSs")?;
  let rows = collect_dimensioned(section, "EPS", DimensionFilter::new(report_type, period))?;
  Ok(
    rows
      .into_iter()
      .map(|r| EarningsPerShare {
        as_of_date: r.as_of_date,
        report_type: r.report_type,
        period: r.period,
        currency: r.currency,
        eps: r.value,
      })
      .collect(),
  )
}

// --- ReportSnapshot ---

pub fn extract_analyst_forecast(bundle: &DocumentBundle) -> Result<AnalystForecast, FundamentalError> {
  let root = bundle.require(FundamentalReportType::ReportSnapshot)?;
  if root.select("ForecastData").is_empty() {
    return Err(FundamentalError::MissingSection("<ForecastData> not found in snapshot".into()));
  }
  let mut forecast = AnalystForecast::default();
  for ratio in root.select("ForecastData/Ratio") {
    let field = required_attr(ratio, "FieldName")?;
    let value_node = ratio.child("Value").ok_or_else(|| {
      FundamentalError::MissingField(format!("Forecast ratio '{}' has no <Value>", field))
    })?;
    forecast.fields.insert(normalize_field_name(field), parse_float(value_node.text())?);
  }
  debug!("Extracted {} forecast fields", forecast.fields.len());
  Ok(forecast)
}

pub fn extract_ratio_snapshot(bundle: &DocumentBundle) -> Result<RatioSnapshot, FundamentalError> {
  let root = bundle.require(FundamentalReportType::ReportSnapshot)?;
  if root.select("Ratios").is_empty() {
    return Err(FundamentalError::MissingSection("<Ratios> not found in snapshot".into()));
  }
  let mut snapshot = RatioSnapshot::default();
  for ratio in root.select("Ratios/Group/Ratio") {
    let field = required_attr(ratio, "FieldName")?.to_lowercase();
    let value = if ratio.attr("Type") == Some("D") {
      match parse_date(ratio.text())? {
        Some(date) => RatioValue::Date(date),
        None => {
          debug!("Ratio '{}' has no date; leaving it out", field);
          continue;
        }
      }
    } else {
      RatioValue::Number(parse_float(ratio.text())?)
    };
    snapshot.fields.insert(field, value);
  }
  debug!("Extracted {} ratio fields", snapshot.fields.len());
  Ok(snapshot)
}

// --- RESC ---

/// Shared FYEstimate/FYActual and FYPeriod attributes of a forward-year record.
struct FiscalPeriod<'a> {
  item: &'a str,
  unit: &'a str,
  period_type: &'a str,
  fyear: i32,
  end_month: i32,
  end_cal_year: i32,
}

impl<'a> FiscalPeriod<'a> {
  fn read(item_node: &'a XmlElement, period_node: &'a XmlElement) -> Result<Self, FundamentalError> {
    Ok(FiscalPeriod {
      item: required_attr(item_node, "type")?,
      unit: required_attr(item_node, "unit")?,
      period_type: required_attr(period_node, "periodType")?,
      fyear: i32_attr(period_node, "fYear")?,
      end_month: i32_attr(period_node, "endMonth")?,
      end_cal_year: i32_attr(period_node, "endCalYear")?,
    })
  }

  fn record(&self, value: f64, kind: ForwardYearKind) -> ForwardYear {
    ForwardYear {
      item: self.item.to_string(),
      unit: self.unit.to_string(),
      period_type: self.period_type.to_string(),
      fyear: self.fyear,
      end_month: self.end_month,
      end_cal_year: self.end_cal_year,
      value,
      kind,
    }
  }
}

fn first_value_child<'a>(node: &'a XmlElement) -> Result<&'a XmlElement, FundamentalError> {
  node.children().first().ok_or_else(|| {
    FundamentalError::MissingField(format!("<{}> has no value element", node.name()))
  })
}

/// One record per `FYEstimate/FYPeriod/ConsEstimate`, in document order.
pub fn extract_forward_estimates(bundle: &DocumentBundle) -> Result<Vec<ForwardYear>, FundamentalError> {
  let root = bundle.require(FundamentalReportType::RESC)?;
  let mut records = Vec::new();
  for estimate in root.descendants_named("FYEstimate") {
    for period in estimate.descendants_named("FYPeriod") {
      let fiscal = FiscalPeriod::read(estimate, period)?;
      for cons in period.descendants_named("ConsEstimate") {
        let est_type = required_attr(cons, "type")?.to_string();
        let value = parse_float(first_value_child(cons)?.text())?;
        records.push(fiscal.record(value, ForwardYearKind::Estimate { est_type }));
      }
    }
  }
  debug!("Extracted {} forward-year estimates", records.len());
  Ok(records)
}

/// One record per `FYActual/FYPeriod`, taken from the period's first value element.
pub fn extract_forward_actuals(bundle: &DocumentBundle) -> Result<Vec<ForwardYear>, FundamentalError> {
  let root = bundle.require(FundamentalReportType::RESC)?;
  let mut records = Vec::new();
  for actual in root.descendants_named("FYActual") {
    for period in actual.descendants_named("FYPeriod") {
      let fiscal = FiscalPeriod::read(actual, period)?;
      let leaf = first_value_child(period)?;
      let updated = parse_timestamp(required_attr(leaf, "updated")?)?.ok_or_else(|| {
        FundamentalError::MissingField(format!("<{}> has an empty 'updated' timestamp", leaf.name()))
      })?;
      let value = parse_float(leaf.text())?;
      records.push(fiscal.record(value, ForwardYearKind::Actual { updated }));
    }
  }
  debug!("Extracted {} forward-year actuals", records.len());
  Ok(records)
}
