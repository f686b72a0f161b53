// ibfundamental/src/parser.rs
//! Per-bundle parser with memoized extraction.
//!
//! A `FundamentalParser` owns one immutable `DocumentBundle` and a small LRU
//! cache of extraction results. Cached and uncached calls return equal
//! values; a cache hit additionally hands back the same `Arc` as the first
//! call. Failed extractions are never cached.

use crate::base::FundamentalError;
use crate::bundle::DocumentBundle;
use crate::data::{
  AnalystForecast, Dividend, DividendPerShare, EarningsPerShare, ForwardYear, OwnershipReport, Period,
  RatioSnapshot, ReportType, Revenue,
};
use crate::financial_report_parser::{self as extract, DimensionFilter};
use crate::memo::LruCache;
use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::Arc;

/// Configuration for result memoization in `FundamentalParser`.
#[derive(Clone, Debug)]
pub struct ParserConfig {
  /// When false, every call re-runs the extraction.
  pub memoize: bool,
  /// Maximum number of cached extraction results (default: 4).
  pub cache_capacity: usize,
}

impl Default for ParserConfig {
  fn default() -> Self {
    Self {
      memoize: true,
      cache_capacity: 4,
    }
  }
}

/// Identifies one memoized extraction, including its dimension filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionKey {
  Ownership,
  DividendPerShare(DimensionFilter),
  Revenue(DimensionFilter),
  Eps(DimensionFilter),
}

#[derive(Debug, Clone)]
enum Memoized {
  Ownership(Arc<OwnershipReport>),
  DividendPerShare(Option<Arc<[DividendPerShare]>>),
  Revenue(Arc<[Revenue]>),
  Eps(Arc<[EarningsPerShare]>),
}

/// Conversion between a memoized result type and its cache slot.
trait MemoValue: Clone {
  fn into_slot(self) -> Memoized;
  fn from_slot(slot: &Memoized) -> Option<Self>;
}

impl MemoValue for Arc<OwnershipReport> {
  fn into_slot(self) -> Memoized { Memoized::Ownership(self) }
  fn from_slot(slot: &Memoized) -> Option<Self> {
    match slot { Memoized::Ownership(v) => Some(v.clone()), _ => None }
  }
}

impl MemoValue for Option<Arc<[DividendPerShare]>> {
  fn into_slot(self) -> Memoized { Memoized::DividendPerShare(self) }
  fn from_slot(slot: &Memoized) -> Option<Self> {
    match slot { Memoized::DividendPerShare(v) => Some(v.clone()), _ => None }
  }
}

impl MemoValue for Arc<[Revenue]> {
  fn into_slot(self) -> Memoized { Memoized::Revenue(self) }
  fn from_slot(slot: &Memoized) -> Option<Self> {
    match slot { Memoized::Revenue(v) => Some(v.clone()), _ => None }
  }
}

impl MemoValue for Arc<[EarningsPerShare]> {
  fn into_slot(self) -> Memoized { Memoized::Eps(self) }
  fn from_slot(slot: &Memoized) -> Option<Self> {
    match slot { Memoized::Eps(v) => Some(v.clone()), _ => None }
  }
}

pub struct FundamentalParser {
  bundle: Arc<DocumentBundle>,
  config: ParserConfig,
  cache: Mutex<LruCache<ExtractionKey, Memoized>>,
}

impl std::fmt::Debug for FundamentalParser {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FundamentalParser")
      .field("reports", &self.bundle.available())
      .field("config", &self.config)
      .field("cached", &self.cache.lock().len())
      .finish()
  }
}

impl FundamentalParser {
  pub fn new(bundle: DocumentBundle) -> Self {
    Self::with_config(bundle, ParserConfig::default())
  }

  pub fn with_config(bundle: DocumentBundle, config: ParserConfig) -> Self {
    let capacity = if config.memoize { config.cache_capacity } else { 0 };
    debug!("Creating FundamentalParser: reports={:?}, cache capacity={}", bundle.available(), capacity);
    FundamentalParser {
      bundle: Arc::new(bundle),
      config,
      cache: Mutex::new(LruCache::new(capacity)),
    }
  }

  pub fn bundle(&self) -> &DocumentBundle {
    &self.bundle
  }

  pub fn config(&self) -> &ParserConfig {
    &self.config
  }

  pub fn is_cached(&self, key: &ExtractionKey) -> bool {
    self.cache.lock().contains(key)
  }

  pub fn cached_len(&self) -> usize {
    self.cache.lock().len()
  }

  pub fn clear_cache(&self) {
    let mut cache = self.cache.lock();
    if !cache.is_empty() {
      debug!("Dropping {} cached extractions", cache.len());
      cache.clear();
    }
  }

  // The lock spans lookup, extraction and insert so concurrent callers
  // never build the same entry twice.
  fn memoized<T: MemoValue>(
    &self,
    key: ExtractionKey,
    compute: impl FnOnce(&DocumentBundle) -> Result<T, FundamentalError>,
  ) -> Result<T, FundamentalError> {
    let mut cache = self.cache.lock();
    if cache.capacity() == 0 {
      drop(cache);
      return compute(&self.bundle);
    }
    if let Some(hit) = cache.get(&key).and_then(T::from_slot) {
      trace!("Cache hit for {:?}", key);
      return Ok(hit);
    }
    trace!("Cache miss for {:?}", key);
    let value = compute(&self.bundle)?;
    if let Some(evicted) = cache.insert(key, value.clone().into_slot()) {
      trace!("Evicted {:?} to cache {:?}", evicted, key);
    }
    Ok(value)
  }

  // --- Memoized extractions ---

  pub fn ownership_report(&self) -> Result<Arc<OwnershipReport>, FundamentalError> {
    self.memoized(ExtractionKey::Ownership, |b| extract::extract_ownership_report(b).map(Arc::new))
  }

  pub fn dividend_per_share(
    &self,
    report_type: Option<ReportType>,
    period: Option<Period>,
  ) -> Result<Option<Arc<[DividendPerShare]>>, FundamentalError> {
    let filter = DimensionFilter::new(report_type, period);
    self.memoized(ExtractionKey::DividendPerShare(filter), |b| {
      extract::extract_dividend_per_share(b, report_type, period).map(|v| v.map(Arc::from))
    })
  }

  pub fn revenue(
    &self,
    report_type: Option<ReportType>,
    period: Option<Period>,
  ) -> Result<Arc<[Revenue]>, FundamentalError> {
    let filter = DimensionFilter::new(report_type, period);
    self.memoized(ExtractionKey::Revenue(filter), |b| {
      extract::extract_revenue(b, report_type, period).map(Arc::from)
    })
  }

  pub fn eps(
    &self,
    report_type: Option<ReportType>,
    period: Option<Period>,
  ) -> Result<Arc<[EarningsPerShare]>, FundamentalError> {
    let filter = DimensionFilter::new(report_type, period);
    self.memoized(ExtractionKey::Eps(filter), |b| {
      extract::extract_eps(b, report_type, period).map(Arc::from)
    })
  }

  // Common presets: quarterly is reported 3M, TTM is any period.

  pub fn dividend_per_share_quarterly(&self) -> Result<Option<Arc<[DividendPerShare]>>, FundamentalError> {
    self.dividend_per_share(Some(ReportType::R), Some(Period::ThreeMonths))
  }

  pub fn dividend_per_share_ttm(&self) -> Result<Option<Arc<[DividendPerShare]>>, FundamentalError> {
    self.dividend_per_share(Some(ReportType::TTM), None)
  }

  pub fn revenue_quarterly(&self) -> Result<Arc<[Revenue]>, FundamentalError> {
    self.revenue(Some(ReportType::R), Some(Period::ThreeMonths))
  }

  pub fn revenue_ttm(&self) -> Result<Arc<[Revenue]>, FundamentalError> {
    self.revenue(Some(ReportType::TTM), None)
  }

  pub fn eps_quarterly(&self) -> Result<Arc<[EarningsPerShare]>, FundamentalError> {
    self.eps(Some(ReportType::R), Some(Period::ThreeMonths))
  }

  pub fn eps_ttm(&self) -> Result<Arc<[EarningsPerShare]>, FundamentalError> {
    self.eps(Some(ReportType::TTM), None)
  }

  // --- Uncached extractions ---

  pub fn dividends(&self) -> Result<Option<Vec<Dividend>>, FundamentalError> {
    extract::extract_dividends(&self.bundle)
  }

  pub fn analyst_forecast(&self) -> Result<AnalystForecast, FundamentalError> {
    extract::extract_analyst_forecast(&self.bundle)
  }

  pub fn ratio_snapshot(&self) -> Result<RatioSnapshot, FundamentalError> {
    extract::extract_ratio_snapshot(&self.bundle)
  }

  pub fn forward_estimates(&self) -> Result<Vec<ForwardYear>, FundamentalError> {
    extract::extract_forward_estimates(&self.bundle)
  }

  pub fn forward_actuals(&self) -> Result<Vec<ForwardYear>, FundamentalError> {
    extract::extract_forward_actuals(&self.bundle)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::FundamentalReportType;
  use crate::fixtures::{bundle_with, full_bundle};

  #[test]
  fn test_ownership_memoized_identity() {
    let parser = FundamentalParser::new(full_bundle());
    let first = parser.ownership_report().unwrap();
    let second = parser.ownership_report().unwrap();
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(parser.cached_len(), 1);
  }

  #[test]
  fn test_memoize_disabled_equal_but_not_shared() {
    let config = ParserConfig { memoize: false, ..Default::default() };
    let parser = FundamentalParser::with_config(full_bundle(), config);
    let first = parser.ownership_report().unwrap();
    let second = parser.ownership_report().unwrap();
    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(parser.cached_len(), 0);
  }

  #[test]
  fn test_lru_eviction_at_capacity_four() {
    let parser = FundamentalParser::new(full_bundle());
    let ownership = parser.ownership_report().unwrap();
    parser.revenue(None, None).unwrap();
    parser.revenue_ttm().unwrap();
    parser.eps_quarterly().unwrap();
    assert_eq!(parser.cached_len(), 4);
    assert!(parser.is_cached(&ExtractionKey::Ownership));

    // A fifth distinct extraction pushes out the least recently used entry.
    parser.eps_ttm().unwrap();
    assert_eq!(parser.cached_len(), 4);
    assert!(!parser.is_cached(&ExtractionKey::Ownership));

    let rebuilt = parser.ownership_report().unwrap();
    assert_eq!(ownership, rebuilt);
    assert!(!Arc::ptr_eq(&ownership, &rebuilt));
    // Rebuilding ownership evicted the next-oldest entry, the unfiltered revenue.
    assert!(!parser.is_cached(&ExtractionKey::Revenue(DimensionFilter::default())));
  }

  #[test]
  fn test_recent_use_protects_entry() {
    let parser = FundamentalParser::new(full_bundle());
    let ownership = parser.ownership_report().unwrap();
    parser.revenue(None, None).unwrap();
    parser.revenue_ttm().unwrap();
    parser.eps_quarterly().unwrap();
    let again = parser.ownership_report().unwrap(); // promote
    parser.eps_ttm().unwrap();
    assert!(Arc::ptr_eq(&ownership, &again));
    assert!(parser.is_cached(&ExtractionKey::Ownership));
    assert!(!parser.is_cached(&ExtractionKey::Revenue(DimensionFilter::default())));
  }

  #[test]
  fn test_filters_are_part_of_the_key() {
    let parser = FundamentalParser::new(full_bundle());
    let quarterly = parser.revenue_quarterly().unwrap();
    let ttm = parser.revenue_ttm().unwrap();
    assert_eq!(quarterly.len(), 2);
    assert_eq!(ttm.len(), 1);
    assert!(Arc::ptr_eq(&quarterly, &parser.revenue(Some(ReportType::R), Some(Period::ThreeMonths)).unwrap()));
  }

  #[test]
  fn test_failures_are_not_cached() {
    let bundle = bundle_with(FundamentalReportType::ReportsFinSummary, "<FinancialSummary/>");
    let parser = FundamentalParser::new(bundle);
    assert!(matches!(parser.revenue(None, None), Err(FundamentalError::MissingSection(_))));
    assert!(matches!(parser.ownership_report(), Err(FundamentalError::MissingSection(_))));
    assert_eq!(parser.cached_len(), 0);

    // Absence is data, and is cached like any other result.
    assert_eq!(parser.dividend_per_share_ttm().unwrap(), None);
    assert_eq!(parser.cached_len(), 1);
  }

  #[test]
  fn test_presets() {
    let parser = FundamentalParser::new(full_bundle());
    let dps_q = parser.dividend_per_share_quarterly().unwrap().unwrap();
    assert_eq!(dps_q.len(), 2);
    assert!(dps_q.iter().all(|d| d.report_type == ReportType::R && d.period == Period::ThreeMonths));
    assert_eq!(parser.dividend_per_share_ttm().unwrap().unwrap()[0].value, 0.96);
    assert_eq!(parser.eps_ttm().unwrap()[0].eps, 6.43);
    assert_eq!(parser.eps_quarterly().unwrap().len(), 2);
  }

  #[test]
  fn test_uncached_passthroughs() {
    let parser = FundamentalParser::new(full_bundle());
    assert_eq!(parser.dividends().unwrap().unwrap().len(), 3);
    assert_eq!(parser.analyst_forecast().unwrap().fields.len(), 5);
    assert!(parser.ratio_snapshot().unwrap().get("pdate").is_some());
    assert_eq!(parser.forward_estimates().unwrap().len(), 3);
    assert_eq!(parser.forward_actuals().unwrap().len(), 2);
    assert_eq!(parser.cached_len(), 0);
  }

  #[test]
  fn test_clear_cache() {
    let parser = FundamentalParser::new(full_bundle());
    let first = parser.ownership_report().unwrap();
    parser.clear_cache();
    assert_eq!(parser.cached_len(), 0);
    assert!(!Arc::ptr_eq(&first, &parser.ownership_report().unwrap()));
  }

  #[test]
  fn test_shared_across_threads() {
    let parser = Arc::new(FundamentalParser::new(full_bundle()));
    let reports: Vec<Arc<OwnershipReport>> = std::thread::scope(|s| {
      let handles: Vec<_> = (0..4)
        .map(|_| {
          let parser = Arc::clone(&parser);
          s.spawn(move || parser.ownership_report().unwrap())
        })
        .collect();
      handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(reports.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(parser.cached_len(), 1);
  }
}
