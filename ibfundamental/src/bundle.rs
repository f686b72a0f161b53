// ibfundamental/src/bundle.rs
// Container of the already-fetched report trees an extraction runs against

use crate::base::FundamentalError;
use crate::data::FundamentalReportType;
use crate::xml_tree::XmlElement;
use log::{debug, info};
use std::path::Path;

/// Raw report trees for one company.
///
/// Each slot is either a parsed tree or unavailable. A bundle is assembled
/// once and then only read; `FundamentalParser` takes ownership of it.
#[derive(Debug, Clone, Default)]
pub struct DocumentBundle {
  ownership: Option<XmlElement>,
  fin_summary: Option<XmlElement>,
  snapshot: Option<XmlElement>,
  resc: Option<XmlElement>,
}

impl DocumentBundle {
  /// An empty bundle; every report is unavailable.
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses `xml_data` and stores it as the tree for `kind`.
  pub fn with_xml(self, kind: FundamentalReportType, xml_data: &str) -> Result<Self, FundamentalError> {
    let tree = XmlElement::parse(xml_data).map_err(|e| match e {
      FundamentalError::XmlParse(msg) => FundamentalError::XmlParse(format!("{}: {}", kind, msg)),
      other => other,
    })?;
    Ok(self.with_tree(kind, tree))
  }

  pub fn with_tree(mut self, kind: FundamentalReportType, tree: XmlElement) -> Self {
    *self.slot_mut(kind) = Some(tree);
    self
  }

  /// Loads `<ReportName>.xml` (e.g. `ReportsFinSummary.xml`) for every report
  /// kind found in `dir`. Missing files leave that report unavailable.
  pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, FundamentalError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
      return Err(FundamentalError::Io(format!("Not a directory: {}", dir.display())));
    }
    let mut bundle = DocumentBundle::new();
    for kind in FundamentalReportType::ALL {
      let path = dir.join(format!("{}.xml", kind.as_tws_str()));
      if !path.is_file() {
        debug!("No {} report at {}", kind, path.display());
        continue;
      }
      let xml_data = std::fs::read_to_string(&path)
        .map_err(|e| FundamentalError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
      bundle = bundle.with_xml(kind, &xml_data)?;
      info!("Loaded {} report from {} ({} bytes)", kind, path.display(), xml_data.len());
    }
    Ok(bundle)
  }

  /// The tree for `kind`, or None when that report was not supplied.
  pub fn tree(&self, kind: FundamentalReportType) -> Option<&XmlElement> {
    match kind {
      FundamentalReportType::ReportsOwnership => self.ownership.as_ref(),
      FundamentalReportType::ReportsFinSummary => self.fin_summary.as_ref(),
      FundamentalReportType::ReportSnapshot => self.snapshot.as_ref(),
      FundamentalReportType::RESC => self.resc.as_ref(),
    }
  }

  /// Like `tree`, but a missing report is a `MissingSection` error.
  pub fn require(&self, kind: FundamentalReportType) -> Result<&XmlElement, FundamentalError> {
    self.tree(kind)
      .ok_or_else(|| FundamentalError::MissingSection(format!("{} report not available", kind)))
  }

  pub fn available(&self) -> Vec<FundamentalReportType> {
    FundamentalReportType::ALL.into_iter().filter(|k| self.tree(*k).is_some()).collect()
  }

  fn slot_mut(&mut self, kind: FundamentalReportType) -> &mut Option<XmlElement> {
    match kind {
      FundamentalReportType::ReportsOwnership => &mut self.ownership,
      FundamentalReportType::ReportsFinSummary => &mut self.fin_summary,
      FundamentalReportType::ReportSnapshot => &mut self.snapshot,
      FundamentalReportType::RESC => &mut self.resc,
    }
  }
}
