// ibfundamental/src/base.rs
// Error definitions shared by the bundle, coercion and extraction layers

use thiserror::Error;

/// Errors that can occur while loading or extracting fundamental reports.
///
/// `MissingSection`, `MissingField` and `Format` are the extraction-time
/// failures. Legitimately absent data is never reported through this type;
/// the extraction functions return `Ok(None)` or an empty value instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FundamentalError {
  /// A structurally required container node (or whole report) is absent.
  #[error("Missing section: {0}")]
  MissingSection(String),

  /// A node lacks the nested value or attribute it must carry.
  #[error("Missing field: {0}")]
  MissingField(String),

  /// A text or attribute token failed date/numeric/enum coercion.
  #[error("Format error: {0}")]
  Format(String),

  #[error("XML parse error: {0}")]
  XmlParse(String),

  #[error("I/O error: {0}")]
  Io(String),
}

impl From<std::io::Error> for FundamentalError {
  fn from(err: std::io::Error) -> Self {
    FundamentalError::Io(err.to_string())
  }
}
