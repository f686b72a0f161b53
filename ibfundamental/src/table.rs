// ibfundamental/src/table.rs
// Flattening of extracted records into named-column rows

use crate::base::FundamentalError;
use crate::data::{
  AnalystForecast, Dividend, DividendPerShare, EarningsPerShare, ForwardYear, OwnershipDetails, RatioSnapshot,
  Revenue,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// A record that can become one row of a table, with columns named after its
/// snake_case fields.
pub trait TableRecord: Serialize {
  /// The column a table of these records is indexed and sorted by, if any.
  fn index_field() -> Option<&'static str>;

  fn to_row(&self) -> Result<Map<String, Value>, FundamentalError> {
    match serde_json::to_value(self) {
      Ok(Value::Object(row)) => Ok(row),
      Ok(other) => Err(FundamentalError::Format(format!("Record is not a row: {}", other))),
      Err(e) => Err(FundamentalError::Format(format!("Failed to serialize record: {}", e))),
    }
  }
}

impl TableRecord for Dividend {
  fn index_field() -> Option<&'static str> { Some("ex_date") }
}

impl TableRecord for DividendPerShare {
  fn index_field() -> Option<&'static str> { Some("as_of_date") }
}

impl TableRecord for Revenue {
  fn index_field() -> Option<&'static str> { Some("as_of_date") }
}

impl TableRecord for EarningsPerShare {
  fn index_field() -> Option<&'static str> { Some("as_of_date") }
}

impl TableRecord for ForwardYear {
  fn index_field() -> Option<&'static str> { Some("updated") }
}

impl TableRecord for OwnershipDetails {
  fn index_field() -> Option<&'static str> { None }
}

impl TableRecord for AnalystForecast {
  fn index_field() -> Option<&'static str> { None }
}

impl TableRecord for RatioSnapshot {
  fn index_field() -> Option<&'static str> { None }
}

/// Rows in record order, tagged with the index column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
  pub index: Option<&'static str>,
  pub rows: Vec<Map<String, Value>>,
}

impl Table {
  pub fn from_records<T: TableRecord>(records: &[T]) -> Result<Self, FundamentalError> {
    Ok(Table {
      index: T::index_field(),
      rows: records.iter().map(|r| r.to_row()).collect::<Result<Vec<_>, _>>()?,
    })
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  /// Values of the index column, one per row. Rows lacking it yield `Null`.
  pub fn index_values(&self) -> Vec<&Value> {
    match self.index {
      Some(column) => self.rows.iter().map(|row| row.get(column).unwrap_or(&Value::Null)).collect(),
      None => Vec::new(),
    }
  }
}
