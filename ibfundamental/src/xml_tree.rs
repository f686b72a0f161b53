// ibfundamental/src/xml_tree.rs
// Owned, read-only XML element tree built from quick-xml events

use crate::base::FundamentalError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str;

/// One element of a parsed report document.
///
/// Attributes keep their document order; `text` is the trimmed, unescaped
/// concatenation of the element's direct text nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
  name: String,
  attributes: Vec<(String, String)>,
  text: String,
  children: Vec<XmlElement>,
}

// Collect attributes of a start tag as owned (key, unescaped value) pairs.
fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>, FundamentalError> {
  let mut attributes = Vec::new();
  for attr_result in e.attributes() {
    let attr = attr_result.map_err(|err| {
      FundamentalError::XmlParse(format!("XML attribute parsing error: {}", err))
    })?;
    let key = str::from_utf8(attr.key.as_ref())
      .map_err(|err| FundamentalError::XmlParse(format!("Attribute name is not UTF-8: {}", err)))?
      .to_string();
    let value = attr.unescape_value().map_err(|err| {
      FundamentalError::XmlParse(format!("Attribute value unescape error: {}", err))
    })?;
    attributes.push((key, value.into_owned()));
  }
  Ok(attributes)
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement, FundamentalError> {
  let name = str::from_utf8(e.name().as_ref())
    .map_err(|err| FundamentalError::XmlParse(format!("Tag name is not UTF-8: {}", err)))?
    .to_string();
  Ok(XmlElement {
    name,
    attributes: read_attributes(e)?,
    ..Default::default()
  })
}

impl XmlElement {
  pub fn new(name: impl Into<String>) -> Self {
    XmlElement { name: name.into(), ..Default::default() }
  }

  pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.push((key.into(), value.into()));
    self
  }

  pub fn with_text(mut self, text: impl Into<String>) -> Self {
    self.text = text.into();
    self
  }

  pub fn with_child(mut self, child: XmlElement) -> Self {
    self.children.push(child);
    self
  }

  /// Parses a complete XML document and returns its root element.
  pub fn parse(xml_data: &str) -> Result<XmlElement, FundamentalError> {
    let mut reader = Reader::from_str(xml_data);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
      match reader.read_event_into(&mut buf) {
        Ok(Event::Start(e)) => {
          stack.push(element_from_start(&e)?);
        }
        Ok(Event::Empty(e)) => {
          let element = element_from_start(&e)?;
          attach(&mut stack, &mut root, element)?;
        }
        Ok(Event::End(_)) => {
          // quick-xml checks end names, so the top of the stack is the matching element.
          let mut element = stack.pop().ok_or_else(|| {
            FundamentalError::XmlParse("Unexpected end tag without matching start".into())
          })?;
          element.text = element.text.trim().to_string();
          attach(&mut stack, &mut root, element)?;
        }
        Ok(Event::Text(text_e)) => {
          let text = text_e.unescape().map_err(|err| FundamentalError::XmlParse(err.to_string()))?;
          if let Some(current) = stack.last_mut() {
            current.text.push_str(&text);
          }
        }
        Ok(Event::CData(cdata)) => {
          let text = str::from_utf8(&cdata)
            .map_err(|err| FundamentalError::XmlParse(format!("CDATA is not UTF-8: {}", err)))?;
          if let Some(current) = stack.last_mut() {
            current.text.push_str(text);
          }
        }
        Ok(Event::Eof) => break,
        Err(err) => {
          return Err(FundamentalError::XmlParse(format!(
            "XML parsing error at position {}: {}", reader.buffer_position(), err
          )))
        }
        _ => (), // Declarations, comments, processing instructions, doctype
      }
      buf.clear();
    }

    if let Some(open) = stack.last() {
      return Err(FundamentalError::XmlParse(format!("Unclosed element <{}> at end of document", open.name)));
    }
    root.ok_or_else(|| FundamentalError::XmlParse("Document has no root element".into()))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn attr(&self, key: &str) -> Option<&str> {
    self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }

  pub fn has_attr(&self, key: &str) -> bool {
    self.attr(key).is_some()
  }

  pub fn children(&self) -> &[XmlElement] {
    &self.children
  }

  /// First direct child with the given tag.
  pub fn child(&self, name: &str) -> Option<&XmlElement> {
    self.children.iter().find(|c| c.name == name)
  }

  /// Direct children with the given tag. The items outlive the borrowed `name`.
  pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlElement> + 'n
  where
    'a: 'n,
  {
    self.children.iter().filter(move |c| c.name == name)
  }

  /// All descendants (not including `self`) with the given tag, in document order.
  pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
    let mut out = Vec::new();
    for child in &self.children {
      child.collect_named(name, &mut out);
    }
    out
  }

  fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
    if self.name == name {
      out.push(self);
    }
    for child in &self.children {
      child.collect_named(name, out);
    }
  }

  /// Elements matching a slash-separated path anchored anywhere in this subtree.
  ///
  /// `select("Ratios/Group/Ratio")` finds every `Ratios` element (this one
  /// included), then walks direct children `Group`, then `Ratio`.
  pub fn select<'a>(&'a self, path: &str) -> Vec<&'a XmlElement> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = match segments.next() {
      Some(s) => s,
      None => return Vec::new(),
    };
    let mut current = Vec::new();
    self.collect_named(first, &mut current);
    for segment in segments {
      current = current
        .into_iter()
        .flat_map(|e| e.children_named(segment))
        .collect();
    }
    current
  }
}

// Append a finished element to its parent, or install it as the document root.
fn attach(
  stack: &mut [XmlElement],
  root: &mut Option<XmlElement>,
  element: XmlElement,
) -> Result<(), FundamentalError> {
  match stack.last_mut() {
    Some(parent) => {
      parent.children.push(element);
      Ok(())
    }
    None if root.is_none() => {
      *root = Some(element);
      Ok(())
    }
    None => Err(FundamentalError::XmlParse(format!(
      "Multiple root elements; unexpected <{}>", element.name
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_nested_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ReportSnapshot Major="1">
  <!-- comment -->
  <Ratios PriceCurrency="USD">
    <Group ID="Price and Volume">
      <Ratio FieldName="NPRICE" Type="N">189.9800</Ratio>
      <Ratio FieldName="PDATE" Type="D">2024-05-10T00:00:00</Ratio>
    </Group>
  </Ratios>
  <Empty flag="1"/>
  <Escaped note="a &amp; b">x &lt; y</Escaped>
</ReportSnapshot>"#;
    let root = XmlElement::parse(xml).unwrap();
    assert_eq!(root.name(), "ReportSnapshot");
    assert_eq!(root.attr("Major"), Some("1"));
    assert_eq!(root.children().len(), 3);

    let ratios = root.select("Ratios/Group/Ratio");
    assert_eq!(ratios.len(), 2);
    assert_eq!(ratios[0].attr("FieldName"), Some("NPRICE"));
    assert_eq!(ratios[0].text(), "189.9800");
    assert_eq!(ratios[1].text(), "2024-05-10T00:00:00");

    let empty = root.child("Empty").unwrap();
    assert!(empty.children().is_empty());
    assert_eq!(empty.text(), "");
    assert_eq!(empty.attr("flag"), Some("1"));

    let escaped = root.child("Escaped").unwrap();
    assert_eq!(escaped.attr("note"), Some("a & b"));
    assert_eq!(escaped.text(), "x < y");
  }

  #[test]
  fn test_descendants_in_document_order() {
    let xml = r#"<R><A id="1"><B id="2"><A id="3"/></B></A><A id="4"/></R>"#;
    let root = XmlElement::parse(xml).unwrap();
    let ids: Vec<_> = root.descendants_named("A").iter().map(|e| e.attr("id").unwrap()).collect();
    assert_eq!(ids, vec!["1", "3", "4"]);
    assert!(root.descendants_named("R").is_empty());
  }

  #[test]
  fn test_select_includes_self_and_nested_anchors() {
    let root = XmlElement::new("ForecastData")
      .with_child(XmlElement::new("Ratio").with_attr("FieldName", "ConsRecom"));
    assert_eq!(root.select("ForecastData/Ratio").len(), 1);
    assert!(root.select("Missing/Ratio").is_empty());
    assert!(root.select("").is_empty());
  }

  #[test]
  fn test_query_results_outlive_query_strings() {
    let root = XmlElement::parse(r#"<R><Ratios><Group><Ratio/><Ratio/></Group></Ratios><Group/></R>"#).unwrap();
    let ratios = {
      let path = String::from("Ratios/Group/Ratio");
      root.select(&path)
    };
    assert_eq!(ratios.len(), 2);

    let groups: Vec<&XmlElement> = {
      let tag = String::from("Group");
      root.children_named(&tag).collect()
    };
    assert_eq!(groups.len(), 1);
    assert!(groups[0].children().is_empty());
  }

  #[test]
  fn test_malformed_documents_rejected() {
    assert!(matches!(XmlElement::parse("<a><b></a>"), Err(FundamentalError::XmlParse(_))));
    assert!(matches!(XmlElement::parse("<a>"), Err(FundamentalError::XmlParse(_))));
    assert!(matches!(XmlElement::parse(""), Err(FundamentalError::XmlParse(_))));
    assert!(matches!(XmlElement::parse("<a/><b/>"), Err(FundamentalError::XmlParse(_))));
  }
}
