//! Flattened view of an EPU metadata document.
//!
//! EPU serializes two kinds of values: plain elements from the
//! `Fei.SharedObjects` data contract (`<NominalMagnification>`, nested
//! `<pixelSize><x><numericValue>`, ...) and a `CustomData` dictionary of
//! `KeyValueOfstringanyType` pairs (`Aperture[C1].Name`, `AppliedDefocus`, ...).
//! Both are collected in a single pass so the parser can resolve named fields
//! without walking the tree again.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ParseError;

const KEY_VALUE_PAIR: &str = "KeyValueOfstringanyType";

/// Leaf text of plain elements plus the custom key/value dictionary
#[derive(Debug, Default)]
pub(crate) struct MetadataDocument {
    /// (element path of local names, trimmed text) in document order
    elements: Vec<(Vec<String>, String)>,
    /// (key, value text) in document order
    custom: Vec<(String, String)>,
}

/// Custom pair being read
struct PendingPair {
    /// Stack depth of the `KeyValueOfstringanyType` element
    depth: usize,
    key: Option<String>,
    value: String,
}

impl MetadataDocument {
    /// Tokenize a document, keeping only non-empty text
    pub(crate) fn from_reader<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);

        let mut doc = MetadataDocument::default();
        let mut stack: Vec<String> = Vec::new();
        let mut pending: Option<PendingPair> = None;
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    saw_root = true;
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let opens_pair = name == KEY_VALUE_PAIR && pending.is_none();
                    stack.push(name);
                    if opens_pair {
                        pending = Some(PendingPair {
                            depth: stack.len(),
                            key: None,
                            value: String::new(),
                        });
                    }
                }
                Event::Empty(_) => {
                    saw_root = true;
                }
                Event::Text(ref t) => {
                    let text = t.unescape()?;
                    doc.push_text(&stack, pending.as_mut(), &text);
                }
                Event::CData(ref c) => {
                    let text = String::from_utf8_lossy(c);
                    doc.push_text(&stack, pending.as_mut(), text.trim());
                }
                Event::End(_) => {
                    if pending.as_ref().is_some_and(|p| p.depth == stack.len()) {
                        if let Some(PendingPair {
                            key: Some(key),
                            value,
                            ..
                        }) = pending.take()
                        {
                            doc.custom.push((key, value));
                        }
                    }
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::Malformed(format!(
                "unexpected end of document inside <{open}>"
            )));
        }
        if !saw_root {
            return Err(ParseError::Malformed("document has no root element".to_string()));
        }

        Ok(doc)
    }

    /// Route text to the open custom pair, or record it as a plain element
    fn push_text(&mut self, stack: &[String], pending: Option<&mut PendingPair>, text: &str) {
        if text.is_empty() {
            return;
        }
        match pending {
            Some(pair) if stack.len() > pair.depth => match stack[pair.depth].as_str() {
                "Key" if stack.len() == pair.depth + 1 => pair.key = Some(text.to_string()),
                "Value" => pair.value.push_str(text),
                _ => {}
            },
            Some(_) => {}
            None => self.elements.push((stack.to_vec(), text.to_string())),
        }
    }

    /// First element, in document order, whose path ends with `suffix`
    pub(crate) fn element(&self, suffix: &[&str]) -> Option<&str> {
        self.elements
            .iter()
            .find(|(path, _)| {
                path.len() >= suffix.len()
                    && path[path.len() - suffix.len()..]
                        .iter()
                        .zip(suffix)
                        .all(|(a, b)| a == b)
            })
            .map(|(_, text)| text.as_str())
    }

    /// Custom dictionary value for an exact key
    pub(crate) fn custom(&self, key: &str) -> Option<&str> {
        self.custom
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Custom value for a detector-scoped key such as `Detectors[EF-Falcon].TotalDose`
    pub(crate) fn detector_custom(&self, field: &str) -> Option<&str> {
        self.custom
            .iter()
            .find(|(k, v)| {
                !v.is_empty()
                    && k.starts_with("Detectors[")
                    && k.strip_suffix(field)
                        .is_some_and(|head| head.ends_with("]."))
            })
            .map(|(_, v)| v.as_str())
    }

    /// Number of plain elements and custom pairs collected
    #[cfg(test)]
    pub(crate) fn len(&self) -> (usize, usize) {
        (self.elements.len(), self.custom.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DOC: &str = r#"<?xml version="1.0"?>
<MicroscopeImage xmlns="http://schemas.datacontract.org/2004/07/Fei.SharedObjects"
                 xmlns:a="http://schemas.microsoft.com/2003/10/Serialization/Arrays">
  <SpatialScale>
    <pixelSize>
      <x><numericValue>1.2E-10</numericValue></x>
      <y><numericValue>1.3E-10</numericValue></y>
    </pixelSize>
  </SpatialScale>
  <CustomData>
    <a:KeyValueOfstringanyType>
      <a:Key>Detectors[EF-Falcon].TotalDose</a:Key>
      <a:Value>5E+20</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>Dose</a:Key>
      <a:Value>7</a:Value>
    </a:KeyValueOfstringanyType>
    <a:KeyValueOfstringanyType>
      <a:Key>Empty</a:Key>
      <a:Value/>
    </a:KeyValueOfstringanyType>
  </CustomData>
</MicroscopeImage>"#;

    fn load(xml: &str) -> Result<MetadataDocument, ParseError> {
        MetadataDocument::from_reader(Cursor::new(xml))
    }

    #[test]
    fn test_collects_elements_and_pairs() {
        let doc = load(DOC).unwrap();
        assert_eq!(doc.len(), (2, 3));
        assert_eq!(doc.element(&["pixelSize", "x", "numericValue"]), Some("1.2E-10"));
        assert_eq!(doc.element(&["y", "numericValue"]), Some("1.3E-10"));
        assert_eq!(doc.element(&["numericValue"]), Some("1.2E-10"));
        assert_eq!(doc.element(&["z", "numericValue"]), None);
    }

    #[test]
    fn test_custom_lookups() {
        let doc = load(DOC).unwrap();
        assert_eq!(doc.custom("Dose"), Some("7"));
        assert_eq!(doc.custom("Empty"), None);
        assert_eq!(doc.detector_custom("TotalDose"), Some("5E+20"));
        assert_eq!(doc.detector_custom("Dose"), None);
    }

    #[test]
    fn test_cdata_values() {
        let xml = r#"<MicroscopeImage>
  <camera><Name><![CDATA[ EF-Falcon ]]></Name></camera>
  <CustomData>
    <KeyValueOfstringanyType>
      <Key>DetectorCommercialName</Key>
      <Value><![CDATA[Falcon 4i]]></Value>
    </KeyValueOfstringanyType>
  </CustomData>
</MicroscopeImage>"#;
        let doc = load(xml).unwrap();
        assert_eq!(doc.element(&["camera", "Name"]), Some("EF-Falcon"));
        assert_eq!(doc.custom("DetectorCommercialName"), Some("Falcon 4i"));
    }

    #[test]
    fn test_truncated_document() {
        let err = load("<MicroscopeImage><camera>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_) | ParseError::Xml(_)));
    }

    #[test]
    fn test_empty_document() {
        let err = load("").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}
