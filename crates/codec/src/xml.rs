//! AWS-shaped XML rendering. Output shapes implement [`ToXml`]; list
//! fields are emitted as `<item>` elements under the list's field name,
//! absent optional fields are omitted, and timestamps are RFC-3339 with a
//! trailing `Z`.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::query::Blob;

/// An XML rendering failure. These only arise from the underlying writer
/// and are surfaced to clients as `InternalError`.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The XML writer rejected an event.
    #[error("xml write failed: {0}")]
    Write(#[from] quick_xml::Error),
    /// The rendered document was not valid UTF-8.
    #[error("xml output was not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A thin event-based writer for response documents.
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    /// A writer with no XML declaration (AWS envelopes omit it).
    pub fn new() -> XmlWriter {
        XmlWriter {
            inner: Writer::new(Vec::new()),
        }
    }

    /// A writer that begins with the standard `<?xml?>` declaration.
    pub fn with_declaration() -> Result<XmlWriter, EncodeError> {
        let mut w = XmlWriter::new();
        w.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(w)
    }

    /// Opens an element.
    pub fn start(&mut self, tag: &str) -> Result<(), EncodeError> {
        self.inner.write_event(Event::Start(BytesStart::new(tag)))?;
        Ok(())
    }

    /// Opens an element carrying an `xmlns` attribute.
    pub fn start_ns(&mut self, tag: &str, xmlns: &str) -> Result<(), EncodeError> {
        let mut start = BytesStart::new(tag);
        start.push_attribute(("xmlns", xmlns));
        self.inner.write_event(Event::Start(start))?;
        Ok(())
    }

    /// Closes an element.
    pub fn end(&mut self, tag: &str) -> Result<(), EncodeError> {
        self.inner.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// Writes `<tag>text</tag>` with escaping.
    pub fn text_element(&mut self, tag: &str, text: &str) -> Result<(), EncodeError> {
        self.start(tag)?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.end(tag)
    }

    /// Finishes the document.
    pub fn into_string(self) -> Result<String, EncodeError> {
        Ok(String::from_utf8(self.inner.into_inner())?)
    }
}

/// Renders `self` as the XML element `tag`.
pub trait ToXml {
    /// Write the element; implementations for optional values may write
    /// nothing at all.
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError>;
}

/// Renders a shape's fields without an enclosing element. Response
/// envelopes use this to inline a result's fields directly into the
/// `<…Response>` or `<…Result>` element.
pub trait ToXmlFields {
    /// Write the fields only.
    fn write_xml_fields(&self, w: &mut XmlWriter) -> Result<(), EncodeError>;
}

impl ToXml for String {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, self)
    }
}

impl ToXml for &str {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, self)
    }
}

impl ToXml for i64 {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, &self.to_string())
    }
}

impl ToXml for bool {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, if *self { "true" } else { "false" })
    }
}

impl ToXml for Blob {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, &self.to_base64())
    }
}

impl ToXml for DateTime<Utc> {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.text_element(tag, &self.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<T: ToXml> ToXml for Option<T> {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        match self {
            Some(value) => value.write_xml(w, tag),
            None => Ok(()),
        }
    }
}

impl<T: ToXml> ToXml for Vec<T> {
    fn write_xml(&self, w: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
        w.start(tag)?;
        for item in self {
            item.write_xml(w, "item")?;
        }
        w.end(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn render<T: ToXml>(value: &T, tag: &str) -> String {
        let mut w = XmlWriter::new();
        value.write_xml(&mut w, tag).unwrap();
        w.into_string().unwrap()
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(
            render(&"a<b&c".to_string(), "name"),
            "<name>a&lt;b&amp;c</name>"
        );
    }

    #[test]
    fn lists_render_as_item_elements() {
        let values = vec!["x".to_string(), "y".to_string()];
        assert_eq!(
            render(&values, "groupSet"),
            "<groupSet><item>x</item><item>y</item></groupSet>"
        );
    }

    #[test]
    fn absent_option_is_omitted() {
        let mut w = XmlWriter::new();
        None::<String>.write_xml(&mut w, "gone").unwrap();
        assert_eq!(w.into_string().unwrap(), "");
    }

    #[test]
    fn timestamps_are_rfc3339_zulu() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap();
        assert_eq!(
            render(&dt, "launchTime"),
            "<launchTime>2024-03-09T12:30:05Z</launchTime>"
        );
    }
}
