use crate::binxml::model::XmlElement;
use crate::binxml::visitor::BinaryXmlVisitor;
use crate::err::Result;

use log::trace;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Renders the event stream as indented textual XML.
///
/// Attributes appear in key-sorted order, values are double-quoted, and no
/// XML declaration is written; the output is for humans and is not
/// round-trippable to the binary form.
pub struct XmlOutput<W: Write> {
    writer: Writer<W>,
    stack: Vec<String>,
}

impl<W: Write> XmlOutput<W> {
    pub fn with_writer(target: W) -> Self {
        XmlOutput {
            writer: Writer::new_with_indent(target, b' ', 2),
            stack: Vec::new(),
        }
    }

    /// Consumes the output, returning control of the inner writer to the
    /// caller.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> BinaryXmlVisitor for XmlOutput<W> {
    fn visit_element_start(&mut self, element: &XmlElement) -> Result<()> {
        trace!("visit_element_start: {:?}", element.name);
        self.stack.push(element.name.clone());

        let mut event = BytesStart::new(element.name.as_str());
        for (name, value) in element.attribute_map() {
            event.push_attribute((name.as_str(), value.as_str()));
        }
        self.writer.write_event(Event::Start(event))?;

        Ok(())
    }

    fn visit_element_end(&mut self, name: &str) -> Result<()> {
        trace!("visit_element_end: {:?}", name);
        // Close with the tracked open tag so unbalanced input still nests.
        let name = self.stack.pop().unwrap_or_else(|| name.to_owned());
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;

        Ok(())
    }

    fn visit_cdata(&mut self, text: &str) -> Result<()> {
        trace!("visit_cdata");
        self.writer.write_event(Event::Text(BytesText::new(text)))?;

        Ok(())
    }

    fn visit_invalid(&mut self, reason: &str) -> Result<()> {
        trace!("visit_invalid: {}", reason);
        let comment = format!(" invalid: {reason} ");
        self.writer
            .write_event(Event::Comment(BytesText::new(&comment)))?;

        Ok(())
    }
}
