use crate::axml_header::BinaryXmlHeader;
use crate::binxml::model::{stack_matches, XmlElement};
use crate::binxml::setter::AttributeSetter;
use crate::binxml::tokens;
use crate::binxml::visitor::BinaryXmlVisitor;
use crate::err::{DeserializationError, DeserializationResult, Result};
use crate::string_pool::StringPool;
use crate::xml_output::XmlOutput;

use byteorder::ReadBytesExt;
use log::{trace, warn};
use std::collections::BTreeMap;
use std::io::Cursor;

const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
const RES_XML_CDATA_TYPE: u16 = 0x0104;
const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

/// A parsed view over one binary XML document (typically the compiled
/// `AndroidManifest.xml` pulled out of an APK).
///
/// The buffer is owned; queries borrow it immutably and re-derive their
/// state per traversal, the mutator rewrites string pool bytes in place.
#[derive(Debug)]
pub struct BinaryXml {
    data: Vec<u8>,
}

enum ChunkStep {
    Start(XmlElement),
    End(String),
    CData(String),
    Skipped,
}

impl BinaryXml {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        BinaryXml { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// True if any start tag in the document equals `name`.
    pub fn has_element(&self, name: &str) -> bool {
        let mut visitor = HasElement { name, found: false };
        if let Err(err) = self.traverse(&mut visitor) {
            warn!("traversal failed while looking for element: {}", err);
        }
        visitor.found
    }

    /// Attributes of the first element whose ancestor stack equals `path`,
    /// or an empty map when no such element exists.
    pub fn element_attributes(&self, path: &[&str]) -> BTreeMap<String, String> {
        let mut visitor = AttributeCollector {
            path,
            stack: Vec::new(),
            found: None,
        };
        if let Err(err) = self.traverse(&mut visitor) {
            warn!("traversal failed while collecting attributes: {}", err);
        }
        visitor.found.unwrap_or_default()
    }

    /// Renders the document as indented textual XML.
    pub fn to_text_xml(&self) -> String {
        let mut output = XmlOutput::with_writer(Vec::new());
        if let Err(err) = self.traverse(&mut output) {
            warn!("rendering binary xml failed: {}", err);
        }
        String::from_utf8_lossy(&output.into_writer()).into_owned()
    }

    /// Rewrites the string the named attribute points at, in place.
    ///
    /// Only the first element whose ancestor stack equals `path` and which
    /// carries `name` is considered; the replacement must encode to exactly
    /// the byte length of the existing pool slot, otherwise
    /// [`crate::err::AxmlError::UnsupportedMutation`] is returned and the
    /// buffer is left unchanged.
    pub fn set_element_attribute(&mut self, path: &[&str], name: &str, value: &str) -> Result<()> {
        let (header, strings) = self.decode_pool()?;

        let mut setter = AttributeSetter::new(&strings, path, name, value);
        self.traverse_chunks(&header, &strings, &mut setter)?;

        if let Some(patch) = setter.into_patch() {
            self.data[patch.offset..patch.offset + patch.bytes.len()]
                .copy_from_slice(&patch.bytes);
        }

        Ok(())
    }

    /// Drives `visitor` over the chunk stream. Malformed input degrades to
    /// a single `visit_invalid` event instead of an error.
    pub fn traverse<V: BinaryXmlVisitor>(&self, visitor: &mut V) -> Result<()> {
        match self.decode_pool() {
            Ok((header, strings)) => self.traverse_chunks(&header, &strings, visitor),
            Err(err) => visitor.visit_invalid(&err.to_string()),
        }
    }

    fn decode_pool(&self) -> DeserializationResult<(BinaryXmlHeader, StringPool)> {
        let header = BinaryXmlHeader::from_bytes(&self.data)?;
        let strings = StringPool::decode(&self.data, &header)?;
        Ok((header, strings))
    }

    fn traverse_chunks<V: BinaryXmlVisitor>(
        &self,
        header: &BinaryXmlHeader,
        strings: &StringPool,
        visitor: &mut V,
    ) -> Result<()> {
        let start = header.xml_chunk_offset();
        if start == 0 || start >= self.data.len() as u64 {
            return visitor.visit_invalid("chunk offset is zero");
        }

        let mut cursor = Cursor::new(self.data.as_slice());
        cursor.set_position(start);

        loop {
            let tag = match try_read!(cursor, u16, "chunk_tag") {
                Ok(tag) => tag,
                Err(err) => return visitor.visit_invalid(&err.to_string()),
            };
            if tag == RES_XML_END_NAMESPACE_TYPE {
                trace!("end namespace, traversal done");
                break;
            }

            match read_chunk(&mut cursor, strings, tag) {
                Ok(ChunkStep::Start(element)) => visitor.visit_element_start(&element)?,
                Ok(ChunkStep::End(name)) => visitor.visit_element_end(&name)?,
                Ok(ChunkStep::CData(text)) => visitor.visit_cdata(&text)?,
                Ok(ChunkStep::Skipped) => {}
                Err(err) => {
                    visitor.visit_invalid(&err.to_string())?;
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Dispatches one chunk. On return the cursor sits on the next chunk's tag.
fn read_chunk(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringPool,
    tag: u16,
) -> DeserializationResult<ChunkStep> {
    let _header_size = try_read!(cursor, u16, "chunk_header_size")?;
    let chunk_size = try_read!(cursor, u32, "chunk_size")?;

    let step = match tag {
        RES_XML_START_ELEMENT_TYPE => {
            ChunkStep::Start(tokens::read_start_element(cursor, strings)?)
        }
        RES_XML_END_ELEMENT_TYPE => ChunkStep::End(tokens::read_end_element(cursor, strings)?),
        RES_XML_CDATA_TYPE => ChunkStep::CData(tokens::read_cdata(cursor, strings)?),
        RES_XML_START_NAMESPACE_TYPE | RES_XML_RESOURCE_MAP_TYPE => {
            skip_chunk_body(cursor, chunk_size)?;
            ChunkStep::Skipped
        }
        other => {
            warn!("skipping unknown chunk tag {:#06x}", other);
            skip_chunk_body(cursor, chunk_size)?;
            ChunkStep::Skipped
        }
    };

    Ok(step)
}

/// Advances past a chunk body given its declared total size; the 8-byte
/// preamble has already been consumed.
fn skip_chunk_body(cursor: &mut Cursor<&[u8]>, chunk_size: u32) -> DeserializationResult<()> {
    if chunk_size < 8 {
        return Err(DeserializationError::InvalidChunkSize {
            size: chunk_size,
            offset: cursor.position(),
        });
    }
    cursor.set_position(cursor.position() + u64::from(chunk_size) - 8);
    Ok(())
}

struct HasElement<'a> {
    name: &'a str,
    found: bool,
}

impl BinaryXmlVisitor for HasElement<'_> {
    fn visit_element_start(&mut self, element: &XmlElement) -> Result<()> {
        if element.name == self.name {
            self.found = true;
        }
        Ok(())
    }

    fn visit_element_end(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn visit_cdata(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_invalid(&mut self, _reason: &str) -> Result<()> {
        Ok(())
    }
}

struct AttributeCollector<'a> {
    path: &'a [&'a str],
    stack: Vec<String>,
    found: Option<BTreeMap<String, String>>,
}

impl BinaryXmlVisitor for AttributeCollector<'_> {
    fn visit_element_start(&mut self, element: &XmlElement) -> Result<()> {
        self.stack.push(element.name.clone());
        if self.found.is_none() && stack_matches(&self.stack, self.path) {
            self.found = Some(element.attribute_map());
        }
        Ok(())
    }

    fn visit_element_end(&mut self, _name: &str) -> Result<()> {
        self.stack.pop();
        Ok(())
    }

    fn visit_cdata(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_invalid(&mut self, _reason: &str) -> Result<()> {
        Ok(())
    }
}
