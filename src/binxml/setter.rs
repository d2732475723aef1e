use crate::binxml::model::{stack_matches, XmlElement};
use crate::binxml::visitor::BinaryXmlVisitor;
use crate::err::{AxmlError, Result};
use crate::string_pool::{PoolEncoding, StringPool};

use encoding::all::UTF_16LE;
use encoding::{EncoderTrap, Encoding};
use log::{debug, warn};

/// An exact byte-range overwrite inside the string pool.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolPatch {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// A traversal sink that locates one attribute along an element path and
/// plans a length-preserving rewrite of the pool slot its raw value points
/// at. Only the first element whose ancestor stack equals the path and
/// which carries the attribute is considered.
///
/// The walk itself never writes; the planned patch is applied by the caller
/// once the traversal (and its borrows) are done.
pub struct AttributeSetter<'a> {
    pool: &'a StringPool,
    path: &'a [&'a str],
    attribute: &'a str,
    replacement: &'a str,
    stack: Vec<String>,
    patch: Option<PoolPatch>,
}

impl<'a> AttributeSetter<'a> {
    pub fn new(
        pool: &'a StringPool,
        path: &'a [&'a str],
        attribute: &'a str,
        replacement: &'a str,
    ) -> Self {
        AttributeSetter {
            pool,
            path,
            attribute,
            replacement,
            stack: Vec::new(),
            patch: None,
        }
    }

    pub fn into_patch(self) -> Option<PoolPatch> {
        self.patch
    }

    fn unsupported(&self, reason: String) -> AxmlError {
        AxmlError::UnsupportedMutation {
            attribute: self.attribute.to_owned(),
            reason,
        }
    }

    fn encode_replacement(&self) -> Result<Vec<u8>> {
        match self.pool.encoding() {
            PoolEncoding::Utf8 => Ok(self.replacement.as_bytes().to_vec()),
            PoolEncoding::Utf16 => UTF_16LE
                .encode(self.replacement, EncoderTrap::Strict)
                .map_err(|m| self.unsupported(format!("cannot encode replacement: {m}"))),
        }
    }
}

impl BinaryXmlVisitor for AttributeSetter<'_> {
    fn visit_element_start(&mut self, element: &XmlElement) -> Result<()> {
        self.stack.push(element.name.clone());

        if self.patch.is_some() || !stack_matches(&self.stack, self.path) {
            return Ok(());
        }
        let Some(attribute) = element.attribute(self.attribute) else {
            return Ok(());
        };

        let Some(index) = attribute.raw_value_index else {
            return Err(self.unsupported("value does not reference a string pool slot".to_owned()));
        };
        let Some(slot) = self.pool.raw_slot(index) else {
            return Err(self.unsupported(format!("raw value index {index} is out of range")));
        };

        let bytes = self.encode_replacement()?;
        if bytes.len() != slot.len {
            return Err(self.unsupported(format!(
                "replacement encodes to {} bytes but the pool slot holds {}",
                bytes.len(),
                slot.len
            )));
        }

        debug!(
            "rewriting pool slot {} at [{}..{}] with [{}]",
            index,
            slot.offset,
            slot.offset + slot.len,
            self.replacement
        );
        self.patch = Some(PoolPatch {
            offset: slot.offset,
            bytes,
        });

        Ok(())
    }

    fn visit_element_end(&mut self, _name: &str) -> Result<()> {
        self.stack.pop();
        Ok(())
    }

    fn visit_cdata(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn visit_invalid(&mut self, reason: &str) -> Result<()> {
        warn!("traversal degraded while looking for attribute: {}", reason);
        Ok(())
    }
}
