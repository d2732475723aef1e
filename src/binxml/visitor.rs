use crate::binxml::model::XmlElement;
use crate::err::Result;

/// A sink for the structured events produced by a binary XML traversal.
///
/// The chunk walker drives exactly one visitor per pass; implementors keep
/// whatever state they need (the renderer keeps an element stack, the
/// attribute setter keeps the ancestor path seen so far).
pub trait BinaryXmlVisitor {
    /// Called on `<tag attr="value" ...>`.
    fn visit_element_start(&mut self, element: &XmlElement) -> Result<()>;

    /// Called on `</tag>`.
    fn visit_element_end(&mut self, name: &str) -> Result<()>;

    /// Called with the text of a character-data chunk.
    fn visit_cdata(&mut self, text: &str) -> Result<()>;

    /// Called when the traversal cannot make sense of the input; the walk
    /// stops after this event.
    fn visit_invalid(&mut self, reason: &str) -> Result<()>;
}
