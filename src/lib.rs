#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]
#[macro_use]
extern crate bitflags;

#[macro_use]
mod macros;

pub use apk::Apk;
pub use axml_header::{BinaryXmlHeader, PoolFlags, BINARY_XML_HEADER_SIZE};
pub use binary_xml::BinaryXml;
pub use binxml::model::{XmlAttribute, XmlElement};
pub use binxml::visitor::BinaryXmlVisitor;
pub use string_pool::{PoolEncoding, StringPool, StringSlot};
pub use xml_output::XmlOutput;

pub mod binxml;
pub mod err;

mod apk;
mod axml_header;
mod binary_xml;
mod string_pool;
mod xml_output;

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

// Cannot use `cfg(test)` here since `rustdoc` won't look at it.
#[cfg(debug_assertions)]
mod test_readme {
    macro_rules! calculated_doc {
        ($doc:expr, $id:ident) => {
            #[doc = $doc]
            enum $id {}
        };
    }

    calculated_doc!(include_str!("../README.md"), _DoctestReadme);
}
