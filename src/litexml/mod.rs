//! A small, deliberately non-conforming XML codec for the game's
//! update-list documents.
//!
//! The dialect is driven by a per-record schema with three markers: a
//! field can be a *tag* (an element of its own), an *attribute* of its
//! parent's tag, or the *inner content* of its parent.  Records implement
//! the [`Element`] visitor trait once, by hand, in schema order — the
//! compile-time stand-in for the original tool's runtime struct-tag
//! reflection.
//!
//! What this codec is **not**: namespaces, DTDs, CDATA, and entities
//! beyond the five predefined ones are out; documents are read leniently
//! (unknown tags and attributes are skipped, malformed entities pass
//! through as text) and written canonically (8-space indent, schema-order
//! attributes, self-closing childless tags).

mod decode;
mod emit;
mod parse;

pub use decode::{decode_into, from_str};
pub use emit::{to_string, to_vec, to_writer, Emitter};
pub use parse::{Parser, Token};

use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────────────────────

/// A syntax error with its 1-based source position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{col}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

// ── Document info ────────────────────────────────────────────────────────────

/// Fields of the XML declaration, `<?xml version=".." encoding=".."
/// standalone=".." ?>`.
///
/// A root record carries one of these; the writer emits the declaration
/// from it (encoding defaults to `utf-8`, standalone is omitted when
/// empty) and the reader fills it in, ignoring unknown declaration keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub version: String,
    pub encoding: String,
    pub standalone: String,
}

// ── Schema traits ────────────────────────────────────────────────────────────

/// A scalar value usable as an attribute: strings, integers, floats.
///
/// Parsing is lossy on purpose — a malformed number decodes as the
/// default, matching the tolerant reader posture everywhere else.
pub trait Scalar {
    fn parse_xml(&mut self, value: &str);
    fn format_xml(&self) -> String;
}

impl Scalar for String {
    fn parse_xml(&mut self, value: &str) {
        *self = value.to_owned();
    }
    fn format_xml(&self) -> String {
        self.clone()
    }
}

macro_rules! numeric_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn parse_xml(&mut self, value: &str) {
                *self = value.parse().unwrap_or_default();
            }
            fn format_xml(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

numeric_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// What a tag opens into: a nested element, or a scalar leaf whose single
/// schema attribute carries the value.
pub enum Child<'a> {
    Node(&'a mut dyn Element),
    Leaf {
        attr: &'static str,
        slot: &'a mut dyn Scalar,
    },
}

/// The per-record schema visitor.
///
/// Implementations mirror the record's field order: `open_child` routes a
/// child tag to its field (appending a fresh element for sequence
/// fields), `set_attr` routes attributes of the record's own tag, and
/// `emit` writes the fields back out in the same order.
pub trait Element {
    /// Route `tag` to the matching child field.  `None` skips the subtree.
    fn open_child(&mut self, tag: &str) -> Option<Child<'_>>;

    /// Assign an attribute of this element's own tag.  Unknown keys are
    /// ignored.
    fn set_attr(&mut self, key: &str, value: &str);

    /// Assign trimmed character data, for records with an inner-content
    /// field.
    fn set_content(&mut self, _text: &str) {}

    /// Receive the XML declaration (root records with a [`DocumentInfo`]
    /// field).
    fn set_doc_info(&mut self, _info: DocumentInfo) {}

    /// Write this record's fields in schema order.
    fn emit(&self, w: &mut Emitter<'_>) -> std::io::Result<()>;
}
