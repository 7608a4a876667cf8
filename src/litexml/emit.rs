//! Emitter and encoder: canonical output for schema records.
//!
//! Output conventions (frozen — patch clients parse this byte-for-byte):
//! eight spaces of indentation per nesting level, attributes in schema
//! order, ` />` self-closing for childless tags, `"` quoting, the five
//! predefined entities escaped, one tag per line.

use std::io::{self, Write};

use super::{DocumentInfo, Element, Scalar};

/// Serialise a record to a writer.
pub fn to_writer(value: &dyn Element, w: &mut dyn Write) -> io::Result<()> {
    let mut emitter = Emitter::new(w);
    value.emit(&mut emitter)?;
    emitter.finish()
}

/// Serialise a record to bytes.
pub fn to_vec(value: &dyn Element) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(value, &mut buf)?;
    Ok(buf)
}

/// Serialise a record to a string.
pub fn to_string(value: &dyn Element) -> io::Result<String> {
    let buf = to_vec(value)?;
    // The emitter only ever writes valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ── Emitter ──────────────────────────────────────────────────────────────────

/// Low-level tag writer with deferred open-tag closing.
///
/// Opening a tag leaves it dangling (`<name`) so attributes can still be
/// appended; the first child, content, or close decides between `>` and
/// the self-closing ` />`.
pub struct Emitter<'w> {
    w: &'w mut dyn Write,
    indent: usize,
    in_tag: bool,
}

impl<'w> Emitter<'w> {
    pub fn new(w: &'w mut dyn Write) -> Emitter<'w> {
        Emitter {
            w,
            indent: 0,
            in_tag: false,
        }
    }

    /// Emit the XML declaration.  `encoding` defaults to `utf-8`;
    /// `standalone` is omitted when empty.
    pub fn doc_info(&mut self, info: &DocumentInfo) -> io::Result<()> {
        self.w.write_all(b"<?xml")?;
        self.raw_attr("version", &info.version)?;
        let encoding = if info.encoding.is_empty() {
            "utf-8"
        } else {
            &info.encoding
        };
        self.raw_attr("encoding", encoding)?;
        if !info.standalone.is_empty() {
            self.raw_attr("standalone", &info.standalone)?;
        }
        self.w.write_all(b" ?>\n")
    }

    /// Append an attribute to the currently open tag.
    pub fn attr(&mut self, key: &str, value: &dyn Scalar) -> io::Result<()> {
        debug_assert!(self.in_tag, "attribute {key:?} emitted outside a tag");
        self.raw_attr(key, &value.format_xml())
    }

    /// Emit a scalar field as a one-attribute self-closing tag.
    pub fn unary_tag(&mut self, tag: &str, attr: &str, value: &dyn Scalar) -> io::Result<()> {
        self.close_open_tag()?;
        self.write_indent()?;
        write!(self.w, "<{tag}")?;
        self.raw_attr(attr, &value.format_xml())?;
        self.w.write_all(b" />\n")
    }

    /// Emit a nested record under `tag`.  The tag self-closes if the
    /// record produces no children or content.
    pub fn nested(&mut self, tag: &str, child: &dyn Element) -> io::Result<()> {
        self.close_open_tag()?;
        self.write_indent()?;
        write!(self.w, "<{tag}")?;
        self.in_tag = true;
        self.indent += 1;

        child.emit(self)?;

        self.indent -= 1;
        if self.in_tag {
            self.in_tag = false;
            self.w.write_all(b" />\n")
        } else {
            self.write_indent()?;
            write!(self.w, "</{tag}>")?;
            self.w.write_all(b"\n")
        }
    }

    /// Emit escaped character data on its own indented line.
    pub fn content(&mut self, text: &str) -> io::Result<()> {
        self.close_open_tag()?;
        self.write_indent()?;
        self.escape(text)?;
        self.w.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        // A dangling root-level tag cannot happen: the root has no tag of
        // its own and nested() always balances.  Flush for stream writers.
        self.w.flush()
    }

    fn close_open_tag(&mut self) -> io::Result<()> {
        if self.in_tag {
            self.in_tag = false;
            self.w.write_all(b">\n")?;
        }
        Ok(())
    }

    fn raw_attr(&mut self, key: &str, value: &str) -> io::Result<()> {
        write!(self.w, " {key}=\"")?;
        self.escape(value)?;
        self.w.write_all(b"\"")
    }

    fn write_indent(&mut self) -> io::Result<()> {
        for _ in 0..self.indent {
            self.w.write_all(b"        ")?;
        }
        Ok(())
    }

    fn escape(&mut self, text: &str) -> io::Result<()> {
        for c in text.chars() {
            match c {
                '"' => self.w.write_all(b"&quot;")?,
                '\'' => self.w.write_all(b"&apos;")?,
                '<' => self.w.write_all(b"&lt;")?,
                '>' => self.w.write_all(b"&gt;")?,
                '&' => self.w.write_all(b"&amp;")?,
                _ => write!(self.w, "{c}")?,
            }
        }
        Ok(())
    }
}
