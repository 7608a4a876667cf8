use pangpak::litexml::{
    self, Child, DocumentInfo, Element, Emitter, SyntaxError,
};
use std::io;

// ── A small schema used only by these tests ──────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Simple {
    a: String,
    b: String,
    c: String,
    d: String,
}

impl Element for Simple {
    fn open_child(&mut self, tag: &str) -> Option<Child<'_>> {
        match tag {
            "nested" => Some(Child::Leaf {
                attr: "c",
                slot: &mut self.c,
            }),
            _ => None,
        }
    }

    fn set_attr(&mut self, key: &str, value: &str) {
        match key {
            "a" => self.a = value.to_owned(),
            "b" => self.b = value.to_owned(),
            _ => {}
        }
    }

    fn set_content(&mut self, text: &str) {
        self.d = text.to_owned();
    }

    fn emit(&self, w: &mut Emitter<'_>) -> io::Result<()> {
        w.attr("a", &self.a)?;
        w.attr("b", &self.b)?;
        w.unary_tag("nested", "c", &self.c)?;
        w.content(&self.d)
    }
}

#[derive(Debug, Default, PartialEq)]
struct Root {
    info: DocumentInfo,
    simple: Simple,
}

impl Element for Root {
    fn open_child(&mut self, tag: &str) -> Option<Child<'_>> {
        match tag {
            "simple" => Some(Child::Node(&mut self.simple)),
            _ => None,
        }
    }

    fn set_attr(&mut self, _key: &str, _value: &str) {}

    fn set_doc_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    fn emit(&self, w: &mut Emitter<'_>) -> io::Result<()> {
        w.doc_info(&self.info)?;
        w.nested("simple", &self.simple)
    }
}

/// Schema-less sink for parser-focused tests.
#[derive(Debug, Default)]
struct Sink;

impl Element for Sink {
    fn open_child(&mut self, _tag: &str) -> Option<Child<'_>> {
        None
    }
    fn set_attr(&mut self, _key: &str, _value: &str) {}
    fn emit(&self, _w: &mut Emitter<'_>) -> io::Result<()> {
        Ok(())
    }
}

fn sample_root() -> Root {
    Root {
        info: DocumentInfo {
            version: "1.0".to_owned(),
            encoding: "utf-8".to_owned(),
            standalone: "yes".to_owned(),
        },
        simple: Simple {
            a: "1234".to_owned(),
            b: "5678".to_owned(),
            c: "C".to_owned(),
            d: "& here is some content".to_owned(),
        },
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

#[test]
fn encode_canonical_form() {
    let expected = "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\" ?>\n\
<simple a=\"1234\" b=\"5678\">\n\
        <nested c=\"C\" />\n\
        &amp; here is some content\n\
</simple>\n";
    assert_eq!(litexml::to_string(&sample_root()).unwrap(), expected);
}

#[test]
fn encode_defaults_encoding_and_omits_empty_standalone() {
    let mut root = sample_root();
    root.info.encoding = String::new();
    root.info.standalone = String::new();
    let out = litexml::to_string(&root).unwrap();
    assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n"));
    assert!(!out.contains("standalone"));
}

#[test]
fn encode_escapes_attribute_values() {
    let mut root = sample_root();
    root.simple.a = "<a&b>\"quoted\"'s".to_owned();
    let out = litexml::to_string(&root).unwrap();
    assert!(out.contains("a=\"&lt;a&amp;b&gt;&quot;quoted&quot;&apos;s\""));
}

// ── Decoding ─────────────────────────────────────────────────────────────────

#[test]
fn decode_compact_document() {
    let input = "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\" ?>\
<simple a=\"1234\" b=\"5678\"><nested c=\"C\" />&amp; here is some content</simple>";
    let decoded: Root = litexml::from_str(input).unwrap();
    assert_eq!(decoded, sample_root());
}

#[test]
fn round_trip_preserves_document() {
    let encoded = litexml::to_string(&sample_root()).unwrap();
    let decoded: Root = litexml::from_str(&encoded).unwrap();
    assert_eq!(decoded, sample_root());
}

#[test]
fn decode_entities_in_attribute_values() {
    let input = "<simple a=\"&quot;&apos;&lt;&gt;&amp; &#x41;&#66; &foo; &bar\" b=\"\" />";
    let decoded: Root = litexml::from_str(input).unwrap();
    // The five predefined entities and both numeric forms decode; unknown
    // entities pass through as text (a well-formed one loses its
    // semicolon).
    assert_eq!(decoded.simple.a, "\"'<>& AB &foo &bar");
}

#[test]
fn decode_ignores_comments_and_unknown_tags() {
    let input = "<!-- preamble --><simple a=\"1\">\
<wild x=\"y\"><deeper/>text</wild>\
<nested c=\"C\" /></simple><!-- trailing -->";
    let decoded: Root = litexml::from_str(input).unwrap();
    assert_eq!(decoded.simple.a, "1");
    assert_eq!(decoded.simple.c, "C");
}

#[test]
fn decode_ignores_unknown_declaration_keys() {
    let input = "<?xml version=\"1.1\" flavor=\"mint\" ?><simple a=\"1\" />";
    let decoded: Root = litexml::from_str(input).unwrap();
    assert_eq!(decoded.info.version, "1.1");
    assert_eq!(decoded.info.encoding, "");
}

#[test]
fn decode_truncated_document_is_lenient() {
    let input = "<simple a=\"1\"><nested ";
    let decoded: Root = litexml::from_str(input).unwrap();
    assert_eq!(decoded.simple.a, "1");
}

#[test]
fn syntax_errors_carry_position() {
    let err: SyntaxError = litexml::from_str::<Sink>("<simple>\n<@").unwrap_err();
    assert_eq!((err.line, err.col), (2, 2));
    assert!(err.message.contains("identifier"));
}
