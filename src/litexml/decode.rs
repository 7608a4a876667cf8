//! Schema-driven decoder: recursive descent over parser tokens.

use super::parse::{Parser, Token};
use super::{Child, Element, SyntaxError};

/// Decode a document into a fresh record.
pub fn from_str<T: Element + Default>(input: &str) -> Result<T, SyntaxError> {
    let mut value = T::default();
    decode_into(input, &mut value)?;
    Ok(value)
}

/// Decode a document into an existing record.
pub fn decode_into(input: &str, root: &mut dyn Element) -> Result<(), SyntaxError> {
    let mut parser = Parser::new(input);
    decode_children(&mut parser, root)
}

/// Consume tokens into `node` until its closing tag (or end of input —
/// truncated documents end leniently, like everything else here).
fn decode_children(parser: &mut Parser, node: &mut dyn Element) -> Result<(), SyntaxError> {
    loop {
        match parser.next_token()? {
            Token::Eof | Token::Close(_) => return Ok(()),
            Token::Decl(info) => node.set_doc_info(info),
            Token::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    node.set_content(trimmed);
                }
            }
            Token::Open {
                name,
                attrs,
                self_closing,
            } => match node.open_child(&name) {
                Some(Child::Node(child)) => {
                    for (key, value) in &attrs {
                        child.set_attr(key, value);
                    }
                    if !self_closing {
                        decode_children(parser, child)?;
                    }
                }
                Some(Child::Leaf { attr, slot }) => {
                    for (key, value) in &attrs {
                        if key == attr {
                            slot.parse_xml(value);
                        }
                    }
                    if !self_closing {
                        skip_element(parser)?;
                    }
                }
                None => {
                    if !self_closing {
                        skip_element(parser)?;
                    }
                }
            },
        }
    }
}

/// Discard a subtree the schema has no field for.
fn skip_element(parser: &mut Parser) -> Result<(), SyntaxError> {
    let mut depth = 1usize;
    loop {
        match parser.next_token()? {
            Token::Eof => return Ok(()),
            Token::Open {
                self_closing: false,
                ..
            } => depth += 1,
            Token::Close(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}
