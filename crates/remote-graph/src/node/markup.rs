//! Minimal element markup for argument trees.
//!
//! Supports exactly what argument payloads need: nested elements, double-quoted
//! attributes, self-closing tags, character text, and the five predefined
//! entities plus numeric character references. No comments, processing
//! instructions, CDATA or namespaces.

use crate::{RemoteError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attr(&self, key: &str) -> Result<&str> {
        self.attr(key).ok_or_else(|| {
            markup_error(format!("<{}> is missing the '{}' attribute", self.name, key))
        })
    }
}

/// Escape text for use in element content or a double-quoted attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| markup_error(format!("unterminated entity in '{}'", raw)))?;
        let entity = &after[..semi];

        let c = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| markup_error(format!("unknown entity '&{};'", entity)))?
            }
        };

        out.push(c);
        rest = &after[semi + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn markup_error(message: String) -> RemoteError {
    RemoteError::Protocol {
        message: format!("Malformed argument markup: {}", message),
    }
}

/// Parse a single root element, allowing surrounding whitespace.
pub(crate) fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader { src: input, pos: 0 };
    reader.skip_ws();
    let element = reader.element()?;
    reader.skip_ws();
    if !reader.rest().is_empty() {
        return Err(markup_error(format!(
            "unexpected trailing content '{}'",
            reader.rest()
        )));
    }
    Ok(element)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.starts_with(token) {
            self.advance(token.len());
            Ok(())
        } else {
            Err(markup_error(format!(
                "expected '{}' at offset {}",
                token, self.pos
            )))
        }
    }

    fn name(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(markup_error(format!("expected a name at offset {}", self.pos)));
        }
        self.advance(end);
        Ok(&rest[..end])
    }

    fn element(&mut self) -> Result<Element> {
        self.expect("<")?;
        let name = self.name()?.to_string();
        let mut attrs = Vec::new();

        loop {
            self.skip_ws();
            if self.starts_with("/>") {
                self.advance(2);
                return Ok(Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    text: String::new(),
                });
            }
            if self.starts_with(">") {
                self.advance(1);
                break;
            }

            let key = self.name()?.to_string();
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            self.expect("\"")?;
            let end = self
                .rest()
                .find('"')
                .ok_or_else(|| markup_error(format!("unterminated attribute '{}'", key)))?;
            let value = unescape(&self.rest()[..end])?;
            self.advance(end + 1);
            attrs.push((key, value));
        }

        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            if self.starts_with("</") {
                self.advance(2);
                let close = self.name()?;
                if close != name {
                    return Err(markup_error(format!(
                        "<{}> closed by </{}>",
                        name, close
                    )));
                }
                self.skip_ws();
                self.expect(">")?;
                break;
            }
            if self.starts_with("<") {
                children.push(self.element()?);
                continue;
            }
            if self.rest().is_empty() {
                return Err(markup_error(format!("<{}> is never closed", name)));
            }

            let end = self.rest().find('<').unwrap_or(self.rest().len());
            text.push_str(&unescape(&self.rest()[..end])?);
            self.advance(end);
        }

        Ok(Element {
            name,
            attrs,
            children,
            text,
        })
    }
}
