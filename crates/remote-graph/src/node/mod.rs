//! Argument trees and their wire markup.
//!
//! An argument is either a literal value tagged with its type, or a
//! constructor call with positional arguments and property initializers:
//!
//! ```text
//! <value type="i32">3</value>
//! <ctor type="demo::MyParam">
//!   <value type="String">1</value>
//!   <value type="String">2</value>
//!   <init prop="Value" type="String">3</init>
//! </ctor>
//! ```
//!
//! SET carries one node. INVOKE wraps its positional arguments in `<args>`.

mod markup;

use crate::codec::Codec;
use crate::{RemoteError, Result};
use markup::{escape, Element};

/// One argument as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentNode {
    Value {
        type_name: String,
        literal: String,
    },
    Constructor {
        type_name: String,
        args: Vec<ArgumentNode>,
        initializers: Vec<Initializer>,
    },
}

/// A `property = literal` assignment applied after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    pub property: String,
    pub type_name: String,
    pub literal: String,
}

impl ArgumentNode {
    pub fn value<T: Codec>(value: &T) -> Self {
        ArgumentNode::Value {
            type_name: T::type_name().into_owned(),
            literal: value.stringify(),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            ArgumentNode::Value { type_name, .. } | ArgumentNode::Constructor { type_name, .. } => {
                type_name
            }
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    pub fn from_markup(text: &str) -> Result<Self> {
        Self::from_element(&markup::parse(text)?)
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            ArgumentNode::Value { type_name, literal } => {
                out.push_str(&format!(
                    "<value type=\"{}\">{}</value>",
                    escape(type_name),
                    escape(literal)
                ));
            }
            ArgumentNode::Constructor {
                type_name,
                args,
                initializers,
            } => {
                out.push_str(&format!("<ctor type=\"{}\">", escape(type_name)));
                for arg in args {
                    arg.write_markup(out);
                }
                for init in initializers {
                    out.push_str(&format!(
                        "<init prop=\"{}\" type=\"{}\">{}</init>",
                        escape(&init.property),
                        escape(&init.type_name),
                        escape(&init.literal)
                    ));
                }
                out.push_str("</ctor>");
            }
        }
    }

    fn from_element(element: &Element) -> Result<Self> {
        match element.name.as_str() {
            "value" => Ok(ArgumentNode::Value {
                type_name: element.required_attr("type")?.to_string(),
                literal: element.text.clone(),
            }),
            "ctor" => {
                let mut args = Vec::new();
                let mut initializers = Vec::new();
                for child in &element.children {
                    if child.name == "init" {
                        initializers.push(Initializer {
                            property: child.required_attr("prop")?.to_string(),
                            type_name: child.required_attr("type")?.to_string(),
                            literal: child.text.clone(),
                        });
                    } else {
                        args.push(Self::from_element(child)?);
                    }
                }
                Ok(ArgumentNode::Constructor {
                    type_name: element.required_attr("type")?.to_string(),
                    args,
                    initializers,
                })
            }
            other => Err(RemoteError::Protocol {
                message: format!("Unexpected argument element <{}>", other),
            }),
        }
    }
}

/// Wrap INVOKE arguments in `<args>`.
pub fn encode_args(nodes: &[ArgumentNode]) -> String {
    let mut out = String::from("<args>");
    for node in nodes {
        node.write_markup(&mut out);
    }
    out.push_str("</args>");
    out
}

/// Parse an `<args>` payload. An empty payload means no arguments.
pub fn decode_args(text: &str) -> Result<Vec<ArgumentNode>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let root = markup::parse(text)?;
    if root.name != "args" {
        return Err(RemoteError::Protocol {
            message: format!("Expected <args>, found <{}>", root.name),
        });
    }

    root.children.iter().map(ArgumentNode::from_element).collect()
}
