//! Turns argument nodes into concrete values.

use super::catalog::Catalog;
use crate::node::ArgumentNode;
use crate::value::Dynamic;
use crate::{RemoteError, Result};

/// Decode one node: literals through the catalog's codecs, constructor nodes
/// through the registered factory (arguments first, initializers after).
pub(crate) fn decode(catalog: &Catalog, node: &ArgumentNode) -> Result<Dynamic> {
    match node {
        ArgumentNode::Value { type_name, literal } => catalog.parse(type_name, literal),
        ArgumentNode::Constructor {
            type_name,
            args,
            initializers,
        } => {
            let args = decode_all(catalog, args)?;
            let factory = catalog
                .factory(type_name)
                .ok_or_else(|| RemoteError::ConstructionFailed {
                    type_name: type_name.clone(),
                    params: args
                        .iter()
                        .map(Dynamic::type_name)
                        .collect::<Vec<_>>()
                        .join(", "),
                })?;

            let initializers = initializers
                .iter()
                .map(|init| {
                    let value = catalog.parse(&init.type_name, &init.literal)?;
                    Ok((init.property.clone(), value))
                })
                .collect::<Result<Vec<_>>>()?;

            factory.construct(args, initializers)
        }
    }
}

pub(crate) fn decode_all(catalog: &Catalog, nodes: &[ArgumentNode]) -> Result<Vec<Dynamic>> {
    nodes.iter().map(|node| decode(catalog, node)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Constructible, Factory};
    use crate::node::Initializer;
    use crate::path::Property;

    #[derive(Debug)]
    struct Param {
        value: String,
    }

    crate::impl_type_name!(Param => "test::Param");

    const VALUE: Property<Param, String> = Property::new("Value");

    impl Constructible for Param {
        fn factory() -> Factory<Self> {
            Factory::new()
                .constructor(|(): ()| Param { value: String::new() })
                .constructor(|(a, b): (String, String)| Param { value: a + &b })
                .constructor(|(inner,): (Param,)| Param {
                    value: format!("[{}]", inner.value),
                })
                .initializer(VALUE, |p, v| p.value = v)
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.register_factory::<Param>();
        catalog
    }

    fn string(literal: &str) -> ArgumentNode {
        ArgumentNode::value(&literal.to_string())
    }

    #[test]
    fn test_decode_literal() {
        let value = decode(&catalog(), &ArgumentNode::value(&7i32)).unwrap();
        assert_eq!(value.take::<i32>().unwrap(), 7);
    }

    #[test]
    fn test_decode_unsupported_literal() {
        let node = ArgumentNode::Value {
            type_name: "test::Unknown".into(),
            literal: "x".into(),
        };
        assert!(matches!(
            decode(&catalog(), &node),
            Err(RemoteError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_decode_constructor_with_init() {
        let node = ArgumentNode::Constructor {
            type_name: "test::Param".into(),
            args: vec![string("1"), string("2")],
            initializers: Vec::new(),
        };
        assert_eq!(decode(&catalog(), &node).unwrap().take::<Param>().unwrap().value, "12");

        let node = ArgumentNode::Constructor {
            type_name: "test::Param".into(),
            args: Vec::new(),
            initializers: vec![Initializer {
                property: "Value".into(),
                type_name: "String".into(),
                literal: "3".into(),
            }],
        };
        assert_eq!(decode(&catalog(), &node).unwrap().take::<Param>().unwrap().value, "3");
    }

    #[test]
    fn test_decode_nested_constructor() {
        let node = ArgumentNode::Constructor {
            type_name: "test::Param".into(),
            args: vec![ArgumentNode::Constructor {
                type_name: "test::Param".into(),
                args: vec![string("a"), string("b")],
                initializers: Vec::new(),
            }],
            initializers: Vec::new(),
        };
        assert_eq!(decode(&catalog(), &node).unwrap().take::<Param>().unwrap().value, "[ab]");
    }

    struct Inner(String);

    struct Outer {
        inner: String,
        label: String,
        tag: String,
    }

    crate::impl_type_name!(Inner => "test::Inner");
    crate::impl_type_name!(Outer => "test::Outer");

    const TAG: Property<Outer, String> = Property::new("Tag");

    impl Constructible for Inner {
        fn factory() -> Factory<Self> {
            Factory::new().constructor(|(text,): (String,)| Inner(text))
        }
    }

    impl Constructible for Outer {
        fn factory() -> Factory<Self> {
            Factory::new()
                .constructor(|(inner, label): (Inner, String)| Outer {
                    inner: inner.0,
                    label,
                    tag: String::new(),
                })
                .initializer(TAG, |o, v| o.tag = v)
        }
    }

    #[test]
    fn test_decode_mixed_constructor_from_markup() {
        let node = crate::Construct::<Outer>::new()
            .nested(crate::Construct::<Inner>::new().arg("a".to_string()))
            .arg("b".to_string())
            .init(TAG, "c".to_string())
            .into_node();
        let parsed = ArgumentNode::from_markup(&node.to_markup()).unwrap();
        assert_eq!(parsed, node);

        let mut catalog = Catalog::new();
        catalog.register_factory::<Inner>();
        catalog.register_factory::<Outer>();

        let outer = decode(&catalog, &parsed).unwrap().take::<Outer>().unwrap();
        assert_eq!(outer.inner, "a");
        assert_eq!(outer.label, "b");
        assert_eq!(outer.tag, "c");
    }

    #[test]
    fn test_decode_unregistered_factory() {
        let node = ArgumentNode::Constructor {
            type_name: "test::Other".into(),
            args: vec![string("1")],
            initializers: Vec::new(),
        };
        let err = decode(&catalog(), &node).unwrap_err();
        assert!(matches!(
            err,
            RemoteError::ConstructionFailed { ref params, .. } if params == "String"
        ));
    }
}
