//! Per-host registry of codecs, factories and member tables, keyed by wire
//! type identity.
//!
//! Member tables pull in what they depend on: registering `T` also registers
//! the codecs of its property and return types and the tables of its typed
//! children. Types reached only through [`AnyObject`](crate::AnyObject)
//! children, and constructor argument types, are registered explicitly.

use super::factory::{Built, Constructible, FactoryTable};
use super::members::{Exposed, MemberTable, Table};
use crate::codec::Codec;
use crate::value::Dynamic;
use crate::{RemoteError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type ParseFn = fn(&str) -> Result<Dynamic>;

fn parse_codec<V: Codec>(literal: &str) -> Result<Dynamic> {
    V::parse(literal).map(Dynamic::from_codec)
}

pub struct Catalog {
    codecs: HashMap<String, ParseFn>,
    factories: HashMap<String, Arc<dyn FactoryTable>>,
    members: HashMap<String, Arc<dyn MemberTable>>,
}

impl Catalog {
    /// A catalog with the built-in codecs registered.
    pub fn new() -> Self {
        let mut catalog = Self::empty();
        catalog.register_codec::<String>();
        catalog.register_codec::<bool>();
        catalog.register_codec::<char>();
        catalog.register_codec::<i8>();
        catalog.register_codec::<i16>();
        catalog.register_codec::<i32>();
        catalog.register_codec::<i64>();
        catalog.register_codec::<i128>();
        catalog.register_codec::<isize>();
        catalog.register_codec::<u8>();
        catalog.register_codec::<u16>();
        catalog.register_codec::<u32>();
        catalog.register_codec::<u64>();
        catalog.register_codec::<u128>();
        catalog.register_codec::<usize>();
        catalog.register_codec::<f32>();
        catalog.register_codec::<f64>();
        catalog
    }

    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
            factories: HashMap::new(),
            members: HashMap::new(),
        }
    }

    pub fn register_codec<V: Codec>(&mut self) {
        self.codecs
            .entry(V::type_name().into_owned())
            .or_insert(parse_codec::<V>);
    }

    pub fn register_factory<T: Constructible>(&mut self) {
        let type_name = T::type_name().into_owned();
        if self.factories.contains_key(&type_name) {
            return;
        }

        let factory = T::factory();
        let dependents = factory.dependents.clone();
        debug!("Registering factory for {}", type_name);
        self.factories.insert(type_name, Arc::new(Built::new(factory)));

        for register in dependents {
            register(self);
        }
    }

    pub fn register_members<T: Exposed>(&mut self) {
        let type_name = T::type_name().into_owned();
        if self.members.contains_key(&type_name) {
            return;
        }

        let members = T::members();
        let dependents = members.dependents.clone();
        debug!("Registering members of {}", type_name);
        // Insert before recursing so cyclic graphs terminate
        self.members.insert(type_name, Arc::new(Table::new(members)));

        for register in dependents {
            register(self);
        }
    }

    /// True if literals of `type_name` can be parsed.
    pub fn can_encode(&self, type_name: &str) -> bool {
        self.codecs.contains_key(type_name)
    }

    pub fn can_construct(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn has_members(&self, type_name: &str) -> bool {
        self.members.contains_key(type_name)
    }

    /// Parse a literal with the codec registered for `type_name`.
    pub fn parse(&self, type_name: &str, literal: &str) -> Result<Dynamic> {
        let parse = self.codecs.get(type_name).ok_or_else(|| RemoteError::NotSupported {
            type_name: type_name.to_string(),
        })?;
        parse(literal)
    }

    pub(crate) fn factory(&self, type_name: &str) -> Option<Arc<dyn FactoryTable>> {
        self.factories.get(type_name).cloned()
    }

    pub(crate) fn members(&self, type_name: &str) -> Result<Arc<dyn MemberTable>> {
        self.members
            .get(type_name)
            .cloned()
            .ok_or_else(|| RemoteError::UnknownType {
                type_name: type_name.to_string(),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{shared, Factory, Members, Shared};
    use crate::path::{Child, Property};

    struct Node {
        next: Option<Shared<Node>>,
        weight: u16,
    }

    crate::impl_type_name!(Node => "test::Node");

    const NEXT: Child<Node, Node> = Child::new("Next");
    const WEIGHT: Property<Node, u16> = Property::new("Weight");

    impl Exposed for Node {
        fn members() -> Members<Self> {
            Members::new()
                .child(NEXT, |n| {
                    n.next
                        .clone()
                        .unwrap_or_else(|| shared(Node { next: None, weight: 0 }))
                })
                .read_only(WEIGHT, |n| n.weight)
        }
    }

    crate::codec_enum! {
        #[derive(Debug, PartialEq)]
        enum Mode as "test::Mode" { Fast, Slow }
    }

    struct Token(String);
    crate::impl_type_name!(Token => "test::Token");

    impl Constructible for Token {
        fn factory() -> Factory<Self> {
            Factory::new().constructor(|(mode,): (Mode,)| Token(format!("{:?}", mode)))
        }
    }

    #[test]
    fn test_builtins_are_registered() {
        let catalog = Catalog::new();
        for name in ["String", "bool", "i32", "u64", "f64", "char"] {
            assert!(catalog.can_encode(name), "{} should be encodable", name);
        }
        assert!(!catalog.can_encode("test::Mode"));
    }

    #[test]
    fn test_parse_with_registered_codec() {
        let mut catalog = Catalog::new();
        catalog.register_codec::<Mode>();

        let value = catalog.parse("test::Mode", "Slow").unwrap();
        assert_eq!(value.take::<Mode>().unwrap(), Mode::Slow);
    }

    #[test]
    fn test_parse_unregistered_type() {
        let err = Catalog::new().parse("test::Mode", "Slow").unwrap_err();
        assert!(matches!(
            err,
            RemoteError::NotSupported { ref type_name } if type_name == "test::Mode"
        ));
    }

    #[test]
    fn test_self_referential_members_terminate() {
        let mut catalog = Catalog::empty();
        catalog.register_members::<Node>();
        assert!(catalog.has_members("test::Node"));
        assert!(catalog.can_encode("u16"));
    }

    #[test]
    fn test_unknown_member_table() {
        let err = Catalog::new().members("test::Ghost").err().unwrap();
        assert!(matches!(err, RemoteError::UnknownType { .. }));
    }

    #[test]
    fn test_factory_registration() {
        let mut catalog = Catalog::new();
        catalog.register_factory::<Token>();
        assert!(catalog.can_construct("test::Token"));
        assert!(catalog.factory("test::Token").is_some());
        assert!(catalog.factory("test::Other").is_none());
    }
}
