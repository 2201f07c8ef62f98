//! Factories for argument types the host builds from constructor nodes.

use super::catalog::Catalog;
use super::members::Register;
use crate::codec::{Codec, TypeName};
use crate::path::Property;
use crate::value::{ArgList, Dynamic};
use crate::{RemoteError, Result};
use std::collections::HashMap;

/// A type the host can build from a constructor node.
pub trait Constructible: TypeName + Sized {
    fn factory() -> Factory<Self>;
}

type Build<T> = Box<dyn Fn(Vec<Dynamic>) -> Result<T> + Send + Sync>;
type Apply<T> = Box<dyn Fn(&mut T, Dynamic) -> Result<()> + Send + Sync>;

struct Constructor<T> {
    params: Vec<String>,
    build: Build<T>,
}

/// Builder listing the constructors and initializable properties of `T`.
pub struct Factory<T> {
    constructors: Vec<Constructor<T>>,
    initializers: HashMap<&'static str, Apply<T>>,
    pub(crate) dependents: Vec<Register>,
}

impl<T: Constructible> Factory<T> {
    pub fn new() -> Self {
        Self {
            constructors: Vec::new(),
            initializers: HashMap::new(),
            dependents: Vec::new(),
        }
    }

    /// A constructor taking the tuple `Args`. Selected when the node's
    /// argument types match `Args` exactly.
    pub fn constructor<Args: ArgList>(
        mut self,
        build: impl Fn(Args) -> T + Send + Sync + 'static,
    ) -> Self {
        let build: Build<T> =
            Box::new(move |args: Vec<Dynamic>| Ok(build(Args::from_dynamics(args)?)));
        self.constructors.push(Constructor {
            params: Args::param_types(),
            build,
        });
        self
    }

    /// A property that may be assigned after construction.
    pub fn initializer<V: Codec>(
        mut self,
        property: Property<T, V>,
        apply: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let apply: Apply<T> = Box::new(move |target: &mut T, value: Dynamic| {
            apply(target, value.take::<V>()?);
            Ok(())
        });
        self.initializers.insert(property.name(), apply);
        self.dependents.push(Catalog::register_codec::<V>);
        self
    }
}

impl<T: Constructible> Default for Factory<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Erased view of a [`Factory`].
pub(crate) trait FactoryTable: Send + Sync {
    fn construct(
        &self,
        args: Vec<Dynamic>,
        initializers: Vec<(String, Dynamic)>,
    ) -> Result<Dynamic>;
}

pub(crate) struct Built<T> {
    type_name: String,
    factory: Factory<T>,
}

impl<T: Constructible> Built<T> {
    pub(crate) fn new(factory: Factory<T>) -> Self {
        Self {
            type_name: T::type_name().into_owned(),
            factory,
        }
    }
}

impl<T: Constructible> FactoryTable for Built<T> {
    fn construct(
        &self,
        args: Vec<Dynamic>,
        initializers: Vec<(String, Dynamic)>,
    ) -> Result<Dynamic> {
        let actual: Vec<&str> = args.iter().map(Dynamic::type_name).collect();
        let constructor = self
            .factory
            .constructors
            .iter()
            .find(|c| c.params.iter().map(String::as_str).eq(actual.iter().copied()))
            .ok_or_else(|| RemoteError::ConstructionFailed {
                type_name: self.type_name.clone(),
                params: actual.join(", "),
            })?;

        let mut value = (constructor.build)(args)?;

        for (property, init) in initializers {
            let apply = self
                .factory
                .initializers
                .get(property.as_str())
                .ok_or_else(|| RemoteError::MemberNotFound {
                    member: property.clone(),
                    container: self.type_name.clone(),
                })?;
            apply(&mut value, init)?;
        }

        Ok(Dynamic::opaque(value))
    }
}
