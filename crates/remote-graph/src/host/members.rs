//! Member tables: how the host reads, writes, navigates and calls members of
//! an exposed type.
//!
//! A type opts in by implementing [`Exposed`] and listing its members with the
//! [`Members`] builder. Only listed members are reachable from the wire.
//!
//! ```ignore
//! impl Exposed for ViewModel {
//!     fn members() -> Members<Self> {
//!         Members::new()
//!             .property(Self::VALUE, |vm| vm.value.clone(), |vm, v| vm.value = v)
//!             .read_only(Self::TUPLE, |vm| vm.tuple)
//!             .method(Self::ADD, |_, (a, b)| a + b)
//!     }
//! }
//! ```

use super::catalog::Catalog;
use crate::codec::{AnyObject, Codec, TypeName};
use crate::path::{Action, Child, Method, Property};
use crate::value::{ArgList, Dynamic};
use crate::{RemoteError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How exposed objects are owned: shared with the host, locked per access.
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// A type whose instances can be exposed or reached through a path.
pub trait Exposed: TypeName + Sync + Sized {
    fn members() -> Members<Self>;
}

/// Type-erased handle to a shared exposed object.
#[derive(Clone)]
pub struct ObjectRef {
    type_name: String,
    cell: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Exposed>(object: &Shared<T>) -> Self {
        Self {
            type_name: T::type_name().into_owned(),
            cell: object.clone(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    fn cell<T: Exposed>(&self) -> Result<&RwLock<T>> {
        self.cell
            .downcast_ref::<RwLock<T>>()
            .ok_or_else(|| RemoteError::TypeMismatch {
                expected: T::type_name().into_owned(),
                actual: self.type_name.clone(),
            })
    }

    // Poison left by a panicking member is ignored
    fn read<T: Exposed>(&self) -> Result<RwLockReadGuard<'_, T>> {
        Ok(self.cell::<T>()?.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T: Exposed>(&self) -> Result<RwLockWriteGuard<'_, T>> {
        Ok(self.cell::<T>()?.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Dynamic + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Dynamic) -> Result<()> + Send + Sync>;
type Navigator<T> = Box<dyn Fn(&T) -> ObjectRef + Send + Sync>;
type Invoker<T> = Box<dyn Fn(&mut T, Vec<Dynamic>) -> Result<Option<Dynamic>> + Send + Sync>;

/// Registration hook run when a table is added to the catalog.
pub(crate) type Register = fn(&mut Catalog);

struct PropertyEntry<T> {
    get: Getter<T>,
    set: Option<Setter<T>>,
}

struct Overload<T> {
    params: Vec<String>,
    call: Invoker<T>,
}

/// Builder for the members of `T` reachable from the wire.
pub struct Members<T> {
    properties: HashMap<&'static str, PropertyEntry<T>>,
    children: HashMap<&'static str, Navigator<T>>,
    methods: HashMap<&'static str, Vec<Overload<T>>>,
    pub(crate) dependents: Vec<Register>,
}

impl<T: Exposed> Members<T> {
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
            children: HashMap::new(),
            methods: HashMap::new(),
            dependents: Vec::new(),
        }
    }

    /// A readable and writable property.
    pub fn property<V: Codec>(
        mut self,
        property: Property<T, V>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self {
        let set: Setter<T> = Box::new(move |target: &mut T, value: Dynamic| {
            set(target, value.take::<V>()?);
            Ok(())
        });
        self.insert_property(property, get, Some(set));
        self
    }

    pub fn read_only<V: Codec>(
        mut self,
        property: Property<T, V>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self {
        self.insert_property(property, get, None);
        self
    }

    fn insert_property<V: Codec>(
        &mut self,
        property: Property<T, V>,
        get: impl Fn(&T) -> V + Send + Sync + 'static,
        set: Option<Setter<T>>,
    ) {
        let get: Getter<T> = Box::new(move |target: &T| Dynamic::from_codec(get(target)));
        self.properties.insert(property.name(), PropertyEntry { get, set });
        self.dependents.push(Catalog::register_codec::<V>);
    }

    /// A member holding another exposed object.
    pub fn child<U: Exposed>(
        mut self,
        child: Child<T, U>,
        get: impl Fn(&T) -> Shared<U> + Send + Sync + 'static,
    ) -> Self {
        let navigate: Navigator<T> = Box::new(move |target: &T| ObjectRef::new(&get(target)));
        self.children.insert(child.name(), navigate);
        self.dependents.push(Catalog::register_members::<U>);
        self
    }

    /// A member whose object type is only known at run time.
    ///
    /// The possible runtime types must be registered with the host separately.
    pub fn child_object(
        mut self,
        child: Child<T, AnyObject>,
        get: impl Fn(&T) -> ObjectRef + Send + Sync + 'static,
    ) -> Self {
        self.children.insert(child.name(), Box::new(get));
        self
    }

    /// A method returning a value. Several methods may share a name as long
    /// as their parameter types differ.
    pub fn method<Args: ArgList, R: Codec>(
        mut self,
        method: Method<T, Args, R>,
        call: impl Fn(&mut T, Args) -> R + Send + Sync + 'static,
    ) -> Self {
        let call: Invoker<T> = Box::new(move |target: &mut T, args: Vec<Dynamic>| {
            let result = call(target, Args::from_dynamics(args)?);
            Ok(Some(Dynamic::from_codec(result)))
        });
        self.insert_overload(method.name(), Args::param_types(), call);
        self.dependents.push(Catalog::register_codec::<R>);
        self
    }

    /// A method with no result.
    pub fn action<Args: ArgList>(
        mut self,
        action: Action<T, Args>,
        call: impl Fn(&mut T, Args) + Send + Sync + 'static,
    ) -> Self {
        let call: Invoker<T> = Box::new(move |target: &mut T, args: Vec<Dynamic>| {
            call(target, Args::from_dynamics(args)?);
            Ok(None)
        });
        self.insert_overload(action.name(), Args::param_types(), call);
        self
    }

    fn insert_overload(&mut self, name: &'static str, params: Vec<String>, call: Invoker<T>) {
        self.methods
            .entry(name)
            .or_default()
            .push(Overload { params, call });
    }
}

impl<T: Exposed> Default for Members<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Erased view of a [`Members`] table.
pub(crate) trait MemberTable: Send + Sync {
    fn read(&self, object: &ObjectRef, member: &str) -> Result<Dynamic>;
    fn write(&self, object: &ObjectRef, member: &str, value: Dynamic) -> Result<()>;
    fn navigate(&self, object: &ObjectRef, member: &str) -> Result<ObjectRef>;
    fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: Vec<Dynamic>,
    ) -> Result<Option<Dynamic>>;
}

pub(crate) struct Table<T> {
    type_name: String,
    members: Members<T>,
}

impl<T: Exposed> Table<T> {
    pub(crate) fn new(members: Members<T>) -> Self {
        Self {
            type_name: T::type_name().into_owned(),
            members,
        }
    }

    fn property(&self, member: &str) -> Result<&PropertyEntry<T>> {
        match self.members.properties.get(member) {
            Some(entry) => Ok(entry),
            None if self.members.children.contains_key(member) => Err(RemoteError::NotAValue {
                member: member.to_string(),
                container: self.type_name.clone(),
            }),
            None => Err(self.missing(member)),
        }
    }

    fn missing(&self, member: &str) -> RemoteError {
        RemoteError::MemberNotFound {
            member: member.to_string(),
            container: self.type_name.clone(),
        }
    }
}

impl<T: Exposed> MemberTable for Table<T> {
    fn read(&self, object: &ObjectRef, member: &str) -> Result<Dynamic> {
        let property = self.property(member)?;
        let target = object.read::<T>()?;
        Ok((property.get)(&*target))
    }

    fn write(&self, object: &ObjectRef, member: &str, value: Dynamic) -> Result<()> {
        let set = self.property(member)?.set.as_ref().ok_or_else(|| RemoteError::ReadOnly {
            member: member.to_string(),
            container: self.type_name.clone(),
        })?;
        let mut target = object.write::<T>()?;
        set(&mut *target, value)
    }

    fn navigate(&self, object: &ObjectRef, member: &str) -> Result<ObjectRef> {
        let navigate = match self.members.children.get(member) {
            Some(navigate) => navigate,
            None if self.members.properties.contains_key(member) => {
                return Err(RemoteError::NotAnObject {
                    member: member.to_string(),
                    container: self.type_name.clone(),
                })
            }
            None => return Err(self.missing(member)),
        };
        let target = object.read::<T>()?;
        Ok(navigate(&*target))
    }

    fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: Vec<Dynamic>,
    ) -> Result<Option<Dynamic>> {
        let actual: Vec<&str> = args.iter().map(Dynamic::type_name).collect();
        let overload = self
            .members
            .methods
            .get(method)
            .and_then(|overloads| {
                overloads
                    .iter()
                    .find(|overload| {
                        overload.params.iter().map(String::as_str).eq(actual.iter().copied())
                    })
            })
            .ok_or_else(|| RemoteError::MethodNotFound {
                method: method.to_string(),
                params: actual.join(", "),
                container: self.type_name.clone(),
            })?;

        let mut target = object.write::<T>()?;
        (overload.call)(&mut *target, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        count: i32,
        label: String,
        inner: Shared<Inner>,
    }

    struct Inner {
        depth: u8,
    }

    crate::impl_type_name!(Counter => "test::Counter");
    crate::impl_type_name!(Inner => "test::Inner");

    const COUNT: Property<Counter, i32> = Property::new("Count");
    const LABEL: Property<Counter, String> = Property::new("Label");
    const INNER: Child<Counter, Inner> = Child::new("Inner");
    const DEPTH: Property<Inner, u8> = Property::new("Depth");
    const ADD: Method<Counter, (i32,), i32> = Method::new("Add");
    const ADD_TEXT: Method<Counter, (String,), String> = Method::new("Add");
    const RESET: Action<Counter, ()> = Action::new("Reset");

    impl Exposed for Counter {
        fn members() -> Members<Self> {
            Members::new()
                .property(COUNT, |c| c.count, |c, v| c.count = v)
                .read_only(LABEL, |c| c.label.clone())
                .child(INNER, |c| c.inner.clone())
                .method(ADD, |c, (n,)| {
                    c.count += n;
                    c.count
                })
                .method(ADD_TEXT, |c, (text,)| format!("{}{}", c.label, text))
                .action(RESET, |c, ()| c.count = 0)
        }
    }

    impl Exposed for Inner {
        fn members() -> Members<Self> {
            Members::new().read_only(DEPTH, |i| i.depth)
        }
    }

    fn fixture() -> (Table<Counter>, ObjectRef) {
        let counter = shared(Counter {
            count: 1,
            label: "n=".into(),
            inner: shared(Inner { depth: 2 }),
        });
        (Table::new(Counter::members()), ObjectRef::new(&counter))
    }

    #[test]
    fn test_read_and_write_property() {
        let (table, object) = fixture();
        assert_eq!(table.read(&object, "Count").unwrap().render().unwrap(), "1");

        table.write(&object, "Count", Dynamic::from_codec(5i32)).unwrap();
        assert_eq!(table.read(&object, "Count").unwrap().take::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_write_read_only_property() {
        let (table, object) = fixture();
        let err = table.write(&object, "Label", Dynamic::from_codec("x".to_string())).unwrap_err();
        assert!(matches!(err, RemoteError::ReadOnly { .. }));
    }

    #[test]
    fn test_write_wrong_type() {
        let (table, object) = fixture();
        let err = table.write(&object, "Count", Dynamic::from_codec("5".to_string())).unwrap_err();
        assert!(matches!(err, RemoteError::TypeMismatch { .. }));
    }

    #[test]
    fn test_missing_member_names_container() {
        let (table, object) = fixture();
        let err = table.read(&object, "Missing").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Missing"));
        assert!(text.contains("test::Counter"));
    }

    #[test]
    fn test_navigate_child() {
        let (table, object) = fixture();
        let inner = table.navigate(&object, "Inner").unwrap();
        assert_eq!(inner.type_name(), "test::Inner");

        let inner_table = Table::new(Inner::members());
        assert_eq!(inner_table.read(&inner, "Depth").unwrap().render().unwrap(), "2");
    }

    #[test]
    fn test_value_and_object_members_are_distinct() {
        let (table, object) = fixture();
        assert!(matches!(table.read(&object, "Inner"), Err(RemoteError::NotAValue { .. })));
        assert!(matches!(table.navigate(&object, "Count"), Err(RemoteError::NotAnObject { .. })));
    }

    #[test]
    fn test_overloads_selected_by_exact_types() {
        let (table, object) = fixture();

        let number = table.invoke(&object, "Add", vec![Dynamic::from_codec(2i32)]).unwrap();
        assert_eq!(number.unwrap().render().unwrap(), "3");

        let args = vec![Dynamic::from_codec("x".to_string())];
        let text = table.invoke(&object, "Add", args).unwrap();
        assert_eq!(text.unwrap().render().unwrap(), "n=x");
    }

    #[test]
    fn test_no_widening_between_overloads() {
        let (table, object) = fixture();
        let err = table.invoke(&object, "Add", vec![Dynamic::from_codec(2i64)]).unwrap_err();
        assert!(matches!(err, RemoteError::MethodNotFound { ref params, .. } if params == "i64"));
    }

    #[test]
    fn test_action_has_no_result() {
        let (table, object) = fixture();
        assert!(table.invoke(&object, "Reset", Vec::new()).unwrap().is_none());
        assert_eq!(table.read(&object, "Count").unwrap().take::<i32>().unwrap(), 0);
    }

    #[test]
    fn test_dependents_cover_property_and_child_types() {
        let mut catalog = Catalog::empty();
        for register in Counter::members().dependents {
            register(&mut catalog);
        }
        assert!(catalog.can_encode("i32"));
        assert!(catalog.can_encode("String"));
        assert!(catalog.has_members("test::Inner"));
    }
}
