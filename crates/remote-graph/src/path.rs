//! Member descriptors and dotted member paths.
//!
//! Descriptors are `const` values shared by the client and host builds. A
//! client composes them with [`Accessor`] into an [`Expr`], which
//! [`compile_path`] flattens into the dotted path sent on the wire:
//!
//! ```
//! use remote_graph::path::{Accessor, Child, Property};
//!
//! struct Window;
//! struct Model;
//! remote_graph::impl_type_name!(Window => "demo::Window");
//! remote_graph::impl_type_name!(Model => "demo::Model");
//!
//! const MODEL: Child<Window, Model> = Child::new("Model");
//! const TITLE: Property<Model, String> = Property::new("Title");
//!
//! let leaf = Accessor::<Window, Window>::root().child(MODEL).property(TITLE);
//! assert_eq!(leaf.path().unwrap(), "Model.Title");
//! ```

use crate::args::IntoArgs;
use crate::codec::TypeName;
use crate::node::ArgumentNode;
use crate::{RemoteError, Result};
use std::fmt;
use std::marker::PhantomData;

macro_rules! descriptor {
    ($(#[$meta:meta])* $name:ident<$($param:ident),+>) => {
        $(#[$meta])*
        pub struct $name<$($param),+> {
            name: &'static str,
            _marker: PhantomData<fn($($param),+)>,
        }

        impl<$($param),+> $name<$($param),+> {
            pub const fn new(name: &'static str) -> Self {
                Self {
                    name,
                    _marker: PhantomData,
                }
            }

            pub const fn name(&self) -> &'static str {
                self.name
            }
        }

        impl<$($param),+> Clone for $name<$($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<$($param),+> Copy for $name<$($param),+> {}

        impl<$($param),+> fmt::Debug for $name<$($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.name)
            }
        }
    };
}

descriptor! {
    /// A readable (and possibly writable) member of `T` holding a `V`.
    Property<T, V>
}

descriptor! {
    /// A member of `T` that leads to another object of type `U`.
    Child<T, U>
}

descriptor! {
    /// A method of `T` taking the tuple `Args` and returning `R`.
    Method<T, Args, R>
}

descriptor! {
    /// A method of `T` taking the tuple `Args` with no result.
    Action<T, Args>
}

/// Client-side member-access expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// The exposed target itself.
    Root,
    Member { target: Box<Expr>, name: String },
    Call { target: Box<Expr>, name: String },
    /// A type assertion; transparent in the compiled path.
    Cast { target: Box<Expr>, type_name: String },
    /// Indexer access. Has no path form.
    Index { target: Box<Expr>, key: String },
}

impl Expr {
    fn kind(&self) -> &'static str {
        match self {
            Expr::Root => "Root",
            Expr::Member { .. } => "Member",
            Expr::Call { .. } => "Call",
            Expr::Cast { .. } => "Cast",
            Expr::Index { .. } => "Index",
        }
    }
}

/// Flatten an expression into `"A.B.C"`, skipping casts.
///
/// The root alone compiles to the empty string.
pub fn compile_path(expr: &Expr) -> Result<String> {
    let mut names = Vec::new();
    let mut current = expr;

    loop {
        match current {
            Expr::Root => break,
            Expr::Member { target, name } | Expr::Call { target, name } => {
                names.push(name.as_str());
                current = &**target;
            }
            Expr::Cast { target, .. } => current = &**target,
            Expr::Index { .. } => {
                return Err(RemoteError::Unsupported {
                    node: current.kind().to_string(),
                })
            }
        }
    }

    names.reverse();
    Ok(names.join("."))
}

/// Typed builder positioned at an object of type `Current`, reached from `Root`.
pub struct Accessor<Root, Current> {
    expr: Expr,
    _marker: PhantomData<fn(Root) -> Current>,
}

impl<Root> Accessor<Root, Root> {
    pub fn root() -> Self {
        Self::at(Expr::Root)
    }
}

impl<Root, Current> Accessor<Root, Current> {
    fn at(expr: Expr) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn child<U>(self, child: Child<Current, U>) -> Accessor<Root, U> {
        Accessor::at(Expr::Member {
            target: Box::new(self.expr),
            name: child.name().to_string(),
        })
    }

    /// Assert the current object is a `U`.
    pub fn cast<U: TypeName>(self) -> Accessor<Root, U> {
        Accessor::at(Expr::Cast {
            target: Box::new(self.expr),
            type_name: U::type_name().into_owned(),
        })
    }

    /// Index into the current object. Compiling such a path always fails.
    pub fn index(self, key: impl Into<String>) -> Accessor<Root, Current> {
        Accessor::at(Expr::Index {
            target: Box::new(self.expr),
            key: key.into(),
        })
    }

    pub fn property<V>(self, property: Property<Current, V>) -> Leaf<Root, V> {
        Leaf {
            expr: Expr::Member {
                target: Box::new(self.expr),
                name: property.name().to_string(),
            },
            _marker: PhantomData,
        }
    }

    pub fn call<Args, R>(
        self,
        method: Method<Current, Args, R>,
        args: impl IntoArgs<Args>,
    ) -> Call<Root, R> {
        Call::new(self.expr, method.name(), args.into_nodes())
    }

    pub fn act<Args>(
        self,
        action: Action<Current, Args>,
        args: impl IntoArgs<Args>,
    ) -> Call<Root, ()> {
        Call::new(self.expr, action.name(), args.into_nodes())
    }
}

/// A property path ending in a value of type `V`.
pub struct Leaf<Root, V> {
    expr: Expr,
    _marker: PhantomData<fn(Root) -> V>,
}

impl<Root, V> Leaf<Root, V> {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn path(&self) -> Result<String> {
        compile_path(&self.expr)
    }
}

/// A method call on some object in the graph, returning `R`.
pub struct Call<Root, R> {
    expr: Expr,
    args: Vec<ArgumentNode>,
    _marker: PhantomData<fn(Root) -> R>,
}

impl<Root, R> Call<Root, R> {
    fn new(target: Expr, method: &str, args: Vec<ArgumentNode>) -> Self {
        Self {
            expr: Expr::Call {
                target: Box::new(target),
                name: method.to_string(),
            },
            args,
            _marker: PhantomData,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn path(&self) -> Result<String> {
        compile_path(&self.expr)
    }

    pub fn args(&self) -> &[ArgumentNode] {
        &self.args
    }
}
