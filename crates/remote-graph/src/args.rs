//! Client-side argument encoding.
//!
//! A positional argument of type `T` is either a codec-able value of `T` or a
//! [`Construct<T>`] describing how the host should build one. Both convert into
//! [`Arg<T>`], so method calls accept either form per position:
//!
//! ```ignore
//! root.call(ViewModel::CONCAT, (
//!     Construct::<MyParam>::new().arg("1".to_string()).arg("2".to_string()),
//!     Construct::<MyParam>::new().init(MyParam::VALUE, "3".to_string()),
//! ))
//! ```

use crate::codec::{Codec, TypeName};
use crate::node::{ArgumentNode, Initializer};
use crate::path::Property;
use std::marker::PhantomData;

/// One encoded argument for a parameter of type `T`.
pub struct Arg<T> {
    node: ArgumentNode,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Arg<T> {
    pub fn node(&self) -> &ArgumentNode {
        &self.node
    }

    pub fn into_node(self) -> ArgumentNode {
        self.node
    }
}

impl<T: Codec> From<T> for Arg<T> {
    fn from(value: T) -> Self {
        Self {
            node: ArgumentNode::value(&value),
            _marker: PhantomData,
        }
    }
}

impl<T: TypeName> From<Construct<T>> for Arg<T> {
    fn from(construct: Construct<T>) -> Self {
        Self {
            node: construct.into_node(),
            _marker: PhantomData,
        }
    }
}

/// Host-side construction of a `T`: constructor arguments in order, then
/// property initializers.
pub struct Construct<T> {
    args: Vec<ArgumentNode>,
    initializers: Vec<Initializer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: TypeName> Construct<T> {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            initializers: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Append a literal constructor argument.
    pub fn arg<A: Codec>(mut self, value: A) -> Self {
        self.args.push(ArgumentNode::value(&value));
        self
    }

    /// Append a constructor argument that is itself constructed.
    pub fn nested<U: TypeName>(mut self, construct: Construct<U>) -> Self {
        self.args.push(construct.into_node());
        self
    }

    /// Assign `property` after construction.
    pub fn init<V: Codec>(mut self, property: Property<T, V>, value: V) -> Self {
        self.initializers.push(Initializer {
            property: property.name().to_string(),
            type_name: V::type_name().into_owned(),
            literal: value.stringify(),
        });
        self
    }

    pub fn into_node(self) -> ArgumentNode {
        ArgumentNode::Constructor {
            type_name: T::type_name().into_owned(),
            args: self.args,
            initializers: self.initializers,
        }
    }
}

impl<T: TypeName> Default for Construct<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A tuple of arguments matching the parameter tuple `Args`.
pub trait IntoArgs<Args> {
    fn into_nodes(self) -> Vec<ArgumentNode>;
}

impl IntoArgs<()> for () {
    fn into_nodes(self) -> Vec<ArgumentNode> {
        Vec::new()
    }
}

macro_rules! into_args {
    ($($arg:ident : $param:ident => $value:ident),+) => {
        impl<$($arg, $param),+> IntoArgs<($($param,)+)> for ($($arg,)+)
        where
            $($arg: Into<Arg<$param>>),+
        {
            fn into_nodes(self) -> Vec<ArgumentNode> {
                let ($($value,)+) = self;
                vec![$(Into::<Arg<$param>>::into($value).into_node()),+]
            }
        }
    };
}

into_args!(X1: A1 => a1);
into_args!(X1: A1 => a1, X2: A2 => a2);
into_args!(X1: A1 => a1, X2: A2 => a2, X3: A3 => a3);
into_args!(X1: A1 => a1, X2: A2 => a2, X3: A3 => a3, X4: A4 => a4);
into_args!(X1: A1 => a1, X2: A2 => a2, X3: A3 => a3, X4: A4 => a4, X5: A5 => a5);
into_args!(X1: A1 => a1, X2: A2 => a2, X3: A3 => a3, X4: A4 => a4, X5: A5 => a5, X6: A6 => a6);
