//! Type-erased values moving between the decoder and capability tables.

use crate::codec::{Codec, TypeName};
use crate::{RemoteError, Result};
use std::any::Any;
use std::fmt;

type Render = fn(&(dyn Any + Send)) -> String;

/// A value whose concrete type is known only by its wire identity.
///
/// Values built from a [`Codec`] type can be rendered back to text. Values
/// built with [`Dynamic::opaque`] (constructed objects, for example) cannot.
pub struct Dynamic {
    type_name: String,
    value: Box<dyn Any + Send>,
    render: Option<Render>,
}

impl Dynamic {
    pub fn from_codec<T: Codec>(value: T) -> Self {
        Self {
            type_name: T::type_name().into_owned(),
            value: Box::new(value),
            render: Some(render_codec::<T>),
        }
    }

    pub fn opaque<T: TypeName>(value: T) -> Self {
        Self {
            type_name: T::type_name().into_owned(),
            value: Box::new(value),
            render: None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is<T: TypeName>(&self) -> bool {
        self.type_name == T::type_name() && self.value.is::<T>()
    }

    /// Move the value out as `T`.
    pub fn take<T: TypeName>(self) -> Result<T> {
        let expected = T::type_name();
        if self.type_name != expected {
            return Err(RemoteError::TypeMismatch {
                expected: expected.into_owned(),
                actual: self.type_name,
            });
        }

        let actual = self.type_name;
        self.value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| RemoteError::TypeMismatch {
                expected: expected.into_owned(),
                actual,
            })
    }

    /// Render through the codec the value was built with.
    pub fn render(&self) -> Result<String> {
        match self.render {
            Some(render) => Ok(render(self.value.as_ref())),
            None => Err(RemoteError::NotSupported {
                type_name: self.type_name.clone(),
            }),
        }
    }
}

fn render_codec<T: Codec>(value: &(dyn Any + Send)) -> String {
    value
        .downcast_ref::<T>()
        .map(Codec::stringify)
        .unwrap_or_default()
}

/// A parameter tuple a host-side closure accepts.
///
/// The tuple's element type names are the exact signature overloads are
/// selected by.
pub trait ArgList: Sized + Send + 'static {
    fn param_types() -> Vec<String>;
    fn from_dynamics(args: Vec<Dynamic>) -> Result<Self>;
}

impl ArgList for () {
    fn param_types() -> Vec<String> {
        Vec::new()
    }

    fn from_dynamics(args: Vec<Dynamic>) -> Result<Self> {
        expect_count(&args, 0)
    }
}

fn expect_count(args: &[Dynamic], count: usize) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(RemoteError::Other(format!(
            "expected {} arguments, got {}",
            count,
            args.len()
        )))
    }
}

macro_rules! arg_list {
    ($count:literal; $($name:ident),+) => {
        impl<$($name: TypeName),+> ArgList for ($($name,)+) {
            fn param_types() -> Vec<String> {
                vec![$($name::type_name().into_owned()),+]
            }

            fn from_dynamics(args: Vec<Dynamic>) -> Result<Self> {
                expect_count(&args, $count)?;
                let mut args = args.into_iter();
                Ok(($(
                    args.next()
                        .ok_or_else(|| RemoteError::Other("argument list ended early".to_string()))?
                        .take::<$name>()?,
                )+))
            }
        }
    };
}

arg_list!(1; A);
arg_list!(2; A, B);
arg_list!(3; A, B, C);
arg_list!(4; A, B, C, D);
arg_list!(5; A, B, C, D, E);
arg_list!(6; A, B, C, D, E, F);

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Dynamic");
        debug.field("type_name", &self.type_name);
        if let Ok(text) = self.render() {
            debug.field("value", &text);
        }
        debug.finish()
    }
}
