//! Type-directed string conversion for leaf values.
//!
//! Every value that crosses the wire as text goes through [`Codec`]. The rules,
//! in the order a type can satisfy them:
//!
//! 1. `String` converts as itself.
//! 2. Enums declared with [`codec_enum!`](crate::codec_enum) convert by member
//!    name.
//! 3. Fixed-arity composites (tuples, or any [`Composite`]) render as
//!    `"(a, b, ...)"` over [`Scalar`] elements. Composites are not scalars, so
//!    nesting one inside another does not type-check.
//! 4. Types following the `FromStr` + `Display` convention, opted in with
//!    [`impl_codec_from_str!`](crate::impl_codec_from_str). All primitives are
//!    built in.
//!
//! Anything else has no `Codec` impl. On the host side the same rule shows up
//! as a missing entry in the [`Catalog`](crate::host::Catalog).

pub mod composite;

pub use composite::Composite;

use crate::Result;
use std::any::Any;
use std::borrow::Cow;

/// Wire identity of a type.
///
/// The identity must be the same string in the client and the host build, so
/// it is declared explicitly rather than derived from `std::any::type_name`.
pub trait TypeName: Any + Send {
    fn type_name() -> Cow<'static, str>;
}

/// Symmetric string conversion: `parse(&v.stringify()) == v`.
pub trait Codec: TypeName + Sized {
    fn stringify(&self) -> String;
    fn parse(text: &str) -> Result<Self>;
}

/// Codec types allowed as composite elements.
pub trait Scalar: Codec {}

/// Implement [`TypeName`] for a type that is not itself codec-able, such as a
/// hosted object or a constructor-only argument type.
#[macro_export]
macro_rules! impl_type_name {
    ($ty:ty => $name:expr) => {
        impl $crate::codec::TypeName for $ty {
            fn type_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($name)
            }
        }
    };
}

/// Implement [`Codec`] and [`Scalar`] through `FromStr` and `Display`.
///
/// The `FromStr::Err` type must implement `Display`.
#[macro_export]
macro_rules! impl_codec_from_str {
    ($($ty:ty => $name:expr),+ $(,)?) => {
        $(
            $crate::impl_type_name!($ty => $name);

            impl $crate::codec::Codec for $ty {
                fn stringify(&self) -> String {
                    ::std::string::ToString::to_string(self)
                }

                fn parse(text: &str) -> $crate::Result<Self> {
                    <$ty as ::std::str::FromStr>::from_str(text)
                        .map_err(|e| $crate::RemoteError::parse($name, text, e))
                }
            }

            impl $crate::codec::Scalar for $ty {}
        )+
    };
}

/// Declare a fieldless enum whose codec converts by member name.
///
/// ```
/// remote_graph::codec_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Visibility as "demo::Visibility" { Visible, Hidden, Collapsed }
/// }
///
/// use remote_graph::Codec;
/// assert_eq!(Visibility::parse("Hidden").unwrap(), Visibility::Hidden);
/// assert_eq!(Visibility::Collapsed.stringify(), "Collapsed");
/// ```
#[macro_export]
macro_rules! codec_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $wire:literal {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        $crate::impl_type_name!($name => $wire);

        impl $crate::codec::Codec for $name {
            fn stringify(&self) -> String {
                match self {
                    $($name::$variant => stringify!($variant).to_string()),+
                }
            }

            fn parse(text: &str) -> $crate::Result<Self> {
                match text {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err($crate::RemoteError::parse($wire, other, "no such enum member")),
                }
            }
        }

        impl $crate::codec::Scalar for $name {}
    };
}

impl TypeName for String {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("String")
    }
}

impl Codec for String {
    fn stringify(&self) -> String {
        self.clone()
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

impl Scalar for String {}

crate::impl_codec_from_str! {
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
}

/// Placeholder for a child whose concrete type is only known at run time.
///
/// Paths through an `AnyObject` child must [`cast`](crate::path::Accessor::cast)
/// to the concrete type before naming further members.
#[derive(Debug, Clone, Copy)]
pub struct AnyObject;

impl_type_name!(AnyObject => "object");

#[cfg(test)]
mod tests {
    use super::*;

    codec_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Visibility as "test::Visibility" { Visible, Hidden, Collapsed }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Celsius(f64);

    impl std::fmt::Display for Celsius {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}C", self.0)
        }
    }

    impl std::str::FromStr for Celsius {
        type Err = String;

        fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
            s.strip_suffix('C')
                .ok_or_else(|| format!("missing unit in '{}'", s))?
                .parse()
                .map(Celsius)
                .map_err(|e: std::num::ParseFloatError| e.to_string())
        }
    }

    impl_codec_from_str!(Celsius => "test::Celsius");

    #[test]
    fn test_string_is_identity() {
        let text = " spaced | piped <tag> ";
        assert_eq!(String::parse(text).unwrap(), text);
        assert_eq!(text.to_string().stringify(), text);
    }

    codec_enum! {
        #[derive(Debug, PartialEq)]
        pub(crate) enum Dock as "test::Dock" {
            /// Docked against the left edge
            Left,
            Right,
        }
    }

    #[test]
    fn test_enum_macro_accepts_visibility_and_variant_attributes() {
        assert_eq!(Dock::type_name(), "test::Dock");
        assert_eq!(Dock::parse("Right").unwrap(), Dock::Right);
        assert_eq!(Dock::Right.stringify(), "Right");
        let err = Dock::parse("Top").unwrap_err();
        assert!(err.to_string().contains("test::Dock"), "{}", err);
    }

    #[test]
    fn test_enum_converts_by_name() {
        for member in [Visibility::Visible, Visibility::Hidden, Visibility::Collapsed] {
            assert_eq!(Visibility::parse(&member.stringify()).unwrap(), member);
        }
        assert_eq!(Visibility::type_name(), "test::Visibility");
    }

    #[test]
    fn test_enum_rejects_unknown_member() {
        let err = Visibility::parse("Translucent").unwrap_err();
        assert!(err.to_string().contains("Translucent"));
        assert!(err.to_string().contains("test::Visibility"));
    }

    #[test]
    fn test_primitives_round_trip() {
        assert_eq!(i32::parse(&(-42i32).stringify()).unwrap(), -42);
        assert_eq!(u64::parse(&u64::MAX.stringify()).unwrap(), u64::MAX);
        assert_eq!(f64::parse(&1.5f64.stringify()).unwrap(), 1.5);
        assert!(bool::parse(&true.stringify()).unwrap());
        assert_eq!(char::parse("x").unwrap(), 'x');
    }

    #[test]
    fn test_primitive_parse_failure_names_type() {
        let err = i32::parse("three").unwrap_err();
        assert!(matches!(
            err,
            crate::RemoteError::Parse { ref type_name, .. } if type_name == "i32"
        ));
    }

    #[test]
    fn test_from_str_convention() {
        let value = Celsius(21.5);
        assert_eq!(value.stringify(), "21.5C");
        assert_eq!(Celsius::parse("21.5C").unwrap(), value);
        assert!(Celsius::parse("21.5").is_err());
    }
}
