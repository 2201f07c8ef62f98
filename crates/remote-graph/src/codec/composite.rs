//! Fixed-arity composites rendered as `"(a, b, ...)"`.
//!
//! Tuples of arity 2 through 6 over [`Scalar`] elements get a [`Codec`] here.
//! Parsing strips the surrounding parentheses, splits on `,` and drops the
//! single space the renderer writes after each comma. Element literals keep
//! any other whitespace, and cannot contain a comma.

use super::{Codec, Scalar, TypeName};
use crate::{RemoteError, Result};
use std::borrow::Cow;

/// A fixed number of scalar parts.
pub trait Composite: Sized {
    const ARITY: usize;

    fn parts(&self) -> Vec<String>;
    fn from_parts(parts: &[&str]) -> Result<Self>;
}

/// Render a composite as `"(a, b, ...)"`.
pub fn stringify<C: Composite>(value: &C) -> String {
    format!("({})", value.parts().join(", "))
}

/// Parse `"(a, b, ...)"` into a composite of exactly `C::ARITY` parts.
pub fn parse<C: Composite>(type_name: &str, text: &str) -> Result<C> {
    let inner = text
        .trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| RemoteError::parse(type_name, text, "expected a parenthesized list"))?;

    let parts: Vec<&str> = inner
        .split(',')
        .enumerate()
        .map(|(i, part)| match i {
            0 => part,
            _ => part.strip_prefix(' ').unwrap_or(part),
        })
        .collect();
    if parts.len() != C::ARITY {
        return Err(RemoteError::parse(
            type_name,
            text,
            format!("expected {} elements, found {}", C::ARITY, parts.len()),
        ));
    }

    C::from_parts(&parts)
}

macro_rules! tuple_codec {
    ($arity:literal; $($name:ident : $idx:tt),+) => {
        impl<$($name: Scalar),+> TypeName for ($($name,)+) {
            fn type_name() -> Cow<'static, str> {
                Cow::Owned(format!("({})", [$($name::type_name()),+].join(", ")))
            }
        }

        impl<$($name: Scalar),+> Composite for ($($name,)+) {
            const ARITY: usize = $arity;

            fn parts(&self) -> Vec<String> {
                vec![$(self.$idx.stringify()),+]
            }

            fn from_parts(parts: &[&str]) -> Result<Self> {
                Ok(($(<$name as Codec>::parse(parts[$idx])?,)+))
            }
        }

        impl<$($name: Scalar),+> Codec for ($($name,)+) {
            fn stringify(&self) -> String {
                stringify(self)
            }

            fn parse(text: &str) -> Result<Self> {
                parse(&Self::type_name(), text)
            }
        }
    };
}

tuple_codec!(2; A: 0, B: 1);
tuple_codec!(3; A: 0, B: 1, C: 2);
tuple_codec!(4; A: 0, B: 1, C: 2, D: 3);
tuple_codec!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_codec!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_renders_with_parentheses() {
        assert_eq!((1i32, 2i32).stringify(), "(1, 2)");
        assert_eq!(<(i32, i32)>::parse("(1, 2)").unwrap(), (1, 2));
    }

    #[test]
    fn test_separator_space_is_optional() {
        let parsed = <(i32, String, bool)>::parse("(7,seven, true)").unwrap();
        assert_eq!(parsed, (7, "seven".to_string(), true));
    }

    #[test]
    fn test_string_whitespace_survives_round_trip() {
        let value = (" a".to_string(), "b ".to_string());
        let text = value.stringify();
        assert_eq!(text, "( a, b )");
        assert_eq!(<(String, String)>::parse(&text).unwrap(), value);
    }

    #[test]
    fn test_padded_numbers_are_rejected() {
        assert!(<(i32, i32)>::parse("( 1, 2)").is_err());
    }

    #[test]
    fn test_type_name_lists_elements() {
        assert_eq!(<(i32, String)>::type_name(), "(i32, String)");
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let err = <(i32, i32)>::parse("(1, 2, 3)").unwrap_err();
        assert!(err.to_string().contains("expected 2 elements, found 3"));
    }

    #[test]
    fn test_nested_text_is_rejected() {
        assert!(<(i32, i32)>::parse("((1, 2), 3)").is_err());
    }

    #[test]
    fn test_missing_parentheses_is_rejected() {
        let err = <(i32, i32)>::parse("1, 2").unwrap_err();
        assert!(err.to_string().contains("parenthesized"));
    }

    #[test]
    fn test_element_parse_failure_propagates() {
        let err = <(i32, i32)>::parse("(1, two)").unwrap_err();
        assert!(matches!(err, RemoteError::Parse { ref type_name, .. } if type_name == "i32"));
    }
}
