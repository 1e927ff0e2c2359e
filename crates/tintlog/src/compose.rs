//! Turns log call arguments into the message part of a line.
use std::{fmt::Display, iter};

use itertools::{Either, Itertools};

use crate::{field::Field, style::Palette};

const SEPARATOR: &str = ", ";

/// One argument of a log call: either a plain value or structured context.
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    Value(&'a dyn Display),
    Field(&'a Field),
}

impl<'a, T: Display> From<&'a T> for Arg<'a> {
    fn from(value: &'a T) -> Self {
        Self::Value(value)
    }
}

impl<'a> From<&'a Field> for Arg<'a> {
    fn from(field: &'a Field) -> Self {
        Self::Field(field)
    }
}

impl Arg<'_> {
    fn tokens(self, palette: &Palette) -> impl Iterator<Item = String> {
        match self {
            Self::Value(value) => Either::Left(iter::once(value.to_string())),
            Self::Field(field) => Either::Right(field.tokens(palette).into_iter()),
        }
    }
}

/// Builds an `&[Arg]` slice, borrowing each expression.
///
/// ```
/// use tintlog::{args, field, sprint, Palette};
///
/// let user = field! { "user" => "ana" };
/// assert_eq!(sprint(args!["login", user, 3], &Palette::plain()), "login, user(ana), 3");
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        &[$($crate::Arg::from(&$arg)),*]
    };
}

/// Joins every argument with `", "`, expanding fields into their tokens.
pub fn sprint(args: &[Arg<'_>], palette: &Palette) -> String {
    args.iter().flat_map(|arg| arg.tokens(palette)).join(SEPARATOR)
}

/// Formats the arguments preceding the first [`Field`] into `format`, then
/// appends everything from that field onward as [`sprint`] does.
///
/// The first field is the only split point: a plain value placed after it is
/// appended as a token, never substituted into `format`.
///
/// `format` understands `{}`, `%v`, `%s`, `%d` (the argument's `Display` form),
/// `%q` (quoted), and the escapes `%%`, `{{` and `}}`. Without arguments the
/// format string is returned untouched.
pub fn sprintf(format: &str, args: &[Arg<'_>], palette: &Palette) -> String {
    if args.is_empty() {
        return format.to_owned();
    }

    let split = args.iter().position(|arg| matches!(arg, Arg::Field(_))).unwrap_or(args.len());
    let (positional, trailing) = args.split_at(split);

    let values = positional
        .iter()
        .filter_map(|arg| match arg {
            Arg::Value(value) => Some(*value),
            Arg::Field(_) => None,
        })
        .collect_vec();

    iter::once(substitute(format, &values))
        .chain(trailing.iter().flat_map(|arg| arg.tokens(palette)))
        .join(SEPARATOR)
}

fn substitute(format: &str, values: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut values = values.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        let placeholder = match (c, chars.peek().copied()) {
            ('%', Some('%')) | ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
                continue;
            }
            ('%', Some(verb @ ('v' | 's' | 'd' | 'q'))) => verb,
            ('{', Some('}')) => 'v',
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();

        match values.next() {
            Some(value) if placeholder == 'q' => out.push_str(&format!("{:?}", value.to_string())),
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(&format!("%!{placeholder}(MISSING)")),
        }
    }

    let extra = values.join(SEPARATOR);
    if !extra.is_empty() {
        out.push_str(&format!("%!(EXTRA {extra})"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{sprint, sprintf};
    use crate::{field, field::Field, style::Palette};

    const PLAIN: Palette = Palette::plain();

    #[test]
    fn sprint_expands_fields_in_place() {
        let field = field! { "x" => 1 };
        assert_eq!(sprint(args!["a", field, "b"], &PLAIN), "a, x(1), b");
    }

    #[test]
    fn sprint_edge_cases() {
        assert_eq!(sprint(args![], &PLAIN), "");
        assert_eq!(sprint(args!["only"], &PLAIN), "only");
        assert_eq!(sprint(args![Field::new()], &PLAIN), "");
        assert_eq!(sprint(args![field! { "a" => 1, "b" => 2 }], &PLAIN), "a(1), b(2)");
    }

    #[test]
    fn sprintf_appends_trailing_fields() {
        let field = field! { "k" => "v" };
        assert_eq!(sprintf("%s", args!["hello", field], &PLAIN), "hello, k(v)");
        assert_eq!(sprintf("{} of {}", args![3, 4, field], &PLAIN), "3 of 4, k(v)");
    }

    #[test]
    fn sprintf_without_args_is_verbatim() {
        assert_eq!(sprintf("100%% {} %v", args![], &PLAIN), "100%% {} %v");
    }

    #[test]
    fn sprintf_splits_at_first_field_only() {
        let first = field! { "a" => 1 };
        let second = field! { "b" => 2 };
        let out = sprintf("%v-%v", args!["x", first, "late", second], &PLAIN);

        assert_eq!(out, "x-%!v(MISSING), a(1), late, b(2)");
    }

    #[test]
    fn sprintf_reports_surplus_values() {
        assert_eq!(sprintf("%d%%", args![50, "extra", 7], &PLAIN), "50%%!(EXTRA extra, 7)");
    }

    #[test]
    fn sprintf_quotes_and_escapes() {
        assert_eq!(sprintf("%q {{}}", args!["a \"b\""], &PLAIN), r#""a \"b\"" {}"#);
    }
}
