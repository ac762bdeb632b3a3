//! Declarative macros for the vtec crates.
//!
//! VTEC is full of short fixed-vocabulary codes (action codes, product
//! classes, significance letters). `enum_str!` keeps the code table in one
//! place so rendering and parsing cannot drift apart.

/// Generates `as_str`, `parse_str` and a `Display` impl for a string-backed enum.
///
/// # Example
///
/// ```
/// use vtec_macros::enum_str;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// enum Class {
///     Operational,
///     Test,
/// }
///
/// enum_str! {
///     impl Class {
///         pub fn as_str(&self) -> &'static str;
///         pub fn parse_str(raw: &str) -> Option<Self>;
///         variants {
///             Operational => ["O", "o"],
///             Test => ["T", "t"],
///         }
///     }
/// }
///
/// assert_eq!(Class::Test.as_str(), "T");
/// assert_eq!(Class::parse_str("o"), Some(Class::Operational));
/// assert_eq!(Class::Operational.to_string(), "O");
/// ```
///
/// - `as_str(&self)` returns the first string listed for each variant
/// - `parse_str(&str)` accepts the first string or any alias
/// - `Display` writes `as_str()`
#[macro_export]
macro_rules! enum_str {
    (
        impl $name:ident {
            $as_vis:vis fn as_str(&self) -> &'static str;
            $parse_vis:vis fn parse_str($raw:ident : &str) -> Option<Self>;
            variants {
                $($variant:ident => [$first:expr $(, $alias:expr)*]),+ $(,)?
            }
        }
    ) => {
        impl $name {
            $as_vis fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $first,)+
                }
            }

            #[allow(dead_code)]
            $parse_vis fn parse_str($raw: &str) -> Option<Self> {
                match $raw {
                    $($first $(| $alias)* => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
