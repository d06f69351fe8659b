// SPDX-License-Identifier: MIT

//! Declarative macros for reducing boilerplate.
//!
//! - [`wire_display!`] — `wire_name()` accessor plus a `Display` impl
//!   for the status/type/reason enums
//! - [`str_newtype!`] — small-string identifier newtype with the usual impls

/// Give a fieldless `Copy` enum its stable wire-format names.
///
/// Generates `wire_name()` returning the SCREAMING_SNAKE form each
/// variant serializes as, and routes `Display` through it so logs and
/// the wire never disagree.
///
/// ```ignore
/// crate::wire_display! {
///     ServerType {
///         Static => "STATIC",
///         Dynamic => "DYNAMIC",
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_display {
    ($enum:ident { $( $variant:ident => $wire:literal ),+ $(,)? }) => {
        impl $enum {
            /// Stable wire-format name, matching the serde rename.
            pub fn wire_name(self) -> &'static str {
                match self {
                    $( $enum::$variant => $wire, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.wire_name())
            }
        }
    };
}

/// Define a newtype identifier wrapping a [`smol_str::SmolStr`].
///
/// Generates `new()`, `as_str()`, `is_empty()`, `Display`, `From<&str>`,
/// `From<String>`, `AsRef<str>`, `Borrow<str>`, and `PartialEq<str>`
/// implementations. Serialization is transparent.
#[macro_export]
macro_rules! str_newtype {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(smol_str::SmolStr::new(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }
    };
}
