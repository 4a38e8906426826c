//! Wire-string conversions for closed enums
//!
//! Roles, approval states and document types all travel as lowercase
//! strings in the relational store. `impl_wire_conversions!` generates
//! `as_str`, `Display` and a lenient `FromStr` (trimmed, case-insensitive)
//! from a single variant table.
//!
//! ```rust
//! use solace_domain::impl_wire_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Email,
//!     Sms,
//! }
//!
//! impl_wire_conversions!(Channel {
//!     Email => "email",
//!     Sms => "sms",
//! });
//!
//! assert_eq!(" SMS ".parse::<Channel>(), Ok(Channel::Sms));
//! assert_eq!(Channel::Email.to_string(), "email");
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a closed enum
#[macro_export]
macro_rules! impl_wire_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
