//! Signature-driven conversion of loosely-typed values into DBus values.
//!
//! DBus messages are typed by a signature, but the data a program wants
//! to send usually starts out as plain integers, strings, lists and maps
//! with no DBus typing attached. This crate closes that gap: given a
//! signature, it builds transformers that check a dynamic [`Value`]
//! against each complete type in the signature and rebuild it as a
//! well-typed [`DbusValue`], or fail saying exactly which part did not
//! fit. Actually marshalling or sending the messages is outside of the
//! scope of this crate.
//!
//! The main entry points are in the [`xformer`] module. [`xformers`]
//! compiles a signature into one [`Xformer`] per complete type, each
//! reusable for any number of values; [`xformer`](crate::xformer::xformer)
//! wraps them into a single transformer for a whole argument list.
//! Going the other way, [`signature`](crate::signature::signature)
//! recovers the signature of a typed value.
//!
//! Values of a variant type are given as a `(signature, value)` pair,
//! see [`Value::variant`]. Every typed value records how many variants
//! enclose it in its `variant_level`.
//!
//! Input values can be built by hand, through the `From` conversions on
//! [`Value`], or from any `Serialize` type with [`to_value`].
//!
//! ```
//! use into_dbus::{signature, xformer, Value};
//!
//! # fn main() -> into_dbus::Result<()> {
//! let func = xformer("adq")?;
//! let values = func.transform(&[Value::from(vec![2.3, 34.0]), Value::from(3)])?;
//! assert_eq!(signature(&values[0])?, "ad");
//! assert_eq!(signature(&values[1])?, "q");
//! # Ok(())
//! # }
//! ```
//!
//! [`Value`]: crate::value::Value
//! [`Value::variant`]: crate::value::Value::variant
//! [`DbusValue`]: crate::types::DbusValue
//! [`Xformer`]: crate::xformer::Xformer
//! [`xformers`]: crate::xformer::xformers
//! [`to_value`]: crate::ser::to_value

pub mod error;
pub mod parser;
mod primitives;
pub mod ser;
pub mod signature;
pub mod types;
pub mod value;
pub mod xformer;

pub use error::{Error, Result};
pub use primitives::{ObjectPath, Signature, UnixFd, MAX_SIGNATURE_LEN};
pub use signature::{signature, signature_stripped};
pub use types::{Data, DbusValue};
pub use value::Value;
pub use xformer::{xformer, xformers, SignatureXformer, Xformer};
