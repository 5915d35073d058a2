//! Value Conversion Engine
//!
//! Bidirectional conversion between the dynamic [`Value`](crate::Value) and
//! statically typed host values:
//!
//! - [`ToValue`] / [`encode`]: host → dynamic. Integers of any width become
//!   `Int`, floats `Float`, sequences `List`, keyed collections and
//!   [`Record`]s `Map`. `None` is `Undefined` unless it sits inside a
//!   container, where it is `Null`; the [`Null`] sentinel is always `Null`.
//! - [`FromValue`] / [`decode`]: dynamic → host, either into a static type or
//!   into a runtime [`Shape`]. Booleans never convert to anything else,
//!   numeric narrowing is range checked, and containers only decode into
//!   containers.
//!
//! Both directions are pure.

mod error;
mod from_value;
mod shape;
mod to_value;

pub use error::{ConversionError, ConversionResult};
pub use from_value::{decode_as, FromValue};
pub use shape::{decode, FloatKind, IntKind, Shape};
pub use to_value::{encode, normalize_field_name, KeyType, Null, Record, ToValue, Undefined};
