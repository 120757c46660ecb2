//! Built-in rule kinds.

mod attribute;
mod blanket;
mod combinators;

pub use attribute::{Matcher, R, RBuilder};
pub use blanket::{Blanket, In, Is, always_allow, always_deny};
pub use combinators::{And, Not, Or};
