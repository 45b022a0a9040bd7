//! Ready-made leaf selectors.
//!
//! [`RangeQuery`], [`ValueMatch`] and [`HasValue`] are query-expressible and
//! localizable; [`UniqueElements`] and [`Sample`] compute row ids directly.

mod has_value;
mod range;
mod sample;
mod unique;
mod value;

pub use has_value::HasValue;
pub use range::RangeQuery;
pub use sample::Sample;
pub use unique::{Indexer, UniqueElements};
pub use value::{Age, Sex, ValueMatch};
