//! Id-keyed record tables and field validation.

mod query;
#[allow(clippy::module_inception)]
mod table;
pub(crate) mod validation;

pub use table::Table;
