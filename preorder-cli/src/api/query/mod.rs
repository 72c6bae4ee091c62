//! PostgREST filter building
//!
//! Filters render to the `column=op.value` query pairs PostgREST expects,
//! e.g. `id=eq.7` or `id=in.(1,2,"a,b")`.

pub mod filters;

pub use filters::{Filter, FilterValue};
