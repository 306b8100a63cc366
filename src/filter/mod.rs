//! Typed filtering for lead queries.
//!
//! Filters arrive as a JSON object in the `filters` query parameter,
//! deserialize into [`LeadFilter`], and compile into a parameterized
//! WHERE clause. Every compiled clause is scoped to a single owner.

pub mod compile;
pub mod error;
pub mod types;

pub use compile::{bind_params, bind_scalar_params, compile, CompiledFilter, SqlParam};
pub use error::FilterError;
pub use types::{
    BoolFilter, BoolOps, DateFilter, EnumFilter, EnumOps, LeadFilter, NumberFilter, NumberOps,
    StringFilter, StringOps,
};
