//! Persistence layer. Every lead operation takes the owning user's id
//! explicitly; nothing here reads ambient request state.

pub mod leads;
pub mod users;

pub use leads::{LeadChanges, LeadPage, LeadStats, LeadStore, ListOptions, NewLead, SortOrder};
pub use users::UserStore;
