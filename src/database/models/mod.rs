pub mod lead;
pub mod user;

pub use lead::{Lead, LeadSource, LeadStatus};
pub use user::User;
