pub mod response;

pub use response::{Pagination, PublicUser};
