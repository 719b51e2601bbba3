pub mod feedback;
pub mod invites;
pub mod logs;
pub mod payload;
pub mod resets;
pub mod sessions;
pub mod users;

pub use payload::{parse_list_payload, parse_payload, parse_validated};
