pub mod prelude;

pub mod audit_logs;
pub mod events;
pub mod photos;
pub mod users;
