pub use super::audit_logs::Entity as AuditLogs;
pub use super::events::Entity as Events;
pub use super::photos::Entity as Photos;
pub use super::users::Entity as Users;
