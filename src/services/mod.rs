pub mod audit;
pub mod identity;
pub mod mailer;
pub mod media;
pub mod passwords;
pub mod quota;
pub mod token;

pub use audit::AuditService;
pub use identity::{IdentityError, IdentityReconciler, ReconcileIntent};
pub use mailer::Mailer;
pub use media::{MediaAsset, MediaClient, MediaError};
pub use quota::QuotaService;
pub use token::{IdentityClaims, TokenError, TokenVerifier};
