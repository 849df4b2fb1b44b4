use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuditService, IdentityReconciler, Mailer, MediaClient, QuotaService, TokenVerifier,
};

/// Everything a request handler needs, wired once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    /// Ready-to-use verifier for provider bearer tokens. Built exactly once;
    /// handlers never initialize it lazily.
    pub verifier: Arc<TokenVerifier>,

    pub reconciler: IdentityReconciler,

    pub quota: QuotaService,

    pub media: MediaClient,

    pub mailer: Mailer,

    pub audit: AuditService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let verifier = Arc::new(TokenVerifier::new(&config.identity));
        let reconciler =
            IdentityReconciler::new(store.clone(), config.identity.admin_emails.clone());
        let quota = QuotaService::new(store.clone());
        let media = MediaClient::new(config.media.clone());
        let mailer = Mailer::new(config.mailer.clone());
        let audit = AuditService::new(store.clone());

        Ok(Self {
            config,
            store,
            verifier,
            reconciler,
            quota,
            media,
            mailer,
            audit,
        })
    }
}
