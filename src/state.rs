use anyhow::Context;
use std::sync::Arc;

use crate::auth::keys::KeyManager;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::db::Store;
use crate::services::auth::AuthFlow;

/// Long-lived service state shared by every request handler.
pub struct SharedState {
    pub config: Arc<Config>,
    pub store: Store,
    pub keys: Arc<KeyManager>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthFlow,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .context("Failed to initialize the record store")?;

        // No signing key means no sessions at all, so this is fatal.
        let keys = Arc::new(
            KeyManager::from_config(&config.security, &config.general.environment)
                .context("Failed to load the token signing key")?,
        );

        let tokens = Arc::new(TokenService::new(
            config.security.jwt_issuer.clone(),
            config.security.token_ttl_hours * 3600,
            keys.clone(),
        ));

        let auth = AuthFlow::new(store.clone(), tokens.clone(), config.security.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            keys,
            tokens,
            auth,
        })
    }
}
