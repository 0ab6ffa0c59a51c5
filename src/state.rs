use std::sync::Arc;

use crate::auth::{IdentityResolver, TokenIssuer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdvertisementService, AuthService, SeaOrmAdvertisementService, SeaOrmAuthService,
    SeaOrmUserService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    /// Read-only after startup. The signing secret is never rotated at runtime.
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenIssuer>,

    pub identity: IdentityResolver,

    pub user_service: Arc<dyn UserService>,

    pub advertisement_service: Arc<dyn AdvertisementService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wire the services around an already opened store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let tokens = Arc::new(TokenIssuer::from_config(&config.security));
        let identity = IdentityResolver::new(store.clone(), tokens.clone());

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService>;

        let advertisement_service = Arc::new(SeaOrmAdvertisementService::new(store.clone()))
            as Arc<dyn AdvertisementService>;

        let auth_service = Arc::new(SeaOrmAuthService::new(store.clone(), tokens.clone()))
            as Arc<dyn AuthService>;

        Self {
            config: Arc::new(config),
            store,
            tokens,
            identity,
            user_service,
            advertisement_service,
            auth_service,
        }
    }
}
