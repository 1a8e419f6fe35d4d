use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CompatibilityService, EmailService, LettreMailer, Mailer, MetalService,
    ProductService, SeaOrmCompatibilityService, SeaOrmMetalService, SeaOrmProductService,
    SeaOrmUserService, UserService,
};

/// Everything a request handler or CLI command needs, built once at startup.
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth: Arc<AuthService>,

    pub email: Arc<EmailService>,

    pub user_service: Arc<dyn UserService>,

    pub product_service: Arc<dyn ProductService>,

    pub metal_service: Arc<dyn MetalService>,

    pub compatibility_service: Arc<dyn CompatibilityService>,
}

impl SharedState {
    /// Connects the database and picks the mail transport from config.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer =
            LettreMailer::from_config(&config.email).context("Failed to set up email transport")?;
        Self::with_mailer(config, Arc::new(mailer)).await
    }

    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .context("Failed to open database")?;

        let auth = Arc::new(AuthService::new(&config.auth, config.security.clone()));
        let email = Arc::new(EmailService::new(mailer, config.email.frontend_url.clone()));

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            auth.clone(),
            email.clone(),
        )) as Arc<dyn UserService>;
        let product_service =
            Arc::new(SeaOrmProductService::new(store.clone())) as Arc<dyn ProductService>;
        let metal_service =
            Arc::new(SeaOrmMetalService::new(store.clone())) as Arc<dyn MetalService>;
        let compatibility_service = Arc::new(SeaOrmCompatibilityService::new(store.clone()))
            as Arc<dyn CompatibilityService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth,
            email,
            user_service,
            product_service,
            metal_service,
            compatibility_service,
        })
    }
}
