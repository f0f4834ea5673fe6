use std::sync::Arc;

use reqwest::Client;
use roster::Store;

use super::{config::Config, events::Changes, mailer::Mailer};

pub struct AppState {
    pub config: Config,
    pub store: Store,
    /// Service-role access for reads row-level security hides from admins.
    pub service_store: Option<Store>,
    pub mailer: Mailer,
    pub changes: Changes,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("zayathon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let store = Store::new(client.clone(), &config.supabase_url, &config.supabase_anon_key);
        let service_store = config
            .supabase_service_key
            .as_deref()
            .map(|key| Store::new(client.clone(), &config.supabase_url, key));

        let mailer = Mailer::new(
            client,
            &config.resend_url,
            config.resend_api_key.clone(),
            &config.email_from,
        );

        Ok(Arc::new(Self {
            config,
            store,
            service_store,
            mailer,
            changes: Changes::new(),
        }))
    }
}
