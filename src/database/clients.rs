use std::sync::Arc;

use reqwest::Client;

use super::postgrest::{Credentials, PostgrestClient};
use super::TableStore;
use crate::config::Config;
use crate::services::identity_service::{IdentityProvider, SupabaseIdentity};

/// Privilege level a data-platform handle acts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    Anonymous,
    User(String),
    Service,
}

/// One handle per privilege tier, built once at start-up and passed to the services.
#[derive(Clone)]
pub struct SupabaseClients {
    http: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClients {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        service_role_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            service_role_key: service_role_key.into(),
        }
    }

    pub fn from_config(http: Client, config: &Config) -> Self {
        Self::new(
            http,
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.supabase_service_role_key,
        )
    }

    pub fn credentials(&self, tier: &Tier) -> Credentials {
        match tier {
            Tier::Anonymous => Credentials {
                api_key: self.anon_key.clone(),
                bearer: self.anon_key.clone(),
            },
            Tier::User(token) => Credentials {
                api_key: self.anon_key.clone(),
                bearer: token.clone(),
            },
            Tier::Service => Credentials {
                api_key: self.service_role_key.clone(),
                bearer: self.service_role_key.clone(),
            },
        }
    }

    pub fn table_store(&self, tier: Tier) -> PostgrestClient {
        PostgrestClient::new(
            self.http.clone(),
            format!("{}/rest/v1", self.base_url),
            self.credentials(&tier),
        )
    }

    pub fn service(&self) -> Arc<dyn TableStore> {
        Arc::new(self.table_store(Tier::Service))
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(SupabaseIdentity::new(
            self.http.clone(),
            format!("{}/auth/v1", self.base_url),
            self.anon_key.clone(),
        ))
    }
}
