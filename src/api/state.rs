use std::sync::Arc;
use crate::{
    auth::TokenService,
    config::Settings,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub token_service: Arc<TokenService>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Self {
        let token_service = Arc::new(TokenService::new(
            &settings.auth.jwt_secret,
            settings.auth.token_duration_hours,
        ));

        Self {
            service_context,
            token_service,
            settings,
        }
    }
}
