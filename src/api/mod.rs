pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::config::AppConfig;
use crate::error::Result;
use crate::incidents::IncidentService;
use crate::state::UnitOfWorkFactory;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub app: AppConfig,
}

impl AppState {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, app: AppConfig) -> Self {
        Self { uow_factory, app }
    }

    /// Service bound to a fresh unit of work for one request
    pub async fn service(&self) -> Result<IncidentService> {
        let uow = self.uow_factory.begin().await?;
        Ok(IncidentService::new(uow))
    }
}
