use std::sync::Arc;

use proforma_core::config::{AppConfig, ConfigError, LoadOptions};
use proforma_crm::{CrmGateway, HttpCrmGateway, RenderClient};
use thiserror::Error;
use tracing::info;

use crate::routes::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub api: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

/// Wires the record-store gateway and render client into the API state.
/// Config must already be validated; `AppConfig::load` guarantees that.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        crm_base_url = %config.crm.base_url,
        "starting application bootstrap"
    );

    let gateway: Arc<dyn CrmGateway> = Arc::new(HttpCrmGateway::new(&config.crm));
    let render = Arc::new(RenderClient::new(&config.render));
    let api = ApiState::new(gateway, render);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "record-store gateway and render client initialized"
    );

    Ok(Application { config, api })
}
