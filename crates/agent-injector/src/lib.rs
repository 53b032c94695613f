pub mod admission_review;
mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod patch;
pub mod policy;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc};

use ::tracing::info;
use anyhow::Result;
use axum::{
    routing::{any, get},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::trace::TraceLayer;

use api::{
    handlers::{admission_handler, readiness_handler},
    state::ApiServerState,
    MUTATE_PATH,
};
use config::Config;

/// The mutating webhook server: an HTTP(S) listener forwarding admission
/// reviews to the [`engine::AdmissionEngine`].
pub struct AgentInjector {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl AgentInjector {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let engine = config.admission_engine();
        info!(
            policy_key = config.policy_key.as_str(),
            policy_source = %config.policy_source,
            target_env = config.target_env.as_str(),
            agent_arguments = %config.agent_arguments,
            "admission engine ready"
        );

        let state = Arc::new(ApiServerState { engine });
        let router = Router::new()
            .route(MUTATE_PATH, any(admission_handler))
            .route(
                "/readiness",
                get(readiness_handler).fallback(admission_handler),
            )
            .fallback(admission_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        let tls_config = match config.tls_config {
            Some(tls_config) => {
                Some(certs::create_tls_config_and_watch_certificate_changes(tls_config).await?)
            }
            None => None,
        };

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let service = self.router.into_make_service();
        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .serve(service)
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr).serve(service).await?;
            }
        }

        Ok(())
    }
}
