use agent_injector::{config::Config, patch::AgentArguments, policy::PolicySource, AgentInjector};
use axum::Router;
use std::net::SocketAddr;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 8443)),
        tls_config: None,
        policy_key: "skywalking-agent-injection".to_owned(),
        policy_source: PolicySource::Labels,
        target_env: "JAVA_OPTS".to_owned(),
        agent_arguments: AgentArguments::default(),
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let server = AgentInjector::new_from_config(config).await.unwrap();

    server.router()
}
