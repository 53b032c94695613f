use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{
    engine::AdmissionEngine,
    patch::{AgentArguments, PatchGenerator},
    policy::{MutationPolicy, PolicySource},
};

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub policy_key: String,
    pub policy_source: PolicySource,
    pub target_env: String,
    pub agent_arguments: AgentArguments,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;

        let policy_key = string_arg(matches, "policy-key");
        if policy_key.is_empty() {
            return Err(anyhow!("error parsing arguments: --policy-key cannot be empty"));
        }
        let policy_source = string_arg(matches, "policy-source").parse::<PolicySource>()?;
        let target_env = string_arg(matches, "target-env");
        if target_env.is_empty() {
            return Err(anyhow!("error parsing arguments: --target-env cannot be empty"));
        }

        let agent_arguments = AgentArguments {
            agent_path: string_arg(matches, "agent-path"),
            namespace: string_arg(matches, "agent-namespace"),
            service_name: string_arg(matches, "agent-service-name"),
            collector_backend: string_arg(matches, "collector-backend"),
        };

        let log_level = string_arg(matches, "log-level");
        let log_fmt = string_arg(matches, "log-fmt");
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            policy_key,
            policy_source,
            target_env,
            agent_arguments,
            log_level,
            log_fmt,
            log_no_color,
        })
    }

    /// Build the admission engine described by this configuration.
    pub fn admission_engine(&self) -> AdmissionEngine {
        AdmissionEngine::new(
            MutationPolicy::new(self.policy_key.clone(), self.policy_source),
            PatchGenerator::new(self.target_env.clone(), &self.agent_arguments),
        )
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches
        .get_one::<String>(id)
        .unwrap_or_else(|| panic!("This should not happen, there's a default value for {id}"))
        .to_owned()
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        string_arg(matches, "address"),
        string_arg(matches, "port")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = string_arg(matches, "cert-file");
    let key_file = string_arg(matches, "key-file");
    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        })),
        _ => Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    fn config_from(flags: &[&str]) -> Result<Config> {
        let mut args = vec!["agent-injector"];
        args.extend(flags);
        let matches = cli::build_cli().try_get_matches_from(args)?;
        Config::from_args(&matches)
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr, "0.0.0.0:8443".parse().unwrap());
        assert!(config.tls_config.is_none());
        assert_eq!(config.policy_key, "skywalking-agent-injection");
        assert_eq!(config.policy_source, PolicySource::Labels);
        assert_eq!(config.target_env, "JAVA_OPTS");
        assert_eq!(config.agent_arguments, AgentArguments::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_fmt, "text");
    }

    #[test]
    fn injection_settings() {
        let config = config_from(&[
            "--policy-key=example.com/inject",
            "--policy-source=annotations",
            "--target-env=JDK_JAVA_OPTIONS",
            "--agent-path=/opt/agent.jar",
            "--agent-namespace=prod",
            "--agent-service-name=billing",
            "--collector-backend=oap:11800",
        ])
        .unwrap();

        assert_eq!(config.policy_key, "example.com/inject");
        assert_eq!(config.policy_source, PolicySource::Annotations);
        assert_eq!(config.target_env, "JDK_JAVA_OPTIONS");
        assert_eq!(
            config.agent_arguments.to_string(),
            "-javaagent:/opt/agent.jar -Dskywalking.agent.namespace=prod -Dskywalking.agent.service_name=billing -Dskywalking.collector.backend_service=oap:11800"
        );
    }

    #[test]
    fn tls_files_must_be_paired() {
        let config = config_from(&["--cert-file=cert.pem", "--key-file=key.pem"]).unwrap();
        let tls_config = config.tls_config.unwrap();
        assert_eq!(tls_config.cert_file, PathBuf::from("cert.pem"));
        assert_eq!(tls_config.key_file, PathBuf::from("key.pem"));

        assert!(config_from(&["--cert-file=cert.pem"]).is_err());
        assert!(config_from(&["--key-file=key.pem"]).is_err());
    }

    #[test]
    fn invalid_values() {
        assert!(config_from(&["--port=https"]).is_err());
        assert!(config_from(&["--policy-source=spec"]).is_err());
        assert!(config_from(&["--policy-key="]).is_err());
        assert!(config_from(&["--log-fmt=otlp"]).is_err());
    }

    #[test]
    fn boolean_flags() {
        for provide_flag in [true, false] {
            let flags: &[&str] = if provide_flag {
                &["--log-no-color"]
            } else {
                &[]
            };

            let config = config_from(flags).unwrap();
            assert_eq!(provide_flag, config.log_no_color);
        }
    }
}
