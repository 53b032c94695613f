use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

use crate::{patch::DEFAULT_TARGET_ENV, policy::DEFAULT_POLICY_KEY};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("AGENT_INJECTOR_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("AGENT_INJECTOR_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("AGENT_INJECTOR_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("AGENT_INJECTOR_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("AGENT_INJECTOR_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("AGENT_INJECTOR_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("policy-key")
            .long("policy-key")
            .value_name("KEY")
            .default_value(DEFAULT_POLICY_KEY)
            .env("AGENT_INJECTOR_POLICY_KEY")
            .help("Metadata key a Deployment sets to `enabled` to opt in to the injection"),
        Arg::new("policy-source")
            .long("policy-source")
            .value_name("SOURCE")
            .default_value("labels")
            .env("AGENT_INJECTOR_POLICY_SOURCE")
            .value_parser([
                PossibleValue::new("labels"),
                PossibleValue::new("annotations"),
            ])
            .help("Metadata map holding the policy key"),
        Arg::new("target-env")
            .long("target-env")
            .value_name("ENV_NAME")
            .default_value(DEFAULT_TARGET_ENV)
            .env("AGENT_INJECTOR_TARGET_ENV")
            .help("Environment variable the agent arguments are appended to"),
        Arg::new("agent-path")
            .long("agent-path")
            .value_name("PATH")
            .default_value("/usr/agent/skywalking-agent.jar")
            .env("AGENT_INJECTOR_AGENT_PATH")
            .help("Path of the agent jar inside of the containers"),
        Arg::new("agent-namespace")
            .long("agent-namespace")
            .value_name("NAMESPACE")
            .default_value("uat")
            .env("AGENT_INJECTOR_AGENT_NAMESPACE")
            .help("Namespace reported by the agent"),
        Arg::new("agent-service-name")
            .long("agent-service-name")
            .value_name("SERVICE_NAME")
            .default_value("fp-android-transit-job")
            .env("AGENT_INJECTOR_AGENT_SERVICE_NAME")
            .help("Service name reported by the agent"),
        Arg::new("collector-backend")
            .long("collector-backend")
            .value_name("HOST:PORT")
            .default_value("10.0.54.104:5006")
            .env("AGENT_INJECTOR_COLLECTOR_BACKEND")
            .help("Address of the collector the agent reports to"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
