use std::fmt;

use json_patch::{jsonptr::PointerBuf, AddOperation, PatchOperation, ReplaceOperation};
use k8s_openapi::{
    api::{apps::v1::DeploymentSpec, core::v1::EnvVar},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

pub const DEFAULT_TARGET_ENV: &str = "JAVA_OPTS";

/// The JVM flags attaching the SkyWalking agent to the workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentArguments {
    pub agent_path: String,
    pub namespace: String,
    pub service_name: String,
    pub collector_backend: String,
}

impl Default for AgentArguments {
    fn default() -> Self {
        AgentArguments {
            agent_path: "/usr/agent/skywalking-agent.jar".to_owned(),
            namespace: "uat".to_owned(),
            service_name: "fp-android-transit-job".to_owned(),
            collector_backend: "10.0.54.104:5006".to_owned(),
        }
    }
}

impl fmt::Display for AgentArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "-javaagent:{} -Dskywalking.agent.namespace={} -Dskywalking.agent.service_name={} -Dskywalking.collector.backend_service={}",
            self.agent_path, self.namespace, self.service_name, self.collector_backend
        )
    }
}

/// The parts of a Deployment looked at by the injection. The `apiVersion` of
/// the object is not checked: `apps/v1beta1` and `apps/v1beta2` Deployments
/// decode the same way as `apps/v1` ones.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeploymentObject {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: Option<DeploymentSpec>,
}

/// Computes the JSON Patch appending the agent arguments to the target
/// environment variable of every container of a Deployment.
#[derive(Clone, Debug)]
pub struct PatchGenerator {
    target_env: String,
    arguments: String,
}

impl Default for PatchGenerator {
    fn default() -> Self {
        PatchGenerator::new(DEFAULT_TARGET_ENV, &AgentArguments::default())
    }
}

impl PatchGenerator {
    pub fn new(target_env: impl Into<String>, arguments: &AgentArguments) -> Self {
        PatchGenerator {
            target_env: target_env.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Operations are returned in container order, then env order. Entries that
    /// already carry the arguments are left alone, so the patch can be applied
    /// to an already mutated object without duplicating them.
    pub fn build_patch(&self, deployment: &DeploymentObject) -> Vec<PatchOperation> {
        let containers = deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .map(|pod_spec| pod_spec.containers.as_slice())
            .unwrap_or_default();

        let mut patch = Vec::new();
        for (container_idx, container) in containers.iter().enumerate() {
            let env = container.env.as_deref().unwrap_or_default();
            for (env_idx, env_var) in env.iter().enumerate() {
                if env_var.name != self.target_env {
                    continue;
                }
                info!(
                    container = container.name.as_str(),
                    env = env_var.name.as_str(),
                    "found target environment variable"
                );

                if let Some(op) = self.operation_for(env_var, container_idx, env_idx) {
                    patch.push(op);
                }
            }
        }

        patch
    }

    fn operation_for(
        &self,
        env_var: &EnvVar,
        container_idx: usize,
        env_idx: usize,
    ) -> Option<PatchOperation> {
        if env_var.value_from.is_some() {
            debug!(
                env = env_var.name.as_str(),
                "value is sourced through valueFrom, skipping"
            );
            return None;
        }

        let path = env_value_pointer(container_idx, env_idx);
        match env_var.value.as_deref() {
            None => Some(PatchOperation::Add(AddOperation {
                path,
                value: Value::String(self.arguments.clone()),
            })),
            Some(value) if value.contains(&self.arguments) => {
                debug!(env = env_var.name.as_str(), "agent already injected");
                None
            }
            Some("") => Some(PatchOperation::Replace(ReplaceOperation {
                path,
                value: Value::String(self.arguments.clone()),
            })),
            Some(value) => Some(PatchOperation::Replace(ReplaceOperation {
                path,
                value: Value::String(format!("{value} {}", self.arguments)),
            })),
        }
    }
}

fn env_value_pointer(container_idx: usize, env_idx: usize) -> PointerBuf {
    let container_idx = container_idx.to_string();
    let env_idx = env_idx.to_string();

    PointerBuf::from_tokens([
        "spec",
        "template",
        "spec",
        "containers",
        container_idx.as_str(),
        "env",
        env_idx.as_str(),
        "value",
    ])
}
