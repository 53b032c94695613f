use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::anyhow;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::info;

pub const DEFAULT_POLICY_KEY: &str = "skywalking-agent-injection";

const ENABLED: &str = "enabled";

/// The metadata map holding the policy key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicySource {
    #[default]
    Labels,
    Annotations,
}

impl FromStr for PolicySource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "labels" => Ok(PolicySource::Labels),
            "annotations" => Ok(PolicySource::Annotations),
            other => Err(anyhow!("unknown policy source: {other}")),
        }
    }
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolicySource::Labels => write!(f, "labels"),
            PolicySource::Annotations => write!(f, "annotations"),
        }
    }
}

/// Decides whether a workload opted in to the agent injection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationPolicy {
    key: String,
    source: PolicySource,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        MutationPolicy::new(DEFAULT_POLICY_KEY, PolicySource::default())
    }
}

impl MutationPolicy {
    pub fn new(key: impl Into<String>, source: PolicySource) -> Self {
        MutationPolicy {
            key: key.into(),
            source,
        }
    }

    /// Only the value `enabled`, compared case-insensitively, turns the mutation on.
    pub fn is_mutation_required(&self, metadata: &ObjectMeta) -> bool {
        let map: Option<&BTreeMap<String, String>> = match self.source {
            PolicySource::Labels => metadata.labels.as_ref(),
            PolicySource::Annotations => metadata.annotations.as_ref(),
        };

        let required = map
            .and_then(|m| m.get(&self.key))
            .is_some_and(|value| value.eq_ignore_ascii_case(ENABLED));

        info!(
            name = metadata.name.as_deref().unwrap_or_default(),
            namespace = metadata.namespace.as_deref().unwrap_or_default(),
            source = %self.source,
            required,
            "mutation policy"
        );

        required
    }
}
