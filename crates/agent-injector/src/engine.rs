use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use tracing::{debug, error, info, Span};

use crate::{
    admission_review::{self, AdmissionRequest, AdmissionResponse, AdmissionReview},
    errors::AdmissionError,
    patch::{DeploymentObject, PatchGenerator},
    policy::MutationPolicy,
};

const DEPLOYMENT_KIND: &str = "Deployment";

/// Turns an incoming admission review into the review sent back to the API server.
///
/// The engine is immutable once built and holds no per-request state, so a
/// single instance is shared by all the concurrent requests.
#[derive(Clone, Debug, Default)]
pub struct AdmissionEngine {
    policy: MutationPolicy,
    generator: PatchGenerator,
}

impl AdmissionEngine {
    pub fn new(policy: MutationPolicy, generator: PatchGenerator) -> Self {
        AdmissionEngine { policy, generator }
    }

    /// Decode the review and run the mutation pipeline on it.
    pub fn review(&self, body: &[u8]) -> AdmissionReview {
        self.respond(body, |review| self.mutate(review))
    }

    /// Decode the review and answer with an error: nothing is served on `path`.
    pub fn unhandled(&self, path: &str, body: &[u8]) -> AdmissionReview {
        self.respond(body, |_| Err(AdmissionError::UnknownPath(path.to_owned())))
    }

    fn respond<F>(&self, body: &[u8], handle: F) -> AdmissionReview
    where
        F: FnOnce(&AdmissionReview) -> Result<AdmissionResponse, AdmissionError>,
    {
        let review = match admission_review::decode(body) {
            Ok(review) => review,
            Err(e) => {
                error!(error = %e, "Can't decode body");
                let response = error_response(&AdmissionError::from(e));
                populate_span_with_response_data(&response);
                return AdmissionReview::new_with_response(response);
            }
        };

        let response = handle(&review).unwrap_or_else(|e| {
            error!(error = %e, "admission request not handled");
            error_response(&e)
        });
        populate_span_with_response_data(&response);

        AdmissionReview::reply_to(&review, response)
    }

    pub fn mutate(&self, review: &AdmissionReview) -> Result<AdmissionResponse, AdmissionError> {
        let request = review
            .request
            .as_ref()
            .ok_or(AdmissionError::MissingRequest)?;
        populate_span_with_request_data(request);

        info!(
            kind = request.kind.kind.as_str(),
            namespace = request.namespace.as_deref().unwrap_or_default(),
            name = request.name.as_deref().unwrap_or_default(),
            uid = request.uid.as_str(),
            "AdmissionReview"
        );

        if request.kind.kind != DEPLOYMENT_KIND {
            return Err(AdmissionError::UnsupportedKind(request.kind.kind.clone()));
        }

        let object = request
            .object
            .as_ref()
            .ok_or(AdmissionError::MissingObject)?;
        let deployment =
            DeploymentObject::deserialize(object).map_err(AdmissionError::Unmarshal)?;

        if !self.policy.is_mutation_required(&deployment.metadata) {
            return Ok(AdmissionResponse::allow());
        }

        let patch = self.generator.build_patch(&deployment);
        if patch.is_empty() {
            debug!(uid = request.uid.as_str(), "nothing to patch");
            return Ok(AdmissionResponse::allow());
        }

        let patch_ops = patch.len();
        let patch = serde_json::to_vec(&json_patch::Patch(patch))
            .map_err(AdmissionError::PatchSerialization)?;
        info!(uid = request.uid.as_str(), patch_ops, "patching deployment");

        Ok(AdmissionResponse::allow_with_patch(
            general_purpose::STANDARD.encode(patch),
        ))
    }
}

fn error_response(error: &AdmissionError) -> AdmissionResponse {
    AdmissionResponse::error(error.code().as_u16(), error.to_string())
}

fn populate_span_with_request_data(request: &AdmissionRequest) {
    let span = Span::current();
    span.record("request_uid", request.uid.as_str());
    span.record("kind", request.kind.kind.as_str());
    span.record("name", request.name.as_deref().unwrap_or_default());
    span.record("namespace", request.namespace.as_deref().unwrap_or_default());
    span.record("operation", request.operation.as_str());
}

fn populate_span_with_response_data(response: &AdmissionResponse) {
    let span = Span::current();
    span.record("allowed", response.allowed);
    span.record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = status.code {
            span.record("response_code", code);
        }
        if let Some(message) = &status.message {
            span.record("response_message", message.as_str());
        }
    }
}
