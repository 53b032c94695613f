use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    pub resource: String,
}

/// The `admission.k8s.io/v1` envelope exchanged with the API server.
///
/// A review received from the API server carries a `request`, the one sent back
/// carries a `response`. Fields that are not modelled here are ignored while decoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl Default for AdmissionReview {
    fn default() -> Self {
        AdmissionReview {
            api_version: Some(String::from(ADMISSION_API_VERSION)),
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            request: None,
            response: None,
        }
    }
}

impl AdmissionReview {
    /// Build the review sent back to the API server. `apiVersion` and `kind` are
    /// copied from the incoming review, and the response UID is set to the request UID.
    pub fn reply_to(review: &AdmissionReview, mut response: AdmissionResponse) -> Self {
        if let Some(request) = &review.request {
            response.uid = request.uid.clone();
        }

        AdmissionReview {
            api_version: review.api_version.clone(),
            kind: review.kind.clone(),
            request: None,
            response: Some(response),
        }
    }

    /// Review used when no incoming envelope could be decoded.
    pub fn new_with_response(response: AdmissionResponse) -> Self {
        AdmissionReview {
            response: Some(response),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub kind: GroupVersionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<GroupVersionResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// This models the admission/v1/AdmissionResponse object of Kubernetes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Copied over from the corresponding AdmissionRequest.
    #[serde(default)]
    pub uid: String,

    #[serde(default)]
    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// Base64 encoded JSON Patch document (RFC 6902).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Only set when the request could not be handled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    pub fn allow() -> AdmissionResponse {
        AdmissionResponse {
            allowed: true,
            ..Default::default()
        }
    }

    pub fn allow_with_patch(patch: String) -> AdmissionResponse {
        AdmissionResponse {
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(patch),
            ..Default::default()
        }
    }

    pub fn error(code: u16, message: String) -> AdmissionResponse {
        AdmissionResponse {
            allowed: false,
            status: Some(AdmissionResponseStatus {
                code: Some(code),
                message: Some(message),
            }),
            ..Default::default()
        }
    }
}

pub fn decode(body: &[u8]) -> Result<AdmissionReview, DecodeError> {
    serde_json::from_slice(body).map_err(DecodeError)
}

pub fn encode(review: &AdmissionReview) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(review)
}
