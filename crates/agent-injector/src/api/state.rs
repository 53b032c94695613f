use crate::engine::AdmissionEngine;

pub(crate) struct ApiServerState {
    pub(crate) engine: AdmissionEngine,
}
