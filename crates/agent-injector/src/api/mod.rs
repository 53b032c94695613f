pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

pub(crate) const MUTATE_PATH: &str = "/mutate";
