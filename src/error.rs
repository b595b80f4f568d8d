use wasm_bindgen::JsValue;

/// Errors returned by the route engine and the GPX codec.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Route needs at least two waypoints for this query")]
    InsufficientWaypoints,

    #[error("Provided routes are read-only; copy the route to edit it")]
    ReadOnlyRoute,

    #[error("No waypoints to export")]
    EmptyRoute,

    #[error("Malformed GPX document: {0}")]
    MalformedDocument(String),

    #[error("No active route")]
    NoActiveRoute,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;

impl RouteError {
    pub(crate) fn index(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}

impl From<quick_xml::Error> for RouteError {
    fn from(e: quick_xml::Error) -> Self {
        Self::MalformedDocument(e.to_string())
    }
}

impl From<RouteError> for JsValue {
    fn from(e: RouteError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
