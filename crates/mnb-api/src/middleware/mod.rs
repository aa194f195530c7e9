pub mod cors;
pub mod request_id;

pub use cors::create_cors_layer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
