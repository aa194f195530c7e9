pub mod model;
pub mod routes;
pub mod service;
pub mod session;

pub use routes::routes;
pub use service::ReviewService;
pub use session::ReviewCoordinator;
