//! LabSight HTTP service: medical report summaries, abnormal lab values and
//! doctor-type recommendations.

pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

pub use routes::build_router;
pub use state::AppState;
