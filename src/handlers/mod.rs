pub mod health;
pub mod leads;
pub mod metrics;
pub mod response;

pub use response::ApiResponse;
