pub mod api;
pub mod server;

pub use api::create_router;
