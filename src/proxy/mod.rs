pub mod handler;
pub mod request;

pub use handler::proxy_handler;
