pub mod navigation_endpoint;
pub mod server_state;
