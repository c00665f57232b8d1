pub mod http_client;
pub mod remote_service;

pub use http_client::HttpRemoteService;
pub use remote_service::RemoteService;
