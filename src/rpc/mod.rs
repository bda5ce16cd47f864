pub mod client;
pub mod eth;
pub mod params;
pub mod protocol;

pub use client::RpcClient;
pub use params::RpcValue;
pub use protocol::{decode_response, error_code_name, JsonRpcRequest, JsonRpcResponse};
