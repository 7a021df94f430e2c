pub mod events;
pub mod pool_instructions;
pub mod rpc;
pub mod utils;
