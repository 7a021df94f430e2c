pub mod events;
pub use events::*;

pub mod global_config;
pub use global_config::*;

pub mod mining;
pub use mining::*;

pub mod owner_ledger;
pub use owner_ledger::*;

pub mod pool_info;
pub use pool_info::*;

pub mod pool_ledger;
pub use pool_ledger::*;
