pub mod initialise_pool;
pub use initialise_pool::*;

pub mod open_owner_ledger;
pub use open_owner_ledger::*;

pub mod checkpoint;
pub use checkpoint::*;

pub mod deposit;
pub use deposit::*;

pub mod withdraw_principal;
pub use withdraw_principal::*;

pub mod submit_receipt;
pub use submit_receipt::*;

pub mod claim_stream;
pub use claim_stream::*;

pub mod claim_owner;
pub use claim_owner::*;

pub mod unstake;
pub use unstake::*;

pub mod finalize_withdraw;
pub use finalize_withdraw::*;

pub mod stake;
pub use stake::*;
