use crate::error::ErrorCode;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Mining and bonus backend accounts
// ──────────────────────────────────────────────────────────────────────────────
//
// Layouts owned by the external backends. They are never written here; handlers
// receive them as unchecked accounts, verify the owning program and
// deserialize them ad hoc.
//

/// The pool's stake position inside the mining backend.
#[account]
#[derive(Default, Debug)]
pub struct MinerPosition {
    /// Authority of the position (the pool authority PDA).
    pub authority: Pubkey,
    /// Principal currently staked.
    pub staked_amount: u64,
    /// Unix timestamp after which an unstaked position can be withdrawn.
    pub withdrawable_at: i64,
}

/// Per-epoch credit counter kept by the mining backend for one authority.
#[account]
#[derive(Default, Debug)]
pub struct MinerCredits {
    pub authority: Pubkey,
    pub epoch: u64,
    pub credits: u64,
}

/// Bonus backend flags for one epoch.
#[account]
#[derive(Default, Debug)]
pub struct BonusEpoch {
    pub epoch: u64,
    pub is_bonus: bool,
    pub claims_open: bool,
}

/// Deserializes an Anchor account owned by `program_id`.
pub fn load_foreign<T: AccountDeserialize>(
    info: &AccountInfo,
    program_id: &Pubkey,
    err: ErrorCode,
) -> Result<T> {
    require_keys_eq!(*info.owner, *program_id, err);
    let data = info.try_borrow_data()?;
    T::try_deserialize(&mut &data[..]).map_err(|_| error!(err))
}

impl MinerPosition {
    pub fn load(info: &AccountInfo, mining_program: &Pubkey, authority: &Pubkey) -> Result<Self> {
        let position: Self = load_foreign(info, mining_program, ErrorCode::InvalidMiningAccount)?;
        require_keys_eq!(
            position.authority,
            *authority,
            ErrorCode::InvalidMiningAccount
        );
        Ok(position)
    }
}

impl MinerCredits {
    /// Credits recorded for `authority` at `epoch`.
    ///
    /// The backend creates the counter on the first forward of an epoch, so an
    /// account that does not exist yet reads as zero.
    pub fn read(
        info: &AccountInfo,
        mining_program: &Pubkey,
        authority: &Pubkey,
        epoch: u64,
    ) -> Result<u64> {
        if info.data_is_empty() && *info.owner == anchor_lang::system_program::ID {
            return Ok(0);
        }
        let counter: Self = load_foreign(info, mining_program, ErrorCode::InvalidMiningAccount)?;
        require_keys_eq!(counter.authority, *authority, ErrorCode::InvalidMiningAccount);
        require!(counter.epoch == epoch, ErrorCode::InvalidMiningAccount);
        Ok(counter.credits)
    }
}

impl BonusEpoch {
    pub fn load(info: &AccountInfo, bonus_program: &Pubkey, epoch: u64) -> Result<Self> {
        let flags: Self = load_foreign(info, bonus_program, ErrorCode::InvalidBonusAccount)?;
        require!(flags.epoch == epoch, ErrorCode::InvalidBonusAccount);
        Ok(flags)
    }
}
