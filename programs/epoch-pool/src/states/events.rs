use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Events: Emitted for off-chain indexers/clients to track pool state changes
// ──────────────────────────────────────────────────────────────────────────────
//

/// Emitted once when the pool is initialised.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct PoolInitialized {
    pub forwarder: Pubkey,
    pub asset_mint: Pubkey,
    pub custody_vault: Pubkey,
    pub fee_vault: Pubkey,
    pub mining_program: Pubkey,
    pub bonus_program: Pubkey,
    /// Fee rate in basis points.
    pub fee_rate: u64,
    pub genesis_epoch: u64,
}

/// Emitted when the lazy checkpoint step moves the settled epoch forward.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct EpochSettled {
    pub from_epoch: u64,
    pub to_epoch: u64,
    /// Principal that became active shares.
    pub activated: u64,
    pub active_total_shares: u64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct PrincipalDeposited {
    pub owner: Pubkey,
    pub amount: u64,
    /// Epoch at which the deposit becomes active shares.
    pub activation_epoch: u64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct PrincipalWithdrawn {
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    /// Portion taken from principal still waiting for activation.
    pub from_pending: u64,
    /// Portion taken from active shares.
    pub from_active: u64,
}

/// Emitted after a receipt was forwarded and the credit index advanced.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct ReceiptForwarded {
    pub epoch: u64,
    pub credits_delta: u64,
    pub active_total_shares: u64,
    pub acc_credits_per_share: u128,
}

/// Emitted once per epoch and stream when a backend claim is settled.
#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct RewardInflowRecorded {
    pub epoch: u64,
    /// `true` for the bonus stream, `false` for the regular stream.
    pub bonus: bool,
    pub gross: u64,
    pub fee: u64,
    pub net: u64,
    pub acc_reward_per_share: u128,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct OwnerRewardsClaimed {
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub epochs: Vec<u64>,
    pub amount: u64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct UnstakeRequested {
    pub epoch: u64,
    pub staked_amount: u64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct WithdrawFinalized {
    pub withdrawn: u64,
    pub timestamp: i64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct PrincipalStaked {
    pub amount: u64,
    pub total_liability: u64,
    pub reward_reserve: u64,
}

#[event]
#[cfg_attr(feature = "client", derive(Debug))]
pub struct PoolRestaked {
    pub epoch: u64,
    pub amount: u64,
    pub unstake_not_before_epoch: u64,
}
