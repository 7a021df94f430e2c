use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    // Configuration
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Address must not be the default public key")]
    InvalidAddress,

    #[msg("Fee rate exceeds the maximum allowed rate")]
    FeeRateTooHigh,

    #[msg("Receipt length bounds are invalid")]
    InvalidReceiptBounds,

    #[msg("Signer is not the pool deployer")]
    InvalidDeployer,

    #[msg("Token account mint does not match the pool asset mint")]
    InvalidMint,

    // Preconditions
    #[msg("Operation is not allowed in the current pool phase")]
    PhaseMismatch,

    #[msg("Epoch list is empty")]
    EmptyEpochList,

    #[msg("Epoch list exceeds the maximum length")]
    EpochListTooLong,

    #[msg("Epoch list must be strictly increasing")]
    EpochListUnsorted,

    #[msg("Epoch has not ended yet")]
    EpochNotEnded,

    #[msg("Regular reward for this epoch was already claimed")]
    RegularAlreadyClaimed,

    #[msg("Bonus reward for this epoch was already claimed")]
    BonusAlreadyClaimed,

    #[msg("Epoch is not a bonus epoch")]
    NotBonusEpoch,

    #[msg("Bonus claims for this epoch are not open")]
    BonusClaimsClosed,

    #[msg("Amount exceeds the owner's principal")]
    InsufficientPrincipal,

    #[msg("Custody balance net of the reward reserve cannot cover the amount")]
    InsufficientLiquidity,

    #[msg("Unstake boundary epoch has not been reached")]
    UnstakeBoundaryNotReached,

    #[msg("Nothing is staked with the mining backend")]
    NothingStaked,

    #[msg("Cooldown has not elapsed")]
    CooldownNotElapsed,

    #[msg("Principal is already fully staked")]
    NothingToStake,

    #[msg("No active shares in the pool")]
    NoActiveShares,

    #[msg("No shares were recorded for the epoch")]
    NoSharesAtEpoch,

    #[msg("Nothing to claim for the requested epochs")]
    NothingToClaim,

    #[msg("Signer is not the configured forwarder")]
    UnauthorizedForwarder,

    #[msg("Receipt payload has an invalid length or tag")]
    InvalidReceiptPayload,

    #[msg("Missing remaining account")]
    MissingRemainingAccount,

    #[msg("Invalid bonus epoch account")]
    InvalidBonusAccount,

    #[msg("Invalid mining backend account")]
    InvalidMiningAccount,

    // External dependencies
    #[msg("Forwarding call to the mining backend failed")]
    ForwardCallFailed,

    #[msg("Credits did not increase after forwarding")]
    CreditsDidNotIncrease,

    #[msg("Claim produced no reward inflow")]
    ZeroGrossInflow,

    // Invariants
    #[msg("Checkpoint ordering invariant violated")]
    CheckpointOrderViolation,

    #[msg("Accumulated value is below the stored debt")]
    DebtExceedsAccumulated,

    #[msg("Current epoch is behind the last settled epoch")]
    EpochRegressed,

    #[msg("Scheduled activation is out of order")]
    ActivationOutOfOrder,

    #[msg("Rewards paid would exceed rewards accrued")]
    RewardsOverdrawn,

    #[msg("Math operation overflowed or underflowed")]
    MathOverflow,
}
