use crate::error::ErrorCode;
use anchor_lang::prelude::*;
use arrayref::array_ref;

//
// ──────────────────────────────────────────────────────────────────────────────
// Global Configuration Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive the global configuration account.
pub const GLOBAL_CONFIG_SEED: &str = "global_config";

/// Length of the tag every forwarded receipt must start with.
pub const RECEIPT_TAG_LEN: usize = 8;

/// Immutable pool configuration written once by `initialise_pool`.
///
/// Holds the fixed addresses of the custody and fee vaults, the mining and bonus
/// backends the pool talks to, and the parameters that gate receipt forwarding.
#[account]
#[derive(Default, Debug)]
pub struct GlobalConfig {
    /// PDA bump for this account (for seed derivation).
    pub bump: u8,

    /// Bump of the pool authority PDA (custody owner and CPI signer).
    pub authority_bump: u8,

    /// The single privileged actor allowed to call `submit_receipt`.
    pub forwarder: Pubkey,

    /// Mint of the pooled principal and of every reward stream.
    pub asset_mint: Pubkey,

    /// Program-owned token account holding unstaked principal and the reward reserve.
    pub custody_vault: Pubkey,

    /// Token account receiving the fee cut of every reward inflow.
    pub fee_vault: Pubkey,

    /// Mining backend program (stake, unstake, withdraw, claim, receipt forwarding).
    pub mining_program: Pubkey,

    /// The pool's position account inside the mining backend.
    pub miner_position: Pubkey,

    /// Mining backend vault that holds the pool's staked principal.
    pub mining_stake_vault: Pubkey,

    /// Bonus backend program (bonus claims and bonus epoch flags).
    pub bonus_program: Pubkey,

    /// Pool-wide accounting account.
    pub pool_info: Pubkey,

    /// Pool-wide checkpoint and epoch index account.
    pub pool_ledger: Pubkey,

    /// Fee rate in basis points, applied to each gross reward inflow.
    pub fee_rate: u64,

    /// Prefix every forwarded receipt payload must start with.
    pub receipt_tag: [u8; RECEIPT_TAG_LEN],

    /// Inclusive payload length bounds for forwarded receipts.
    pub min_receipt_len: u16,
    pub max_receipt_len: u16,
}

impl GlobalConfig {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1 + 1: bumps
    /// - 32 * 10: ten Pubkeys
    /// - 8: fee rate
    /// - 8: receipt tag
    /// - 2 + 2: receipt length bounds
    pub const LEN: usize = 8 + 1 + 1 + 32 * 10 + 8 + RECEIPT_TAG_LEN + 2 + 2;

    /// Rejects payloads outside the configured length bounds or with the wrong tag.
    pub fn check_receipt(&self, payload: &[u8]) -> Result<()> {
        let len = payload.len();
        require!(
            len >= self.min_receipt_len as usize && len <= self.max_receipt_len as usize,
            ErrorCode::InvalidReceiptPayload
        );
        require!(len >= RECEIPT_TAG_LEN, ErrorCode::InvalidReceiptPayload);
        let tag = array_ref![payload, 0, RECEIPT_TAG_LEN];
        require!(*tag == self.receipt_tag, ErrorCode::InvalidReceiptPayload);
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;

    fn config() -> GlobalConfig {
        GlobalConfig {
            receipt_tag: *b"receipt!",
            min_receipt_len: 12,
            max_receipt_len: 64,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_tagged_payload_within_bounds() {
        let mut payload = b"receipt!".to_vec();
        payload.extend_from_slice(&[7u8; 24]);
        assert!(config().check_receipt(&payload).is_ok());
    }

    #[test]
    fn rejects_wrong_tag_or_length() {
        let cfg = config();
        let short = b"receipt!abc".to_vec();
        let long = [b"receipt!".as_slice(), &[0u8; 57]].concat();
        let wrong = [b"receipt?".as_slice(), &[0u8; 8]].concat();
        for payload in [short, long, wrong, Vec::new()] {
            assert_eq!(
                cfg.check_receipt(&payload).unwrap_err(),
                ErrorCode::InvalidReceiptPayload.into()
            );
        }
    }
}
