use crate::states::*;
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct OpenOwnerLedger<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Per-owner ledger (derived by OWNER_LEDGER_SEED + owner). Created on first use.
    #[account(
        init_if_needed,
        seeds = [
            OWNER_LEDGER_SEED.as_bytes(),
            owner.key().as_ref()
        ],
        bump,
        payer = owner,
        space = OwnerLedger::initial_space()
    )]
    pub owner_ledger: Box<Account<'info, OwnerLedger>>,

    pub system_program: Program<'info, System>,
}

/// Creates the caller's ledger. Calling it again is a no-op.
pub fn open_owner_ledger(ctx: Context<OpenOwnerLedger>) -> Result<()> {
    let owner_ledger = &mut ctx.accounts.owner_ledger;
    if owner_ledger.owner == Pubkey::default() {
        owner_ledger.bump = ctx.bumps.owner_ledger;
        owner_ledger.owner = ctx.accounts.owner.key();
        msg!("Owner ledger opened for {}", owner_ledger.owner);
    }
    Ok(())
}
