//! Hand-built CPIs into the mining and bonus backends.
//!
//! Both backends are Anchor programs; instruction data is the 8-byte
//! `global:<name>` sighash followed by the borsh-encoded arguments. The pool
//! authority PDA signs every call. Accounts beyond the fixed ones are passed
//! through from the caller's remaining accounts in order.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::invoke_signed;

pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{}", name);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    discriminator
}

/// Invokes `program_id` with `data`. `authority` is marked as signer; every
/// other account keeps the writable flag it was passed with.
fn invoke_backend<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    data: Vec<u8>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    let mut metas = Vec::with_capacity(accounts.len() + 1);
    metas.push(AccountMeta::new_readonly(authority.key(), true));
    for account in accounts {
        if account.is_writable {
            metas.push(AccountMeta::new(account.key(), account.is_signer));
        } else {
            metas.push(AccountMeta::new_readonly(account.key(), account.is_signer));
        }
    }

    let ix = Instruction {
        program_id: program.key(),
        accounts: metas,
        data,
    };

    let mut infos = Vec::with_capacity(accounts.len() + 2);
    infos.push(authority.clone());
    infos.extend_from_slice(accounts);
    infos.push(program.clone());

    invoke_signed(&ix, &infos, signer_seeds)?;
    Ok(())
}

fn encode<T: AnchorSerialize>(name: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = sighash(name).to_vec();
    args.serialize(&mut data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;
    Ok(data)
}

/// `stake(amount)`: accounts `[position, custody_vault, stake_vault, asset_mint, token_program]`.
pub fn stake<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    amount: u64,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(program, authority, accounts, encode("stake", &amount)?, signer_seeds)
}

/// `unstake()`: accounts `[position]`.
pub fn unstake<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(program, authority, accounts, sighash("unstake").to_vec(), signer_seeds)
}

/// `withdraw()`: accounts `[position, stake_vault, custody_vault, asset_mint, token_program]`.
pub fn withdraw<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(program, authority, accounts, sighash("withdraw").to_vec(), signer_seeds)
}

/// `claim(epochs)` on the mining backend, paying into custody.
pub fn claim<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    epochs: Vec<u64>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(program, authority, accounts, encode("claim", &epochs)?, signer_seeds)
}

/// `claim_bonus(epochs)` on the bonus backend, paying into custody.
pub fn claim_bonus<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    epochs: Vec<u64>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(
        program,
        authority,
        accounts,
        encode("claim_bonus", &epochs)?,
        signer_seeds,
    )
}

/// Forwards a receipt verbatim. The payload's leading tag selects the backend
/// entry point, so it is used as instruction data unchanged.
pub fn forward<'info>(
    program: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    payload: Vec<u8>,
    signer_seeds: &[&[&[u8]]],
) -> Result<()> {
    invoke_backend(program, authority, accounts, payload, signer_seeds)
}
