use anchor_lang::AccountDeserialize;
use anyhow::{format_err, Result};
use epoch_pool::{
    states::{
        GlobalConfig, OwnerLedger, PoolInfo, PoolLedger, GLOBAL_CONFIG_SEED, OWNER_LEDGER_SEED,
        POOL_INFO_SEED, POOL_LEDGER_SEED,
    },
    AUTH_SEED, CUSTODY_VAULT_SEED,
};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{account::Account, pubkey::Pubkey};
use spl_token_2022::{extension::StateWithExtensions, state::Mint};

pub fn deserialize_anchor_account<T: AccountDeserialize>(account: &Account) -> Result<T> {
    let mut data: &[u8] = &account.data;
    T::try_deserialize(&mut data).map_err(Into::into)
}

pub fn get_global_config_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[GLOBAL_CONFIG_SEED.as_bytes()], program_id).0
}

pub fn get_pool_info_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_INFO_SEED.as_bytes()], program_id).0
}

pub fn get_pool_ledger_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_LEDGER_SEED.as_bytes()], program_id).0
}

pub fn get_owner_ledger_address(program_id: &Pubkey, owner: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[OWNER_LEDGER_SEED.as_bytes(), owner.as_ref()], program_id).0
}

pub fn get_authority_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[AUTH_SEED.as_bytes()], program_id).0
}

pub fn get_custody_vault_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[CUSTODY_VAULT_SEED.as_bytes()], program_id).0
}

/// Token program owning `mint` plus its decimals. Works for both the legacy
/// token program and token-2022 since the base mint layout is shared.
#[derive(Debug, Clone, Copy)]
pub struct MintInfo {
    pub mint: Pubkey,
    pub token_program: Pubkey,
    pub decimals: u8,
}

pub fn get_mint_info(rpc_client: &RpcClient, mint: &Pubkey) -> Result<MintInfo> {
    let account = rpc_client.get_account(mint)?;
    let state = StateWithExtensions::<Mint>::unpack(&account.data)
        .map_err(|err| format_err!("failed to unpack mint {}: {}", mint, err))?;
    Ok(MintInfo {
        mint: *mint,
        token_program: account.owner,
        decimals: state.base.decimals,
    })
}

pub fn get_associated_token_address(owner: &Pubkey, mint: &MintInfo) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        &mint.mint,
        &mint.token_program,
    )
}

/// Snapshot of every pool-wide account, fetched in one round trip.
pub struct PoolSnapshot {
    pub config: GlobalConfig,
    pub info: PoolInfo,
    pub ledger: PoolLedger,
}

pub fn fetch_pool(rpc_client: &RpcClient, program_id: &Pubkey) -> Result<PoolSnapshot> {
    let keys = vec![
        get_global_config_address(program_id),
        get_pool_info_address(program_id),
        get_pool_ledger_address(program_id),
    ];
    let rsps = rpc_client.get_multiple_accounts(&keys)?;
    let mut accounts = rsps.into_iter().zip(keys.iter()).map(|(rsp, key)| {
        rsp.ok_or_else(|| format_err!("account {} not found, is the pool initialised?", key))
    });
    let config = deserialize_anchor_account::<GlobalConfig>(
        &accounts.next().ok_or_else(|| format_err!("missing global config"))??,
    )?;
    let info = deserialize_anchor_account::<PoolInfo>(
        &accounts.next().ok_or_else(|| format_err!("missing pool info"))??,
    )?;
    let ledger = deserialize_anchor_account::<PoolLedger>(
        &accounts.next().ok_or_else(|| format_err!("missing pool ledger"))??,
    )?;
    Ok(PoolSnapshot {
        config,
        info,
        ledger,
    })
}

/// Returns `None` when the owner never opened a ledger.
pub fn fetch_owner_ledger(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    owner: &Pubkey,
) -> Result<Option<OwnerLedger>> {
    let address = get_owner_ledger_address(program_id, owner);
    let rsp = rpc_client.get_multiple_accounts(&[address])?;
    match rsp.into_iter().next().flatten() {
        Some(account) => Ok(Some(deserialize_anchor_account::<OwnerLedger>(&account)?)),
        None => Ok(None),
    }
}

pub fn parse_receipt_tag(s: &str) -> Result<[u8; 8]> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format_err!("receipt tag must be 8 bytes, got {}", b.len()))
}
