use anyhow::{format_err, Result};
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig, RpcTransactionConfig},
    rpc_response::RpcSimulateTransactionResult,
};
use solana_sdk::{
    commitment_config::CommitmentConfig, signature::Signature, transaction::Transaction,
};
use solana_transaction_status::UiTransactionEncoding;

pub fn send_txn(client: &RpcClient, txn: &Transaction, wait_confirm: bool) -> Result<Signature> {
    Ok(client.send_and_confirm_transaction_with_spinner_and_config(
        txn,
        if wait_confirm {
            CommitmentConfig::confirmed()
        } else {
            CommitmentConfig::processed()
        },
        RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        },
    )?)
}

pub fn simulate_transaction(
    client: &RpcClient,
    transaction: &Transaction,
    sig_verify: bool,
    cfg: CommitmentConfig,
) -> Result<RpcSimulateTransactionResult> {
    let result = client.simulate_transaction_with_config(
        transaction,
        RpcSimulateTransactionConfig {
            sig_verify,
            commitment: Some(cfg),
            ..RpcSimulateTransactionConfig::default()
        },
    )?;
    Ok(result.value)
}

/// Log lines of a confirmed transaction.
pub fn get_transaction_logs(client: &RpcClient, signature: &Signature) -> Result<Vec<String>> {
    let txn = client.get_transaction_with_config(
        signature,
        RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        },
    )?;
    let meta = txn
        .transaction
        .meta
        .ok_or_else(|| format_err!("transaction {} has no status meta", signature))?;
    Option::<Vec<String>>::from(meta.log_messages)
        .ok_or_else(|| format_err!("transaction {} has no log messages", signature))
}
