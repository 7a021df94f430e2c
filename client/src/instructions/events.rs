use anchor_lang::{AnchorDeserialize, Discriminator};
use anyhow::{format_err, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use colorful::{Color, Colorful};
use epoch_pool::states::{
    EpochSettled, OwnerRewardsClaimed, PoolInitialized, PoolRestaked, PrincipalDeposited,
    PrincipalStaked, PrincipalWithdrawn, ReceiptForwarded, RewardInflowRecorded,
    UnstakeRequested, WithdrawFinalized,
};
use regex::Regex;

#[derive(Debug)]
pub enum PoolEvent {
    PoolInitialized(PoolInitialized),
    EpochSettled(EpochSettled),
    PrincipalDeposited(PrincipalDeposited),
    PrincipalWithdrawn(PrincipalWithdrawn),
    ReceiptForwarded(ReceiptForwarded),
    RewardInflowRecorded(RewardInflowRecorded),
    OwnerRewardsClaimed(OwnerRewardsClaimed),
    UnstakeRequested(UnstakeRequested),
    WithdrawFinalized(WithdrawFinalized),
    PrincipalStaked(PrincipalStaked),
    PoolRestaked(PoolRestaked),
}

macro_rules! match_event {
    ($data:expr, $($event:ident),+ $(,)?) => {{
        let (disc, mut body) = $data.split_at(8);
        $(
            if disc == $event::DISCRIMINATOR {
                return Ok(Some(PoolEvent::$event($event::deserialize(&mut body)?)));
            }
        )+
        Ok(None)
    }};
}

/// Decodes one `Program data:` payload. Unknown discriminators yield `None`.
pub fn decode_event(data: &[u8]) -> Result<Option<PoolEvent>> {
    if data.len() < 8 {
        return Ok(None);
    }
    match_event!(
        data,
        PoolInitialized,
        EpochSettled,
        PrincipalDeposited,
        PrincipalWithdrawn,
        ReceiptForwarded,
        RewardInflowRecorded,
        OwnerRewardsClaimed,
        UnstakeRequested,
        WithdrawFinalized,
        PrincipalStaked,
        PoolRestaked,
    )
}

/// Entries of a transaction's log that were produced by `program_id`.
#[derive(Debug)]
pub enum ProgramLog {
    Message(String),
    Event(PoolEvent),
}

/// Walks the invoke stack in `logs` and keeps only lines emitted while
/// `program_id` was the innermost program.
pub fn parse_program_logs(logs: &[String], program_id: &str) -> Result<Vec<ProgramLog>> {
    let invoke = Regex::new(r"^Program (\w+) invoke \[(\d+)\]$")?;
    let finish = Regex::new(r"^Program (\w+) (success|failed)")?;
    let log = Regex::new(r"^Program log: (.*)$")?;
    let data = Regex::new(r"^Program data: (.+)$")?;

    let mut stack: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for line in logs {
        if let Some(caps) = invoke.captures(line) {
            stack.push(caps[1].to_string());
            continue;
        }
        if finish.is_match(line) {
            stack.pop();
            continue;
        }
        if stack.last().map(String::as_str) != Some(program_id) {
            continue;
        }
        if let Some(caps) = log.captures(line) {
            out.push(ProgramLog::Message(caps[1].to_string()));
        } else if let Some(caps) = data.captures(line) {
            let bytes = STANDARD
                .decode(&caps[1])
                .map_err(|err| format_err!("bad event payload {}: {}", &caps[1], err))?;
            if let Some(event) = decode_event(&bytes)? {
                out.push(ProgramLog::Event(event));
            }
        }
    }
    Ok(out)
}

pub fn print_program_logs(entries: &[ProgramLog]) {
    for entry in entries {
        match entry {
            ProgramLog::Message(msg) => println!("{}", msg.as_str().color(Color::Blue)),
            ProgramLog::Event(event) => {
                println!("{}", format!("{:#?}", event).color(Color::Green))
            }
        }
    }
}
