//! Types and encoders for the SLP and ALP token protocols.
//!
//! SLP carries a single token operation in one `OP_RETURN` push sequence.
//! ALP carries any number of operations, each as one push inside an eMPP
//! envelope (`OP_RETURN OP_RESERVED <push>...`).

use {
  bitcoin::{
    consensus::encode::{serialize, VarInt},
    hashes::Hash,
    opcodes::all::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_RESERVED, OP_RETURN},
    ScriptBuf, Txid,
  },
  derive_more::Display,
  serde_with::{DeserializeFromStr, SerializeDisplay},
  std::{
    cmp::Ordering,
    fmt::{self, Formatter},
    str::FromStr,
  },
  thiserror::Error,
};

pub use {
  alp::{alp_burn, alp_genesis, alp_mint, alp_send, AlpMintData},
  empp::empp_script,
  genesis_info::GenesisInfo,
  slp::{slp_burn, slp_genesis, slp_mint, slp_send},
  token_id::TokenId,
  token_type::{AlpTokenType, Protocol, SlpTokenType, TokenType},
};

mod alp;
mod empp;
mod genesis_info;
mod slp;
mod token_id;
mod token_type;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

pub const SLP_LOKAD_ID: &[u8; 4] = b"SLP\0";
pub const ALP_LOKAD_ID: &[u8; 4] = b"SLP2";

/// Highest output index an SLP SEND may color.
pub const SLP_MAX_SEND_OUTPUTS: usize = 19;

/// Highest output index an ALP tx may color under current relay policy.
pub const ALP_POLICY_MAX_OUTPUTS: usize = 29;

/// Largest standard `OP_RETURN` script, in bytes.
pub const OP_RETURN_MAX_BYTES: usize = 223;

/// ALP atoms are 48-bit.
pub const ALP_MAX_ATOMS: u64 = 0xffff_ffff_ffff;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("Atoms out of range: {0}")]
  AtomsOutOfRange(u64),
  #[error("Cannot use more than {max} amounts, but got {count}")]
  TooManyAmounts { max: usize, count: usize },
  #[error("sendAtomsArray cannot be empty")]
  EmptySendAtoms,
  #[error("eMPP pushes must not be empty")]
  EmptyEmppPush,
  #[error("{0} genesis requires a mint vault scripthash")]
  MissingMintVaultScripthash(SlpTokenType),
  #[error("{0} does not support a mint baton")]
  UnexpectedMintBaton(SlpTokenType),
  #[error("Cannot use MINT for {0}")]
  UnsupportedMint(SlpTokenType),
}

/// Appends `data` to `script` as a single push, choosing the smallest push
/// opcode that fits. Empty data is pushed as `OP_PUSHDATA1 0x00` when
/// `empty_as_pushdata1` is set, which is how SLP encodes empty fields.
fn push_bytes(script: &mut Vec<u8>, data: &[u8], empty_as_pushdata1: bool) {
  let len = data.len();

  if len == 0 && empty_as_pushdata1 {
    script.extend([OP_PUSHDATA1.to_u8(), 0]);
    return;
  }

  if let Ok(len) = u8::try_from(len) {
    if len < OP_PUSHDATA1.to_u8() {
      script.push(len);
    } else {
      script.extend([OP_PUSHDATA1.to_u8(), len]);
    }
  } else if let Ok(len) = u16::try_from(len) {
    script.push(OP_PUSHDATA2.to_u8());
    script.extend(len.to_le_bytes());
  } else {
    script.push(OP_PUSHDATA4.to_u8());
    script.extend(u32::try_from(len).unwrap_or(u32::MAX).to_le_bytes());
  }

  script.extend_from_slice(data);
}

fn write_size(payload: &mut Vec<u8>, size: usize) {
  payload.extend(serialize(&VarInt(size as u64)));
}
