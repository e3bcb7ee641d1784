//! The query interface to a ledger indexer.
//!
//! The wallet never talks to the network directly. Everything it learns
//! about the chain, and every transaction it publishes, goes through an
//! `Indexer`. Errors are passed through untouched and never retried.

use super::*;

pub use snapshot::Snapshot;

mod snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptUtxo {
  pub outpoint: OutPoint,
  /// -1 while unconfirmed.
  pub block_height: i32,
  pub is_coinbase: bool,
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub sats: Amount,
  pub is_final: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<UtxoToken>,
}

/// All unspent outputs locked by one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptUtxos {
  pub output_script: ScriptBuf,
  pub utxos: Vec<ScriptUtxo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainInfo {
  pub tip_hash: BlockHash,
  pub tip_height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTxInput {
  pub prev_out: OutPoint,
  pub output_script: ScriptBuf,
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub sats: Amount,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<UtxoToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTxOutput {
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub sats: Amount,
  pub output_script: ScriptBuf,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<UtxoToken>,
  /// Input that spends this output, if the indexer has seen one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub spent_by: Option<OutPoint>,
}

/// A transaction as reported by the indexer, with the outputs its inputs
/// spend and token data resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTx {
  pub txid: Txid,
  pub inputs: Vec<IndexedTxInput>,
  pub outputs: Vec<IndexedTxOutput>,
  /// `None` while in the mempool.
  #[serde(default)]
  pub block_height: Option<i32>,
  #[serde(default)]
  pub is_coinbase: bool,
  #[serde(default)]
  pub is_final: bool,
}

impl IndexedTx {
  pub fn outpoint(&self, vout: usize) -> Option<OutPoint> {
    Some(OutPoint {
      txid: self.txid,
      vout: u32::try_from(vout).ok()?,
    })
  }
}

#[async_trait]
pub trait Indexer: Send + Sync {
  async fn address_utxos(&self, address: &CashAddress) -> Result<ScriptUtxos>;

  async fn blockchain_info(&self) -> Result<BlockchainInfo>;

  /// Publishes a hex-encoded transaction, returning its txid.
  async fn broadcast_tx(&self, raw_tx: &str) -> Result<Txid>;
}
