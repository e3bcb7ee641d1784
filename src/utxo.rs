use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoToken {
  pub token_id: TokenId,
  pub token_type: TokenType,
  pub atoms: u64,
  pub is_mint_baton: bool,
}

/// A spendable output owned by a wallet, tagged with the address that owns
/// it so the signer can find its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletUtxo {
  pub outpoint: OutPoint,
  /// -1 while unconfirmed.
  pub block_height: i32,
  pub is_coinbase: bool,
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub sats: Amount,
  pub is_final: bool,
  pub token: Option<UtxoToken>,
  pub address: CashAddress,
}

impl WalletUtxo {
  pub const UNCONFIRMED_HEIGHT: i32 = -1;

  pub fn new(utxo: ScriptUtxo, address: CashAddress) -> Self {
    Self {
      outpoint: utxo.outpoint,
      block_height: utxo.block_height,
      is_coinbase: utxo.is_coinbase,
      sats: utxo.sats,
      is_final: utxo.is_final,
      token: utxo.token,
      address,
    }
  }

  pub fn token_id(&self) -> Option<TokenId> {
    self.token.map(|token| token.token_id)
  }

  pub fn atoms(&self) -> u64 {
    self.token.map(|token| token.atoms).unwrap_or_default()
  }

  pub fn is_mint_baton(&self) -> bool {
    self.token.is_some_and(|token| token.is_mint_baton)
  }

  /// A coinbase output is locked until it has `COINBASE_MATURITY`
  /// confirmations. Unconfirmed coinbase outputs are never spendable.
  pub fn is_mature(&self, tip_height: i32) -> bool {
    if !self.is_coinbase {
      return true;
    }

    self.block_height != Self::UNCONFIRMED_HEIGHT
      && tip_height.saturating_sub(self.block_height) >= COINBASE_MATURITY
  }

  pub fn sign_data(&self) -> SignData {
    SignData {
      sats: self.sats,
      output_script: self.address.script(),
    }
  }
}
