use super::*;

/// Metadata committed in a GENESIS push.
///
/// `hash` and `mint_vault_scripthash` only exist in SLP. `data` and
/// `auth_pubkey` only exist in ALP. Fields that do not apply to the encoding
/// protocol are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenesisInfo {
  pub token_ticker: Option<String>,
  pub token_name: Option<String>,
  pub url: Option<String>,
  pub hash: Option<[u8; 32]>,
  pub mint_vault_scripthash: Option<[u8; 20]>,
  pub data: Option<Vec<u8>>,
  pub auth_pubkey: Option<Vec<u8>>,
  pub decimals: Option<u8>,
}

impl GenesisInfo {
  pub(crate) fn ticker_bytes(&self) -> &[u8] {
    self.token_ticker.as_deref().unwrap_or_default().as_bytes()
  }

  pub(crate) fn name_bytes(&self) -> &[u8] {
    self.token_name.as_deref().unwrap_or_default().as_bytes()
  }

  pub(crate) fn url_bytes(&self) -> &[u8] {
    self.url.as_deref().unwrap_or_default().as_bytes()
  }
}
