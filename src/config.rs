use super::*;

/// Contents of `ecash-wallet.yaml`. The mnemonic is deliberately absent, so
/// a config file that contains one fails to load.
#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
  pub(crate) account: Option<u32>,
  pub(crate) change_index: Option<u32>,
  pub(crate) dust_sats: Option<u64>,
  pub(crate) fee_per_kb: Option<u64>,
  pub(crate) hd: Option<bool>,
  pub(crate) receive_index: Option<u32>,
  pub(crate) snapshot: Option<PathBuf>,
}
