use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
  #[arg(long, help = "Derive keys for BIP44 account <ACCOUNT>. [default: 0]")]
  pub(crate) account: Option<u32>,
  #[arg(long, help = "Start change derivation at <CHANGE_INDEX>. [default: 0]")]
  pub(crate) change_index: Option<u32>,
  #[arg(
    long,
    env = "ECASH_WALLET_CONFIG",
    help = "Load configuration from <CONFIG>."
  )]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Load configuration from <CONFIG_DIR>/ecash-wallet.yaml.")]
  pub(crate) config_dir: Option<PathBuf>,
  #[arg(long, help = "Treat outputs below <DUST_SATS> as dust. [default: 546]")]
  pub(crate) dust_sats: Option<u64>,
  #[arg(long, help = "Pay <FEE_PER_KB> sats per 1000 bytes. [default: 1000]")]
  pub(crate) fee_per_kb: Option<FeeRate>,
  #[arg(long, short, help = "Specify output format. [default: json]")]
  pub(crate) format: Option<OutputFormat>,
  #[arg(long, help = "Use the mnemonic as an HD root instead of a single key.")]
  pub(crate) hd: bool,
  #[arg(long, help = "Read the wallet mnemonic from <MNEMONIC_FILE>.")]
  pub(crate) mnemonic_file: Option<PathBuf>,
  #[arg(long, help = "Start receive derivation at <RECEIVE_INDEX>. [default: 0]")]
  pub(crate) receive_index: Option<u32>,
  #[arg(long, help = "Load UTXOs from the indexer snapshot at <SNAPSHOT>.")]
  pub(crate) snapshot: Option<PathBuf>,
}
