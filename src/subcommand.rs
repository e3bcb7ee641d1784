use {super::*, signatory::SigHashType};

mod address;
mod balance;
mod max_send;
mod send;
mod send_token;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Print a receive or change address")]
  Address(address::Address),
  #[command(about = "Print sats and token balances")]
  Balance,
  #[command(about = "Print the most sats a single payment can send")]
  MaxSend,
  #[command(about = "Send sats to an address")]
  Send(send::Send),
  #[command(about = "Send tokens to an address")]
  SendToken(send_token::SendToken),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::Address(address) => address.run(settings),
      Self::Balance => balance::run(settings),
      Self::MaxSend => max_send::run(settings),
      Self::Send(send) => send.run(settings),
      Self::SendToken(send_token) => send_token.run(settings),
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
  #[default]
  Json,
  Yaml,
}

pub trait Output: Send {
  fn print(&self, format: OutputFormat);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print(&self, format: OutputFormat) {
    match format {
      OutputFormat::Json => serde_json::to_writer_pretty(io::stdout(), self).ok(),
      OutputFormat::Yaml => serde_yaml::to_writer(io::stdout(), self).ok(),
    };
    println!();
  }
}

pub(crate) type SubcommandResult = SnafuResult<Option<Box<dyn Output>>>;

/// A signed transaction as reported by `send` and `send-token`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct BuiltOutput {
  pub txid: Txid,
  pub fee: u64,
  pub size: usize,
  pub hex: String,
  pub broadcast: bool,
}

fn synced_wallet(settings: &Settings, runtime: &Runtime) -> Result<(Wallet, Snapshot)> {
  let mut wallet = settings.wallet()?;

  let indexer = settings.indexer()?;

  runtime.block_on(wallet.sync(&indexer))?;

  Ok((wallet, indexer))
}

fn build_and_broadcast(
  settings: &Settings,
  action: Action,
  no_broadcast: bool,
) -> Result<BuiltOutput> {
  let runtime = Runtime::new()?;

  let (mut wallet, indexer) = synced_wallet(settings, &runtime)?;

  let built = wallet
    .action(action, SatsSelectionStrategy::RequireSats)?
    .build(SigHashType::ALL_BIP143)?;

  let built_tx = built
    .built_txs
    .first()
    .ok_or_else(|| anyhow!("action built no transactions"))?;

  if !no_broadcast {
    runtime.block_on(built.broadcast(&indexer))?;
  }

  Ok(BuiltOutput {
    txid: built_tx.txid,
    fee: built_tx.fee_paid().to_sat(),
    size: built_tx.size(),
    hex: built_tx.hex(),
    broadcast: !no_broadcast,
  })
}
