use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Address {
  #[arg(long, help = "Print a change address instead of a receive address.")]
  change: bool,
  #[arg(
    long,
    help = "Derive the address at <INDEX>. [default: the configured receive or change index]"
  )]
  index: Option<u32>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub address: CashAddress,
  pub change: bool,
  pub index: u32,
}

impl Address {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    Ok(Some(Box::new(self.output(&settings)?)))
  }

  fn output(&self, settings: &Settings) -> Result<Output> {
    let mut wallet = settings.wallet()?;

    let index = match self.index {
      Some(index) => index,
      None if self.change => wallet.change_index(),
      None => wallet.receive_index(),
    };

    Ok(Output {
      address: wallet.derive_address(self.change, index)?,
      change: self.change,
      index,
    })
  }
}
