use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Send {
  #[arg(help = "Pay <ADDRESS>.")]
  address: CashAddress,
  #[arg(help = "Send <SATS> satoshis.")]
  sats: u64,
  #[arg(long, help = "Sign the transaction without broadcasting it.")]
  no_broadcast: bool,
}

impl Send {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    Ok(Some(Box::new(self.output(&settings)?)))
  }

  fn output(&self, settings: &Settings) -> Result<BuiltOutput> {
    let action = Action {
      outputs: vec![PaymentOutput::plain(
        Amount::from_sat(self.sats),
        self.address.script(),
      )],
      dust_sats: Some(settings.dust_sats()?),
      fee_per_kb: Some(settings.fee_per_kb()?),
      ..default()
    };

    build_and_broadcast(settings, action, self.no_broadcast)
  }
}
