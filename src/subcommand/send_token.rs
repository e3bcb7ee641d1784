use super::*;

#[derive(Debug, Parser)]
pub(crate) struct SendToken {
  #[arg(help = "Pay <ADDRESS>.")]
  address: CashAddress,
  #[arg(help = "Send tokens of <TOKEN_ID>.")]
  token_id: TokenId,
  #[arg(help = "Send <ATOMS> atoms.")]
  atoms: u64,
  #[arg(long, help = "Encode the send with token <PROTOCOL>, `slp` or `alp`.")]
  protocol: Protocol,
  #[arg(long, help = "Sign the transaction without broadcasting it.")]
  no_broadcast: bool,
}

impl SendToken {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    Ok(Some(Box::new(self.output(&settings)?)))
  }

  fn output(&self, settings: &Settings) -> Result<BuiltOutput> {
    let token_type = match self.protocol {
      Protocol::Slp => TokenType::SLP_FUNGIBLE,
      Protocol::Alp => TokenType::ALP_STANDARD,
    };

    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(self.token_id, self.atoms, self.address.script()).into(),
      ],
      token_actions: vec![TokenAction::Send {
        token_id: self.token_id,
        token_type,
      }],
      dust_sats: Some(settings.dust_sats()?),
      fee_per_kb: Some(settings.fee_per_kb()?),
      ..default()
    };

    build_and_broadcast(settings, action, self.no_broadcast)
  }
}
