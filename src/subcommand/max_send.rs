use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub sats: u64,
}

pub(crate) fn run(settings: Settings) -> SubcommandResult {
  Ok(Some(Box::new(output(&settings)?)))
}

fn output(settings: &Settings) -> Result<Output> {
  let (wallet, _) = synced_wallet(settings, &Runtime::new()?)?;

  Ok(Output {
    sats: wallet.max_send_sats(&[], settings.fee_per_kb()?).to_sat(),
  })
}
