use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub address: CashAddress,
  pub sats: u64,
  pub spendable_sats: u64,
  pub tokens: BTreeMap<TokenId, u128>,
  pub utxos: usize,
}

pub(crate) fn run(settings: Settings) -> SubcommandResult {
  Ok(Some(Box::new(output(&settings)?)))
}

fn output(settings: &Settings) -> Result<Output> {
  let (wallet, _) = synced_wallet(settings, &Runtime::new()?)?;

  let spendable_sats = wallet
    .spendable_sats_only_utxos()
    .iter()
    .map(|utxo| utxo.sats.to_sat())
    .sum();

  let mut tokens = BTreeMap::new();

  for token in wallet.utxos().iter().filter_map(|utxo| utxo.token) {
    if !token.is_mint_baton {
      *tokens.entry(token.token_id).or_default() += u128::from(token.atoms);
    }
  }

  Ok(Output {
    address: wallet.address().clone(),
    sats: wallet.balance_sats().to_sat(),
    spendable_sats,
    tokens,
    utxos: wallet.utxos().len(),
  })
}
