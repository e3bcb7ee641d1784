use super::*;

fn header(token_type: SlpTokenType, tx_type: &[u8]) -> Vec<u8> {
  let mut script = vec![OP_RETURN.to_u8()];
  push_bytes(&mut script, SLP_LOKAD_ID, true);
  push_bytes(&mut script, &[token_type.number()], true);
  push_bytes(&mut script, tx_type, true);
  script
}

fn push_atoms(script: &mut Vec<u8>, atoms: u64) {
  push_bytes(script, &atoms.to_be_bytes(), true);
}

fn push_mint_baton(script: &mut Vec<u8>, mint_baton_out_idx: Option<u8>) {
  match mint_baton_out_idx {
    Some(out_idx) => push_bytes(script, &[out_idx], true),
    None => push_bytes(script, &[], true),
  }
}

pub fn slp_genesis(
  token_type: SlpTokenType,
  genesis_info: &GenesisInfo,
  initial_atoms: u64,
  mint_baton_out_idx: Option<u8>,
) -> Result<ScriptBuf> {
  let mut script = header(token_type, b"GENESIS");

  push_bytes(&mut script, genesis_info.ticker_bytes(), true);
  push_bytes(&mut script, genesis_info.name_bytes(), true);
  push_bytes(&mut script, genesis_info.url_bytes(), true);
  push_bytes(
    &mut script,
    genesis_info.hash.as_ref().map(<[u8; 32]>::as_slice).unwrap_or_default(),
    true,
  );
  push_bytes(&mut script, &[genesis_info.decimals.unwrap_or(0)], true);

  match token_type {
    SlpTokenType::MintVault => {
      if mint_baton_out_idx.is_some() {
        return Err(Error::UnexpectedMintBaton(token_type));
      }

      let scripthash = genesis_info
        .mint_vault_scripthash
        .ok_or(Error::MissingMintVaultScripthash(token_type))?;

      push_bytes(&mut script, &scripthash, true);
    }
    SlpTokenType::Nft1Child => {
      if mint_baton_out_idx.is_some() {
        return Err(Error::UnexpectedMintBaton(token_type));
      }

      push_mint_baton(&mut script, None);
    }
    SlpTokenType::Fungible | SlpTokenType::Nft1Group => {
      push_mint_baton(&mut script, mint_baton_out_idx);
    }
  }

  push_atoms(&mut script, initial_atoms);

  Ok(ScriptBuf::from_bytes(script))
}

pub fn slp_mint(
  token_id: TokenId,
  token_type: SlpTokenType,
  additional_atoms: u64,
  mint_baton_out_idx: Option<u8>,
) -> Result<ScriptBuf> {
  if matches!(token_type, SlpTokenType::MintVault | SlpTokenType::Nft1Child) {
    return Err(Error::UnsupportedMint(token_type));
  }

  let mut script = header(token_type, b"MINT");
  push_bytes(&mut script, &token_id.slp_bytes(), true);
  push_mint_baton(&mut script, mint_baton_out_idx);
  push_atoms(&mut script, additional_atoms);

  Ok(ScriptBuf::from_bytes(script))
}

pub fn slp_send(
  token_id: TokenId,
  token_type: SlpTokenType,
  send_atoms: &[u64],
) -> Result<ScriptBuf> {
  if send_atoms.is_empty() {
    return Err(Error::EmptySendAtoms);
  }

  if send_atoms.len() > SLP_MAX_SEND_OUTPUTS {
    return Err(Error::TooManyAmounts {
      max: SLP_MAX_SEND_OUTPUTS,
      count: send_atoms.len(),
    });
  }

  let mut script = header(token_type, b"SEND");
  push_bytes(&mut script, &token_id.slp_bytes(), true);

  for atoms in send_atoms {
    push_atoms(&mut script, *atoms);
  }

  Ok(ScriptBuf::from_bytes(script))
}

pub fn slp_burn(token_id: TokenId, token_type: SlpTokenType, burn_atoms: u64) -> ScriptBuf {
  let mut script = header(token_type, b"BURN");
  push_bytes(&mut script, &token_id.slp_bytes(), true);
  push_atoms(&mut script, burn_atoms);
  ScriptBuf::from_bytes(script)
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  const BUX: &str = "7e7dacd72dcdb14e00a03dd3aff47f019ed51a6f1f4e4f532ae50692f62bc4e5";

  fn bux() -> TokenId {
    BUX.parse().unwrap()
  }

  fn encoded(script: Result<ScriptBuf>) -> String {
    hex::encode(script.unwrap().as_bytes())
  }

  #[test]
  fn mint() {
    assert_eq!(
      encoded(slp_mint(bux(), SlpTokenType::Fungible, 12500, Some(2))),
      format!("6a04534c50000101044d494e5420{BUX}01020800000000000030d4"),
    );
  }

  #[test]
  fn mint_without_baton_pushes_empty() {
    assert_eq!(
      encoded(slp_mint(bux(), SlpTokenType::Fungible, 1, None)),
      format!("6a04534c50000101044d494e5420{BUX}4c00080000000000000001"),
    );
  }

  #[test]
  fn burn() {
    assert_eq!(
      hex::encode(slp_burn(bux(), SlpTokenType::Fungible, 21500000).as_bytes()),
      format!("6a04534c50000101044255524e20{BUX}080000000001481060"),
    );
  }

  #[test]
  fn mint_vault_genesis() {
    let genesis_info = GenesisInfo {
      token_ticker: Some("BUX".into()),
      token_name: Some("Badger Universal Token".into()),
      url: Some("https://bux.digital".into()),
      decimals: Some(4),
      mint_vault_scripthash: Some(
        hex::decode("08d6edf91c7b93d18306d3b8244587e43f11df4b")
          .unwrap()
          .try_into()
          .unwrap(),
      ),
      ..Default::default()
    };

    assert_eq!(
      encoded(slp_genesis(SlpTokenType::MintVault, &genesis_info, 0, None)),
      "6a04534c500001020747454e45534953034255581642616467657220556e6976657273616c20546f6b656e1368747470733a2f2f6275782e6469676974616c4c0001041408d6edf91c7b93d18306d3b8244587e43f11df4b080000000000000000",
    );
  }

  #[test]
  fn fungible_genesis() {
    let genesis_info = GenesisInfo {
      token_ticker: Some("T".into()),
      decimals: Some(0),
      ..Default::default()
    };

    assert_eq!(
      encoded(slp_genesis(SlpTokenType::Fungible, &genesis_info, 100, Some(2))),
      "6a04534c500001010747454e4553495301544c004c004c0001000102080000000000000064",
    );
  }

  #[test]
  fn genesis_errors() {
    assert_eq!(
      slp_genesis(SlpTokenType::MintVault, &GenesisInfo::default(), 0, None),
      Err(Error::MissingMintVaultScripthash(SlpTokenType::MintVault)),
    );
    assert_eq!(
      slp_genesis(SlpTokenType::Nft1Child, &GenesisInfo::default(), 1, Some(2)),
      Err(Error::UnexpectedMintBaton(SlpTokenType::Nft1Child)),
    );
  }

  #[test]
  fn send() {
    assert_eq!(
      encoded(slp_send(bux(), SlpTokenType::Fungible, &[1, 2])),
      format!("6a04534c500001010453454e4420{BUX}080000000000000001080000000000000002"),
    );
  }

  #[test]
  fn send_errors() {
    assert_eq!(
      slp_send(bux(), SlpTokenType::Fungible, &[]),
      Err(Error::EmptySendAtoms),
    );
    assert_eq!(
      slp_send(bux(), SlpTokenType::Fungible, &[1; 20])
        .unwrap_err()
        .to_string(),
      "Cannot use more than 19 amounts, but got 20",
    );
    assert!(slp_send(bux(), SlpTokenType::Fungible, &[1; 19]).is_ok());
  }

  #[test]
  fn unsupported_mint() {
    assert_eq!(
      slp_mint(bux(), SlpTokenType::MintVault, 1, None),
      Err(Error::UnsupportedMint(SlpTokenType::MintVault)),
    );
  }
}
