use super::*;

/// Atoms and mint batons created by an ALP GENESIS or MINT.
///
/// Output `i + 1` receives `atoms_array[i]`, and the `num_batons` outputs
/// after the last atoms output receive mint batons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlpMintData {
  pub atoms_array: Vec<u64>,
  pub num_batons: u8,
}

fn header(token_type: AlpTokenType, tx_type: &[u8]) -> Vec<u8> {
  let mut payload = ALP_LOKAD_ID.to_vec();
  payload.push(token_type.number());
  write_bytes(&mut payload, tx_type);
  payload
}

fn write_bytes(payload: &mut Vec<u8>, bytes: &[u8]) {
  write_size(payload, bytes.len());
  payload.extend_from_slice(bytes);
}

fn write_atoms(payload: &mut Vec<u8>, atoms: u64) -> Result {
  if atoms > ALP_MAX_ATOMS {
    return Err(Error::AtomsOutOfRange(atoms));
  }

  payload.extend_from_slice(&atoms.to_le_bytes()[..6]);

  Ok(())
}

fn write_atoms_array(payload: &mut Vec<u8>, atoms_array: &[u64]) -> Result {
  write_size(payload, atoms_array.len());

  for atoms in atoms_array {
    write_atoms(payload, *atoms)?;
  }

  Ok(())
}

fn write_mint_data(payload: &mut Vec<u8>, mint_data: &AlpMintData) -> Result {
  write_atoms_array(payload, &mint_data.atoms_array)?;
  payload.push(mint_data.num_batons);
  Ok(())
}

pub fn alp_genesis(
  token_type: AlpTokenType,
  genesis_info: &GenesisInfo,
  mint_data: &AlpMintData,
) -> Result<Vec<u8>> {
  let mut payload = header(token_type, b"GENESIS");

  write_bytes(&mut payload, genesis_info.ticker_bytes());
  write_bytes(&mut payload, genesis_info.name_bytes());
  write_bytes(&mut payload, genesis_info.url_bytes());
  write_bytes(
    &mut payload,
    genesis_info.data.as_deref().unwrap_or_default(),
  );
  write_bytes(
    &mut payload,
    genesis_info.auth_pubkey.as_deref().unwrap_or_default(),
  );
  payload.push(genesis_info.decimals.unwrap_or(0));
  write_mint_data(&mut payload, mint_data)?;

  Ok(payload)
}

pub fn alp_mint(
  token_id: TokenId,
  token_type: AlpTokenType,
  mint_data: &AlpMintData,
) -> Result<Vec<u8>> {
  let mut payload = header(token_type, b"MINT");
  payload.extend_from_slice(&token_id.alp_bytes());
  write_mint_data(&mut payload, mint_data)?;
  Ok(payload)
}

pub fn alp_send(
  token_id: TokenId,
  token_type: AlpTokenType,
  send_atoms: &[u64],
) -> Result<Vec<u8>> {
  let mut payload = header(token_type, b"SEND");
  payload.extend_from_slice(&token_id.alp_bytes());
  write_atoms_array(&mut payload, send_atoms)?;
  Ok(payload)
}

pub fn alp_burn(token_id: TokenId, token_type: AlpTokenType, burn_atoms: u64) -> Result<Vec<u8>> {
  let mut payload = header(token_type, b"BURN");
  payload.extend_from_slice(&token_id.alp_bytes());
  write_atoms(&mut payload, burn_atoms)?;
  Ok(payload)
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn crd() -> TokenId {
    "cdcdcdcdcdc9dda4c92bb1145aa84945c024346ea66fd4b699e344e45df2e145"
      .parse()
      .unwrap()
  }

  #[test]
  fn genesis() {
    let genesis_info = GenesisInfo {
      token_ticker: Some("CRD".into()),
      token_name: Some("Credo In Unum Deo".into()),
      url: Some("https://crd.network/token".into()),
      data: Some(Vec::new()),
      auth_pubkey: Some(
        hex::decode("0334b744e6338ad438c92900c0ed1869c3fd2c0f35a4a9b97a88447b6e2b145f10").unwrap(),
      ),
      decimals: Some(4),
      ..Default::default()
    };

    let payload = alp_genesis(
      AlpTokenType::Standard,
      &genesis_info,
      &AlpMintData {
        atoms_array: Vec::new(),
        num_batons: 1,
      },
    )
    .unwrap();

    assert_eq!(
      hex::encode(payload),
      "534c5032000747454e455349530343524411437265646f20496e20556e756d2044656f1968747470733a2f2f6372642e6e6574776f726b2f746f6b656e00210334b744e6338ad438c92900c0ed1869c3fd2c0f35a4a9b97a88447b6e2b145f10040001",
    );
  }

  #[test]
  fn mint() {
    let payload = alp_mint(
      crd(),
      AlpTokenType::Standard,
      &AlpMintData {
        atoms_array: Vec::new(),
        num_batons: 127,
      },
    )
    .unwrap();

    assert_eq!(
      hex::encode(payload),
      "534c503200044d494e5445e1f25de444e399b6d46fa66e3424c04549a85a14b12bc9a4ddc9cdcdcdcdcd007f",
    );
  }

  #[test]
  fn send() {
    assert_eq!(
      hex::encode(alp_send(crd(), AlpTokenType::Standard, &[1000, 298900, 100]).unwrap()),
      "534c5032000453454e4445e1f25de444e399b6d46fa66e3424c04549a85a14b12bc9a4ddc9cdcdcdcdcd03e80300000000948f04000000640000000000",
    );
  }

  #[test]
  fn burn() {
    assert_eq!(
      hex::encode(alp_burn(crd(), AlpTokenType::Standard, 50491793).unwrap()),
      "534c503200044255524e45e1f25de444e399b6d46fa66e3424c04549a85a14b12bc9a4ddc9cdcdcdcdcd917102030000",
    );
  }

  #[test]
  fn atoms_out_of_range() {
    assert_eq!(
      alp_send(crd(), AlpTokenType::Standard, &[ALP_MAX_ATOMS + 1]),
      Err(Error::AtomsOutOfRange(ALP_MAX_ATOMS + 1)),
    );
    assert!(alp_burn(crd(), AlpTokenType::Standard, ALP_MAX_ATOMS).is_ok());
  }
}
