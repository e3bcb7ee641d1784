//! UTXO selection.
//!
//! Token shortfalls always fail selection. Sats shortfalls fail only under
//! `SatsSelectionStrategy::RequireSats`, since the other strategies leave
//! fees to fuel UTXOs or to a second party.

use super::*;

/// Largest number of distinct partial sums kept while searching for an
/// exact-atoms subset.
const MAX_SUBSET_STATES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SatsSelectionStrategy {
  /// Fail unless selected UTXOs cover the output sats.
  #[default]
  RequireSats,
  /// Return whatever sats are available, reporting the shortfall.
  AttemptSats,
  /// Select no sats-only UTXOs. Used for postage.
  NoSats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectUtxosResult {
  pub success: bool,
  pub utxos: Option<Vec<WalletUtxo>>,
  pub missing_sats: Amount,
  pub missing_tokens: Option<BTreeMap<TokenId, RequiredTokenInputs>>,
  pub errors: Vec<String>,
  pub sats_strategy: SatsSelectionStrategy,
}

#[derive(Debug, PartialEq)]
pub enum Error {
  ExactAtoms(ExactAtomsError),
  RequiredUtxoMissing(OutPoint),
  RequiredUtxosWithBurn,
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::ExactAtoms(err) => write!(f, "{err}"),
      Self::RequiredUtxoMissing(outpoint) => write!(
        f,
        "Required UTXO {}:{} not available in spendable utxos",
        outpoint.txid, outpoint.vout
      ),
      Self::RequiredUtxosWithBurn => {
        write!(f, "ecash-wallet does not support requiredUtxos for SLP burn txs")
      }
    }
  }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, PartialEq)]
pub enum ExactAtomsError {
  ZeroBurn {
    token_id: TokenId,
  },
  NoUtxos {
    token_id: TokenId,
  },
  Insufficient {
    token_id: TokenId,
    burn_atoms: u64,
    available: u128,
  },
  NotFound {
    token_id: TokenId,
    burn_atoms: u64,
  },
}

impl Display for ExactAtomsError {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::ZeroBurn { token_id } => write!(
        f,
        "burnAtoms of 0 specified for {token_id}. burnAtoms must be greater than 0n."
      ),
      Self::NoUtxos { token_id } => {
        write!(f, "Cannot burn {token_id} as no UTXOs are available.")
      }
      Self::Insufficient {
        token_id,
        burn_atoms,
        available,
      } => write!(
        f,
        "burnAtoms of {burn_atoms} specified for {token_id}, but only {available} are available."
      ),
      Self::NotFound {
        token_id,
        burn_atoms,
      } => write!(
        f,
        "Unable to find UTXOs for {token_id} with exactly {burn_atoms} atoms. \
        Create a UTXO with {burn_atoms} atoms to burn without a SEND action."
      ),
    }
  }
}

impl std::error::Error for ExactAtomsError {}

/// Finds UTXOs of `token_id` whose atoms sum to exactly `burn_atoms`.
///
/// Partial sums are tracked in insertion order, so among several exact
/// subsets the one found first while walking `utxos` in order wins.
pub fn token_utxos_with_exact_atoms(
  utxos: &[WalletUtxo],
  token_id: TokenId,
  burn_atoms: u64,
) -> Result<Vec<WalletUtxo>, ExactAtomsError> {
  if burn_atoms == 0 {
    return Err(ExactAtomsError::ZeroBurn { token_id });
  }

  let relevant = utxos
    .iter()
    .filter(|utxo| utxo.token_id() == Some(token_id) && utxo.atoms() > 0 && !utxo.is_mint_baton())
    .collect::<Vec<&WalletUtxo>>();

  if relevant.is_empty() {
    return Err(ExactAtomsError::NoUtxos { token_id });
  }

  let available = relevant
    .iter()
    .map(|utxo| u128::from(utxo.atoms()))
    .sum::<u128>();

  let target = u128::from(burn_atoms);

  if available < target {
    return Err(ExactAtomsError::Insufficient {
      token_id,
      burn_atoms,
      available,
    });
  }

  if available == target {
    return Ok(relevant.into_iter().cloned().collect());
  }

  let mut sums: Vec<(u128, Vec<usize>)> = vec![(0, Vec::new())];
  let mut positions: HashMap<u128, usize> = [(0, 0)].into();

  for (i, utxo) in relevant.iter().enumerate() {
    let atoms = u128::from(utxo.atoms());

    let new_entries = sums
      .iter()
      .filter(|(sum, _)| sum + atoms <= target)
      .map(|(sum, members)| {
        let mut members = members.clone();
        members.push(i);
        (sum + atoms, members)
      })
      .collect::<Vec<(u128, Vec<usize>)>>();

    for (sum, members) in new_entries {
      if sum == target {
        return Ok(members.into_iter().map(|i| relevant[i].clone()).collect());
      }

      if let Some(position) = positions.get(&sum) {
        sums[*position].1 = members;
      } else if sums.len() < MAX_SUBSET_STATES {
        positions.insert(sum, sums.len());
        sums.push((sum, members));
      }
    }
  }

  Err(ExactAtomsError::NotFound {
    token_id,
    burn_atoms,
  })
}

/// The group token input for an NFT1 child genesis: a qty-1 UTXO if one
/// exists, otherwise the UTXO with the most atoms.
pub fn nft_child_genesis_input(
  group_token_id: TokenId,
  utxos: &[WalletUtxo],
) -> Option<&WalletUtxo> {
  let candidates = || {
    utxos
      .iter()
      .filter(move |utxo| utxo.token_id() == Some(group_token_id) && !utxo.is_mint_baton())
  };

  candidates().find(|utxo| utxo.atoms() == 1).or_else(|| {
    candidates()
      .filter(|utxo| utxo.atoms() > 0)
      .fold(None, |best: Option<&WalletUtxo>, utxo| match best {
        Some(best) if best.atoms() >= utxo.atoms() => Some(best),
        _ => Some(utxo),
      })
  })
}

struct Selection {
  required: ActionTotal,
  open: BTreeSet<TokenId>,
  utxos: Vec<WalletUtxo>,
  sats: Amount,
  strategy: SatsSelectionStrategy,
  needs_nft_input: bool,
}

impl Selection {
  fn push(&mut self, utxo: WalletUtxo) {
    self.sats = self.sats.checked_add(utxo.sats).unwrap_or(Amount::MAX);
    self.utxos.push(utxo);
  }

  /// Applies `token` to the open requirements, returning whether it
  /// contributed to one.
  fn credit(&mut self, token: &UtxoToken) -> bool {
    if !self.open.contains(&token.token_id) {
      return false;
    }

    let Some(required) = self.required.tokens.get_mut(&token.token_id) else {
      return false;
    };

    let contributed = if token.is_mint_baton {
      mem::replace(&mut required.needs_mint_baton, false)
    } else if required.atoms > 0 {
      required.atoms = required.atoms.saturating_sub(u128::from(token.atoms));
      true
    } else {
      false
    };

    if required.atoms == 0 && !required.needs_mint_baton {
      self.open.remove(&token.token_id);
    }

    contributed
  }

  fn missing_sats(&self) -> Amount {
    self
      .required
      .sats
      .checked_sub(self.sats)
      .unwrap_or(Amount::ZERO)
  }

  fn is_done(&self) -> bool {
    (self.sats >= self.required.sats || self.strategy == SatsSelectionStrategy::NoSats)
      && self.open.is_empty()
      && !self.needs_nft_input
  }

  fn success(self) -> SelectUtxosResult {
    SelectUtxosResult {
      success: true,
      missing_sats: self.missing_sats(),
      utxos: Some(self.utxos),
      missing_tokens: None,
      errors: Vec::new(),
      sats_strategy: self.strategy,
    }
  }

  fn failure(
    &self,
    missing_tokens: Option<BTreeMap<TokenId, RequiredTokenInputs>>,
    errors: Vec<String>,
  ) -> SelectUtxosResult {
    SelectUtxosResult {
      success: false,
      utxos: None,
      missing_sats: self.missing_sats(),
      missing_tokens,
      errors,
      sats_strategy: self.strategy,
    }
  }
}

/// Selects UTXOs from `spendable_utxos` that fulfill `action`.
///
/// Insufficiency is reported in the result. Only malformed requests, such
/// as a required UTXO that is not spendable, are errors.
pub fn select_utxos(
  action: &Action,
  spendable_utxos: &[WalletUtxo],
  strategy: SatsSelectionStrategy,
) -> Result<SelectUtxosResult, Error> {
  let required = ActionTotal::new(action);

  let exact_burn_ids = required
    .tokens
    .iter()
    .filter(|(_, required)| required.atoms_must_be_exact)
    .map(|(token_id, _)| *token_id)
    .collect::<Vec<TokenId>>();

  if !action.required_utxos.is_empty() && !exact_burn_ids.is_empty() {
    return Err(Error::RequiredUtxosWithBurn);
  }

  let mut candidates = spendable_utxos.to_vec();

  let mut selection = Selection {
    open: required.tokens.keys().copied().collect(),
    required,
    utxos: Vec::new(),
    sats: Amount::ZERO,
    strategy,
    needs_nft_input: false,
  };

  let mut nft_input = None;

  if let Some(group_token_id) = selection.required.group_token_id {
    match nft_child_genesis_input(group_token_id, &candidates) {
      None => selection.needs_nft_input = true,
      Some(utxo) if utxo.atoms() == 1 => nft_input = Some(utxo.outpoint),
      Some(_) => {
        return Ok(selection.failure(
          None,
          vec![format!(
            "NFT1 child genesis requires a qty-1 input of group token {group_token_id}"
          )],
        ))
      }
    }
  }

  for outpoint in &action.required_utxos {
    let position = candidates
      .iter()
      .position(|utxo| utxo.outpoint == *outpoint)
      .ok_or(Error::RequiredUtxoMissing(*outpoint))?;

    let utxo = candidates.remove(position);

    if let Some(token) = utxo.token {
      selection.credit(&token);
    }

    selection.push(utxo);
  }

  if !action.required_utxos.is_empty() && selection.is_done() {
    return Ok(selection.success());
  }

  if let (Some(group_token_id), Some(outpoint)) = (selection.required.group_token_id, nft_input) {
    if nft_child_genesis_input(group_token_id, &selection.utxos).is_none() {
      if let Some(position) = candidates.iter().position(|utxo| utxo.outpoint == outpoint) {
        let utxo = candidates.remove(position);
        selection.push(utxo);
      }
    }

    if selection.is_done() {
      return Ok(selection.success());
    }
  }

  for token_id in exact_burn_ids {
    let burn_atoms = action.burn_atoms(token_id).unwrap_or_default();

    let burn_utxos = match token_utxos_with_exact_atoms(&candidates, token_id, burn_atoms) {
      Ok(burn_utxos) => burn_utxos,
      Err(err @ ExactAtomsError::ZeroBurn { .. }) => return Err(Error::ExactAtoms(err)),
      Err(err) => {
        let mut missing = selection
          .required
          .tokens
          .get(&token_id)
          .cloned()
          .unwrap_or_default();

        missing.error = Some(err.to_string());

        return Ok(selection.failure(Some([(token_id, missing)].into()), vec![err.to_string()]));
      }
    };

    log::debug!(
      "selected {} utxos to burn exactly {burn_atoms} atoms of {token_id}",
      burn_utxos.len()
    );

    candidates.retain(|utxo| {
      !burn_utxos
        .iter()
        .any(|burn_utxo| burn_utxo.outpoint == utxo.outpoint)
    });

    for utxo in burn_utxos {
      selection.push(utxo);
    }

    if let Some(required) = selection.required.tokens.get_mut(&token_id) {
      required.atoms = 0;

      if !required.needs_mint_baton {
        selection.open.remove(&token_id);
      }
    }
  }

  if selection.is_done() {
    return Ok(selection.success());
  }

  for utxo in candidates {
    if let Some(token) = utxo.token {
      if selection.credit(&token) {
        selection.push(utxo);

        if selection.is_done() {
          return Ok(selection.success());
        }
      }

      continue;
    }

    if strategy == SatsSelectionStrategy::NoSats || selection.sats >= selection.required.sats {
      continue;
    }

    selection.push(utxo);

    if selection.is_done() {
      return Ok(selection.success());
    }
  }

  if !selection.open.is_empty() {
    let missing_tokens = selection
      .required
      .tokens
      .iter()
      .filter(|(token_id, _)| selection.open.contains(token_id))
      .map(|(token_id, required)| {
        let error = if required.needs_mint_baton {
          "Missing mint baton".to_string()
        } else {
          format!(
            "Missing {} atom{}",
            required.atoms,
            if required.atoms == 1 { "" } else { "s" }
          )
        };

        (
          *token_id,
          RequiredTokenInputs {
            error: Some(error),
            ..required.clone()
          },
        )
      })
      .collect::<BTreeMap<TokenId, RequiredTokenInputs>>();

    let error = format!(
      "Missing required token utxos: {}",
      missing_tokens
        .iter()
        .map(|(token_id, required)| format!(
          "{token_id} => {}",
          required.error.as_deref().unwrap_or_default()
        ))
        .collect::<Vec<String>>()
        .join(", ")
    );

    return Ok(selection.failure(Some(missing_tokens), vec![error]));
  }

  if selection.needs_nft_input {
    let group_token_id = selection.required.group_token_id;

    let missing_tokens = group_token_id
      .map(|group_token_id| {
        [(
          group_token_id,
          RequiredTokenInputs {
            atoms: 1,
            ..default()
          },
        )]
        .into()
      });

    let error = format!(
      "Missing SLP_TOKEN_TYPE_NFT1_GROUP input for groupTokenId {}",
      group_token_id.map(|id| id.to_string()).unwrap_or_default()
    );

    return Ok(selection.failure(missing_tokens, vec![error]));
  }

  let missing_sats = selection.missing_sats();

  if strategy == SatsSelectionStrategy::RequireSats && missing_sats > Amount::ZERO {
    return Ok(selection.failure(
      None,
      vec![format!(
        "Insufficient sats to complete tx. Need {} additional satoshis to complete this Action.",
        missing_sats.to_sat()
      )],
    ));
  }

  Ok(selection.success())
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn send_action(token_id: TokenId, token_type: TokenType, atoms: u64) -> Action {
    Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id, atoms, p2pkh_script(1)).into(),
      ],
      token_actions: vec![TokenAction::Send {
        token_id,
        token_type,
      }],
      ..default()
    }
  }

  fn burn_action(token_id: TokenId, burn_atoms: u64) -> Action {
    Action {
      outputs: vec![PaymentOutput::Placeholder],
      token_actions: vec![TokenAction::Burn {
        token_id,
        token_type: TokenType::ALP_STANDARD,
        burn_atoms,
      }],
      ..default()
    }
  }

  fn outpoints(result: &SelectUtxosResult) -> Vec<OutPoint> {
    result
      .utxos
      .as_ref()
      .unwrap()
      .iter()
      .map(|utxo| utxo.outpoint)
      .collect()
  }

  #[test]
  fn accumulates_until_sats_are_covered() {
    let action = Action {
      outputs: vec![plain_output(1000, 1)],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[utxo(1, 750), utxo(2, 750), utxo(3, 750)],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(1), outpoint(2)]);
    assert_eq!(result.missing_sats, Amount::ZERO);
    assert!(result.errors.is_empty());
  }

  #[test]
  fn require_sats_fails_on_shortfall() {
    let action = Action {
      outputs: vec![plain_output(3000, 1)],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[utxo(1, 750), utxo(2, 750)],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert_eq!(
      result,
      SelectUtxosResult {
        success: false,
        utxos: None,
        missing_sats: Amount::from_sat(1500),
        missing_tokens: None,
        errors: vec![
          "Insufficient sats to complete tx. Need 1500 additional satoshis to complete this Action."
            .into()
        ],
        sats_strategy: SatsSelectionStrategy::RequireSats,
      }
    );
  }

  #[test]
  fn attempt_sats_returns_partial_selection() {
    let action = Action {
      outputs: vec![plain_output(3000, 1)],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[utxo(1, 750), utxo(2, 750)],
      SatsSelectionStrategy::AttemptSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(1), outpoint(2)]);
    assert_eq!(result.missing_sats, Amount::from_sat(1500));
    assert!(result.errors.is_empty());
  }

  #[test]
  fn token_shortfall_fails_regardless_of_strategy() {
    let action = send_action(token_id(1), TokenType::SLP_FUNGIBLE, 2);

    let result = select_utxos(
      &action,
      &[
        token_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE, 1),
        utxo(2, 10_000),
      ],
      SatsSelectionStrategy::AttemptSats,
    )
    .unwrap();

    assert!(!result.success);
    assert_eq!(result.utxos, None);
    assert_eq!(
      result.missing_tokens,
      Some(
        [(
          token_id(1),
          RequiredTokenInputs {
            atoms: 1,
            error: Some("Missing 1 atom".into()),
            ..default()
          }
        )]
        .into()
      )
    );
    assert_eq!(
      result.errors,
      [format!(
        "Missing required token utxos: {} => Missing 1 atom",
        token_id(1)
      )]
    );
  }

  #[test]
  fn missing_tokens_are_sorted_and_only_open() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id(3), 5, p2pkh_script(1)).into(),
        TokenOutput::new(token_id(2), 5, p2pkh_script(1)).into(),
        TokenOutput::new(token_id(1), 5, p2pkh_script(1)).into(),
      ],
      token_actions: vec![
        TokenAction::Send {
          token_id: token_id(3),
          token_type: TokenType::ALP_STANDARD,
        },
        TokenAction::Send {
          token_id: token_id(2),
          token_type: TokenType::ALP_STANDARD,
        },
        TokenAction::Send {
          token_id: token_id(1),
          token_type: TokenType::ALP_STANDARD,
        },
        TokenAction::Mint {
          token_id: token_id(4),
          token_type: TokenType::ALP_STANDARD,
        },
      ],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[token_utxo(5, token_id(2), TokenType::ALP_STANDARD, 5)],
      SatsSelectionStrategy::NoSats,
    )
    .unwrap();

    assert_eq!(
      result.errors,
      [format!(
        "Missing required token utxos: {} => Missing 5 atoms, {} => Missing 5 atoms, {} => Missing mint baton",
        token_id(1),
        token_id(3),
        token_id(4),
      )]
    );
    assert_eq!(
      result
        .missing_tokens
        .unwrap()
        .into_keys()
        .collect::<Vec<TokenId>>(),
      [token_id(1), token_id(3), token_id(4)]
    );
  }

  #[test]
  fn token_utxos_are_only_taken_when_needed() {
    let action = send_action(token_id(1), TokenType::ALP_STANDARD, 10);

    let result = select_utxos(
      &action,
      &[
        token_utxo(1, token_id(2), TokenType::ALP_STANDARD, 100),
        mint_baton_utxo(2, token_id(1), TokenType::ALP_STANDARD),
        token_utxo(3, token_id(1), TokenType::ALP_STANDARD, 6),
        utxo(4, 10_000),
        token_utxo(5, token_id(1), TokenType::ALP_STANDARD, 6),
        utxo(6, 10_000),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(3), outpoint(5)]);
  }

  #[test]
  fn no_sats_selects_only_token_utxos() {
    let mut action = send_action(token_id(1), TokenType::SLP_FUNGIBLE, 10);
    action.outputs.push(plain_output(1000, 2));

    let result = select_utxos(
      &action,
      &[
        utxo(1, 10_000),
        token_utxo(2, token_id(1), TokenType::SLP_FUNGIBLE, 10),
      ],
      SatsSelectionStrategy::NoSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(2)]);
    assert_eq!(result.missing_sats, Amount::from_sat(1000));
  }

  #[test]
  fn mint_needs_baton() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id(1), 100, p2pkh_script(1)).into(),
      ],
      token_actions: vec![TokenAction::Mint {
        token_id: token_id(1),
        token_type: TokenType::SLP_FUNGIBLE,
      }],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[
        token_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE, 100),
        mint_baton_utxo(2, token_id(1), TokenType::SLP_FUNGIBLE),
        utxo(3, 10_000),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(2)]);

    let result = select_utxos(&action, &[utxo(3, 10_000)], SatsSelectionStrategy::RequireSats).unwrap();

    assert!(!result.success);
    assert_eq!(
      result.errors,
      [format!(
        "Missing required token utxos: {} => Missing mint baton",
        token_id(1)
      )]
    );
  }

  #[test]
  fn required_utxos_come_first() {
    let action = Action {
      outputs: vec![plain_output(1000, 1)],
      required_utxos: vec![outpoint(3)],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[utxo(1, 5000), utxo(2, 5000), utxo(3, 500)],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(3), outpoint(1)]);

    let action = Action {
      outputs: vec![plain_output(1000, 1)],
      required_utxos: vec![outpoint(3), outpoint(2)],
      ..default()
    };

    let result = select_utxos(
      &action,
      &[utxo(1, 5000), utxo(2, 5000), utxo(3, 500)],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert_eq!(outpoints(&result), [outpoint(3), outpoint(2)]);
  }

  #[test]
  fn required_utxo_must_be_spendable() {
    let action = Action {
      outputs: vec![plain_output(1000, 1)],
      required_utxos: vec![outpoint(7)],
      ..default()
    };

    let err = select_utxos(&action, &[utxo(1, 5000)], SatsSelectionStrategy::RequireSats).unwrap_err();

    assert_eq!(err, Error::RequiredUtxoMissing(outpoint(7)));
    assert_eq!(
      err.to_string(),
      format!("Required UTXO {}:7 not available in spendable utxos", txid(7))
    );
  }

  #[test]
  fn required_utxos_with_exact_burn() {
    let mut action = burn_action(token_id(1), 5);
    action.required_utxos = vec![outpoint(1)];

    assert_eq!(
      select_utxos(&action, &[utxo(1, 5000)], SatsSelectionStrategy::RequireSats).unwrap_err(),
      Error::RequiredUtxosWithBurn,
    );
  }

  #[test]
  fn exact_atoms_subset() {
    let utxos = [
      token_utxo(1, token_id(1), TokenType::ALP_STANDARD, 3),
      token_utxo(2, token_id(1), TokenType::ALP_STANDARD, 5),
      token_utxo(3, token_id(2), TokenType::ALP_STANDARD, 4),
      token_utxo(4, token_id(1), TokenType::ALP_STANDARD, 7),
    ];

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 12)
        .unwrap()
        .iter()
        .map(|utxo| utxo.outpoint)
        .collect::<Vec<OutPoint>>(),
      [outpoint(2), outpoint(4)]
    );

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 15)
        .unwrap()
        .len(),
      3
    );

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 3)
        .unwrap()
        .iter()
        .map(|utxo| utxo.outpoint)
        .collect::<Vec<OutPoint>>(),
      [outpoint(1)]
    );
  }

  #[test]
  fn exact_atoms_errors() {
    let utxos = [
      token_utxo(1, token_id(1), TokenType::ALP_STANDARD, 3),
      token_utxo(2, token_id(1), TokenType::ALP_STANDARD, 5),
      mint_baton_utxo(3, token_id(1), TokenType::ALP_STANDARD),
    ];

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 0)
        .unwrap_err()
        .to_string(),
      format!(
        "burnAtoms of 0 specified for {}. burnAtoms must be greater than 0n.",
        token_id(1)
      )
    );

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(2), 1)
        .unwrap_err()
        .to_string(),
      format!("Cannot burn {} as no UTXOs are available.", token_id(2))
    );

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 9)
        .unwrap_err()
        .to_string(),
      format!(
        "burnAtoms of 9 specified for {}, but only 8 are available.",
        token_id(1)
      )
    );

    assert_eq!(
      token_utxos_with_exact_atoms(&utxos, token_id(1), 4)
        .unwrap_err()
        .to_string(),
      format!(
        "Unable to find UTXOs for {0} with exactly 4 atoms. \
        Create a UTXO with 4 atoms to burn without a SEND action.",
        token_id(1)
      )
    );
  }

  #[test]
  fn exact_burn_selection() {
    let action = burn_action(token_id(1), 8);

    let result = select_utxos(
      &action,
      &[
        token_utxo(1, token_id(1), TokenType::ALP_STANDARD, 3),
        token_utxo(2, token_id(1), TokenType::ALP_STANDARD, 4),
        token_utxo(3, token_id(1), TokenType::ALP_STANDARD, 5),
        utxo(4, 10_000),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(
      outpoints(&result),
      [outpoint(1), outpoint(3)]
    );
  }

  #[test]
  fn exact_burn_failure_is_a_result() {
    let action = burn_action(token_id(1), 4);

    let result = select_utxos(
      &action,
      &[
        token_utxo(1, token_id(1), TokenType::ALP_STANDARD, 3),
        token_utxo(2, token_id(1), TokenType::ALP_STANDARD, 5),
        utxo(3, 10_000),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(!result.success);
    assert_matches!(
      result.errors.as_slice(),
      [error] if error.starts_with("Unable to find UTXOs")
    );

    assert_eq!(
      select_utxos(
        &burn_action(token_id(1), 0),
        &[utxo(3, 10_000)],
        SatsSelectionStrategy::RequireSats
      )
      .unwrap_err(),
      Error::ExactAtoms(ExactAtomsError::ZeroBurn {
        token_id: token_id(1)
      }),
    );
  }

  fn nft_child_genesis_action() -> Action {
    Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::genesis(1, p2pkh_script(1)).into(),
      ],
      token_actions: vec![TokenAction::Genesis {
        token_type: TokenType::SLP_NFT1_CHILD,
        genesis_info: default(),
        group_token_id: Some(token_id(9)),
      }],
      ..default()
    }
  }

  #[test]
  fn nft_child_genesis_input_preference() {
    let utxos = [
      token_utxo(1, token_id(9), TokenType::SLP_NFT1_GROUP, 5),
      token_utxo(2, token_id(9), TokenType::SLP_NFT1_GROUP, 9),
      token_utxo(3, token_id(9), TokenType::SLP_NFT1_GROUP, 1),
    ];

    assert_eq!(
      nft_child_genesis_input(token_id(9), &utxos).unwrap().outpoint,
      outpoint(3)
    );
    assert_eq!(
      nft_child_genesis_input(token_id(9), &utxos[..2]).unwrap().outpoint,
      outpoint(2)
    );
    assert_eq!(nft_child_genesis_input(token_id(8), &utxos), None);
  }

  #[test]
  fn nft_child_genesis_selects_group_input() {
    let result = select_utxos(
      &nft_child_genesis_action(),
      &[
        utxo(1, 10_000),
        token_utxo(2, token_id(9), TokenType::SLP_NFT1_GROUP, 1),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(result.success);
    assert_eq!(outpoints(&result), [outpoint(2)]);
  }

  #[test]
  fn nft_child_genesis_needs_qty_one_input() {
    let result = select_utxos(
      &nft_child_genesis_action(),
      &[
        utxo(1, 10_000),
        token_utxo(2, token_id(9), TokenType::SLP_NFT1_GROUP, 2),
      ],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(!result.success);
    assert_eq!(
      result.errors,
      [format!(
        "NFT1 child genesis requires a qty-1 input of group token {}",
        token_id(9)
      )]
    );

    let result = select_utxos(
      &nft_child_genesis_action(),
      &[utxo(1, 10_000)],
      SatsSelectionStrategy::RequireSats,
    )
    .unwrap();

    assert!(!result.success);
    assert_eq!(
      result.errors,
      [format!(
        "Missing SLP_TOKEN_TYPE_NFT1_GROUP input for groupTokenId {}",
        token_id(9)
      )]
    );
    assert_eq!(
      result.missing_tokens.unwrap()[&token_id(9)].atoms,
      1
    );
  }
}
