use super::*;

fn validate(tx: &TokenTx, output_token_ids: &BTreeSet<TokenId>) -> Result<(), Error> {
  let token_type = tx.token_type;

  if output_token_ids.len() > 1 {
    return Err(Error::SlpMultipleTokenIds {
      token_type,
      count: output_token_ids.len(),
    });
  }

  if tx.genesis().is_some() && !output_token_ids.is_empty() {
    return Err(Error::SlpGenesisWithTokenIds { token_type });
  }

  if !tx.send_ids.is_empty() && !tx.mint_ids.is_empty() {
    return Err(Error::SlpSendWithMint { token_type });
  }

  let minting = tx.genesis().is_some() || !tx.mint_ids.is_empty();

  // outIdx 1 must hold the mint quantity of a GENESIS or MINT
  if minting
    && !tx
      .outputs
      .get(1)
      .and_then(PaymentOutput::token)
      .is_some_and(|output| tx.is_mint_qty_output(output))
  {
    return Err(Error::MissingMintQty {
      token_type,
      genesis: tx.genesis().is_some(),
    });
  }

  let kind = tx.mint_kind();
  let mut has_mint_baton = false;

  for (out_idx, output) in tx.outputs.iter().enumerate() {
    let Some(output) = output.token() else {
      continue;
    };

    if out_idx > SLP_MAX_SEND_OUTPUTS {
      return Err(Error::TokenOutputOutOfRange {
        token_type,
        max: SLP_MAX_SEND_OUTPUTS,
        out_idx,
      });
    }

    if minting && out_idx == 1 {
      continue;
    }

    if output.is_mint_baton {
      if has_mint_baton {
        return Err(Error::SecondMintBaton {
          token_type,
          kind,
          out_idx,
        });
      }

      if !(2..=255).contains(&out_idx) {
        return Err(Error::MintBatonOutOfRange {
          token_type,
          kind,
          out_idx,
        });
      }

      has_mint_baton = true;
      continue;
    }

    if tx.is_mint_qty_output(output) {
      return Err(Error::ExtraMintQty {
        token_type,
        kind,
        out_idx,
      });
    }
  }

  Ok(())
}

/// Builds the SLP `OP_RETURN` for a validated single-action SLP tx.
pub(super) fn op_return(
  tx: &TokenTx,
  token_type: SlpTokenType,
  output_token_ids: &BTreeSet<TokenId>,
) -> Result<ScriptBuf, Error> {
  validate(tx, output_token_ids)?;

  let last_send_idx = tx
    .outputs
    .iter()
    .enumerate()
    .filter(|(_, output)| {
      output
        .token()
        .is_some_and(|output| tx.is_send_output(output))
    })
    .map(|(out_idx, _)| out_idx)
    .last();

  let mut mint_qty = None;
  let mut mint_baton_out_idx = None;
  let mut send_atoms = Vec::new();

  for (out_idx, output) in tx.outputs.iter().enumerate().skip(1) {
    let token = output.token();

    if let Some(token) = token {
      if tx.is_mint_qty_output(token) {
        mint_qty = Some(token.atoms);
      }

      if token.is_mint_baton {
        mint_baton_out_idx = Some(u8::try_from(out_idx).map_err(|_| {
          Error::MintBatonOutOfRange {
            token_type: tx.token_type,
            kind: tx.mint_kind(),
            out_idx,
          }
        })?);
      }
    }

    if last_send_idx.is_some_and(|last| out_idx <= last) {
      send_atoms.push(
        token
          .filter(|token| tx.is_send_output(token))
          .map(|token| token.atoms)
          .unwrap_or_default(),
      );
    }
  }

  let Some(first_action) = tx.action.token_actions.first() else {
    return Err(Error::MissingOpReturnPlaceholder);
  };

  let script = match (mint_qty, first_action) {
    (Some(atoms), TokenAction::Genesis { genesis_info, .. }) => {
      if token_type == SlpTokenType::Nft1Child && atoms != 1 {
        return Err(Error::Nft1ChildGenesisAtoms { atoms });
      }

      ecash_tokens::slp_genesis(token_type, genesis_info, atoms, mint_baton_out_idx)?
    }
    (Some(atoms), TokenAction::Mint { token_id, .. }) => {
      ecash_tokens::slp_mint(*token_id, token_type, atoms, mint_baton_out_idx)?
    }
    (
      _,
      TokenAction::Burn {
        token_id,
        burn_atoms,
        ..
      },
    ) => ecash_tokens::slp_burn(*token_id, token_type, *burn_atoms),
    (_, action) => {
      let token_id = action
        .token_id()
        .ok_or(Error::MissingMintQty {
          token_type: tx.token_type,
          genesis: tx.genesis().is_some(),
        })?;

      ecash_tokens::slp_send(token_id, token_type, &send_atoms)?
    }
  };

  Ok(script)
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn genesis(token_type: TokenType) -> TokenAction {
    TokenAction::Genesis {
      token_type,
      genesis_info: GenesisInfo {
        token_ticker: Some("TST".into()),
        ..default()
      },
      group_token_id: (token_type == TokenType::SLP_NFT1_CHILD).then(|| token_id(7)),
    }
  }

  fn finalize(action: &Action, selected: &[WalletUtxo]) -> Result<FinalizedOutputs, Error> {
    finalize_outputs(action, selected, || Ok::<ScriptBuf, Error>(p2pkh_script(9)))
  }

  fn op_return_of(finalized: &FinalizedOutputs) -> ScriptBuf {
    finalized.tx_outputs[0].script_pubkey.clone()
  }

  #[test]
  fn genesis_with_mint_baton() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::genesis(1000, p2pkh_script(1)).into(),
        TokenOutput::mint_baton(TokenRef::Genesis, p2pkh_script(1)).into(),
      ],
      token_actions: vec![genesis(TokenType::SLP_FUNGIBLE)],
      ..default()
    };

    let finalized = finalize(&action, &[]).unwrap();

    let expected = ecash_tokens::slp_genesis(
      SlpTokenType::Fungible,
      &GenesisInfo {
        token_ticker: Some("TST".into()),
        ..default()
      },
      1000,
      Some(2),
    )
    .unwrap();

    assert_eq!(op_return_of(&finalized), expected);
    assert_eq!(finalized.tx_outputs.len(), 3);
  }

  #[test]
  fn genesis_requires_qty_at_one() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        plain_output(1000, 1),
        TokenOutput::genesis(1000, p2pkh_script(1)).into(),
      ],
      token_actions: vec![genesis(TokenType::SLP_FUNGIBLE)],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err().to_string(),
      "Genesis action for SLP_TOKEN_TYPE_FUNGIBLE token specified, but no mint quantity output \
      found at outIdx 1. This is a spec requirement for SLP SLP_TOKEN_TYPE_FUNGIBLE tokens."
    );

    let action = Action {
      outputs: vec![PaymentOutput::Placeholder],
      token_actions: vec![genesis(TokenType::SLP_FUNGIBLE)],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err(),
      Error::MissingMintQty {
        token_type: TokenType::SLP_FUNGIBLE,
        genesis: true,
      }
    );
  }

  #[test]
  fn mint_baton_rules() {
    let baton = || PaymentOutput::from(TokenOutput::mint_baton(TokenRef::Genesis, p2pkh_script(1)));

    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::genesis(1000, p2pkh_script(1)).into(),
        baton(),
        baton(),
      ],
      token_actions: vec![genesis(TokenType::SLP_FUNGIBLE)],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err().to_string(),
      "An SLP_TOKEN_TYPE_FUNGIBLE GENESIS tx may only specify exactly 1 mint baton. \
      Found second mint baton at outIdx 3."
    );

    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::genesis(1000, p2pkh_script(1)).into(),
        TokenOutput::genesis(1000, p2pkh_script(1)).into(),
      ],
      token_actions: vec![genesis(TokenType::SLP_FUNGIBLE)],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err().to_string(),
      "An SLP_TOKEN_TYPE_FUNGIBLE GENESIS tx may have only one mint qty output and it must be \
      at outIdx 1. Found another mint qty output at outIdx 2."
    );
  }

  #[test]
  fn mint_with_baton() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id(1), 50, p2pkh_script(1)).into(),
        TokenOutput::mint_baton(TokenRef::Id(token_id(1)), p2pkh_script(1)).into(),
      ],
      token_actions: vec![TokenAction::Mint {
        token_id: token_id(1),
        token_type: TokenType::SLP_FUNGIBLE,
      }],
      ..default()
    };

    let finalized = finalize(
      &action,
      &[mint_baton_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE)],
    )
    .unwrap();

    assert_eq!(
      op_return_of(&finalized),
      ecash_tokens::slp_mint(token_id(1), SlpTokenType::Fungible, 50, Some(2)).unwrap()
    );
  }

  #[test]
  fn send_pads_skipped_outputs_with_zero() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id(1), 3, p2pkh_script(1)).into(),
        plain_output(1000, 2),
        TokenOutput::new(token_id(1), 4, p2pkh_script(3)).into(),
      ],
      token_actions: vec![TokenAction::Send {
        token_id: token_id(1),
        token_type: TokenType::SLP_FUNGIBLE,
      }],
      ..default()
    };

    let finalized = finalize(
      &action,
      &[token_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE, 10)],
    )
    .unwrap();

    assert_eq!(finalized.payment_outputs.len(), 5);
    assert_eq!(
      op_return_of(&finalized),
      ecash_tokens::slp_send(token_id(1), SlpTokenType::Fungible, &[3, 0, 4, 3]).unwrap()
    );
  }

  #[test]
  fn burn_without_outputs() {
    let action = Action {
      outputs: vec![PaymentOutput::Placeholder, plain_output(1000, 1)],
      token_actions: vec![TokenAction::Burn {
        token_id: token_id(1),
        token_type: TokenType::SLP_FUNGIBLE,
        burn_atoms: 10,
      }],
      ..default()
    };

    let finalized = finalize(
      &action,
      &[token_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE, 10)],
    )
    .unwrap();

    assert_eq!(
      op_return_of(&finalized),
      ecash_tokens::slp_burn(token_id(1), SlpTokenType::Fungible, 10)
    );

    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::new(token_id(1), 1, p2pkh_script(1)).into(),
      ],
      ..action
    };

    assert_eq!(finalize(&action, &[]).unwrap_err(), Error::SlpBurnWithOutputs);
  }

  #[test]
  fn single_action_only() {
    let action = Action {
      outputs: vec![PaymentOutput::Placeholder],
      token_actions: vec![
        TokenAction::Send {
          token_id: token_id(1),
          token_type: TokenType::SLP_FUNGIBLE,
        },
        TokenAction::Burn {
          token_id: token_id(1),
          token_type: TokenType::SLP_FUNGIBLE,
          burn_atoms: 1,
        },
      ],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err().to_string(),
      "SLP_TOKEN_TYPE_FUNGIBLE token txs may only have a single token action. \
      2 tokenActions specified."
    );
  }

  #[test]
  fn token_outputs_past_nineteen() {
    let mut outputs = vec![PaymentOutput::Placeholder];
    outputs.extend((0..20).map(|_| TokenOutput::new(token_id(1), 1, p2pkh_script(1)).into()));

    let action = Action {
      outputs,
      token_actions: vec![TokenAction::Send {
        token_id: token_id(1),
        token_type: TokenType::SLP_FUNGIBLE,
      }],
      ..default()
    };

    assert_eq!(
      finalize(
        &action,
        &[token_utxo(1, token_id(1), TokenType::SLP_FUNGIBLE, 20)]
      )
      .unwrap_err()
      .to_string(),
      "An SLP SLP_TOKEN_TYPE_FUNGIBLE Action may not have more than 19 token outputs, \
      and no outputs may be at outIdx > 19. Found output at outIdx 20."
    );
  }

  #[test]
  fn nft1_child_genesis_qty() {
    let action = Action {
      outputs: vec![
        PaymentOutput::Placeholder,
        TokenOutput::genesis(2, p2pkh_script(1)).into(),
      ],
      token_actions: vec![genesis(TokenType::SLP_NFT1_CHILD)],
      ..default()
    };

    assert_eq!(
      finalize(&action, &[]).unwrap_err().to_string(),
      "An SLP_TOKEN_TYPE_NFT1_CHILD GENESIS tx must have 1 atom at outIdx 1. Found 2 atoms."
    );

    let mut action = action;
    action.outputs[1] = TokenOutput::genesis(1, p2pkh_script(1)).into();

    assert!(finalize(&action, &[]).is_ok());
  }
}
