use super::*;

#[derive(Default)]
struct Layout {
  /// Highest outIdx each token's atoms array must cover.
  last_atoms_out_idx: BTreeMap<TokenRef, usize>,
  num_batons: BTreeMap<TokenRef, u8>,
}

fn layout(tx: &TokenTx) -> Result<Layout, Error> {
  let mut layout = Layout::default();
  let mut last_baton = None;

  for (out_idx, output) in tx.outputs.iter().enumerate() {
    let Some(output) = output.token() else {
      last_baton = None;
      continue;
    };

    if out_idx > ALP_POLICY_MAX_OUTPUTS {
      return Err(Error::TokenOutputOutOfRange {
        token_type: tx.token_type,
        max: ALP_POLICY_MAX_OUTPUTS,
        out_idx,
      });
    }

    if tx.is_send_output(output) {
      layout.last_atoms_out_idx.insert(output.token, out_idx);
    }

    if output.is_mint_baton {
      match layout.num_batons.get_mut(&output.token) {
        None => {
          layout
            .last_atoms_out_idx
            .insert(output.token, out_idx.saturating_sub(1));
          layout.num_batons.insert(output.token, 1);
        }
        Some(num_batons) => {
          if last_baton != Some(output.token) {
            return Err(Error::NonConsecutiveMintBatons {
              token: output.token,
              out_idx,
            });
          }

          *num_batons = num_batons.saturating_add(1);
        }
      }

      last_baton = Some(output.token);
      continue;
    }

    if tx.is_mint_qty_output(output) {
      if layout.num_batons.contains_key(&output.token) {
        return Err(Error::MintQtyAfterBaton {
          token: output.token,
          out_idx,
        });
      }

      layout.last_atoms_out_idx.insert(output.token, out_idx);
    }

    last_baton = None;
  }

  Ok(layout)
}

fn atoms_array(outputs: &[PaymentOutput], token: TokenRef, last_out_idx: usize) -> Vec<u64> {
  (1..=last_out_idx)
    .map(|out_idx| {
      outputs
        .get(out_idx)
        .and_then(PaymentOutput::token)
        .filter(|output| output.token == token)
        .map(|output| output.atoms)
        .unwrap_or_default()
    })
    .collect()
}

/// Builds the eMPP `OP_RETURN` carrying one ALP push per token action, in
/// action order.
pub(super) fn op_return(tx: &TokenTx, token_type: AlpTokenType) -> Result<ScriptBuf, Error> {
  let layout = layout(tx)?;

  let mint_data = |token: TokenRef| ecash_tokens::AlpMintData {
    atoms_array: layout
      .last_atoms_out_idx
      .get(&token)
      .map(|last| atoms_array(tx.outputs, token, *last))
      .unwrap_or_default(),
    num_batons: layout.num_batons.get(&token).copied().unwrap_or_default(),
  };

  let mut pushes = Vec::with_capacity(tx.action.token_actions.len());

  for action in &tx.action.token_actions {
    let push = match action {
      TokenAction::Genesis { genesis_info, .. } => {
        ecash_tokens::alp_genesis(token_type, genesis_info, &mint_data(TokenRef::Genesis))?
      }
      TokenAction::Send { token_id, .. } => ecash_tokens::alp_send(
        *token_id,
        token_type,
        &mint_data(TokenRef::Id(*token_id)).atoms_array,
      )?,
      TokenAction::Mint { token_id, .. } => {
        ecash_tokens::alp_mint(*token_id, token_type, &mint_data(TokenRef::Id(*token_id)))?
      }
      TokenAction::Burn {
        token_id,
        burn_atoms,
        ..
      } => ecash_tokens::alp_burn(*token_id, token_type, *burn_atoms)?,
      TokenAction::Data { data } => data.clone(),
    };

    pushes.push(push);
  }

  let script = ecash_tokens::empp_script(&pushes)?;

  if script.len() > OP_RETURN_MAX_BYTES {
    return Err(Error::OpReturnTooLarge { size: script.len() });
  }

  Ok(script)
}
