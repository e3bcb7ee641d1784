use super::*;

/// An `Action` with UTXOs selected from a wallet, ready to be built.
pub struct WalletAction<'a> {
  wallet: &'a mut Wallet,
  pub action: Action,
  pub action_total: ActionTotal,
  pub select_utxos_result: SelectUtxosResult,
}

/// An ALP token burned without a SEND and without a UTXO subset of exactly
/// the burn amount gets a SEND, so the remainder comes back as change.
fn infer_alp_burn_sends(mut action: Action, spendable_utxos: &[WalletUtxo]) -> Result<Action> {
  let send_ids = action.send_token_ids();

  let burns = action
    .token_actions
    .iter()
    .filter_map(|token_action| match token_action {
      TokenAction::Burn {
        token_id,
        token_type,
        burn_atoms,
      } if token_type.protocol() == Protocol::Alp && !send_ids.contains(token_id) => {
        Some((*token_id, *token_type, *burn_atoms))
      }
      _ => None,
    })
    .collect::<Vec<(TokenId, TokenType, u64)>>();

  for (token_id, token_type, burn_atoms) in burns {
    match selector::token_utxos_with_exact_atoms(spendable_utxos, token_id, burn_atoms) {
      Ok(_) => {}
      Err(selector::ExactAtomsError::NotFound { .. }) => {
        log::debug!("adding SEND to burn of {token_id} for atom change");

        action.token_actions.push(TokenAction::Send {
          token_id,
          token_type,
        });
      }
      Err(err) => return Err(selector::Error::ExactAtoms(err).into()),
    }
  }

  Ok(action)
}

fn selection_error(result: &SelectUtxosResult) -> Error {
  if result.errors.is_empty() {
    Error::InsufficientSats {
      missing_sats: result.missing_sats,
    }
  } else {
    Error::Selection {
      errors: result.errors.clone(),
    }
  }
}

impl<'a> WalletAction<'a> {
  pub(crate) fn new(
    wallet: &'a mut Wallet,
    action: Action,
    strategy: SatsSelectionStrategy,
  ) -> Result<Self> {
    let spendable_utxos = wallet.spendable_utxos();

    let action = infer_alp_burn_sends(action, &spendable_utxos)?;

    let select_utxos_result = selector::select_utxos(&action, &spendable_utxos, strategy)?;

    log::debug!(
      "selected {} utxos for action, success: {}",
      select_utxos_result
        .utxos
        .as_ref()
        .map(Vec::len)
        .unwrap_or_default(),
      select_utxos_result.success,
    );

    Ok(Self {
      action_total: ActionTotal::new(&action),
      wallet,
      action,
      select_utxos_result,
    })
  }

  fn selected_utxos(&self) -> &[WalletUtxo] {
    self.select_utxos_result.utxos.as_deref().unwrap_or_default()
  }

  /// Builds and signs a transaction that pays its own fee.
  ///
  /// The selected UTXOs are tried first. If they cannot cover the fee,
  /// spendable sats-only UTXOs are added one at a time, largest first,
  /// until the transaction is funded. On success the wallet's UTXO set
  /// reflects the new transaction.
  pub fn build(self, sighash: SigHashType) -> Result<BuiltAction> {
    let result = &self.select_utxos_result;

    if result.sats_strategy == SatsSelectionStrategy::NoSats {
      return Err(Error::BuildPostageRequired.into());
    }

    if !result.success || result.missing_sats > Amount::ZERO {
      return Err(selection_error(result).into());
    }

    let selected = self.selected_utxos().to_vec();

    let Self { wallet, action, .. } = self;

    let dust = action.dust_sats();
    let fee_per_kb = action.fee_per_kb();

    let mut token_changes = 0;

    let finalized = finalize::finalize_outputs(&action, &selected, || {
      let script = wallet.change_script_at(token_changes)?;
      token_changes += 1;
      Ok::<ScriptBuf, anyhow::Error>(script)
    })
    .map_err(Error::Finalize)?;

    let output_sats = sum_sats(finalized.tx_outputs.iter().map(|output| &output.value))?;

    let mut outputs = finalized
      .tx_outputs
      .iter()
      .cloned()
      .map(TxBuilderOutput::Fixed)
      .collect::<Vec<TxBuilderOutput>>();

    if !action.no_change {
      outputs.push(TxBuilderOutput::Leftover(wallet.script()));
    }

    let mut builder = TxBuilder::new(
      selected
        .iter()
        .map(|utxo| wallet.input(utxo, sighash))
        .collect::<Result<Vec<TxBuilderInput>, Error>>()?,
      outputs,
    );

    let mut input_sats = sum_sats(selected.iter().map(|utxo| &utxo.sats))?;

    let mut fuel = wallet
      .spendable_sats_only_utxos()
      .into_iter()
      .filter(|utxo| !selected.iter().any(|s| s.outpoint == utxo.outpoint))
      .collect::<Vec<WalletUtxo>>();

    fuel.sort_by(|a, b| b.sats.cmp(&a.sats));

    let mut fuel = fuel.into_iter();

    loop {
      if let Some(probe) = probe(&builder, fee_per_kb, dust, input_sats, output_sats) {
        let has_change = !action.no_change && probe.output.len() > finalized.tx_outputs.len();

        if has_change && wallet.is_hd() {
          let change_script = wallet.change_script_at(token_changes)?;

          if let Some(TxBuilderOutput::Leftover(script)) = builder.outputs.last_mut() {
            *script = change_script;
          }
        }

        let tx = builder.sign(fee_per_kb, dust)?;

        wallet.advance_change_index(token_changes.saturating_add(u32::from(has_change)))?;

        wallet.apply_built_tx(&tx, &action, &finalized.payment_outputs);

        log::info!(
          "built tx {} with {} inputs and {} outputs",
          tx.compute_txid(),
          tx.input.len(),
          tx.output.len(),
        );

        return Ok(BuiltAction::new(
          vec![BuiltTx::new(tx, fee_per_kb, input_sats)],
          fee_per_kb,
        ));
      }

      let Some(utxo) = fuel.next() else {
        break;
      };

      tprintln!("adding fuel utxo {} with {} sats", utxo.outpoint, utxo.sats);

      builder.inputs.push(wallet.input(&utxo, sighash)?);

      input_sats = input_sats
        .checked_add(utxo.sats)
        .ok_or(Error::ValueOverflow)?;
    }

    Err(
      Error::InsufficientUtxoSats {
        input_sats,
        output_sats,
      }
      .into(),
    )
  }

  /// Builds a transaction that does not pay its fee, signed
  /// `ALL|ANYONECANPAY` so a second party can add fuel inputs with
  /// `PostageTx::add_fuel`.
  pub fn build_postage(self) -> Result<PostageTx> {
    if self.action.no_change {
      return Err(Error::NoChangePostage.into());
    }

    let result = &self.select_utxos_result;

    if !result.success {
      return Err(if result.errors.is_empty() {
        Error::UnableToSelect
      } else {
        Error::Selection {
          errors: result.errors.clone(),
        }
      }
      .into());
    }

    let selected = self.selected_utxos().to_vec();

    let Self {
      wallet,
      action,
      action_total,
      ..
    } = self;

    let dust = action.dust_sats();
    let fee_per_kb = action.fee_per_kb();

    let mut token_changes = 0;

    let finalized = finalize::finalize_outputs(&action, &selected, || {
      let script = wallet.change_script_at(token_changes)?;
      token_changes += 1;
      Ok::<ScriptBuf, anyhow::Error>(script)
    })
    .map_err(Error::Finalize)?;

    let input_sats = sum_sats(selected.iter().map(|utxo| &utxo.sats))?;

    let tx = TxBuilder::new(
      selected
        .iter()
        .map(|utxo| wallet.input(utxo, SigHashType::ALL_ANYONECANPAY_BIP143))
        .collect::<Result<Vec<TxBuilderInput>, Error>>()?,
      finalized
        .tx_outputs
        .into_iter()
        .map(TxBuilderOutput::Fixed)
        .collect(),
    )
    .sign(fee_per_kb, dust)?;

    wallet.advance_change_index(token_changes)?;

    log::info!(
      "built postage tx with {} inputs and {} outputs",
      tx.input.len(),
      tx.output.len(),
    );

    Ok(PostageTx::new(
      tx,
      fee_per_kb,
      dust,
      action_total,
      input_sats,
    ))
  }
}

/// Signs `builder` with placeholder signatures, returning the transaction
/// if `input_sats` covers `output_sats` plus the fee at its size.
pub(crate) fn probe(
  builder: &TxBuilder,
  fee_per_kb: FeeRate,
  dust: Amount,
  input_sats: Amount,
  output_sats: Amount,
) -> Option<Transaction> {
  let tx = match builder.sign_with(&EccDummy, fee_per_kb, dust) {
    Ok(tx) => tx,
    Err(err) => {
      log::debug!("probe with {} inputs failed: {err}", builder.inputs.len());
      return None;
    }
  };

  let required = output_sats.checked_add(fee_per_kb.fee(tx.total_size()))?;

  (input_sats >= required).then_some(tx)
}
