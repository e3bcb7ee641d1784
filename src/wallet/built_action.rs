use super::*;

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTx {
  pub tx: Transaction,
  pub txid: Txid,
  pub fee_per_kb: FeeRate,
  /// Value of the outputs spent by `tx`.
  pub input_sats: Amount,
}

impl BuiltTx {
  pub fn new(tx: Transaction, fee_per_kb: FeeRate, input_sats: Amount) -> Self {
    Self {
      txid: tx.compute_txid(),
      tx,
      fee_per_kb,
      input_sats,
    }
  }

  pub fn size(&self) -> usize {
    self.tx.total_size()
  }

  /// Sats paid to miners, inputs minus outputs. Exceeds `fee` when
  /// leftover below the dust limit was left out of the transaction.
  pub fn fee_paid(&self) -> Amount {
    sum_sats(self.tx.output.iter().map(|output| &output.value))
      .ok()
      .and_then(|output_sats| self.input_sats.checked_sub(output_sats))
      .unwrap_or(Amount::ZERO)
  }

  /// Fee implied by the size of the transaction at its fee rate.
  pub fn fee(&self) -> Amount {
    self.fee_per_kb.fee(self.size())
  }

  pub fn hex(&self) -> String {
    hex::encode(serialize(&self.tx))
  }

  pub async fn broadcast(&self, indexer: &dyn Indexer) -> Result<Txid> {
    let txid = indexer.broadcast_tx(&self.hex()).await?;

    log::info!("broadcast {txid}");

    Ok(txid)
  }
}

/// Transactions fulfilling one `Action`, ready to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltAction {
  pub txs: Vec<Transaction>,
  pub built_txs: Vec<BuiltTx>,
  pub fee_per_kb: FeeRate,
}

impl BuiltAction {
  pub fn new(built_txs: Vec<BuiltTx>, fee_per_kb: FeeRate) -> Self {
    Self {
      txs: built_txs.iter().map(|built_tx| built_tx.tx.clone()).collect(),
      built_txs,
      fee_per_kb,
    }
  }

  /// Broadcasts every transaction in order, stopping at the first
  /// failure.
  pub async fn broadcast(&self, indexer: &dyn Indexer) -> Result<Vec<Txid>> {
    let mut txids = Vec::new();

    for built_tx in &self.built_txs {
      txids.push(built_tx.broadcast(indexer).await?);
    }

    Ok(txids)
  }
}

/// A transaction whose inputs do not cover its fee, signed so that fuel
/// inputs can still be added.
#[derive(Debug, Clone)]
pub struct PostageTx {
  pub partially_signed_tx: Transaction,
  pub tx_builder: TxBuilder,
  pub fee_per_kb: FeeRate,
  pub dust: Amount,
  pub action_total: ActionTotal,
  /// Value of the postage inputs, which the transaction does not record.
  pub input_sats: Amount,
}

impl PostageTx {
  pub fn new(
    partially_signed_tx: Transaction,
    fee_per_kb: FeeRate,
    dust: Amount,
    action_total: ActionTotal,
    input_sats: Amount,
  ) -> Self {
    Self {
      tx_builder: TxBuilder::from_tx(&partially_signed_tx),
      partially_signed_tx,
      fee_per_kb,
      dust,
      action_total,
      input_sats,
    }
  }

  /// Fuels the transaction at the fee rate and dust limit of the action
  /// it was built from.
  pub fn add_fuel(&self, fuel_wallet: &mut Wallet, sighash: SigHashType) -> Result<BuiltAction> {
    self.add_fuel_and_sign(
      fuel_wallet,
      self.input_sats,
      sighash,
      self.fee_per_kb,
      self.dust,
    )
  }

  /// Adds sats-only UTXOs of `fuel_wallet`, smallest first, until the fee
  /// is covered, and signs the fuel inputs.
  ///
  /// The postage input value, fee rate and dust limit come from the
  /// caller, so the payer may override what `build_postage` recorded. The
  /// fuel wallet's spent UTXOs are removed on success.
  pub fn add_fuel_and_sign(
    &self,
    fuel_wallet: &mut Wallet,
    pre_postage_input_sats: Amount,
    sighash: SigHashType,
    fee_per_kb: FeeRate,
    dust: Amount,
  ) -> Result<BuiltAction> {
    let output_sats = sum_sats(self.partially_signed_tx.output.iter().map(|output| &output.value))?;

    let mut fuel = fuel_wallet.spendable_sats_only_utxos();

    fuel.sort_by(|a, b| a.sats.cmp(&b.sats));

    let mut builder = self.tx_builder.clone();
    let mut input_sats = pre_postage_input_sats;
    let mut fee = Amount::ZERO;
    let mut fuel = fuel.into_iter();

    loop {
      if input_sats > output_sats {
        match builder.sign_with(&EccDummy, fee_per_kb, dust) {
          Ok(probe) => {
            fee = fee_per_kb.fee(probe.total_size());

            if input_sats
              .checked_sub(output_sats)
              .is_some_and(|paid| paid > fee)
            {
              let tx = builder.sign(fee_per_kb, dust)?;

              fuel_wallet.remove_spent_utxos(&tx);

              log::info!(
                "added {} fuel inputs to postage tx {}",
                tx.input.len().saturating_sub(self.partially_signed_tx.input.len()),
                tx.compute_txid(),
              );

              return Ok(BuiltAction::new(
                vec![BuiltTx::new(tx, fee_per_kb, input_sats)],
                fee_per_kb,
              ));
            }
          }
          Err(err) => log::debug!("postage probe failed: {err}"),
        }
      }

      let Some(utxo) = fuel.next() else {
        break;
      };

      builder.inputs.push(fuel_wallet.input(&utxo, sighash)?);

      input_sats = input_sats
        .checked_add(utxo.sats)
        .ok_or(Error::ValueOverflow)?;
    }

    Err(
      Error::InsufficientFuel {
        input_sats,
        output_sats,
        fee,
      }
      .into(),
    )
  }
}
