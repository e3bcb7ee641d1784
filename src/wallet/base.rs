use super::*;

/// Derivation settings of an HD wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdOptions {
  pub account: u32,
  pub receive_index: u32,
  pub change_index: u32,
}

/// Net effect of a transaction on a wallet.
///
/// Sats count only non-token outputs and atoms skip mint batons. Tokens
/// whose delta nets to zero are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxAmounts {
  /// Every input and non-`OP_RETURN` output belongs to the wallet.
  pub is_self_send: bool,
  pub sats_delta: i128,
  pub token_deltas: BTreeMap<TokenId, i128>,
}

impl TxAmounts {
  fn apply(&mut self, sats: Amount, token: Option<&UtxoToken>, sign: i128) {
    match token {
      None => self.sats_delta += sign * i128::from(sats.to_sat()),
      Some(token) if !token.is_mint_baton && token.atoms > 0 => {
        *self.token_deltas.entry(token.token_id).or_default() += sign * i128::from(token.atoms);
      }
      Some(_) => {}
    }
  }

  fn credit(&mut self, sats: Amount, token: Option<&UtxoToken>) {
    self.apply(sats, token, 1);
  }

  fn debit(&mut self, sats: Amount, token: Option<&UtxoToken>) {
    self.apply(sats, token, -1);
  }

  fn finish(mut self) -> Self {
    self.token_deltas.retain(|_, delta| *delta != 0);
    self
  }
}

/// Address and UTXO bookkeeping shared by signing and watch-only wallets.
#[derive(Debug, Clone)]
pub struct WalletState<K: Keypair> {
  pub(crate) address: CashAddress,
  pub(crate) root: Option<K::Root>,
  pub(crate) account: u32,
  pub(crate) receive_index: u32,
  pub(crate) change_index: u32,
  pub(crate) keypairs: BTreeMap<CashAddress, K>,
  /// Address of every derived `(change, index)` pair.
  pub(crate) derived: BTreeMap<(bool, u32), CashAddress>,
  pub(crate) utxos: Vec<WalletUtxo>,
  pub(crate) balance_sats: Amount,
  pub(crate) tip_height: i32,
}

impl<K: Keypair> WalletState<K> {
  pub(crate) fn single(keypair: K) -> Self {
    let address = keypair.address();

    Self {
      address: address.clone(),
      root: None,
      account: 0,
      receive_index: 0,
      change_index: 0,
      keypairs: [(address, keypair)].into(),
      derived: BTreeMap::new(),
      utxos: Vec::new(),
      balance_sats: Amount::ZERO,
      tip_height: 0,
    }
  }

  pub(crate) fn hd(root: K::Root, options: HdOptions) -> Result<Self> {
    let keypair = K::derive(&root, false, 0)?;
    let address = keypair.address();

    let mut state = Self {
      address: address.clone(),
      root: Some(root),
      account: options.account,
      receive_index: options.receive_index,
      change_index: options.change_index,
      keypairs: [(address.clone(), keypair)].into(),
      derived: [((false, 0), address)].into(),
      utxos: Vec::new(),
      balance_sats: Amount::ZERO,
      tip_height: 0,
    };

    state.derive_known_addresses()?;

    Ok(state)
  }

  /// Primary address. For HD wallets this is receive address 0.
  pub fn address(&self) -> &CashAddress {
    &self.address
  }

  pub fn script(&self) -> ScriptBuf {
    self.address.script()
  }

  pub fn is_hd(&self) -> bool {
    self.root.is_some()
  }

  pub fn account(&self) -> u32 {
    self.account
  }

  pub fn receive_index(&self) -> u32 {
    self.receive_index
  }

  pub fn change_index(&self) -> u32 {
    self.change_index
  }

  pub fn utxos(&self) -> &[WalletUtxo] {
    &self.utxos
  }

  /// Sum of sats over non-token UTXOs, including immature coinbase.
  pub fn balance_sats(&self) -> Amount {
    self.balance_sats
  }

  pub fn tip_height(&self) -> i32 {
    self.tip_height
  }

  /// Derives and caches the address at `<account>/<chain>/<index>`. A
  /// non-HD wallet always returns its single address.
  pub fn derive_address(&mut self, change: bool, index: u32) -> Result<CashAddress> {
    let Some(root) = &self.root else {
      return Ok(self.address.clone());
    };

    if let Some(address) = self.derived.get(&(change, index)) {
      return Ok(address.clone());
    }

    let keypair = K::derive(root, change, index)?;
    let address = keypair.address();

    self.keypairs.insert(address.clone(), keypair);
    self.derived.insert((change, index), address.clone());

    Ok(address)
  }

  fn derive_known_addresses(&mut self) -> Result {
    for index in 0..=self.receive_index {
      self.derive_address(false, index)?;
    }

    for index in 0..=self.change_index {
      self.derive_address(true, index)?;
    }

    Ok(())
  }

  /// Script for sats or token change. HD wallets move to the next change
  /// address on every call.
  pub fn next_change_script(&mut self) -> Result<ScriptBuf> {
    let script = self.change_script_at(0)?;
    self.advance_change_index(1)?;
    Ok(script)
  }

  /// Change script `offset` addresses past the change index, leaving the
  /// index where it is.
  pub(crate) fn change_script_at(&mut self, offset: u32) -> Result<ScriptBuf> {
    if !self.is_hd() {
      return Ok(self.script());
    }

    let index = self
      .change_index
      .checked_add(offset)
      .context("change index overflow")?;

    Ok(self.derive_address(true, index)?.script())
  }

  pub(crate) fn advance_change_index(&mut self, count: u32) -> Result {
    if self.is_hd() {
      self.change_index = self
        .change_index
        .checked_add(count)
        .context("change index overflow")?;
    }

    Ok(())
  }

  pub fn next_receive_address(&mut self) -> Result<CashAddress> {
    if !self.is_hd() {
      return Ok(self.address.clone());
    }

    let address = self.derive_address(false, self.receive_index)?;

    self.receive_index = self
      .receive_index
      .checked_add(1)
      .context("receive index overflow")?;

    Ok(address)
  }

  pub fn all_addresses(&self) -> Vec<CashAddress> {
    self.keypairs.keys().cloned().collect()
  }

  pub fn keypair_for_address(&self, address: &CashAddress) -> Option<&K> {
    self.keypairs.get(address)
  }

  /// The wallet's own address paying to `script`, whatever its prefix.
  fn owned_address(&self, script: &Script) -> Option<CashAddress> {
    let candidate = CashAddress::from_script(script)?;

    if self.keypairs.contains_key(&candidate) {
      return Some(candidate);
    }

    self
      .keypairs
      .keys()
      .find(|address| {
        address.address_type() == candidate.address_type() && address.hash() == candidate.hash()
      })
      .cloned()
  }

  pub fn is_wallet_script(&self, script: &Script) -> bool {
    self.owned_address(script).is_some()
  }

  /// Replaces the UTXO set with the indexer's view of every known address.
  ///
  /// All addresses are queried concurrently and nothing is applied unless
  /// every query succeeds.
  pub async fn sync(&mut self, indexer: &dyn Indexer) -> Result {
    self.derive_known_addresses()?;

    let addresses = self.all_addresses();

    let (info, results) = futures::try_join!(
      indexer.blockchain_info(),
      futures::future::try_join_all(addresses.iter().map(|address| async move {
        let script_utxos = indexer.address_utxos(address).await?;
        Ok::<_, anyhow::Error>((address, script_utxos))
      })),
    )?;

    self.utxos = results
      .into_iter()
      .flat_map(|(address, script_utxos)| {
        script_utxos
          .utxos
          .into_iter()
          .map(move |utxo| WalletUtxo::new(utxo, address.clone()))
      })
      .collect();

    self.tip_height = info.tip_height;

    self.update_balance();

    log::info!(
      "synced {} utxos over {} addresses at height {}",
      self.utxos.len(),
      addresses.len(),
      self.tip_height,
    );

    Ok(())
  }

  pub(crate) fn update_balance(&mut self) {
    self.balance_sats = self
      .utxos
      .iter()
      .filter(|utxo| utxo.token.is_none())
      .map(|utxo| utxo.sats)
      .fold(Amount::ZERO, |sum, sats| sum.checked_add(sats).unwrap_or(Amount::MAX));
  }

  /// UTXOs that may be spent at the current tip. Immature coinbase outputs
  /// are excluded.
  pub fn spendable_utxos(&self) -> Vec<WalletUtxo> {
    self
      .utxos
      .iter()
      .filter(|utxo| utxo.is_mature(self.tip_height))
      .cloned()
      .collect()
  }

  pub fn spendable_sats_only_utxos(&self) -> Vec<WalletUtxo> {
    self
      .spendable_utxos()
      .into_iter()
      .filter(|utxo| utxo.token.is_none())
      .collect()
  }

  pub fn remove_spent_utxos(&mut self, tx: &Transaction) {
    let spent = tx
      .input
      .iter()
      .map(|input| input.previous_output)
      .collect::<HashSet<OutPoint>>();

    self.utxos.retain(|utxo| !spent.contains(&utxo.outpoint));

    self.update_balance();
  }

  /// Applies a transaction this wallet just built: spent inputs are removed
  /// and outputs to wallet scripts are added as unconfirmed UTXOs.
  ///
  /// `payment_outputs` describes the leading outputs of `tx`. A single
  /// output past them is the sats change.
  pub(crate) fn apply_built_tx(
    &mut self,
    tx: &Transaction,
    action: &Action,
    payment_outputs: &[PaymentOutput],
  ) {
    self.remove_spent_utxos(tx);

    let txid = tx.compute_txid();

    for (vout, output) in tx.output.iter().enumerate() {
      if output.value == Amount::ZERO {
        continue;
      }

      let Some(address) = self.owned_address(&output.script_pubkey) else {
        continue;
      };

      let token = match payment_outputs.get(vout).and_then(PaymentOutput::token) {
        Some(token_output) => {
          let Some(token_type) = action.token_type_of(token_output.token) else {
            log::warn!("no token type for output {vout} of {txid}");
            continue;
          };

          Some(UtxoToken {
            token_id: token_output.token_id().unwrap_or_else(|| txid.into()),
            token_type,
            atoms: token_output.atoms,
            is_mint_baton: token_output.is_mint_baton,
          })
        }
        None => None,
      };

      let Ok(vout) = u32::try_from(vout) else {
        continue;
      };

      self.utxos.push(WalletUtxo {
        outpoint: OutPoint { txid, vout },
        block_height: WalletUtxo::UNCONFIRMED_HEIGHT,
        is_coinbase: false,
        sats: output.value,
        is_final: false,
        token,
        address,
      });
    }

    self.update_balance();
  }

  fn is_self_send(&self, tx: &IndexedTx) -> bool {
    tx.inputs
      .iter()
      .all(|input| self.is_wallet_script(&input.output_script))
      && tx
        .outputs
        .iter()
        .filter(|output| !output.output_script.is_op_return())
        .all(|output| self.is_wallet_script(&output.output_script))
  }

  /// Computes what `tx` does to this wallet without changing any state.
  pub fn tx_amounts(&self, tx: &IndexedTx) -> TxAmounts {
    let mut amounts = TxAmounts {
      is_self_send: self.is_self_send(tx),
      ..default()
    };

    if !tx.is_coinbase {
      for input in &tx.inputs {
        if self.is_wallet_script(&input.output_script) {
          amounts.debit(input.sats, input.token.as_ref());
        }
      }
    }

    for output in &tx.outputs {
      if self.is_wallet_script(&output.output_script) {
        amounts.credit(output.sats, output.token.as_ref());
      }
    }

    amounts.finish()
  }

  /// Updates the UTXO set from an observed transaction without a resync,
  /// returning the change it caused.
  ///
  /// Outputs already in the set are skipped, so applying the same
  /// transaction twice has no further effect.
  pub fn add_received_tx(&mut self, tx: &IndexedTx) -> TxAmounts {
    let mut amounts = TxAmounts {
      is_self_send: self.is_self_send(tx),
      ..default()
    };

    for input in &tx.inputs {
      if let Some(i) = self
        .utxos
        .iter()
        .position(|utxo| utxo.outpoint == input.prev_out)
      {
        let spent = self.utxos.remove(i);
        amounts.debit(spent.sats, spent.token.as_ref());
      }
    }

    for (vout, output) in tx.outputs.iter().enumerate() {
      if output.spent_by.is_some() || output.output_script.is_op_return() {
        continue;
      }

      let Some(address) = self.owned_address(&output.output_script) else {
        continue;
      };

      let Some(outpoint) = tx.outpoint(vout) else {
        continue;
      };

      if self.utxos.iter().any(|utxo| utxo.outpoint == outpoint) {
        continue;
      }

      self.utxos.push(WalletUtxo {
        outpoint,
        block_height: tx.block_height.unwrap_or(WalletUtxo::UNCONFIRMED_HEIGHT),
        is_coinbase: tx.is_coinbase,
        sats: output.sats,
        is_final: tx.is_final,
        token: output.token,
        address,
      });

      amounts.credit(output.sats, output.token.as_ref());
    }

    self.update_balance();

    amounts.finish()
  }
}
