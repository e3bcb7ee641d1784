use super::*;

/// An offline indexer backed by a JSON file.
///
/// Broadcast transactions are appended to the file, so a later run sees
/// them, but the UTXO set is never updated from them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
  pub tip_hash: Option<BlockHash>,
  #[serde(default)]
  pub tip_height: i32,
  /// UTXOs by cashaddr.
  #[serde(default)]
  pub utxos: BTreeMap<String, Vec<ScriptUtxo>>,
  #[serde(default)]
  pub broadcasts: Mutex<Vec<String>>,
  #[serde(skip)]
  path: Option<PathBuf>,
}

impl Snapshot {
  pub fn load(path: &Path) -> Result<Self> {
    let json = fs::read_to_string(path)
      .with_context(|| format!("failed to read snapshot `{}`", path.display()))?;

    let mut snapshot = serde_json::from_str::<Self>(&json)
      .with_context(|| format!("failed to parse snapshot `{}`", path.display()))?;

    snapshot.path = Some(path.into());

    log::info!(
      "loaded snapshot at height {} with {} addresses",
      snapshot.tip_height,
      snapshot.utxos.len()
    );

    Ok(snapshot)
  }

  fn save(&self) -> Result {
    let Some(path) = &self.path else {
      return Ok(());
    };

    fs::write(path, serde_json::to_string_pretty(self)?)
      .with_context(|| format!("failed to write snapshot `{}`", path.display()))?;

    Ok(())
  }
}

#[async_trait]
impl Indexer for Snapshot {
  async fn address_utxos(&self, address: &CashAddress) -> Result<ScriptUtxos> {
    Ok(ScriptUtxos {
      output_script: address.script(),
      utxos: self
        .utxos
        .get(&address.to_string())
        .cloned()
        .unwrap_or_default(),
    })
  }

  async fn blockchain_info(&self) -> Result<BlockchainInfo> {
    Ok(BlockchainInfo {
      tip_hash: self.tip_hash.unwrap_or(BlockHash::all_zeros()),
      tip_height: self.tip_height,
    })
  }

  async fn broadcast_tx(&self, raw_tx: &str) -> Result<Txid> {
    let tx = bitcoin::consensus::encode::deserialize::<Transaction>(&hex::decode(raw_tx)?)
      .context("failed to decode broadcast transaction")?;

    self
      .broadcasts
      .lock()
      .map_err(|err| anyhow!("{err}"))?
      .push(raw_tx.into());

    self.save()?;

    Ok(tx.compute_txid())
  }
}
