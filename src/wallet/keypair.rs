use super::*;

/// Key material for one P2PKH address, derived from a BIP32 account node.
pub trait Keypair: Clone + fmt::Debug + Send + Sync {
  /// The account-level node keypairs are derived from.
  type Root: Clone + fmt::Debug + Send + Sync;

  /// Derives the keypair at `<root>/<chain>/<index>`, where chain 1 holds
  /// change addresses.
  fn derive(root: &Self::Root, change: bool, index: u32) -> Result<Self>;

  fn address(&self) -> CashAddress;

  fn script(&self) -> ScriptBuf {
    self.address().script()
  }
}

fn chain_path(change: bool, index: u32) -> Result<[ChildNumber; 2]> {
  Ok([
    ChildNumber::from_normal_idx(u32::from(change))?,
    ChildNumber::from_normal_idx(index)?,
  ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretKeypair {
  pub sk: SecretKey,
  pub pk: PublicKey,
}

impl SecretKeypair {
  pub fn new(sk: SecretKey) -> Self {
    Self {
      sk,
      pk: PublicKey::from_secret_key_global(&sk),
    }
  }

  pub fn signatory(&self, sighash: signatory::SigHashType) -> Arc<dyn Signatory> {
    Arc::new(signatory::P2pkhSignatory::new(self.sk, self.pk, sighash))
  }
}

impl Keypair for SecretKeypair {
  type Root = Xpriv;

  fn derive(root: &Xpriv, change: bool, index: u32) -> Result<Self> {
    let node = root.derive_priv(SECP256K1, &chain_path(change, index)?)?;
    Ok(Self::new(node.private_key))
  }

  fn address(&self) -> CashAddress {
    CashAddress::p2pkh_from_pubkey(&self.pk)
  }
}

/// An address without a secret key. The public key is unknown when the
/// wallet was imported from an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeypair {
  pub address: CashAddress,
  pub pk: Option<PublicKey>,
}

impl PublicKeypair {
  pub fn from_address(address: CashAddress) -> Self {
    Self { address, pk: None }
  }
}

impl Keypair for PublicKeypair {
  type Root = Xpub;

  fn derive(root: &Xpub, change: bool, index: u32) -> Result<Self> {
    let node = root.derive_pub(SECP256K1, &chain_path(change, index)?)?;
    Ok(Self {
      address: CashAddress::p2pkh_from_pubkey(&node.public_key),
      pk: Some(node.public_key),
    })
  }

  fn address(&self) -> CashAddress {
    self.address.clone()
  }
}
