use super::*;

/// A wallet that tracks addresses and UTXOs but cannot sign.
#[derive(Debug, Clone)]
pub struct WatchOnlyWallet {
  state: WalletState<PublicKeypair>,
}

impl Deref for WatchOnlyWallet {
  type Target = WalletState<PublicKeypair>;

  fn deref(&self) -> &Self::Target {
    &self.state
  }
}

impl DerefMut for WatchOnlyWallet {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.state
  }
}

impl WatchOnlyWallet {
  pub fn from_address(address: CashAddress) -> Self {
    Self {
      state: WalletState::single(PublicKeypair::from_address(address)),
    }
  }

  /// Watches the account of `xpub`, which must be an account-level node
  /// (`m/44'/1899'/<account>'`).
  pub fn from_xpub(xpub: Xpub, options: HdOptions) -> Result<Self, Error> {
    if xpub.depth != 3 {
      return Err(Error::InvalidXpubDepth { depth: xpub.depth });
    }

    Ok(Self {
      state: WalletState::hd(xpub, options).map_err(|err| Error::Derivation {
        message: err.to_string(),
      })?,
    })
  }
}
