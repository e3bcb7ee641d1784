//! Wallets own key material and a UTXO set, and turn `Action`s into
//! signed transactions.
//!
//! `Wallet` holds secret keys and can sign. `WatchOnlyWallet` holds only
//! addresses or an account xpub. Both keep their addresses and UTXOs in a
//! `WalletState`, which they dereference to.

use {
  super::*,
  signatory::SigHashType,
  std::ops::{Deref, DerefMut},
};

pub use self::{
  base::{HdOptions, TxAmounts, WalletState},
  keypair::{Keypair, PublicKeypair, SecretKeypair},
  watch_only::WatchOnlyWallet,
};

mod base;
pub mod built_action;
mod keypair;
pub mod wallet_action;
mod watch_only;

#[derive(Debug, PartialEq)]
pub enum Error {
  BuildPostageRequired,
  Derivation {
    message: String,
  },
  Finalize(finalize::Error),
  InsufficientFuel {
    input_sats: Amount,
    output_sats: Amount,
    fee: Amount,
  },
  InsufficientSats {
    missing_sats: Amount,
  },
  InsufficientUtxoSats {
    input_sats: Amount,
    output_sats: Amount,
  },
  InvalidXpubDepth {
    depth: u8,
  },
  MissingKeypair {
    address: CashAddress,
  },
  NoChangePostage,
  Select(selector::Error),
  Selection {
    errors: Vec<String>,
  },
  UnableToSelect,
  ValueOverflow,
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::BuildPostageRequired => write!(
        f,
        "You must call buildPostage() for inputs selected with SatsSelectionStrategy.NO_SATS"
      ),
      Self::Derivation { message } => write!(f, "Key derivation failed: {message}"),
      Self::Finalize(err) => write!(f, "{err}"),
      Self::InsufficientFuel {
        input_sats,
        output_sats,
        fee,
      } => write!(
        f,
        "Insufficient fuel: insufficient sats in impliedInputSats ({}) to cover output sats ({}) \
        + fee ({}) with available fuel UTXOs",
        input_sats.to_sat(),
        output_sats.to_sat(),
        fee.to_sat(),
      ),
      Self::InsufficientSats { missing_sats } => write!(
        f,
        "Insufficient sats to complete tx. Need {} additional satoshis to complete this Action.",
        missing_sats.to_sat()
      ),
      Self::InsufficientUtxoSats {
        input_sats,
        output_sats,
      } => write!(
        f,
        "Insufficient satoshis in available utxos ({}) to cover outputs of this tx ({}) + fee",
        input_sats.to_sat(),
        output_sats.to_sat(),
      ),
      Self::InvalidXpubDepth { depth } => write!(
        f,
        "Invalid xpub depth: expected depth 3 (account level), got {depth}"
      ),
      Self::MissingKeypair { address } => write!(f, "No keypair found for address {address}"),
      Self::NoChangePostage => write!(f, "noChange param is not supported for postage txs"),
      Self::Select(err) => write!(f, "{err}"),
      Self::Selection { errors } => write!(f, "{}", errors.join("; ")),
      Self::UnableToSelect => write!(f, "Unable to select required UTXOs for this Action."),
      Self::ValueOverflow => write!(f, "Sum of satoshis overflows"),
    }
  }
}

impl std::error::Error for Error {}

impl From<finalize::Error> for Error {
  fn from(err: finalize::Error) -> Self {
    Self::Finalize(err)
  }
}

impl From<selector::Error> for Error {
  fn from(err: selector::Error) -> Self {
    Self::Select(err)
  }
}

/// Path of BIP44 account `account` of eCash, `m/44'/1899'/<account>'`.
pub(crate) fn account_path(account: u32) -> Result<DerivationPath> {
  Ok(DerivationPath::from(vec![
    ChildNumber::from_hardened_idx(44)?,
    ChildNumber::from_hardened_idx(XEC_COIN_TYPE)?,
    ChildNumber::from_hardened_idx(account)?,
  ]))
}

pub(crate) fn sum_sats<'a>(sats: impl IntoIterator<Item = &'a Amount>) -> Result<Amount, Error> {
  sats
    .into_iter()
    .try_fold(Amount::ZERO, |sum, sats| sum.checked_add(*sats))
    .ok_or(Error::ValueOverflow)
}

#[derive(Debug, Clone)]
pub struct Wallet {
  state: WalletState<SecretKeypair>,
}

impl Deref for Wallet {
  type Target = WalletState<SecretKeypair>;

  fn deref(&self) -> &Self::Target {
    &self.state
  }
}

impl DerefMut for Wallet {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.state
  }
}

impl Wallet {
  /// A single-address wallet.
  pub fn from_sk(sk: SecretKey) -> Self {
    Self {
      state: WalletState::single(SecretKeypair::new(sk)),
    }
  }

  /// Without `hd`, the wallet uses the single key at `m/44'/1899'/0'/0/0`.
  pub fn from_mnemonic(mnemonic: &str, hd: Option<HdOptions>) -> Result<Self> {
    let seed = bip39::Mnemonic::parse(mnemonic)
      .context("invalid mnemonic")?
      .to_seed("");

    let master = Xpriv::new_master(NetworkKind::Main, &seed)?;

    match hd {
      Some(options) => {
        let root = master.derive_priv(SECP256K1, &account_path(options.account)?)?;

        log::info!("loaded HD wallet for account {}", options.account);

        Ok(Self {
          state: WalletState::hd(root, options)?,
        })
      }
      None => {
        let path = account_path(0)?
          .child(ChildNumber::from_normal_idx(0)?)
          .child(ChildNumber::from_normal_idx(0)?);

        Ok(Self::from_sk(
          master.derive_priv(SECP256K1, &path)?.private_key,
        ))
      }
    }
  }

  /// Account xpub of an HD wallet, for creating a matching watch-only
  /// wallet.
  pub fn xpub(&self) -> Option<Xpub> {
    self
      .root
      .as_ref()
      .map(|root| Xpub::from_priv(SECP256K1, root))
  }

  /// Builder input spending `utxo`, signed with the key of its address.
  pub fn input(&self, utxo: &WalletUtxo, sighash: SigHashType) -> Result<TxBuilderInput, Error> {
    let keypair = self
      .keypair_for_address(&utxo.address)
      .ok_or_else(|| Error::MissingKeypair {
        address: utxo.address.clone(),
      })?;

    Ok(TxBuilderInput::new(
      utxo.outpoint,
      utxo.sign_data(),
      keypair.signatory(sighash),
    ))
  }

  /// Selects UTXOs for `action`. Nothing is signed until the returned
  /// `WalletAction` is built.
  pub fn action(
    &mut self,
    action: Action,
    strategy: SatsSelectionStrategy,
  ) -> Result<WalletAction<'_>> {
    WalletAction::new(self, action, strategy)
  }

  /// The most sats a single P2PKH output plus `extra_outputs` could carry
  /// after spending every spendable sats-only UTXO. Zero if no such
  /// transaction can be built.
  pub fn max_send_sats(&self, extra_outputs: &[TxOut], fee_per_kb: FeeRate) -> Amount {
    self
      .try_max_send_sats(extra_outputs, fee_per_kb)
      .unwrap_or_else(|err| {
        log::debug!("max send sats unavailable: {err}");
        Amount::ZERO
      })
  }

  fn try_max_send_sats(&self, extra_outputs: &[TxOut], fee_per_kb: FeeRate) -> Result<Amount> {
    let utxos = self.spendable_sats_only_utxos();

    if utxos.is_empty() {
      return Ok(Amount::ZERO);
    }

    let total = sum_sats(utxos.iter().map(|utxo| &utxo.sats))?;

    let inputs = utxos
      .iter()
      .map(|utxo| self.input(utxo, SigHashType::ALL_BIP143))
      .collect::<Result<Vec<TxBuilderInput>, Error>>()?;

    let mut outputs = extra_outputs
      .iter()
      .cloned()
      .map(TxBuilderOutput::Fixed)
      .collect::<Vec<TxBuilderOutput>>();

    outputs.push(TxBuilderOutput::Fixed(TxOut {
      value: total,
      script_pubkey: ScriptBuf::new_p2pkh(&PubkeyHash::all_zeros()),
    }));

    let tx = TxBuilder::new(inputs, outputs).sign_with(&EccDummy, fee_per_kb, DEFAULT_DUST_SATS)?;

    Ok(
      total
        .checked_sub(fee_per_kb.fee(tx.total_size()))
        .unwrap_or(Amount::ZERO),
    )
  }
}
