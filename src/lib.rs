#![allow(
  clippy::large_enum_variant,
  clippy::result_large_err,
  clippy::too_many_arguments,
  clippy::type_complexity
)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    arguments::Arguments,
    error::{ResultExt, SnafuError},
    indexer::{BlockchainInfo, ScriptUtxos, Snapshot},
    signatory::{Ecc, EccDummy, Secp256k1Ecc, SignData, Signatory},
    subcommand::{OutputFormat, Subcommand, SubcommandResult},
  },
  anyhow::{anyhow, bail, Context, Error},
  async_trait::async_trait,
  bitcoin::{
    absolute::LockTime,
    bip32::{ChildNumber, DerivationPath, Xpriv, Xpub},
    consensus::encode::serialize,
    hashes::{hash160, sha256d, Hash},
    opcodes::all::OP_RETURN,
    script::{Builder, PushBytesBuf},
    transaction::Version,
    Amount, BlockHash, NetworkKind, OutPoint, PubkeyHash, Script, ScriptBuf, ScriptHash, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
  },
  clap::Parser,
  ecash_tokens::{
    AlpTokenType, GenesisInfo, Protocol, SlpTokenType, TokenId, TokenType, ALP_POLICY_MAX_OUTPUTS,
    OP_RETURN_MAX_BYTES, SLP_MAX_SEND_OUTPUTS,
  },
  lazy_static::lazy_static,
  regex::Regex,
  secp256k1::{Message, PublicKey, SecretKey, SECP256K1},
  serde::{Deserialize, Serialize},
  serde_with::{DeserializeFromStr, SerializeDisplay},
  snafu::{ErrorCompat, Snafu},
  std::{
    backtrace::BacktraceStatus,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    env,
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io, mem,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    sync::{Arc, Mutex},
  },
  tokio::runtime::Runtime,
};

pub use self::{
  action::{Action, PaymentOutput, TokenAction, TokenOutput, TokenRef},
  cashaddr::{AddressType, CashAddress},
  fee_rate::FeeRate,
  indexer::{Indexer, IndexedTx, IndexedTxInput, IndexedTxOutput, ScriptUtxo},
  options::Options,
  selector::{SatsSelectionStrategy, SelectUtxosResult},
  settings::Settings,
  totals::{ActionTotal, RequiredTokenInputs},
  tx_builder::{TxBuilder, TxBuilderInput, TxBuilderOutput},
  utxo::{UtxoToken, WalletUtxo},
  wallet::{
    built_action::{BuiltAction, BuiltTx, PostageTx},
    wallet_action::WalletAction,
    Wallet, WatchOnlyWallet,
  },
};


#[cfg(test)]
use self::test::*;

pub mod action;
pub mod arguments;
pub mod cashaddr;
mod config;
mod error;
mod fee_rate;
pub mod finalize;
pub mod indexer;
mod macros;
pub mod options;
mod re;
pub mod selector;
pub mod settings;
pub mod signatory;
pub mod subcommand;
pub mod totals;
pub mod tx_builder;
pub mod utxo;
pub mod wallet;

type Result<T = (), E = Error> = std::result::Result<T, E>;
type SnafuResult<T = (), E = SnafuError> = std::result::Result<T, E>;

pub const DEFAULT_DUST_SATS: Amount = Amount::from_sat(546);

/// Confirmations a coinbase output needs before it may be spent.
pub const COINBASE_MATURITY: i32 = 100;

/// SLIP-44 coin type of eCash.
const XEC_COIN_TYPE: u32 = 1899;

fn default<T: Default>() -> T {
  Default::default()
}

pub fn main() {
  env_logger::init();

  let args = Arguments::parse();

  let format = args.options.format;

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");

      if let SnafuError::Anyhow { err } = err {
        for (i, err) in err.chain().skip(1).enumerate() {
          if i == 0 {
            eprintln!();
            eprintln!("because:");
          }

          eprintln!("- {err}");
        }

        if env::var_os("RUST_BACKTRACE")
          .map(|val| val == "1")
          .unwrap_or_default()
        {
          eprintln!("{}", err.backtrace());
        }
      } else {
        for (i, err) in err.iter_chain().skip(1).enumerate() {
          if i == 0 {
            eprintln!();
            eprintln!("because:");
          }

          eprintln!("- {err}");
        }

        if let Some(backtrace) = err.backtrace() {
          if backtrace.status() == BacktraceStatus::Captured {
            eprintln!("backtrace:");
            eprintln!("{backtrace}");
          }
        }
      }

      process::exit(1);
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print(format.unwrap_or_default());
      }
    }
  }
}
