//! The caller's declared intent for a single transaction.
//!
//! An `Action` lists the outputs the caller wants, in order, and the token
//! operations they imply. Output order is significant: both token protocols
//! color outputs by index, so the index of every output in `outputs` is the
//! index it will have in the signed transaction.

use super::*;

/// Which token a token output carries. Outputs of a GENESIS carry the token
/// being created, whose id is not known until the transaction is signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenRef {
  Genesis,
  Id(TokenId),
}

impl Display for TokenRef {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::Genesis => write!(f, "GENESIS action"),
      Self::Id(token_id) => write!(f, "tokenId {token_id}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOutput {
  /// Defaults to the action's dust amount.
  pub sats: Option<Amount>,
  pub script: ScriptBuf,
  pub token: TokenRef,
  pub atoms: u64,
  pub is_mint_baton: bool,
}

impl TokenOutput {
  pub fn new(token_id: TokenId, atoms: u64, script: ScriptBuf) -> Self {
    Self {
      sats: None,
      script,
      token: TokenRef::Id(token_id),
      atoms,
      is_mint_baton: false,
    }
  }

  pub fn genesis(atoms: u64, script: ScriptBuf) -> Self {
    Self {
      sats: None,
      script,
      token: TokenRef::Genesis,
      atoms,
      is_mint_baton: false,
    }
  }

  pub fn mint_baton(token: TokenRef, script: ScriptBuf) -> Self {
    Self {
      sats: None,
      script,
      token,
      atoms: 0,
      is_mint_baton: true,
    }
  }

  pub fn token_id(&self) -> Option<TokenId> {
    match self.token {
      TokenRef::Genesis => None,
      TokenRef::Id(token_id) => Some(token_id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutput {
  /// `{ sats: 0 }` at index 0 of a token tx. Replaced by the token
  /// `OP_RETURN` during finalization.
  Placeholder,
  Plain {
    sats: Amount,
    script: ScriptBuf,
  },
  Token(TokenOutput),
  /// Receives whatever is left after outputs and fee. Only the wallet adds
  /// these.
  Leftover(ScriptBuf),
}

impl PaymentOutput {
  pub fn plain(sats: Amount, script: ScriptBuf) -> Self {
    Self::Plain { sats, script }
  }

  pub fn token(&self) -> Option<&TokenOutput> {
    match self {
      Self::Token(output) => Some(output),
      _ => None,
    }
  }

  pub fn script(&self) -> Option<&Script> {
    match self {
      Self::Placeholder => None,
      Self::Plain { script, .. } | Self::Leftover(script) => Some(script),
      Self::Token(output) => Some(&output.script),
    }
  }

  pub fn is_op_return(&self) -> bool {
    self
      .script()
      .and_then(|script| script.as_bytes().first())
      .is_some_and(|opcode| *opcode == OP_RETURN.to_u8())
  }

  /// Value this output needs from the inputs. A leftover needs nothing.
  pub fn sats(&self, dust: Amount) -> Amount {
    match self {
      Self::Placeholder | Self::Leftover(_) => Amount::ZERO,
      Self::Plain { sats, .. } => *sats,
      Self::Token(output) => output.sats.unwrap_or(dust),
    }
  }

  pub fn to_tx_out(&self, dust: Amount) -> TxOut {
    TxOut {
      value: self.sats(dust),
      script_pubkey: self.script().map(Script::to_owned).unwrap_or_default(),
    }
  }
}

impl From<TokenOutput> for PaymentOutput {
  fn from(output: TokenOutput) -> Self {
    Self::Token(output)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
  Genesis {
    token_type: TokenType,
    genesis_info: GenesisInfo,
    /// Required for, and only allowed on, NFT1 child genesis.
    group_token_id: Option<TokenId>,
  },
  Send {
    token_id: TokenId,
    token_type: TokenType,
  },
  Mint {
    token_id: TokenId,
    token_type: TokenType,
  },
  Burn {
    token_id: TokenId,
    token_type: TokenType,
    burn_atoms: u64,
  },
  /// Arbitrary eMPP push, appended in order with the token pushes.
  Data {
    data: Vec<u8>,
  },
}

impl TokenAction {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Genesis { .. } => "GENESIS",
      Self::Send { .. } => "SEND",
      Self::Mint { .. } => "MINT",
      Self::Burn { .. } => "BURN",
      Self::Data { .. } => "DATA",
    }
  }

  pub fn token_id(&self) -> Option<TokenId> {
    match self {
      Self::Send { token_id, .. } | Self::Mint { token_id, .. } | Self::Burn { token_id, .. } => {
        Some(*token_id)
      }
      Self::Genesis { .. } | Self::Data { .. } => None,
    }
  }

  pub fn token_type(&self) -> Option<TokenType> {
    match self {
      Self::Genesis { token_type, .. }
      | Self::Send { token_type, .. }
      | Self::Mint { token_type, .. }
      | Self::Burn { token_type, .. } => Some(*token_type),
      Self::Data { .. } => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Action {
  pub outputs: Vec<PaymentOutput>,
  pub token_actions: Vec<TokenAction>,
  pub dust_sats: Option<Amount>,
  pub fee_per_kb: Option<FeeRate>,
  /// Spent before any other UTXO, in this order.
  pub required_utxos: Vec<OutPoint>,
  /// Build without a trailing sats change output.
  pub no_change: bool,
}

impl Action {
  pub fn dust_sats(&self) -> Amount {
    self.dust_sats.unwrap_or(DEFAULT_DUST_SATS)
  }

  pub fn fee_per_kb(&self) -> FeeRate {
    self.fee_per_kb.unwrap_or_default()
  }

  pub fn genesis_action(&self) -> Option<&TokenAction> {
    self
      .token_actions
      .iter()
      .find(|action| matches!(action, TokenAction::Genesis { .. }))
  }

  fn token_ids_of(&self, kind: &str) -> BTreeSet<TokenId> {
    self
      .token_actions
      .iter()
      .filter(|action| action.kind() == kind)
      .filter_map(TokenAction::token_id)
      .collect()
  }

  pub fn send_token_ids(&self) -> BTreeSet<TokenId> {
    self.token_ids_of("SEND")
  }

  pub fn mint_token_ids(&self) -> BTreeSet<TokenId> {
    self.token_ids_of("MINT")
  }

  pub fn burn_token_ids(&self) -> BTreeSet<TokenId> {
    self.token_ids_of("BURN")
  }

  pub fn burn_atoms(&self, token_id: TokenId) -> Option<u64> {
    self.token_actions.iter().find_map(|action| match action {
      TokenAction::Burn {
        token_id: id,
        burn_atoms,
        ..
      } if *id == token_id => Some(*burn_atoms),
      _ => None,
    })
  }

  /// Token type of outputs carrying `token`, as declared by the actions.
  pub fn token_type_of(&self, token: TokenRef) -> Option<TokenType> {
    match token {
      TokenRef::Genesis => self.genesis_action().and_then(TokenAction::token_type),
      TokenRef::Id(token_id) => self
        .token_actions
        .iter()
        .find(|action| action.token_id() == Some(token_id))
        .and_then(TokenAction::token_type),
    }
  }
}
