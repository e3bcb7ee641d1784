//! Turns a declared `Action` into network-ready outputs.
//!
//! Finalization validates the outputs against the rules of the action's
//! token protocol, appends any token change outputs needed to avoid burning
//! atoms, and replaces the placeholder at index 0 with the encoded token
//! `OP_RETURN`. It is the only place structural rules are enforced, so every
//! violation is a hard error.

use super::*;

mod alp;
mod slp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOutputs {
  /// Outputs as declared, plus token change, with the token `OP_RETURN`
  /// filled in.
  pub payment_outputs: Vec<PaymentOutput>,
  pub tx_outputs: Vec<TxOut>,
}

#[derive(Debug, PartialEq)]
pub enum Error {
  AtomsOverflow {
    token_id: TokenId,
    atoms: u128,
  },
  BlankOpReturnInNonTokenTx,
  BurnExceedsInputs {
    token_id: TokenId,
  },
  ChangeScript {
    message: String,
  },
  DataActionsRequireAlp,
  DuplicateAction {
    kind: &'static str,
    token_id: TokenId,
  },
  Encoding(ecash_tokens::Error),
  ExtraMintQty {
    token_type: TokenType,
    kind: &'static str,
    out_idx: usize,
  },
  GenesisNotFirst {
    index: usize,
  },
  GenesisOutputsWithoutGenesisAction,
  InsufficientInputAtoms {
    token_id: TokenId,
    input_atoms: u128,
    output_atoms: u128,
  },
  LeftoverSpecified,
  ManualOpReturnInTokenTx,
  MintAndSend {
    token_id: TokenId,
  },
  MintBatonOutOfRange {
    token_type: TokenType,
    kind: &'static str,
    out_idx: usize,
  },
  MintBatonWithAtoms {
    count: usize,
  },
  MintQtyAfterBaton {
    token: TokenRef,
    out_idx: usize,
  },
  MintVaultUnsupported,
  MissingMintQty {
    token_type: TokenType,
    genesis: bool,
  },
  MissingOpReturnPlaceholder,
  MultipleOpReturns {
    count: usize,
  },
  MultipleTokenTypes {
    first: TokenType,
    second: TokenType,
  },
  Nft1ChildGenesisAtoms {
    atoms: u64,
  },
  Nft1ChildMissingGroupTokenId,
  NoOutputs,
  NoRoomForChange {
    token_id: TokenId,
    out_idx: usize,
    max: usize,
    token_type: TokenType,
  },
  NonConsecutiveMintBatons {
    token: TokenRef,
    out_idx: usize,
  },
  OpReturnBurnsSats {
    sats: Amount,
  },
  OpReturnTooLarge {
    size: usize,
  },
  SecondMintBaton {
    token_type: TokenType,
    kind: &'static str,
    out_idx: usize,
  },
  SlpBurnWithOutputs,
  SlpGenesisWithTokenIds {
    token_type: TokenType,
  },
  SlpMultipleActions {
    token_type: TokenType,
    count: usize,
  },
  SlpMultipleTokenIds {
    token_type: TokenType,
    count: usize,
  },
  SlpSendWithMint {
    token_type: TokenType,
  },
  TokenOutputOutOfRange {
    token_type: TokenType,
    max: usize,
    out_idx: usize,
  },
  TokenOutputsWithoutActions,
  UnassociatedTokenId {
    token_id: TokenId,
  },
  UnexpectedGroupTokenId {
    token_type: TokenType,
  },
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::AtomsOverflow { token_id, atoms } => write!(
        f,
        "Token change of {atoms} atoms of {token_id} does not fit in a single output"
      ),
      Self::BlankOpReturnInNonTokenTx => write!(
        f,
        "A blank OP_RETURN output (i.e. {{sats: 0n}}) is not allowed in a non-token tx."
      ),
      Self::BurnExceedsInputs { token_id } => write!(
        f,
        "Cannot process burn action for {token_id}: output atoms exceed input atoms less burn atoms."
      ),
      Self::ChangeScript { message } => write!(f, "Failed to get change script: {message}"),
      Self::DataActionsRequireAlp => write!(
        f,
        "Data actions are only supported for ALP_TOKEN_TYPE_STANDARD token actions."
      ),
      Self::DuplicateAction { kind, token_id } => {
        write!(f, "Duplicate {kind} action for tokenId {token_id}")
      }
      Self::Encoding(err) => write!(f, "{err}"),
      Self::ExtraMintQty {
        token_type,
        kind,
        out_idx,
      } => write!(
        f,
        "An {token_type} {kind} tx may have only one mint qty output and it must be at outIdx 1. \
        Found another mint qty output at outIdx {out_idx}."
      ),
      Self::GenesisNotFirst { index } => write!(
        f,
        "GenesisAction must be at index 0 of tokenActions. Found GenesisAction at index {index}."
      ),
      Self::GenesisOutputsWithoutGenesisAction => write!(
        f,
        "Genesis outputs specified without GenesisAction. \
        Must include GenesisAction or remove genesis outputs."
      ),
      Self::InsufficientInputAtoms {
        token_id,
        input_atoms,
        output_atoms,
      } => write!(
        f,
        "Insufficient atoms of {token_id} in inputs ({input_atoms}) \
        to cover atoms specified in outputs {output_atoms}"
      ),
      Self::LeftoverSpecified => write!(
        f,
        "ecash-wallet automatically includes a leftover output. \
        Do not specify a leftover output in the outputs array."
      ),
      Self::ManualOpReturnInTokenTx => write!(
        f,
        "A token tx cannot specify any manual OP_RETURN outputs. \
        Token txs can only include a blank OP_RETURN output (i.e. {{ sats: 0n}} at index 0."
      ),
      Self::MintAndSend { token_id } => write!(
        f,
        "ecash-wallet does not support minting and sending the same token in the same Action. \
        tokenActions MINT and SEND {token_id}."
      ),
      Self::MintBatonOutOfRange {
        token_type,
        kind,
        out_idx,
      } => write!(
        f,
        "An {token_type} {kind} tx mint baton, if present, must be at outIdx 2-255. \
        Mint baton found at outIdx {out_idx}."
      ),
      Self::MintBatonWithAtoms { count } => write!(
        f,
        "Mint baton outputs must have 0 atoms. Found {count} mint baton output{} with non-zero atoms.",
        if *count == 1 { "" } else { "s" }
      ),
      Self::MintQtyAfterBaton { token, out_idx } => write!(
        f,
        "For a given tokenId, an ALP ALP_TOKEN_TYPE_STANDARD Action may not have mint qty outputs \
        at a higher outIdx than mint baton outputs. Mint qty output for {} with preceding mint \
        batons found at outIdx {out_idx}.",
        match token {
          TokenRef::Genesis => "GENESIS action",
          TokenRef::Id(_) => "a tokenId",
        }
      ),
      Self::MintVaultUnsupported => write!(
        f,
        "ecash-wallet does not currently support SLP_TOKEN_TYPE_MINT_VAULT tokens."
      ),
      Self::MissingMintQty {
        token_type,
        genesis,
      } => write!(
        f,
        "{} action for {token_type} token specified, but no mint quantity output found at outIdx 1. \
        This is a spec requirement for SLP {token_type} tokens.",
        if *genesis { "Genesis" } else { "Mint" }
      ),
      Self::MissingOpReturnPlaceholder => write!(
        f,
        "Token action requires a built OP_RETURN at index 0 of outputs, i.e. {{ sats: 0n }}."
      ),
      Self::MultipleOpReturns { count } => write!(
        f,
        "ecash-wallet only supports 1 OP_RETURN per tx. {count} OP_RETURN outputs specified."
      ),
      Self::MultipleTokenTypes { first, second } => write!(
        f,
        "Action must include only one token type. Found (at least) two: {first} and {second}."
      ),
      Self::Nft1ChildGenesisAtoms { atoms } => write!(
        f,
        "An SLP_TOKEN_TYPE_NFT1_CHILD GENESIS tx must have 1 atom at outIdx 1. Found {atoms} atoms."
      ),
      Self::Nft1ChildMissingGroupTokenId => write!(
        f,
        "SLP_TOKEN_TYPE_NFT1_CHILD genesis txs must specify a groupTokenId."
      ),
      Self::NoOutputs => write!(f, "No outputs specified. All actions must have outputs."),
      Self::NoRoomForChange {
        token_id,
        out_idx,
        max,
        token_type,
      } => write!(
        f,
        "Tx needs a token change output to avoid burning atoms of {token_id}, \
        but the token change output would be at outIdx {out_idx} which is greater than \
        the maximum allowed outIdx of {max} for {token_type}."
      ),
      Self::NonConsecutiveMintBatons { token, out_idx } => write!(
        f,
        "An ALP ALP_TOKEN_TYPE_STANDARD Action may only have consecutive mint baton outputs \
        for the same tokenId. Found non-consecutive mint baton output at outIdx {out_idx} for {token}."
      ),
      Self::OpReturnBurnsSats { sats } => write!(
        f,
        "Tx burns {} satoshis in OP_RETURN output. \
        ecash-wallet does not support burning XEC in the OP_RETURN.",
        sats.to_sat()
      ),
      Self::OpReturnTooLarge { size } => write!(
        f,
        "Specified action results in OP_RETURN of {size} bytes, vs max allowed of {OP_RETURN_MAX_BYTES}."
      ),
      Self::SecondMintBaton {
        token_type,
        kind,
        out_idx,
      } => write!(
        f,
        "An {token_type} {kind} tx may only specify exactly 1 mint baton. \
        Found second mint baton at outIdx {out_idx}."
      ),
      Self::SlpBurnWithOutputs => write!(
        f,
        "SLP burns may not specify SLP receive outputs. \
        ecash-wallet will automatically calculate change from SLP burns."
      ),
      Self::SlpGenesisWithTokenIds { token_type } => write!(
        f,
        "An SLP {token_type} Action with a specified genesisAction \
        may not have any other associated token actions."
      ),
      Self::SlpMultipleActions { token_type, count } => write!(
        f,
        "{token_type} token txs may only have a single token action. {count} tokenActions specified."
      ),
      Self::SlpMultipleTokenIds { token_type, count } => write!(
        f,
        "An SLP {token_type} Action may only be associated with a single tokenId. Found {count}."
      ),
      Self::SlpSendWithMint { token_type } => write!(
        f,
        "An SLP {token_type} Action with SEND outputs may not have any MINT outputs."
      ),
      Self::TokenOutputOutOfRange {
        token_type,
        max,
        out_idx,
      } => write!(
        f,
        "An {} {token_type} Action may not have more than {max} token outputs, \
        and no outputs may be at outIdx > {max}. Found output at outIdx {out_idx}.",
        token_type.protocol()
      ),
      Self::TokenOutputsWithoutActions => write!(
        f,
        "Specified outputs imply token actions, but no tokenActions specified."
      ),
      Self::UnassociatedTokenId { token_id } => write!(
        f,
        "Output-specified tokenId {token_id} is not associated with any action. \
        Please ensure that the tokenActions match the outputs specified in the action."
      ),
      Self::UnexpectedGroupTokenId { token_type } => {
        write!(f, "{token_type} genesis txs must not specify a groupTokenId.")
      }
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Encoding(err) => Some(err),
      _ => None,
    }
  }
}

impl From<ecash_tokens::Error> for Error {
  fn from(err: ecash_tokens::Error) -> Self {
    Self::Encoding(err)
  }
}

/// The token type of `action`, if it has token actions. All token actions
/// must share one type.
pub fn token_type(action: &Action) -> Result<Option<TokenType>, Error> {
  let mut token_type = action.genesis_action().and_then(TokenAction::token_type);

  for action_type in action.token_actions.iter().filter_map(TokenAction::token_type) {
    match token_type {
      None => token_type = Some(action_type),
      Some(first) if first != action_type => {
        return Err(Error::MultipleTokenTypes {
          first,
          second: action_type,
        })
      }
      Some(_) => {}
    }
  }

  Ok(token_type)
}

/// Checks the token actions of an action against each other.
pub fn validate_token_actions(token_actions: &[TokenAction]) -> Result<(), Error> {
  let mut send_ids = BTreeSet::new();
  let mut mint_ids = BTreeSet::new();
  let mut burn_ids = BTreeSet::new();

  for (index, action) in token_actions.iter().enumerate() {
    match action {
      TokenAction::Genesis {
        token_type,
        group_token_id,
        ..
      } => {
        if index != 0 {
          return Err(Error::GenesisNotFirst { index });
        }

        match (*token_type, group_token_id) {
          (TokenType::SLP_NFT1_CHILD, None) => return Err(Error::Nft1ChildMissingGroupTokenId),
          (TokenType::SLP_NFT1_CHILD, Some(_)) | (_, None) => {}
          (token_type, Some(_)) => return Err(Error::UnexpectedGroupTokenId { token_type }),
        }
      }
      TokenAction::Send { token_id, .. } => {
        if !send_ids.insert(*token_id) {
          return Err(Error::DuplicateAction {
            kind: "SEND",
            token_id: *token_id,
          });
        }

        if mint_ids.contains(token_id) {
          return Err(Error::MintAndSend {
            token_id: *token_id,
          });
        }
      }
      TokenAction::Mint {
        token_id,
        token_type,
      } => {
        if *token_type == TokenType::SLP_MINT_VAULT {
          return Err(Error::MintVaultUnsupported);
        }

        if !mint_ids.insert(*token_id) {
          return Err(Error::DuplicateAction {
            kind: "MINT",
            token_id: *token_id,
          });
        }

        if send_ids.contains(token_id) {
          return Err(Error::MintAndSend {
            token_id: *token_id,
          });
        }
      }
      TokenAction::Burn { token_id, .. } => {
        if !burn_ids.insert(*token_id) {
          return Err(Error::DuplicateAction {
            kind: "BURN",
            token_id: *token_id,
          });
        }
      }
      TokenAction::Data { .. } => {}
    }
  }

  Ok(())
}

/// The validated shape of a token transaction, shared by the protocol
/// encoders.
pub(crate) struct TokenTx<'a> {
  pub(crate) action: &'a Action,
  pub(crate) token_type: TokenType,
  pub(crate) outputs: &'a [PaymentOutput],
  pub(crate) send_ids: BTreeSet<TokenId>,
  pub(crate) mint_ids: BTreeSet<TokenId>,
}

impl TokenTx<'_> {
  pub(crate) fn genesis(&self) -> Option<&TokenAction> {
    self.action.genesis_action()
  }

  pub(crate) fn is_send_output(&self, output: &TokenOutput) -> bool {
    !output.is_mint_baton
      && output
        .token_id()
        .is_some_and(|token_id| self.send_ids.contains(&token_id))
  }

  /// A non-baton output created by a GENESIS or MINT.
  pub(crate) fn is_mint_qty_output(&self, output: &TokenOutput) -> bool {
    !output.is_mint_baton
      && match output.token {
        TokenRef::Genesis => self.genesis().is_some(),
        TokenRef::Id(token_id) => self.mint_ids.contains(&token_id),
      }
  }

  pub(crate) fn mint_kind(&self) -> &'static str {
    if self.genesis().is_some() {
      "GENESIS"
    } else {
      "MINT"
    }
  }
}

/// Validates and completes the outputs of `action`, given the UTXOs
/// selected to fund it. `change_script` is called once per token change
/// output.
pub fn finalize_outputs<F, E>(
  action: &Action,
  selected: &[WalletUtxo],
  mut change_script: F,
) -> Result<FinalizedOutputs, Error>
where
  F: FnMut() -> Result<ScriptBuf, E>,
  E: Display,
{
  let dust = action.dust_sats();
  let mut outputs = action.outputs.clone();

  if outputs.is_empty() {
    return Err(Error::NoOutputs);
  }

  if outputs
    .iter()
    .any(|output| matches!(output, PaymentOutput::Leftover(_)))
  {
    return Err(Error::LeftoverSpecified);
  }

  let token_type = token_type(action)?;

  if action
    .token_actions
    .iter()
    .any(|action| matches!(action, TokenAction::Data { .. }))
    && token_type != Some(TokenType::ALP_STANDARD)
  {
    return Err(Error::DataActionsRequireAlp);
  }

  let op_returns = outputs
    .iter()
    .filter(|output| output.is_op_return())
    .collect::<Vec<&PaymentOutput>>();

  match (token_type, op_returns.as_slice()) {
    (Some(_), [_, ..]) => return Err(Error::ManualOpReturnInTokenTx),
    (None, [op_return]) => {
      let sats = op_return.sats(dust);
      if sats != Amount::ZERO {
        return Err(Error::OpReturnBurnsSats { sats });
      }
    }
    (None, [_, _, ..]) => {
      return Err(Error::MultipleOpReturns {
        count: op_returns.len(),
      })
    }
    _ => {}
  }

  let Some(token_type) = token_type else {
    if outputs
      .iter()
      .any(|output| matches!(output, PaymentOutput::Placeholder))
    {
      return Err(Error::BlankOpReturnInNonTokenTx);
    }

    if outputs.iter().any(|output| output.token().is_some()) {
      return Err(Error::TokenOutputsWithoutActions);
    }

    return Ok(FinalizedOutputs {
      tx_outputs: outputs.iter().map(|output| output.to_tx_out(dust)).collect(),
      payment_outputs: outputs,
    });
  };

  if token_type == TokenType::SLP_MINT_VAULT {
    return Err(Error::MintVaultUnsupported);
  }

  validate_token_actions(&action.token_actions)?;

  if token_type.protocol() == Protocol::Slp && action.token_actions.len() > 1 {
    return Err(Error::SlpMultipleActions {
      token_type,
      count: action.token_actions.len(),
    });
  }

  let token_outputs = || outputs.iter().filter_map(PaymentOutput::token);

  if action.genesis_action().is_none()
    && token_outputs().any(|output| output.token == TokenRef::Genesis)
  {
    return Err(Error::GenesisOutputsWithoutGenesisAction);
  }

  let batons_with_atoms = token_outputs()
    .filter(|output| output.is_mint_baton && output.atoms != 0)
    .count();

  if batons_with_atoms > 0 {
    return Err(Error::MintBatonWithAtoms {
      count: batons_with_atoms,
    });
  }

  let send_ids = action.send_token_ids();
  let mint_ids = action.mint_token_ids();
  let burn_ids = action.burn_token_ids();

  let output_token_ids = token_outputs()
    .filter_map(TokenOutput::token_id)
    .collect::<BTreeSet<TokenId>>();

  if token_type.protocol() == Protocol::Slp && !output_token_ids.is_empty() && !burn_ids.is_empty()
  {
    return Err(Error::SlpBurnWithOutputs);
  }

  if let Some(token_id) = output_token_ids.iter().find(|token_id| {
    !send_ids.contains(token_id) && !burn_ids.contains(token_id) && !mint_ids.contains(token_id)
  }) {
    return Err(Error::UnassociatedTokenId {
      token_id: *token_id,
    });
  }

  if outputs.first() != Some(&PaymentOutput::Placeholder) {
    return Err(Error::MissingOpReturnPlaceholder);
  }

  let max_out_idx = match token_type.protocol() {
    Protocol::Slp => SLP_MAX_SEND_OUTPUTS,
    Protocol::Alp => ALP_POLICY_MAX_OUTPUTS,
  };

  let send_order = action
    .token_actions
    .iter()
    .filter_map(|action| match action {
      TokenAction::Send { token_id, .. } => Some(*token_id),
      _ => None,
    })
    .collect::<Vec<TokenId>>();

  for token_id in send_order {
    let input_atoms = selected
      .iter()
      .filter(|utxo| utxo.token_id() == Some(token_id))
      .map(|utxo| u128::from(utxo.atoms()))
      .sum::<u128>();

    let output_atoms = outputs
      .iter()
      .filter_map(PaymentOutput::token)
      .filter(|output| output.token_id() == Some(token_id))
      .map(|output| u128::from(output.atoms))
      .sum::<u128>();

    if input_atoms < output_atoms {
      return Err(Error::InsufficientInputAtoms {
        token_id,
        input_atoms,
        output_atoms,
      });
    }

    let burn_atoms = u128::from(action.burn_atoms(token_id).unwrap_or_default());

    let change_atoms = input_atoms
      .checked_sub(output_atoms)
      .and_then(|remaining| remaining.checked_sub(burn_atoms))
      .ok_or(Error::BurnExceedsInputs { token_id })?;

    if change_atoms == 0 {
      continue;
    }

    let out_idx = outputs.len();

    if out_idx > max_out_idx {
      return Err(Error::NoRoomForChange {
        token_id,
        out_idx,
        max: max_out_idx,
        token_type,
      });
    }

    let atoms = u64::try_from(change_atoms).map_err(|_| Error::AtomsOverflow {
      token_id,
      atoms: change_atoms,
    })?;

    let script = change_script().map_err(|err| Error::ChangeScript {
      message: err.to_string(),
    })?;

    log::debug!("adding token change of {atoms} atoms of {token_id} at outIdx {out_idx}");

    outputs.push(TokenOutput::new(token_id, atoms, script).into());
  }

  let tx = TokenTx {
    action,
    token_type,
    outputs: &outputs,
    send_ids,
    mint_ids,
  };

  let op_return = match token_type {
    TokenType::Slp(slp_type) => slp::op_return(&tx, slp_type, &output_token_ids)?,
    TokenType::Alp(alp_type) => alp::op_return(&tx, alp_type)?,
  };

  outputs[0] = PaymentOutput::plain(Amount::ZERO, op_return);

  Ok(FinalizedOutputs {
    tx_outputs: outputs.iter().map(|output| output.to_tx_out(dust)).collect(),
    payment_outputs: outputs,
  })
}
