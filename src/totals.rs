//! Resource requirements of an `Action`, independent of any UTXO set.

use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequiredTokenInputs {
  pub atoms: u128,
  /// Set for tokens burned without a SEND. No change output can return a
  /// remainder, so the inputs must sum to exactly `atoms`.
  pub atoms_must_be_exact: bool,
  pub needs_mint_baton: bool,
  /// Human-readable shortfall, set on the missing-token entries of a failed
  /// selection.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTotal {
  pub sats: Amount,
  pub tokens: BTreeMap<TokenId, RequiredTokenInputs>,
  /// Group token an NFT1 child genesis must spend.
  pub group_token_id: Option<TokenId>,
}

impl ActionTotal {
  pub fn new(action: &Action) -> Self {
    let dust = action.dust_sats();

    let send_ids = action.send_token_ids();
    let burn_ids = action.burn_token_ids();

    let group_token_id = action
      .genesis_action()
      .and_then(|genesis| match genesis {
        TokenAction::Genesis {
          token_type: TokenType::SLP_NFT1_CHILD,
          group_token_id,
          ..
        } => *group_token_id,
        _ => None,
      });

    let mut tokens = BTreeMap::<TokenId, RequiredTokenInputs>::new();

    for output in action.outputs.iter().filter_map(PaymentOutput::token) {
      let Some(token_id) = output.token_id() else {
        continue;
      };

      if send_ids.contains(&token_id) || burn_ids.contains(&token_id) {
        tokens.entry(token_id).or_default().atoms += u128::from(output.atoms);
      }
    }

    for token_id in &burn_ids {
      let burn_atoms = u128::from(action.burn_atoms(*token_id).unwrap_or_default());

      if send_ids.contains(token_id) {
        tokens.entry(*token_id).or_default().atoms += burn_atoms;
      } else {
        tokens.insert(
          *token_id,
          RequiredTokenInputs {
            atoms: burn_atoms,
            atoms_must_be_exact: true,
            ..default()
          },
        );
      }
    }

    for token_id in action.mint_token_ids() {
      tokens.entry(token_id).or_default().needs_mint_baton = true;
    }

    let sats = action
      .outputs
      .iter()
      .filter(|output| !matches!(output, PaymentOutput::Leftover(_)))
      .try_fold(Amount::ZERO, |total, output| {
        total.checked_add(output.sats(dust))
      })
      .unwrap_or(Amount::MAX);

    Self {
      sats,
      tokens,
      group_token_id,
    }
  }
}
