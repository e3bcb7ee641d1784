//! Signed transaction assembly with an optional leftover output.
//!
//! A `TxBuilder` holds inputs, each optionally carrying the `SignData` of
//! the output it spends and a `Signatory` that produces its `scriptSig`, and
//! outputs, at most one of which may be a `Leftover`.
//!
//! The leftover output receives whatever value remains after the fixed
//! outputs and the fee are paid. To price the fee, the transaction is first
//! signed with placeholder signatures of maximum size, and the fee at the
//! requested rate is computed from that size. If the remainder is below the
//! dust threshold the leftover output is dropped and the remainder goes to
//! the fee. If the inputs cannot pay for the fee with the leftover present,
//! the leftover is dropped and the smaller transaction is priced again before
//! giving up.
//!
//! Without a leftover output no fee check is made. This is how partially
//! funded transactions are built for a second party to complete.

use super::*;

#[derive(Debug, PartialEq)]
pub enum Error {
  InsufficientInputValue {
    input_sats: Amount,
    fixed_output_sats: Amount,
    fee: Amount,
  },
  LeftoverNeedsSignData,
  MissingSignData {
    input_idx: usize,
  },
  MultipleLeftovers,
  Sign {
    input_idx: usize,
    message: String,
  },
  ValueOverflow,
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::InsufficientInputValue {
        input_sats,
        fixed_output_sats,
        fee,
      } => write!(
        f,
        "Insufficient input value ({}): Can only pay for {} fees, but {} required",
        input_sats.to_sat(),
        i128::from(input_sats.to_sat()) - i128::from(fixed_output_sats.to_sat()),
        fee.to_sat(),
      ),
      Self::LeftoverNeedsSignData => write!(
        f,
        "Using a leftover output requires setting SignData.sats for all inputs"
      ),
      Self::MissingSignData { input_idx } => {
        write!(f, "Input {input_idx} has a signatory but no SignData")
      }
      Self::MultipleLeftovers => write!(f, "Multiple leftover outputs are not supported"),
      Self::Sign { input_idx, message } => {
        write!(f, "Failed to sign input {input_idx}: {message}")
      }
      Self::ValueOverflow => write!(f, "arithmetic overflow calculating output value"),
    }
  }
}

impl std::error::Error for Error {}

#[derive(Clone)]
pub struct TxBuilderInput {
  pub prev_out: OutPoint,
  pub sequence: Sequence,
  pub script_sig: ScriptBuf,
  pub sign_data: Option<SignData>,
  pub signatory: Option<Arc<dyn Signatory>>,
}

impl TxBuilderInput {
  pub fn new(prev_out: OutPoint, sign_data: SignData, signatory: Arc<dyn Signatory>) -> Self {
    Self {
      prev_out,
      sequence: Sequence::MAX,
      script_sig: ScriptBuf::new(),
      sign_data: Some(sign_data),
      signatory: Some(signatory),
    }
  }
}

impl fmt::Debug for TxBuilderInput {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    f.debug_struct("TxBuilderInput")
      .field("prev_out", &self.prev_out)
      .field("sequence", &self.sequence)
      .field("script_sig", &self.script_sig)
      .field("sign_data", &self.sign_data)
      .field("signatory", &self.signatory.is_some())
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxBuilderOutput {
  Fixed(TxOut),
  Leftover(ScriptBuf),
}

#[derive(Debug, Clone)]
pub struct TxBuilder {
  pub version: Version,
  pub lock_time: LockTime,
  pub inputs: Vec<TxBuilderInput>,
  pub outputs: Vec<TxBuilderOutput>,
}

impl TxBuilder {
  pub fn new(inputs: Vec<TxBuilderInput>, outputs: Vec<TxBuilderOutput>) -> Self {
    Self {
      version: Version::TWO,
      lock_time: LockTime::ZERO,
      inputs,
      outputs,
    }
  }

  /// Builder that reproduces `tx`, keeping its existing `scriptSig`s.
  pub fn from_tx(tx: &Transaction) -> Self {
    Self {
      version: tx.version,
      lock_time: tx.lock_time,
      inputs: tx
        .input
        .iter()
        .map(|input| TxBuilderInput {
          prev_out: input.previous_output,
          sequence: input.sequence,
          script_sig: input.script_sig.clone(),
          sign_data: None,
          signatory: None,
        })
        .collect(),
      outputs: tx
        .output
        .iter()
        .cloned()
        .map(TxBuilderOutput::Fixed)
        .collect(),
    }
  }

  /// Sum of input values, if every input has `SignData`.
  pub fn input_sats(&self) -> Option<Amount> {
    self.inputs.iter().try_fold(Amount::ZERO, |sum, input| {
      sum.checked_add(input.sign_data.as_ref()?.sats)
    })
  }

  pub fn sign(&self, fee_per_kb: FeeRate, dust: Amount) -> Result<Transaction, Error> {
    self.sign_with(&Secp256k1Ecc, fee_per_kb, dust)
  }

  pub fn sign_with(
    &self,
    ecc: &dyn Ecc,
    fee_per_kb: FeeRate,
    dust: Amount,
  ) -> Result<Transaction, Error> {
    let mut leftover_idx = None;
    let mut fixed_output_sats = Amount::ZERO;
    let mut outputs = Vec::new();

    for (i, output) in self.outputs.iter().enumerate() {
      match output {
        TxBuilderOutput::Fixed(output) => {
          fixed_output_sats = fixed_output_sats
            .checked_add(output.value)
            .ok_or(Error::ValueOverflow)?;
          outputs.push(output.clone());
        }
        TxBuilderOutput::Leftover(script) => {
          if leftover_idx.is_some() {
            return Err(Error::MultipleLeftovers);
          }
          leftover_idx = Some(i);
          outputs.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: script.clone(),
          });
        }
      }
    }

    if let Some(leftover_idx) = leftover_idx {
      let input_sats = self.input_sats().ok_or(Error::LeftoverNeedsSignData)?;

      let fee = fee_per_kb.fee(self.sign_outputs(&EccDummy, outputs.clone())?.total_size());

      let leftover = input_sats
        .checked_sub(fixed_output_sats)
        .and_then(|remaining| remaining.checked_sub(fee));

      match leftover {
        Some(leftover) if leftover >= dust => outputs[leftover_idx].value = leftover,
        Some(_) => {
          outputs.remove(leftover_idx);
        }
        None => {
          outputs.remove(leftover_idx);

          let fee = fee_per_kb.fee(self.sign_outputs(&EccDummy, outputs.clone())?.total_size());

          let required = fixed_output_sats
            .checked_add(fee)
            .ok_or(Error::ValueOverflow)?;

          if input_sats < required {
            return Err(Error::InsufficientInputValue {
              input_sats,
              fixed_output_sats,
              fee,
            });
          }
        }
      }
    }

    self.sign_outputs(ecc, outputs)
  }

  fn sign_outputs(&self, ecc: &dyn Ecc, outputs: Vec<TxOut>) -> Result<Transaction, Error> {
    let mut tx = Transaction {
      version: self.version,
      lock_time: self.lock_time,
      input: self
        .inputs
        .iter()
        .map(|input| TxIn {
          previous_output: input.prev_out,
          script_sig: input.script_sig.clone(),
          sequence: input.sequence,
          witness: Witness::new(),
        })
        .collect(),
      output: outputs,
    };

    for (input_idx, input) in self.inputs.iter().enumerate() {
      let Some(signatory) = &input.signatory else {
        continue;
      };

      let sign_data = input
        .sign_data
        .as_ref()
        .ok_or(Error::MissingSignData { input_idx })?;

      tx.input[input_idx].script_sig = signatory
        .sign_input(ecc, &tx, input_idx, sign_data)
        .map_err(|err| Error::Sign {
          input_idx,
          message: err.to_string(),
        })?;
    }

    Ok(tx)
  }
}
