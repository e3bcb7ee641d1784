//! Input signing with the BIP143 FORKID sighash.

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigHashVariant {
  All,
  None,
  Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigHashType {
  pub variant: SigHashVariant,
  pub anyone_can_pay: bool,
}

impl SigHashType {
  pub const ALL_BIP143: Self = Self {
    variant: SigHashVariant::All,
    anyone_can_pay: false,
  };

  pub const ALL_ANYONECANPAY_BIP143: Self = Self {
    variant: SigHashVariant::All,
    anyone_can_pay: true,
  };

  const FORKID: u8 = 0x40;
  const ANYONECANPAY: u8 = 0x80;

  pub fn to_u8(self) -> u8 {
    let base = match self.variant {
      SigHashVariant::All => 0x01,
      SigHashVariant::None => 0x02,
      SigHashVariant::Single => 0x03,
    };

    let anyone_can_pay = if self.anyone_can_pay {
      Self::ANYONECANPAY
    } else {
      0
    };

    base | Self::FORKID | anyone_can_pay
  }
}

/// Data about the output an input spends, which the sighash commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignData {
  pub sats: Amount,
  pub output_script: ScriptBuf,
}

pub trait Ecc: Send + Sync {
  fn ecdsa_sign(&self, sk: &SecretKey, msg: [u8; 32]) -> Vec<u8>;
}

pub struct Secp256k1Ecc;

impl Ecc for Secp256k1Ecc {
  fn ecdsa_sign(&self, sk: &SecretKey, msg: [u8; 32]) -> Vec<u8> {
    SECP256K1
      .sign_ecdsa(&Message::from_digest(msg), sk)
      .serialize_der()
      .to_vec()
  }
}

/// Produces placeholder signatures of the maximum DER size, so a transaction
/// can be measured before it is signed.
pub struct EccDummy;

impl EccDummy {
  const SIGNATURE_SIZE: usize = 72;
}

impl Ecc for EccDummy {
  fn ecdsa_sign(&self, _sk: &SecretKey, _msg: [u8; 32]) -> Vec<u8> {
    vec![0; Self::SIGNATURE_SIZE]
  }
}

pub trait Signatory: Send + Sync {
  /// Returns the `scriptSig` for input `input_idx` of `tx`.
  fn sign_input(
    &self,
    ecc: &dyn Ecc,
    tx: &Transaction,
    input_idx: usize,
    sign_data: &SignData,
  ) -> Result<ScriptBuf>;
}

pub struct P2pkhSignatory {
  sk: SecretKey,
  pk: PublicKey,
  sighash: SigHashType,
}

impl P2pkhSignatory {
  pub fn new(sk: SecretKey, pk: PublicKey, sighash: SigHashType) -> Self {
    Self { sk, pk, sighash }
  }
}

impl Signatory for P2pkhSignatory {
  fn sign_input(
    &self,
    ecc: &dyn Ecc,
    tx: &Transaction,
    input_idx: usize,
    sign_data: &SignData,
  ) -> Result<ScriptBuf> {
    let digest = sighash(tx, input_idx, sign_data, self.sighash)?;

    let mut signature = ecc.ecdsa_sign(&self.sk, digest);
    signature.push(self.sighash.to_u8());

    Ok(
      Builder::new()
        .push_slice(PushBytesBuf::try_from(signature)?)
        .push_key(&bitcoin::PublicKey::new(self.pk))
        .into_script(),
    )
  }
}

fn hash_outputs<'a>(outputs: impl IntoIterator<Item = &'a TxOut>) -> [u8; 32] {
  let mut preimage = Vec::new();
  for output in outputs {
    preimage.extend(serialize(output));
  }
  sha256d::Hash::hash(&preimage).to_byte_array()
}

/// BIP143 signature hash with the FORKID flag set in the hash type.
pub fn sighash(
  tx: &Transaction,
  input_idx: usize,
  sign_data: &SignData,
  sighash_type: SigHashType,
) -> Result<[u8; 32]> {
  let input = tx
    .input
    .get(input_idx)
    .ok_or_else(|| anyhow!("input index {input_idx} out of range"))?;

  let hash_prevouts = if sighash_type.anyone_can_pay {
    [0; 32]
  } else {
    let mut preimage = Vec::new();
    for input in &tx.input {
      preimage.extend(serialize(&input.previous_output));
    }
    sha256d::Hash::hash(&preimage).to_byte_array()
  };

  let hash_sequence =
    if sighash_type.anyone_can_pay || sighash_type.variant != SigHashVariant::All {
      [0; 32]
    } else {
      let mut preimage = Vec::new();
      for input in &tx.input {
        preimage.extend(input.sequence.0.to_le_bytes());
      }
      sha256d::Hash::hash(&preimage).to_byte_array()
    };

  let hash_outputs = match sighash_type.variant {
    SigHashVariant::All => hash_outputs(&tx.output),
    SigHashVariant::Single => match tx.output.get(input_idx) {
      Some(output) => hash_outputs([output]),
      None => [0; 32],
    },
    SigHashVariant::None => [0; 32],
  };

  let mut preimage = Vec::new();
  preimage.extend(tx.version.0.to_le_bytes());
  preimage.extend(hash_prevouts);
  preimage.extend(hash_sequence);
  preimage.extend(serialize(&input.previous_output));
  preimage.extend(serialize(&sign_data.output_script));
  preimage.extend(sign_data.sats.to_sat().to_le_bytes());
  preimage.extend(input.sequence.0.to_le_bytes());
  preimage.extend(hash_outputs);
  preimage.extend(tx.lock_time.to_consensus_u32().to_le_bytes());
  preimage.extend(u32::from(sighash_type.to_u8()).to_le_bytes());

  Ok(sha256d::Hash::hash(&preimage).to_byte_array())
}
