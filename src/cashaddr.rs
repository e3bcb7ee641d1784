//! CashAddr encoding of P2PKH and P2SH output scripts.
//!
//! A cashaddr is `<prefix>:<payload><checksum>`, where the payload is a
//! version byte followed by the 20-byte hash, regrouped into 5-bit words, and
//! the checksum is a 40-bit BCH code over the prefix and payload.

use super::*;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const CHECKSUM_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
  P2pkh,
  P2sh,
}

impl AddressType {
  fn version_byte(self) -> u8 {
    match self {
      Self::P2pkh => 0x00,
      Self::P2sh => 0x08,
    }
  }

  fn from_version_byte(version_byte: u8) -> Option<Self> {
    match version_byte {
      0x00 => Some(Self::P2pkh),
      0x08 => Some(Self::P2sh),
      _ => None,
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct CashAddress {
  prefix: String,
  address_type: AddressType,
  hash: [u8; 20],
}

impl CashAddress {
  pub const MAINNET_PREFIX: &'static str = "ecash";

  pub fn p2pkh(hash: PubkeyHash) -> Self {
    Self {
      prefix: Self::MAINNET_PREFIX.into(),
      address_type: AddressType::P2pkh,
      hash: hash.to_byte_array(),
    }
  }

  pub fn p2pkh_from_pubkey(pubkey: &PublicKey) -> Self {
    Self::p2pkh(PubkeyHash::from_raw_hash(hash160::Hash::hash(
      &pubkey.serialize(),
    )))
  }

  pub fn p2sh(hash: ScriptHash) -> Self {
    Self {
      prefix: Self::MAINNET_PREFIX.into(),
      address_type: AddressType::P2sh,
      hash: hash.to_byte_array(),
    }
  }

  /// Returns the address paid by `script`, if it is P2PKH or P2SH.
  pub fn from_script(script: &Script) -> Option<Self> {
    let bytes = script.as_bytes();

    let (address_type, hash) = if script.is_p2pkh() {
      (AddressType::P2pkh, &bytes[3..23])
    } else if script.is_p2sh() {
      (AddressType::P2sh, &bytes[2..22])
    } else {
      return None;
    };

    Some(Self {
      prefix: Self::MAINNET_PREFIX.into(),
      address_type,
      hash: hash.try_into().ok()?,
    })
  }

  pub fn with_prefix(self, prefix: &str) -> Self {
    Self {
      prefix: prefix.to_lowercase(),
      ..self
    }
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  pub fn address_type(&self) -> AddressType {
    self.address_type
  }

  pub fn hash(&self) -> [u8; 20] {
    self.hash
  }

  pub fn script(&self) -> ScriptBuf {
    match self.address_type {
      AddressType::P2pkh => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(self.hash)),
      AddressType::P2sh => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(self.hash)),
    }
  }

  fn payload(&self) -> Vec<u8> {
    let mut bytes = vec![self.address_type.version_byte()];
    bytes.extend_from_slice(&self.hash);
    convert_bits(&bytes, 8, 5, true).unwrap_or_default()
  }
}

fn prefix_words(prefix: &str) -> impl Iterator<Item = u8> + '_ {
  prefix
    .bytes()
    .map(|c| c & 0x1f)
    .chain(std::iter::once(0))
}

fn poly_mod(words: impl IntoIterator<Item = u8>) -> u64 {
  const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
  ];

  let mut c = 1u64;

  for word in words {
    let c0 = c >> 35;
    c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(word);

    for (i, generator) in GENERATORS.iter().enumerate() {
      if (c0 >> i) & 1 == 1 {
        c ^= generator;
      }
    }
  }

  c ^ 1
}

#[allow(clippy::cast_possible_truncation)]
fn checksum(prefix: &str, payload: &[u8]) -> [u8; CHECKSUM_LEN] {
  let poly = poly_mod(
    prefix_words(prefix)
      .chain(payload.iter().copied())
      .chain([0; CHECKSUM_LEN]),
  );

  let mut checksum = [0; CHECKSUM_LEN];

  for (i, word) in checksum.iter_mut().enumerate() {
    *word = ((poly >> (5 * (CHECKSUM_LEN - 1 - i))) & 0x1f) as u8;
  }

  checksum
}

#[allow(clippy::cast_possible_truncation)]
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
  let mut acc = 0u32;
  let mut bits = 0u32;
  let max = (1u32 << to) - 1;
  let mut out = Vec::new();

  for value in data {
    let value = u32::from(*value);

    if value >> from != 0 {
      return None;
    }

    acc = (acc << from) | value;
    bits += from;

    while bits >= to {
      bits -= to;
      out.push(((acc >> bits) & max) as u8);
    }
  }

  if pad {
    if bits > 0 {
      out.push(((acc << (to - bits)) & max) as u8);
    }
  } else if bits >= from || ((acc << (to - bits)) & max) != 0 {
    return None;
  }

  Some(out)
}

impl Display for CashAddress {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let payload = self.payload();
    let checksum = checksum(&self.prefix, &payload);

    write!(f, "{}:", self.prefix)?;

    for word in payload.iter().chain(checksum.iter()) {
      write!(f, "{}", char::from(CHARSET[usize::from(*word)]))?;
    }

    Ok(())
  }
}

impl FromStr for CashAddress {
  type Err = SnafuError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = |reason| error::CashAddressParse { input: s, reason }.build();

    let lowercase = s.to_lowercase();

    if lowercase != s && s.to_uppercase() != s {
      return Err(invalid("mixed case"));
    }

    let captures = re::CASHADDR
      .captures(&lowercase)
      .ok_or_else(|| invalid("invalid format"))?;

    let prefix = captures
      .get(2)
      .map(|m| m.as_str())
      .unwrap_or(Self::MAINNET_PREFIX);

    let words = captures
      .get(3)
      .ok_or_else(|| invalid("invalid format"))?
      .as_str()
      .bytes()
      .map(|c| {
        CHARSET
          .iter()
          .position(|x| *x == c)
          .and_then(|i| u8::try_from(i).ok())
      })
      .collect::<Option<Vec<u8>>>()
      .ok_or_else(|| invalid("invalid character"))?;

    if poly_mod(prefix_words(prefix).chain(words.iter().copied())) != 0 {
      return Err(invalid("invalid checksum"));
    }

    let bytes = convert_bits(&words[..words.len() - CHECKSUM_LEN], 5, 8, false)
      .ok_or_else(|| invalid("invalid padding"))?;

    let (version_byte, hash) = bytes
      .split_first()
      .ok_or_else(|| invalid("empty payload"))?;

    Ok(Self {
      prefix: prefix.into(),
      address_type: AddressType::from_version_byte(*version_byte)
        .ok_or_else(|| invalid("unsupported version byte"))?,
      hash: hash
        .try_into()
        .map_err(|_| invalid("invalid hash length"))?,
    })
  }
}
