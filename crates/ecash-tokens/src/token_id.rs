use super::*;

/// The id of a token, which is the txid of its GENESIS transaction.
///
/// Ordering follows the displayed hex, so sorted token ids read in the same
/// order as their string forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct TokenId(Txid);

impl TokenId {
  pub fn txid(self) -> Txid {
    self.0
  }

  /// Bytes in display order, as SLP pushes them.
  pub fn slp_bytes(self) -> [u8; 32] {
    let mut bytes = self.0.to_byte_array();
    bytes.reverse();
    bytes
  }

  /// Bytes in internal order, as ALP serializes them.
  pub fn alp_bytes(self) -> [u8; 32] {
    self.0.to_byte_array()
  }
}

impl From<Txid> for TokenId {
  fn from(txid: Txid) -> Self {
    Self(txid)
  }
}

impl fmt::Display for TokenId {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for TokenId {
  type Err = <Txid as FromStr>::Err;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self(s.parse()?))
  }
}

impl Ord for TokenId {
  fn cmp(&self, other: &Self) -> Ordering {
    self.slp_bytes().cmp(&other.slp_bytes())
  }
}

impl PartialOrd for TokenId {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
