use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Protocol {
  #[display("SLP")]
  Slp,
  #[display("ALP")]
  Alp,
}

impl FromStr for Protocol {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "slp" => Ok(Self::Slp),
      "alp" => Ok(Self::Alp),
      _ => Err(format!("unknown token protocol `{s}`")),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SlpTokenType {
  #[display("SLP_TOKEN_TYPE_FUNGIBLE")]
  Fungible,
  #[display("SLP_TOKEN_TYPE_MINT_VAULT")]
  MintVault,
  #[display("SLP_TOKEN_TYPE_NFT1_GROUP")]
  Nft1Group,
  #[display("SLP_TOKEN_TYPE_NFT1_CHILD")]
  Nft1Child,
}

impl SlpTokenType {
  /// The type byte in SLP pushes.
  pub fn number(self) -> u8 {
    match self {
      Self::Fungible => 0x01,
      Self::MintVault => 0x02,
      Self::Nft1Group => 0x81,
      Self::Nft1Child => 0x41,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AlpTokenType {
  #[display("ALP_TOKEN_TYPE_STANDARD")]
  Standard,
}

impl AlpTokenType {
  pub fn number(self) -> u8 {
    match self {
      Self::Standard => 0x00,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, DeserializeFromStr, SerializeDisplay,
)]
pub enum TokenType {
  #[display("{_0}")]
  Slp(SlpTokenType),
  #[display("{_0}")]
  Alp(AlpTokenType),
}

impl TokenType {
  pub const SLP_FUNGIBLE: Self = Self::Slp(SlpTokenType::Fungible);
  pub const SLP_MINT_VAULT: Self = Self::Slp(SlpTokenType::MintVault);
  pub const SLP_NFT1_GROUP: Self = Self::Slp(SlpTokenType::Nft1Group);
  pub const SLP_NFT1_CHILD: Self = Self::Slp(SlpTokenType::Nft1Child);
  pub const ALP_STANDARD: Self = Self::Alp(AlpTokenType::Standard);

  const ALL: [Self; 5] = [
    Self::SLP_FUNGIBLE,
    Self::SLP_MINT_VAULT,
    Self::SLP_NFT1_GROUP,
    Self::SLP_NFT1_CHILD,
    Self::ALP_STANDARD,
  ];

  pub fn protocol(self) -> Protocol {
    match self {
      Self::Slp(_) => Protocol::Slp,
      Self::Alp(_) => Protocol::Alp,
    }
  }

  pub fn number(self) -> u8 {
    match self {
      Self::Slp(slp) => slp.number(),
      Self::Alp(alp) => alp.number(),
    }
  }
}

impl FromStr for TokenType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|token_type| token_type.to_string() == s)
      .ok_or_else(|| format!("unknown token type `{s}`"))
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  #[test]
  fn display() {
    assert_eq!(TokenType::SLP_FUNGIBLE.to_string(), "SLP_TOKEN_TYPE_FUNGIBLE");
    assert_eq!(TokenType::SLP_NFT1_CHILD.to_string(), "SLP_TOKEN_TYPE_NFT1_CHILD");
    assert_eq!(TokenType::ALP_STANDARD.to_string(), "ALP_TOKEN_TYPE_STANDARD");
    assert_eq!(TokenType::ALP_STANDARD.protocol().to_string(), "ALP");
    assert_eq!(TokenType::SLP_NFT1_GROUP.protocol().to_string(), "SLP");
  }

  #[test]
  fn numbers() {
    assert_eq!(TokenType::SLP_FUNGIBLE.number(), 1);
    assert_eq!(TokenType::SLP_MINT_VAULT.number(), 2);
    assert_eq!(TokenType::SLP_NFT1_GROUP.number(), 0x81);
    assert_eq!(TokenType::SLP_NFT1_CHILD.number(), 0x41);
    assert_eq!(TokenType::ALP_STANDARD.number(), 0);
  }

  #[test]
  fn round_trip_strings() {
    for token_type in TokenType::ALL {
      assert_eq!(token_type.to_string().parse::<TokenType>(), Ok(token_type));
    }

    assert!("SLP_TOKEN_TYPE_UNKNOWN".parse::<TokenType>().is_err());
  }

  #[test]
  fn protocol_from_str() {
    assert_eq!("slp".parse::<Protocol>(), Ok(Protocol::Slp));
    assert_eq!("ALP".parse::<Protocol>(), Ok(Protocol::Alp));
    assert!("xyz".parse::<Protocol>().is_err());
  }
}
