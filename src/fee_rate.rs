use super::*;

/// Fee rate in satoshis per 1000 bytes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, DeserializeFromStr, SerializeDisplay)]
pub struct FeeRate(u64);

impl FeeRate {
  pub const DEFAULT: Self = Self(1000);

  pub fn from_sats_per_kb(n: u64) -> Self {
    Self(n)
  }

  pub fn n(self) -> u64 {
    self.0
  }

  /// Fee for a transaction of `size` bytes, rounded up to the next satoshi.
  pub fn fee(self, size: usize) -> Amount {
    let size = u64::try_from(size).unwrap_or(u64::MAX);
    Amount::from_sat(size.saturating_mul(self.0).div_ceil(1000))
  }
}

impl Default for FeeRate {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl Display for FeeRate {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for FeeRate {
  type Err = SnafuError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self(
      s.parse()
        .snafu_context(error::FeeRateParse { input: s })?,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse() {
    assert_eq!("1000".parse::<FeeRate>().unwrap().n(), 1000);
    assert_eq!("0".parse::<FeeRate>().unwrap().n(), 0);
    assert!("-4".parse::<FeeRate>().is_err());
    assert!("1.1".parse::<FeeRate>().is_err());
    assert_eq!(
      "foo".parse::<FeeRate>().unwrap_err().to_string(),
      "invalid fee rate `foo`"
    );
  }

  #[test]
  fn fee() {
    assert_eq!(FeeRate::DEFAULT.fee(219), Amount::from_sat(219));
    assert_eq!(
      FeeRate::from_sats_per_kb(1500).fee(219),
      Amount::from_sat(329)
    );
    assert_eq!(FeeRate::from_sats_per_kb(1).fee(1), Amount::from_sat(1));
    assert_eq!(FeeRate::from_sats_per_kb(1).fee(1000), Amount::from_sat(1));
    assert_eq!(FeeRate::from_sats_per_kb(1).fee(1001), Amount::from_sat(2));
    assert_eq!(FeeRate::from_sats_per_kb(0).fee(1001), Amount::ZERO);
  }

  #[test]
  fn serde() {
    let fee_rate = FeeRate::from_sats_per_kb(2000);
    assert_eq!(serde_json::to_string(&fee_rate).unwrap(), "\"2000\"");
    assert_eq!(
      serde_json::from_str::<FeeRate>("\"2000\"").unwrap(),
      fee_rate
    );
  }
}
