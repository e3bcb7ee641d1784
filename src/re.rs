use super::*;

fn re(s: &'static str) -> Regex {
  Regex::new(&format!("^{s}$")).unwrap()
}

lazy_static! {
  pub(crate) static ref CASHADDR: Regex =
    re(r"(([a-z]+):)?([qpzry9x8gf2tvdw0s3jn54khce6mua7l]{42})");
}
