use super::*;

/// Wraps `pushes` in an eMPP `OP_RETURN` script.
pub fn empp_script<T: AsRef<[u8]>>(pushes: &[T]) -> Result<ScriptBuf> {
  let mut script = vec![OP_RETURN.to_u8(), OP_RESERVED.to_u8()];

  for push in pushes {
    let push = push.as_ref();

    if push.is_empty() {
      return Err(Error::EmptyEmppPush);
    }

    push_bytes(&mut script, push, false);
  }

  Ok(ScriptBuf::from_bytes(script))
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  #[test]
  fn envelope() {
    let script = empp_script(&[vec![0xaa, 0xbb], vec![0xcc]]).unwrap();
    assert_eq!(hex::encode(script.as_bytes()), "6a5002aabb01cc");
  }

  #[test]
  fn no_pushes() {
    let script = empp_script::<Vec<u8>>(&[]).unwrap();
    assert_eq!(hex::encode(script.as_bytes()), "6a50");
  }

  #[test]
  fn empty_push() {
    assert_eq!(
      empp_script(&[Vec::<u8>::new()]),
      Err(Error::EmptyEmppPush)
    );
  }

  #[test]
  fn alp_send_in_envelope() {
    let token_id = "cdcdcdcdcdc9dda4c92bb1145aa84945c024346ea66fd4b699e344e45df2e145"
      .parse::<TokenId>()
      .unwrap();

    let payload = alp_send(token_id, AlpTokenType::Standard, &[1]).unwrap();
    let script = empp_script(&[&payload]).unwrap();

    assert_eq!(script.len(), 2 + 1 + payload.len());
    assert_eq!(script.as_bytes()[2], u8::try_from(payload.len()).unwrap());
  }
}
