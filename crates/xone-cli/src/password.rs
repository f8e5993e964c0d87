//! One-way credential hashing for stored users.
//!
//! Hashes are argon2id PHC strings (`$argon2id$v=19$…`) with a fresh random
//! salt; the store treats them as opaque.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;

pub fn hash(plaintext: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(plaintext.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
    .to_string();
  Ok(hash)
}

/// `false` for a wrong password and for a hash that does not parse.
pub fn verify(hash: &str, plaintext: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(plaintext.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify(&hash, "hunter2"));
    assert!(!verify(&hash, "hunter3"));
  }

  #[test]
  fn salts_differ() {
    assert_ne!(hash("secret").unwrap(), hash("secret").unwrap());
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!verify("not-a-phc-string", "anything"));
    assert!(!verify("", ""));
  }
}
