use ring::constant_time::verify_slices_are_equal;
use sha3::{Digest, Sha3_256};
use uuid::Uuid;

const SEPARATOR: char = '$';

pub fn get_sha3_256_hash(data: &str) -> String {
   let mut hasher = Sha3_256::default();
   hasher.update(data);
   format!("{:X}", hasher.finalize())
}

/// Hashes a password with a fresh random salt; the result is `salt$HEX`.
pub fn hash_password(pwd: &str) -> String {
   let salt = Uuid::new_v4().simple().to_string();
   salted(&salt, pwd)
}

pub fn verify_password(pwd: &str, stored: &str) -> bool {
   match stored.split_once(SEPARATOR) {
      Some((salt, _)) => verify_slices_are_equal(salted(salt, pwd).as_bytes(), stored.as_bytes()).is_ok(),
      None => false,
   }
}

fn salted(salt: &str, pwd: &str) -> String {
   format!("{salt}{SEPARATOR}{}", get_sha3_256_hash(&format!("{salt}{pwd}")))
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn known_digest() {
      assert_eq!(
         get_sha3_256_hash(""),
         "A7FFC6F8BF1ED76651C14756A061D662F580FF4DE43B49FA82D80A4B80F8434A"
      );
   }

   #[test]
   fn verifies_own_hash_only() {
      let stored = hash_password("correct horse");
      assert!(verify_password("correct horse", &stored));
      assert!(!verify_password("correct horse!", &stored));
      assert!(!verify_password("correct horse", "no-separator"));
      let (salt, _) = stored.split_once(SEPARATOR).unwrap();
      assert!(!verify_password("correct horse", &format!("{salt}$")));
   }

   #[test]
   fn same_password_gets_different_salts() {
      assert_ne!(hash_password("hunter22"), hash_password("hunter22"));
   }
}
