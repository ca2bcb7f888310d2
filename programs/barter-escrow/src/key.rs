//! Raw 32-byte public key layout
//!
//! Every key in an instruction account list or escrow record is stored as its
//! bare bytes: no length prefix, no padding.

use solana_program::pubkey::Pubkey;

use crate::{
    constants::PUBKEY_BYTES,
    error::{EscrowError, EscrowResult, Field},
};

/// Write `key` into a 32-byte slot
pub fn pack_key(key: &Pubkey, dst: &mut [u8; PUBKEY_BYTES]) {
    dst.copy_from_slice(key.as_ref());
}

/// Read a key from exactly 32 bytes
pub fn unpack_key(src: &[u8], field: Field) -> EscrowResult<Pubkey> {
    let bytes: [u8; PUBKEY_BYTES] = src
        .try_into()
        .map_err(|_| EscrowError::MalformedKey {
            field,
            len: src.len(),
        })?;
    Ok(Pubkey::new_from_array(bytes))
}

/// True when a slot holds no key
pub fn is_zero_key(src: &[u8]) -> bool {
    src.iter().all(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountRole;

    #[test]
    fn test_key_layout_is_raw_bytes() {
        let key = Pubkey::new_unique();
        let mut slot = [0u8; PUBKEY_BYTES];
        pack_key(&key, &mut slot);

        assert_eq!(slot, key.to_bytes());
        assert_eq!(unpack_key(&slot, Field::Account(AccountRole::Initiator)).unwrap(), key);
    }

    #[test]
    fn test_wrong_width_is_malformed() {
        let field = Field::Account(AccountRole::Authority);
        for len in [0usize, 31, 33, 64] {
            let bytes = vec![7u8; len];
            assert_eq!(
                unpack_key(&bytes, field),
                Err(EscrowError::MalformedKey { field, len })
            );
        }
    }

    #[test]
    fn test_zero_slot() {
        assert!(is_zero_key(&[0u8; PUBKEY_BYTES]));
        assert!(!is_zero_key(&Pubkey::new_unique().to_bytes()));
    }
}
