//! Byte coercion for text and binary inputs.

use bytes::Bytes;
use std::borrow::Cow;

/// Values that can be turned into a byte sequence.
///
/// Text is encoded as UTF-8; byte inputs pass through unchanged.
pub trait ToBytes {
    fn to_bytes(self) -> Bytes;
}

impl ToBytes for &str {
    fn to_bytes(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToBytes for String {
    fn to_bytes(self) -> Bytes {
        Bytes::from(self)
    }
}

impl ToBytes for &String {
    fn to_bytes(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToBytes for Cow<'_, str> {
    fn to_bytes(self) -> Bytes {
        match self {
            Cow::Borrowed(s) => s.to_bytes(),
            Cow::Owned(s) => s.to_bytes(),
        }
    }
}

impl ToBytes for &[u8] {
    fn to_bytes(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl<const N: usize> ToBytes for &[u8; N] {
    fn to_bytes(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(self) -> Bytes {
        Bytes::from(self)
    }
}

impl ToBytes for Bytes {
    fn to_bytes(self) -> Bytes {
        self
    }
}

impl ToBytes for &Bytes {
    fn to_bytes(self) -> Bytes {
        self.clone()
    }
}

/// Coerce text or bytes into [`Bytes`].
///
/// ```rust
/// use formshield::to_bytes;
///
/// assert_eq!(to_bytes("top secret !!!"), to_bytes(b"top secret !!!".to_vec()));
/// assert!(to_bytes(String::new()).is_empty());
/// ```
pub fn to_bytes(input: impl ToBytes) -> Bytes {
    input.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_inputs() {
        assert!(to_bytes(Bytes::new()).is_empty());
        assert!(to_bytes(String::new()).is_empty());
        assert!(to_bytes("").is_empty());
        assert!(to_bytes(Vec::new()).is_empty());
    }

    #[test]
    fn text_is_utf8_encoded() {
        assert_eq!(to_bytes("çà"), Bytes::from_static(&[0xc3, 0xa7, 0xc3, 0xa0]));
        assert_eq!(to_bytes(Cow::Borrowed("abc")), Bytes::from_static(b"abc"));
        let owned = String::from("abc");
        assert_eq!(to_bytes(&owned), to_bytes(owned.clone()));
    }

    #[test]
    fn bytes_pass_through() {
        let raw = Bytes::from_static(b"\x00\xffraw");
        assert_eq!(to_bytes(&raw), raw);
        assert_eq!(to_bytes(raw.clone()), raw);
        assert_eq!(to_bytes(&b"\x00\xffraw"[..]), raw);
        assert_eq!(to_bytes(b"\x00\xffraw"), raw);
    }

    proptest! {
        #[test]
        fn text_and_its_bytes_agree(text in "\\PC*") {
            prop_assert_eq!(to_bytes(text.as_str()), to_bytes(text.as_bytes()));
        }
    }
}
