use std::borrow::Borrow;
use std::fmt;

use bytes::Bytes;

/// Size of a content digest in bytes (BLAKE3 output).
pub const DIGEST_SIZE: usize = 32;

/// The unit of deduplication: an immutable byte sequence.
///
/// Two `Content` values are the same key exactly when their bytes are
/// equal. The backing [`Bytes`] buffer is reference counted, so cloning a
/// `Content` to use it as a lock-table key or to hand it to a store does
/// not copy the payload.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────┐
/// │ Operation    │ Semantics                                        │
/// ├──────────────┼──────────────────────────────────────────────────┤
/// │ Eq / Hash    │ exact byte equality                              │
/// │ Display      │ UTF-8 (lossy), used verbatim in result messages  │
/// │ digest()     │ BLAKE3 of the bytes, for logs and store indexes  │
/// │ preview(n)   │ at most n bytes, for bounded log output          │
/// └──────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// The empty byte sequence is a valid key like any other.
///
/// # Example
///
/// ```rust
/// use dedupe_types::Content;
///
/// let a = Content::from("apple");
/// let b = Content::from(b"apple".to_vec());
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "apple");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Content(Bytes);

impl Content {
    /// Wrap an existing buffer without copying.
    #[must_use]
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// BLAKE3 hash of the content bytes.
    ///
    /// Digests identify content compactly in log fields and let stores
    /// index records. They never decide equality on their own: stores
    /// must still compare bytes before reporting a match.
    #[must_use]
    pub fn digest(&self) -> [u8; DIGEST_SIZE] {
        blake3::hash(&self.0).into()
    }

    /// Short lowercase hex prefix of [`digest`](Self::digest), 12 chars.
    #[must_use]
    pub fn short_digest(&self) -> String {
        use std::fmt::Write;

        self.digest()[..6]
            .iter()
            .fold(String::with_capacity(12), |mut out, b| {
                let _ = write!(out, "{b:02x}");
                out
            })
    }

    /// Lossy UTF-8 rendering of at most `max_len` bytes.
    ///
    /// Appends `…` when the content was cut. A cut that lands inside a
    /// multi-byte character shows up as a replacement character.
    #[must_use]
    pub fn preview(&self, max_len: usize) -> String {
        if self.0.len() <= max_len {
            return self.to_string();
        }
        let mut out = String::from_utf8_lossy(&self.0[..max_len]).into_owned();
        out.push('…');
        out
    }

    /// Consume the content, returning the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Content")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

impl AsRef<[u8]> for Content {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Content {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl<const N: usize> From<&[u8; N]> for Content {
    fn from(bytes: &[u8; N]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self(Bytes::from(text))
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<&Content> for Content {
    fn from(content: &Content) -> Self {
        content.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_value() {
        let a = Content::from("same");
        let b = Content::from(String::from("same"));
        let c = Content::from(b"same");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_ne!(a, Content::from("Same"));
    }

    #[test]
    fn empty_content_is_a_key() {
        let empty = Content::default();
        assert!(empty.is_empty());
        assert_eq!(empty, Content::from(""));
        assert_eq!(empty.to_string(), "");
        let expected: [u8; 32] = blake3::hash(b"").into();
        assert_eq!(empty.digest(), expected);
    }

    #[test]
    fn display_is_lossy_utf8() {
        let content = Content::from(vec![b'o', b'k', 0xFF]);
        assert_eq!(content.to_string(), "ok\u{FFFD}");
    }

    #[test]
    fn digest_matches_blake3() {
        let content = Content::from("apple");
        let expected: [u8; 32] = blake3::hash(b"apple").into();
        assert_eq!(content.digest(), expected);
    }

    #[test]
    fn short_digest_is_twelve_hex_chars() {
        let short = Content::from("apple").short_digest();
        assert_eq!(short.len(), 12);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn preview_truncates_long_content() {
        let content = Content::from("abcdefgh");
        assert_eq!(content.preview(3), "abc…");
        assert_eq!(content.preview(8), "abcdefgh");
        assert_eq!(content.preview(100), "abcdefgh");
    }

    #[test]
    fn clone_shares_buffer() {
        let content = Content::from("shared");
        let copy = content.clone();
        assert_eq!(content.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }
}
