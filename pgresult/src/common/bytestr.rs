use bytes::Bytes;
use std::{borrow::Borrow, fmt, hash, ops::Deref, str::Utf8Error};

/// Utf8 checked [`Bytes`].
///
/// Field names, command tags and diagnostic fields are sliced out of the
/// message body without copying.
#[derive(Clone, Default)]
pub struct ByteStr {
    bytes: Bytes,
}

impl ByteStr {
    /// Check that `bytes` is utf8.
    pub fn from_utf8(bytes: Bytes) -> Result<ByteStr, Utf8Error> {
        std::str::from_utf8(&bytes)?;
        Ok(ByteStr { bytes })
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: checked in every constructor, `Bytes` is immutable
        unsafe { std::str::from_utf8_unchecked(&self.bytes) }
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl TryFrom<Bytes> for ByteStr {
    type Error = Utf8Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        ByteStr::from_utf8(bytes)
    }
}

impl From<&'static str> for ByteStr {
    fn from(value: &'static str) -> Self {
        ByteStr { bytes: Bytes::from_static(value.as_bytes()) }
    }
}

impl From<String> for ByteStr {
    fn from(value: String) -> Self {
        ByteStr { bytes: Bytes::from(value.into_bytes()) }
    }
}

impl From<ByteStr> for Bytes {
    fn from(value: ByteStr) -> Self {
        value.bytes
    }
}

impl Deref for ByteStr {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ByteStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ByteStr {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ByteStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl fmt::Debug for ByteStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl PartialEq for ByteStr {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteStr { }

impl hash::Hash for ByteStr {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialEq<str> for ByteStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ByteStr {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn checked_utf8() {
        let tag = ByteStr::from_utf8(Bytes::from_static(b"INSERT 0 1")).unwrap();
        assert_eq!(tag, "INSERT 0 1");
        assert_eq!(tag.split_whitespace().count(), 3);
        assert!(ByteStr::try_from(Bytes::from_static(b"\xff")).is_err());
    }

    #[test]
    fn shares_bytes() {
        let bytes = Bytes::from(String::from("relation"));
        let name = ByteStr::from_utf8(bytes.slice(..3)).unwrap();
        assert_eq!(Bytes::from(name.clone()).as_ptr(), bytes.as_ptr());
        assert_eq!(format!("{name:?}"), "\"rel\"");
    }
}
