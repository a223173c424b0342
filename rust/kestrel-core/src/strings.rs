//! Immutable byte strings with three storage subkinds.
//!
//! - `Owned`: a shared buffer allocated by the runtime.
//! - `Constant`: a `'static` slice that is never freed.
//! - `View`: a zero-copy `(start, len)` window into an owned buffer. The view
//!   holds a strong handle to the buffer, so the parent storage lives at least
//!   as long as the longest-lived view.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use strum::{Display, IntoStaticStr};

/// Storage subkind of a [`Str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum StrKind {
    Owned,
    Constant,
    View,
}

#[derive(Clone)]
enum Repr {
    Owned(Rc<[u8]>),
    Constant(&'static [u8]),
    View {
        base: Rc<[u8]>,
        start: usize,
        len: usize,
    },
}

/// An immutable byte string.
#[derive(Clone)]
pub struct Str(Repr);

impl Str {
    /// Copy `bytes` into a fresh owned buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Str(Repr::Owned(Rc::from(bytes)))
    }

    /// Take ownership of `bytes` as the buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Str(Repr::Owned(Rc::from(bytes)))
    }

    /// Reference a constant without copying it.
    pub fn from_const(s: &'static str) -> Self {
        Str(Repr::Constant(s.as_bytes()))
    }

    pub fn from_static_bytes(bytes: &'static [u8]) -> Self {
        Str(Repr::Constant(bytes))
    }

    pub fn empty() -> Self {
        Str(Repr::Constant(b""))
    }

    pub fn kind(&self) -> StrKind {
        match &self.0 {
            Repr::Owned(_) => StrKind::Owned,
            Repr::Constant(_) => StrKind::Constant,
            Repr::View { .. } => StrKind::View,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Repr::Owned(buf) => &buf[..],
            Repr::Constant(bytes) => *bytes,
            Repr::View { base, start, len } => &base[*start..*start + *len],
        }
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        match &self.0 {
            Repr::Owned(buf) => buf.len(),
            Repr::Constant(bytes) => bytes.len(),
            Repr::View { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-copy substring `[a, b)`.
    ///
    /// Negative bounds count from the end; both bounds are then clamped to
    /// `[0, len]`. An inverted range yields the empty string.
    pub fn view(&self, a: i64, b: i64) -> Str {
        let (start, end) = clamp_range(self.len(), a, b);
        let len = end.saturating_sub(start);
        match &self.0 {
            Repr::Constant(bytes) => {
                let bytes: &'static [u8] = *bytes;
                Str(Repr::Constant(&bytes[start..start + len]))
            }
            Repr::Owned(buf) => Str(Repr::View {
                base: Rc::clone(buf),
                start,
                len,
            }),
            Repr::View {
                base,
                start: offset,
                ..
            } => Str(Repr::View {
                base: Rc::clone(base),
                start: offset + start,
                len,
            }),
        }
    }

    /// Owned copy of `[a, b)`, with the same bound rules as [`Str::view`].
    pub fn substring(&self, a: i64, b: i64) -> Str {
        Str::from_bytes(self.view(a, b).as_bytes())
    }

    /// The one-byte view at `index`, or `None` when out of range.
    pub fn char_at(&self, index: usize) -> Option<Str> {
        if index >= self.len() {
            return None;
        }
        let i = index as i64;
        Some(self.view(i, i + 1))
    }

    /// Fresh owned buffer holding the same bytes.
    pub fn to_owned_copy(&self) -> Str {
        Str::from_bytes(self.as_bytes())
    }

    pub fn concat(&self, other: &Str) -> Str {
        let mut out = Vec::with_capacity(self.len() + other.len());
        out.extend_from_slice(self.as_bytes());
        out.extend_from_slice(other.as_bytes());
        Str::from_vec(out)
    }

    /// `n` copies back to back; `n <= 0` gives the empty string. `None` when
    /// the result length overflows `usize`.
    pub fn repeat(&self, n: i64) -> Option<Str> {
        if n <= 0 || self.is_empty() {
            return Some(Str::from_vec(Vec::new()));
        }
        let n = usize::try_from(n).ok()?;
        self.len().checked_mul(n)?;
        Some(Str::from_vec(self.as_bytes().repeat(n)))
    }

    /// Lexicographic byte comparison; on a common prefix the shorter sorts first.
    pub fn compare(&self, other: &Str) -> Ordering {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        let n = a.len().min(b.len());
        match a[..n].cmp(&b[..n]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            ord => ord,
        }
    }

    /// Position of the first occurrence of `needle`.
    pub fn find(&self, needle: &Str) -> Option<usize> {
        find_bytes(self.as_bytes(), needle.as_bytes())
    }

    pub fn contains(&self, needle: &Str) -> bool {
        self.find(needle).is_some()
    }

    pub fn starts_with(&self, prefix: &Str) -> bool {
        self.as_bytes().starts_with(prefix.as_bytes())
    }

    /// True when both strings read from the same underlying buffer.
    pub fn shares_buffer(&self, other: &Str) -> bool {
        match (self.buffer(), other.buffer()) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn buffer(&self) -> Option<&Rc<[u8]>> {
        match &self.0 {
            Repr::Owned(buf) => Some(buf),
            Repr::View { base, .. } => Some(base),
            Repr::Constant(_) => None,
        }
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

pub(crate) fn find_bytes(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Normalize a `[a, b)` pair against `len`: negatives wrap once, then clamp.
pub fn clamp_range(len: usize, a: i64, b: i64) -> (usize, usize) {
    let l = len as i64;
    let a = if a < 0 { l + a } else { a };
    let b = if b < 0 { l + b } else { b };
    let a = a.clamp(0, l) as usize;
    let b = b.clamp(0, l) as usize;
    (a, b.max(a))
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str::from_bytes(s.as_bytes())
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str::from_vec(s.into_bytes())
    }
}

impl PartialEq for Str {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Str {}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.to_string_lossy())
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
