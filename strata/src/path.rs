//! Paths into mixed value trees.

use std::{fmt, sync::Arc};

use smallvec::SmallVec;

use crate::value::Value;

/// One step of a [`Path`]: a named field or a list index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Field(Arc<str>),
    Index(usize),
}

impl Key {
    /// Field-name form of this key; indices render in decimal.
    pub(crate) fn as_field(&self) -> Arc<str> {
        match self {
            Key::Field(f) => f.clone(),
            Key::Index(i) => i.to_string().into(),
        }
    }

    /// Index form, for indices and all-digit field names.
    pub(crate) fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Field(f) => f.parse().ok(),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Field(s.into())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Field(s) => f.write_str(s),
            Key::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A normalized, ordered sequence of keys addressing a location in a tree.
///
/// The empty path addresses the root itself. Accepted input forms are a
/// dot-delimited string (`"a.b.c"`, digit-only segments become indices), a
/// single index, or an explicit key sequence; all of them convert with
/// [`From`]. Splitting is purely syntactic and never fails; only conversion
/// from a dynamic [`Value`] can reject its input (see [`TryFrom`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(SmallVec<[Key; 4]>);

impl Path {
    /// The empty path, denoting the root.
    pub fn root() -> Path {
        Path(SmallVec::new())
    }

    /// Parses a dot-delimited path. Empty input denotes the root.
    pub fn parse(s: &str) -> Path {
        if s.is_empty() {
            return Path::root();
        }
        s.split('.')
            .map(|seg| {
                if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
                    seg.parse::<usize>().map(Key::Index).unwrap_or_else(|_| Key::Field(seg.into()))
                } else {
                    Key::Field(seg.into())
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Returns this path extended with `suffix`, leaving both inputs
    /// untouched. Used to address into a subtree from a known prefix.
    pub fn concat(&self, suffix: impl Into<Path>) -> Path {
        let mut keys = self.0.clone();
        keys.extend(suffix.into().0);
        Path(keys)
    }

    /// Splits off the leading key, if any.
    pub fn split_first(&self) -> Option<(&Key, Path)> {
        self.0.split_first().map(|(head, rest)| (head, rest.iter().cloned().collect()))
    }
}

impl std::ops::Deref for Path {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::parse(&s)
    }
}

impl From<usize> for Path {
    fn from(i: usize) -> Self {
        Path(SmallVec::from_iter([Key::Index(i)]))
    }
}

impl From<Key> for Path {
    fn from(key: Key) -> Self {
        Path(SmallVec::from_iter([key]))
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Path(SmallVec::from_vec(keys))
    }
}

impl From<&[Key]> for Path {
    fn from(keys: &[Key]) -> Self {
        keys.iter().cloned().collect()
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

/// Error for path inputs that are not path-shaped.
///
/// A mistyped path produces rendering bugs far from its origin, so dynamic
/// inputs are rejected loudly instead of being coerced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path key must be a string or a non-negative integer, got {0}")]
    InvalidKey(&'static str),
    #[error("path must be a string, a number or a list of keys, got {0}")]
    InvalidPath(&'static str),
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::List(_) | Value::PersistentList(_) => "a list",
        Value::Map(_) | Value::PersistentMap(_) => "a map",
    }
}

fn key_from_value(value: &Value) -> Result<Key, PathError> {
    match value {
        Value::String(s) => Ok(Key::Field(s.clone())),
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && n.is_finite() => Ok(Key::Index(*n as usize)),
        other => Err(PathError::InvalidKey(kind(other))),
    }
}

impl TryFrom<&Value> for Path {
    type Error = PathError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Path::parse(s)),
            Value::Number(_) => Ok(Path::from(key_from_value(value)?)),
            Value::List(keys) => keys.iter().map(key_from_value).collect(),
            Value::PersistentList(keys) => keys.iter().map(key_from_value).collect(),
            other => Err(PathError::InvalidPath(kind(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forms() {
        assert_eq!(
            Path::parse("a.b.c").keys(),
            &[Key::from("a"), Key::from("b"), Key::from("c")]
        );
        assert_eq!(Path::parse("items.3.name").keys()[1], Key::Index(3));
        assert_eq!(Path::from(7).keys(), &[Key::Index(7)]);
        assert!(Path::parse("").is_empty());
        // splitting is purely syntactic
        assert_eq!(Path::parse("a..b").len(), 3);
    }

    #[test]
    fn display_round_trips() {
        let path = Path::parse("form.fields.0.label");
        assert_eq!(path.to_string(), "form.fields.0.label");
        assert_eq!(Path::parse(&path.to_string()), path);
    }

    #[test]
    fn concat_prefixes() {
        let prefix = Path::parse("form");
        assert_eq!(prefix.concat("email"), Path::parse("form.email"));
        assert_eq!(prefix.concat(2), Path::parse("form.2"));
        assert_eq!(Path::root().concat("a.b"), Path::parse("a.b"));
    }

    #[test]
    fn dynamic_paths_fail_fast() {
        assert_eq!(Path::try_from(&Value::from("a.b")), Ok(Path::parse("a.b")));
        assert_eq!(Path::try_from(&Value::from(2)), Ok(Path::from(2)));
        assert_eq!(
            Path::try_from(&Value::list([Value::from("a"), Value::from(1)])),
            Ok(Path::parse("a.1"))
        );
        assert!(matches!(Path::try_from(&Value::Bool(true)), Err(PathError::InvalidPath(_))));
        assert!(matches!(
            Path::try_from(&Value::list([Value::Null])),
            Err(PathError::InvalidKey(_))
        ));
        assert!(matches!(
            Path::try_from(&Value::from(-1)),
            Err(PathError::InvalidKey(_))
        ));
    }
}
