//! Settings key type with validated components.

use std::fmt;

/// Errors related to key parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// A key component is neither an identifier nor a decimal index.
    #[error("invalid key component '{component}' at position {position}: {message}")]
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The key string is invalid.
    #[error("invalid key: {message}")]
    InvalidKey { message: String },
}

/// A validated hierarchical settings key.
///
/// Components are separated by `/` and must each be an identifier
/// (`layer_order`, `_name`, `l_n`) or a pure decimal string (`0`, `17`).
/// The empty key addresses the root of the store.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Key {
    pub components: Vec<String>,
}

impl Key {
    /// Parse a key string, validating components.
    ///
    /// Empty components are ignored, so `//` and a trailing `/` normalize away.
    ///
    /// ```rust
    /// use keymap_settings::Key;
    ///
    /// let key = Key::parse("slots/2/l/0/14").unwrap();
    /// assert_eq!(key.len(), 5);
    /// assert_eq!(Key::parse("keymap/").unwrap(), Key::parse("keymap").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let components: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        Self::try_from_components(components)
    }

    /// The root key (no components).
    pub fn root() -> Self {
        Key {
            components: Vec::new(),
        }
    }

    /// Try to create a key from components, validating each.
    pub fn try_from_components(components: Vec<String>) -> Result<Self, KeyError> {
        for (i, component) in components.iter().enumerate() {
            Self::validate_component(component, i)?;
        }
        Ok(Key { components })
    }

    fn validate_component(component: &str, position: usize) -> Result<(), KeyError> {
        let mut chars = component.chars();
        let Some(first) = chars.next() else {
            return Err(KeyError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "empty component".to_string(),
            });
        };

        if component.chars().all(|c| c.is_ascii_digit()) {
            return Ok(());
        }

        let valid_start = unicode_ident::is_xid_start(first)
            || (first == '_'
                && chars
                    .clone()
                    .next()
                    .is_some_and(unicode_ident::is_xid_continue));

        if !valid_start {
            return Err(KeyError::InvalidComponent {
                component: component.to_string(),
                position,
                message: "must start with a letter or underscore followed by letter/digit"
                    .to_string(),
            });
        }

        for c in chars {
            if !unicode_ident::is_xid_continue(c) {
                return Err(KeyError::InvalidComponent {
                    component: component.to_string(),
                    position,
                    message: format!("invalid character '{}' in identifier", c),
                });
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    /// Join this key with another.
    #[must_use]
    pub fn join(&self, other: &Key) -> Key {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Key { components }
    }

    /// Append one validated component.
    pub fn child(&self, component: &str) -> Result<Key, KeyError> {
        Self::validate_component(component, self.components.len())?;
        let mut components = self.components.clone();
        components.push(component.to_string());
        Ok(Key { components })
    }

    /// Append a decimal index component. Always valid.
    #[must_use]
    pub fn index(&self, index: usize) -> Key {
        let mut components = self.components.clone();
        components.push(index.to_string());
        Key { components }
    }

    pub fn has_prefix(&self, prefix: &Key) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Strip a prefix from this key, `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Key) -> Option<Key> {
        if self.has_prefix(prefix) {
            Some(Key {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

impl std::str::FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::parse(s)
    }
}

impl std::ops::Index<usize> for Key {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

/// Macro for creating keys from string literals.
///
/// ```rust
/// use keymap_settings::key;
///
/// let k = key!("keymap/l_n/3");
/// assert_eq!(k.len(), 3);
/// ```
#[macro_export]
macro_rules! key {
    ($s:expr) => {
        $crate::Key::parse($s).expect("invalid key literal")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_keys() {
        assert_eq!(Key::parse("").unwrap().len(), 0);
        assert_eq!(Key::parse("keymap").unwrap().len(), 1);
        assert_eq!(Key::parse("slots/0").unwrap().len(), 2);
        assert_eq!(Key::parse("keymap/l/0/12").unwrap().len(), 4);
    }

    #[test]
    fn normalize_slashes() {
        assert_eq!(key!("keymap/l_n/"), key!("keymap/l_n"));
        assert_eq!(key!("keymap//l_n"), key!("keymap/l_n"));
        assert_eq!(key!("/keymap/l_n"), key!("keymap/l_n"));
    }

    #[test]
    fn field_names_are_valid() {
        for name in ["_name", "layer_order", "l_n", "l", "keymap", "slots"] {
            assert!(Key::parse(name).is_ok(), "{name} should parse");
        }
    }

    #[test]
    fn invalid_components_rejected() {
        assert!(Key::parse("keymap/bad name").is_err());
        assert!(Key::parse("keymap/bad-name").is_err());
        assert!(Key::parse("keymap/.hidden").is_err());
        assert!(Key::parse("keymap/12abc").is_err());
        assert!(Key::parse("keymap/_").is_err());
    }

    #[test]
    fn child_and_index_extend() {
        let root = key!("slots");
        assert_eq!(root.index(3), key!("slots/3"));
        assert_eq!(root.index(3).child("_name").unwrap(), key!("slots/3/_name"));
        assert!(root.child("no way").is_err());
    }

    #[test]
    fn has_prefix_works() {
        let k = key!("slots/1/l/0/5");
        assert!(k.has_prefix(&Key::root()));
        assert!(k.has_prefix(&key!("slots/1")));
        assert!(!k.has_prefix(&key!("slots/10")));
        assert!(!k.has_prefix(&key!("slots/1/l/0/5/9")));
    }

    #[test]
    fn strip_prefix_works() {
        let k = key!("keymap/l/2/40");
        assert_eq!(k.strip_prefix(&key!("keymap")), Some(key!("l/2/40")));
        assert_eq!(k.strip_prefix(&key!("keymap/l/2/40")), Some(Key::root()));
        assert_eq!(k.strip_prefix(&key!("slots")), None);
    }

    #[test]
    fn display_joins_components() {
        assert_eq!(key!("slots/0/layer_order").to_string(), "slots/0/layer_order");
        assert_eq!(Key::root().to_string(), "");
    }

    #[test]
    fn key_error_display() {
        let err = Key::parse("keymap/bad-name").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("bad-name"));
        assert!(display.contains("position 1"));
    }
}
