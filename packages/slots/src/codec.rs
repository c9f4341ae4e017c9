//! Key layout of one keymap configuration.
//!
//! Every configuration lives under a namespace root, either `keymap` for the
//! live keymap or `slots/<n>` for a stored slot:
//!
//! ```text
//! <root>/_name                 slot label (slots only)
//! <root>/layer_order           opaque layer ordering
//! <root>/l_n/<layer>           layer display name
//! <root>/l/<layer>/<position>  one binding
//! ```
//!
//! Decoding distinguishes "not one of our fields" (ignored, so newer firmware
//! can add fields) from "our field with a broken index" (an error). A suffix
//! only counts as one of our fields when its component count fits the shape.

use std::fmt;

use keymap_settings::Key;
use serde::Serialize;

pub const SYSTEM_ROOT: &str = "keymap";
pub const SLOTS_ROOT: &str = "slots";

const NAME: &str = "_name";
const LAYER_ORDER: &str = "layer_order";
const LAYER_NAMES: &str = "l_n";
const LAYER_BINDINGS: &str = "l";

/// Where a configuration is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Namespace {
    /// The live keymap the user is editing.
    System,
    /// A stored slot, 0-based.
    Slot(usize),
}

impl Namespace {
    pub fn root(&self) -> Key {
        match self {
            Namespace::System => Key {
                components: vec![SYSTEM_ROOT.to_string()],
            },
            Namespace::Slot(index) => Key {
                components: vec![SLOTS_ROOT.to_string(), index.to_string()],
            },
        }
    }

    /// Only slots carry a `_name` field.
    pub fn has_name(&self) -> bool {
        matches!(self, Namespace::Slot(_))
    }

    /// Full key of `field` inside this namespace.
    pub fn key(&self, field: Field) -> Key {
        self.root().join(&field.suffix())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::System => write!(f, "{}", SYSTEM_ROOT),
            Namespace::Slot(index) => write!(f, "{}/{}", SLOTS_ROOT, index),
        }
    }
}

/// One addressable field of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    Name,
    LayerOrder,
    LayerName(usize),
    Binding { layer: usize, position: u16 },
}

impl Field {
    /// Key suffix relative to a namespace root.
    pub fn suffix(&self) -> Key {
        let components = match *self {
            Field::Name => vec![NAME.to_string()],
            Field::LayerOrder => vec![LAYER_ORDER.to_string()],
            Field::LayerName(layer) => vec![LAYER_NAMES.to_string(), layer.to_string()],
            Field::Binding { layer, position } => vec![
                LAYER_BINDINGS.to_string(),
                layer.to_string(),
                position.to_string(),
            ],
        };
        Key { components }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Name => write!(f, "slot name"),
            Field::LayerOrder => write!(f, "layer order"),
            Field::LayerName(layer) => write!(f, "layer {} name", layer),
            Field::Binding { layer, position } => {
                write!(f, "layer {} binding at position {}", layer, position)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexKind {
    Layer,
    Position,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Layer => write!(f, "layer"),
            IndexKind::Position => write!(f, "position"),
        }
    }
}

/// A key that names one of our fields but cannot be addressed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed {kind} index '{raw}' in '{key}'")]
    MalformedIndex {
        key: String,
        kind: IndexKind,
        raw: String,
    },
    #[error("layer {layer} out of range in '{key}' (layer count {layers})")]
    LayerOutOfRange {
        key: String,
        layer: usize,
        layers: usize,
    },
}

/// Decode a key suffix against the field shapes.
///
/// Returns `Ok(None)` for keys that are not configuration fields at all.
pub fn decode(suffix: &Key, layers: usize) -> Result<Option<Field>, DecodeError> {
    let parts: Vec<&str> = suffix.iter().collect();
    match parts.as_slice() {
        [NAME] => Ok(Some(Field::Name)),
        [LAYER_ORDER] => Ok(Some(Field::LayerOrder)),
        [LAYER_NAMES, layer] => {
            let layer = parse_layer(suffix, layer, layers)?;
            Ok(Some(Field::LayerName(layer)))
        }
        [LAYER_BINDINGS, layer, position] => {
            let layer = parse_layer(suffix, layer, layers)?;
            let position = position
                .parse::<u16>()
                .map_err(|_| malformed(suffix, IndexKind::Position, position))?;
            Ok(Some(Field::Binding { layer, position }))
        }
        _ => Ok(None),
    }
}

fn parse_layer(suffix: &Key, raw: &str, layers: usize) -> Result<usize, DecodeError> {
    let layer = raw
        .parse::<usize>()
        .map_err(|_| malformed(suffix, IndexKind::Layer, raw))?;
    if layer >= layers {
        return Err(DecodeError::LayerOutOfRange {
            key: suffix.to_string(),
            layer,
            layers,
        });
    }
    Ok(layer)
}

fn malformed(suffix: &Key, kind: IndexKind, raw: &str) -> DecodeError {
    DecodeError::MalformedIndex {
        key: suffix.to_string(),
        kind,
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymap_settings::key;

    #[test]
    fn namespace_roots() {
        assert_eq!(Namespace::System.root(), key!("keymap"));
        assert_eq!(Namespace::Slot(3).root(), key!("slots/3"));
        assert_eq!(Namespace::Slot(3).to_string(), "slots/3");
        assert!(Namespace::Slot(0).has_name());
        assert!(!Namespace::System.has_name());
    }

    #[test]
    fn field_keys() {
        let ns = Namespace::Slot(1);
        assert_eq!(ns.key(Field::Name), key!("slots/1/_name"));
        assert_eq!(ns.key(Field::LayerOrder), key!("slots/1/layer_order"));
        assert_eq!(ns.key(Field::LayerName(2)), key!("slots/1/l_n/2"));
        assert_eq!(
            Namespace::System.key(Field::Binding {
                layer: 0,
                position: 42
            }),
            key!("keymap/l/0/42")
        );
    }

    #[test]
    fn decode_known_shapes() {
        assert_eq!(decode(&key!("_name"), 4), Ok(Some(Field::Name)));
        assert_eq!(decode(&key!("layer_order"), 4), Ok(Some(Field::LayerOrder)));
        assert_eq!(decode(&key!("l_n/3"), 4), Ok(Some(Field::LayerName(3))));
        assert_eq!(
            decode(&key!("l/1/65535"), 4),
            Ok(Some(Field::Binding {
                layer: 1,
                position: 65535
            }))
        );
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        assert_eq!(decode(&key!("combos/0"), 4), Ok(None));
        assert_eq!(decode(&key!("_name/extra"), 4), Ok(None));
        assert_eq!(decode(&key!(""), 4), Ok(None));
    }

    #[test]
    fn decode_rejects_out_of_range_layer() {
        assert!(matches!(
            decode(&key!("l_n/4"), 4),
            Err(DecodeError::LayerOutOfRange { layer: 4, .. })
        ));
        assert!(matches!(
            decode(&key!("l/9/1"), 4),
            Err(DecodeError::LayerOutOfRange { layer: 9, .. })
        ));
    }

    #[test]
    fn decode_rejects_malformed_indices() {
        assert!(matches!(
            decode(&key!("l_n/abc"), 4),
            Err(DecodeError::MalformedIndex {
                kind: IndexKind::Layer,
                ..
            })
        ));
        assert!(matches!(
            decode(&key!("l/0/65536"), 4),
            Err(DecodeError::MalformedIndex {
                kind: IndexKind::Position,
                ..
            })
        ));
    }

    #[test]
    fn decode_ignores_wrong_component_counts() {
        assert_eq!(decode(&key!("l"), 4), Ok(None));
        assert_eq!(decode(&key!("l/0"), 4), Ok(None));
        assert_eq!(decode(&key!("l/0/5/extra"), 4), Ok(None));
        assert_eq!(decode(&key!("l_n"), 4), Ok(None));
        assert_eq!(decode(&key!("l_n/0/x"), 4), Ok(None));
    }

    #[test]
    fn suffix_decodes_back() {
        let field = Field::Binding {
            layer: 2,
            position: 7,
        };
        assert_eq!(decode(&field.suffix(), 4), Ok(Some(field)));
    }
}
