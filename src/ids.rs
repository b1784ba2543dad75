//! Identifier types.
//!
//! [`SpellId`] and [`BuffId`] are typed handles into a character's spell
//! and buff lists, resolved once at setup. [`SpellKey`] is the stable
//! identity of a spell for statistics: name plus icon, interned with
//! `Arc<str>` so cloning a key into every record is cheap.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Handle to a spell owned by a [`Character`](crate::Character).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpellId(pub(crate) usize);

/// Handle to a buff owned by a [`Character`](crate::Character).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuffId(pub(crate) usize);

impl SpellId {
    /// Position of the spell in its character's spell list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl BuffId {
    /// Position of the buff in its character's buff list.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell#{}", self.0)
    }
}

impl fmt::Display for BuffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buff#{}", self.0)
    }
}

/// Statistics identity of a spell: name and icon.
///
/// Two spells with the same name but different icons (e.g. main-hand and
/// off-hand auto attacks) are tracked separately.
///
/// # Examples
///
/// ```rust
/// use combatsim::SpellKey;
///
/// let a = SpellKey::new("Mortal Strike", "ability_warrior_savageblow");
/// let b = SpellKey::new("Mortal Strike", "ability_warrior_savageblow");
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "Mortal Strike");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpellKey {
    name: Arc<str>,
    icon: Arc<str>,
}

impl SpellKey {
    /// Create a key from a spell name and icon path.
    pub fn new(name: &str, icon: &str) -> Self {
        Self {
            name: Arc::from(name),
            icon: Arc::from(icon),
        }
    }

    /// The spell name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The icon path.
    pub fn icon(&self) -> &str {
        &self.icon
    }
}

impl Serialize for SpellKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SpellKey", 2)?;
        state.serialize_field("name", self.name.as_ref())?;
        state.serialize_field("icon", self.icon.as_ref())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for SpellKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            icon: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(SpellKey::new(&raw.name, &raw.icon))
    }
}

impl fmt::Display for SpellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
