use std::fmt;

/// Definition id of an object, NPC or item type.
///
/// Many instances in the world share one definition id; see [`EntityKey`] for
/// a handle to a single instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle to one spawned instance.
///
/// Keys are assigned by the snapshot provider and stay stable for as long as
/// the instance exists. A despawned and respawned object gets a new key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityKey(pub u64);

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key:{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationId(pub i32);

/// Interface group id of a widget such as a dialogue box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WidgetGroupId(pub u32);

impl WidgetGroupId {
    pub const NPC_DIALOGUE: Self = Self(231);
    pub const PLAYER_DIALOGUE: Self = Self(217);
    pub const DIALOGUE_OPTIONS: Self = Self(219);
    pub const SPRITE_DIALOGUE: Self = Self(229);
    pub const DOUBLE_SPRITE_DIALOGUE: Self = Self(193);
    pub const CHATBOX_INPUT: Self = Self(162);

    /// Widget groups that indicate a conversation has started.
    pub const DIALOGUE: [WidgetGroupId; 6] = [
        Self::NPC_DIALOGUE,
        Self::PLAYER_DIALOGUE,
        Self::DIALOGUE_OPTIONS,
        Self::SPRITE_DIALOGUE,
        Self::DOUBLE_SPRITE_DIALOGUE,
        Self::CHATBOX_INPUT,
    ];
}
