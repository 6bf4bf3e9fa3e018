//! Core types for anchor persistence
//!
//! ## Table of Contents
//! - **AnchorId**: 128-bit persistent anchor identifier (two u64 halves)
//! - **PrefabSelector**: fixed prefab index or random choice
//! - **Pose**: engine-agnostic position + rotation
//! - **AnchorHandle**: a live platform anchor (trackable id + pose)
//! - **ObjectHandle**: opaque handle to a spawned presentation object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::MooringError;

/// 128-bit identifier for a persisted anchor, split into two u64 halves.
///
/// The canonical text form is the two halves as hyphen-joined 16-digit
/// hexadecimal strings, low half first (`{low:016x}-{high:016x}`). That
/// string is also the JSON map key in the store file, so the type
/// serializes as text rather than as a struct. Parsing accepts either
/// case; files written by other runtimes use upper-case digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId {
    low: u64,
    high: u64,
}

impl AnchorId {
    /// Create an AnchorId from its two halves
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Create a random AnchorId
    pub fn random() -> Self {
        let bits = Uuid::new_v4().as_u128();
        Self {
            low: bits as u64,
            high: (bits >> 64) as u64,
        }
    }

    /// The low 64 bits
    pub fn low(&self) -> u64 {
        self.low
    }

    /// The high 64 bits
    pub fn high(&self) -> u64 {
        self.high
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}-{:016x}", self.low, self.high)
    }
}

impl FromStr for AnchorId {
    type Err = MooringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once('-')
            .ok_or_else(|| MooringError::InvalidAnchorId(s.to_string()))?;
        let half = |text: &str| {
            u64::from_str_radix(text, 16)
                .map_err(|_| MooringError::InvalidAnchorId(s.to_string()))
        };
        Ok(Self {
            low: half(low)?,
            high: half(high)?,
        })
    }
}

impl Serialize for AnchorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AnchorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Which prefab a spawned object uses.
///
/// The wire form is the signed integer from the store file: any negative
/// value means "choose randomly at spawn time", zero or greater indexes
/// the spawner's prefab catalog. Encoding always writes -1 for random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefabSelector {
    /// Draw a fresh catalog index on every spawn
    Random,
    /// A fixed index into the prefab catalog
    Prefab(usize),
}

impl PrefabSelector {
    /// Decode the signed wire integer
    pub fn from_wire(value: i64) -> Self {
        if value < 0 {
            Self::Random
        } else {
            Self::Prefab(value as usize)
        }
    }

    /// Encode to the signed wire integer
    pub fn to_wire(self) -> i64 {
        match self {
            Self::Random => -1,
            Self::Prefab(index) => index as i64,
        }
    }

    /// Whether this selector draws randomly
    pub fn is_random(self) -> bool {
        matches!(self, Self::Random)
    }
}

impl fmt::Display for PrefabSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Prefab(index) => write!(f, "prefab {index}"),
        }
    }
}

impl Serialize for PrefabSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for PrefabSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_wire(i64::deserialize(deserializer)?))
    }
}

/// Engine-agnostic transform for anchors and spawned objects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World-space position (x, y, z)
    pub position: [f32; 3],
    /// Rotation quaternion (x, y, z, w)
    pub rotation: [f32; 4],
}

impl Pose {
    /// Identity pose at the origin
    pub fn identity() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Pose at a position with identity rotation
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::identity()
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// A live platform anchor: the provider's trackable id plus its pose.
///
/// This is a back-reference to a provider-owned resource. Dropping the
/// handle does not destroy the anchor; only
/// [`AnchorProvider::remove_anchor`](crate::provider::AnchorProvider::remove_anchor)
/// does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorHandle {
    /// Session-local trackable id (distinct from any persisted id)
    pub id: AnchorId,
    /// Pose the anchor was created or loaded at
    pub pose: Pose,
}

impl AnchorHandle {
    /// Create a handle from a trackable id and pose
    pub fn new(id: AnchorId, pose: Pose) -> Self {
        Self { id, pose }
    }
}

/// Opaque handle to a live presentation object issued by the spawner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    /// Create an ObjectHandle from a raw value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_anchor_id_display_is_padded_hex() {
        let id = AnchorId::new(0x1f, 0xc186d6401e9a4f66);
        assert_eq!(id.to_string(), "000000000000001f-c186d6401e9a4f66");
    }

    #[test]
    fn test_anchor_id_parse_roundtrip() {
        let id = AnchorId::random();
        let parsed: AnchorId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_anchor_id_parse_accepts_upper_case() {
        let parsed: AnchorId = "C186D6401E9A4F66-8004FE8301A4DC21".parse().unwrap();
        assert_eq!(parsed.low(), 0xc186d6401e9a4f66);
        assert_eq!(parsed.high(), 0x8004fe8301a4dc21);
    }

    #[test]
    fn test_anchor_id_parse_rejects_garbage() {
        assert!("no hyphen".parse::<AnchorId>().is_err());
        assert!("12ab".parse::<AnchorId>().is_err());
        assert!("12ab-zz".parse::<AnchorId>().is_err());
        assert!("12ab-34cd-56ef".parse::<AnchorId>().is_err());
        assert!("-34cd".parse::<AnchorId>().is_err());
    }

    #[test]
    fn test_selector_wire_mapping() {
        assert_eq!(PrefabSelector::from_wire(-1), PrefabSelector::Random);
        assert_eq!(PrefabSelector::from_wire(-42), PrefabSelector::Random);
        assert_eq!(PrefabSelector::from_wire(0), PrefabSelector::Prefab(0));
        assert_eq!(PrefabSelector::from_wire(7), PrefabSelector::Prefab(7));
        assert_eq!(PrefabSelector::Random.to_wire(), -1);
        assert_eq!(PrefabSelector::Prefab(3).to_wire(), 3);
    }

    #[test]
    fn test_store_wire_format() {
        let mut map = HashMap::new();
        map.insert(AnchorId::new(1, 2), PrefabSelector::Random);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0000000000000001-0000000000000002":-1}"#);

        let back: HashMap<AnchorId, PrefabSelector> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_pose_default_is_identity() {
        let pose = Pose::default();
        assert_eq!(pose.position, [0.0, 0.0, 0.0]);
        assert_eq!(pose.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(Pose::at(1.0, 2.0, 3.0).position, [1.0, 2.0, 3.0]);
    }
}
