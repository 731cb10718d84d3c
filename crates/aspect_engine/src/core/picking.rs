//! Picking configuration values shared by the frontend settings node and its
//! render-side peer

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// How pick hits are computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickMethod {
    /// Test against bounding volumes only
    #[default]
    BoundingVolume,
    /// Test against individual triangles
    Triangle,
}

/// Which hits are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickResultMode {
    /// Only the closest hit
    #[default]
    Nearest,
    /// Every hit along the ray
    All,
}

bitflags! {
    /// Which triangle faces can be picked
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FaceOrientation: u8 {
        /// Front facing triangles
        const FRONT_FACE = 0x01;
        /// Back facing triangles
        const BACK_FACE = 0x02;
        /// Both orientations
        const FRONT_AND_BACK_FACE = Self::FRONT_FACE.bits() | Self::BACK_FACE.bits();
    }
}

impl Default for FaceOrientation {
    fn default() -> Self {
        Self::FRONT_FACE
    }
}

impl TryFrom<i32> for PickMethod {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BoundingVolume),
            1 => Ok(Self::Triangle),
            other => Err(other),
        }
    }
}

impl From<PickMethod> for i32 {
    fn from(method: PickMethod) -> Self {
        match method {
            PickMethod::BoundingVolume => 0,
            PickMethod::Triangle => 1,
        }
    }
}

impl TryFrom<i32> for PickResultMode {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nearest),
            1 => Ok(Self::All),
            other => Err(other),
        }
    }
}

impl From<PickResultMode> for i32 {
    fn from(mode: PickResultMode) -> Self {
        match mode {
            PickResultMode::Nearest => 0,
            PickResultMode::All => 1,
        }
    }
}

impl TryFrom<i32> for FaceOrientation {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_bits)
            .filter(|flags| !flags.is_empty())
            .ok_or(value)
    }
}

impl From<FaceOrientation> for i32 {
    fn from(flags: FaceOrientation) -> Self {
        Self::from(flags.bits())
    }
}
