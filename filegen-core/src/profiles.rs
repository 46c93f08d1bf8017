//! Fabrication Profiles - Fixed Output Targets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a fabrication profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileId {
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "laser")]
    Laser,
    #[serde(rename = "vinyl")]
    Vinyl,
    #[serde(rename = "mill")]
    Mill,
    #[serde(rename = "cnc")]
    CncRouter,
}

impl ProfileId {
    pub const ALL: [ProfileId; 5] = [
        ProfileId::ThreeD,
        ProfileId::Laser,
        ProfileId::Vinyl,
        ProfileId::Mill,
        ProfileId::CncRouter,
    ];

    /// Profile used when an id is not recognized.
    pub const FALLBACK: ProfileId = ProfileId::Laser;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileId::ThreeD => "3d",
            ProfileId::Laser => "laser",
            ProfileId::Vinyl => "vinyl",
            ProfileId::Mill => "mill",
            ProfileId::CncRouter => "cnc",
        }
    }

    /// Resolve a raw id, falling back to laser for anything unknown.
    pub fn resolve(raw: &str) -> ProfileId {
        raw.parse().unwrap_or_else(|_| {
            tracing::debug!(profile = raw, fallback = Self::FALLBACK.as_str(), "unknown profile id");
            Self::FALLBACK
        })
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown fabrication profile: {0}")]
pub struct UnknownProfile(pub String);

impl FromStr for ProfileId {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ProfileId::ALL
            .into_iter()
            .find(|id| id.as_str() == needle)
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricationProfile {
    pub id: ProfileId,
    pub name: String,
    pub tagline: String,
    /// Presentation only; the core never reads it.
    pub accent_color: String,
    pub formats: Vec<String>,
    pub demo_title: String,
    pub demo_description: String,
}

impl FabricationProfile {
    fn new(
        id: ProfileId,
        name: &str,
        accent_color: &str,
        formats: &[&str],
        demo_title: &str,
        demo_description: &str,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            tagline: formats.join(" · "),
            accent_color: accent_color.to_string(),
            formats: formats.iter().map(|f| f.to_string()).collect(),
            demo_title: demo_title.to_string(),
            demo_description: demo_description.to_string(),
        }
    }

    pub fn accepts_format(&self, label: &str) -> bool {
        self.formats.iter().any(|f| f.eq_ignore_ascii_case(label))
    }
}

/// Profile registry - built once, never mutated
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileId, FabricationProfile>,
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        let profiles = [
            FabricationProfile::new(
                ProfileId::ThreeD,
                "3D Printing",
                "#FF1493",
                &["STL", "OBJ", "3MF"],
                "Game Controller Wall Mount",
                "Ready for slicing",
            ),
            FabricationProfile::new(
                ProfileId::Laser,
                "Laser Cutting",
                "#00BFFF",
                &["SVG", "DXF", "AI"],
                "Custom Coaster Set",
                "Vector cut paths",
            ),
            FabricationProfile::new(
                ProfileId::Vinyl,
                "Vinyl Cutting",
                "#00D9A5",
                &["SVG", "PNG"],
                "Laptop Decal",
                "Cut-ready vinyl",
            ),
            FabricationProfile::new(
                ProfileId::Mill,
                "Milling",
                "#9B59FF",
                &["STEP", "STL", "DXF"],
                "Engraved Name Plate",
                "Pocket and profile passes",
            ),
            FabricationProfile::new(
                ProfileId::CncRouter,
                "CNC Routing",
                "#FF8C00",
                &["SVG", "DXF", "NC"],
                "Routed Wall Sign",
                "Outside profile cut",
            ),
        ];

        Self {
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: ProfileId) -> &FabricationProfile {
        // builtin() registers every variant
        &self.profiles[&id]
    }

    /// Look up by raw id without falling back.
    pub fn find(&self, raw: &str) -> Option<&FabricationProfile> {
        raw.parse::<ProfileId>().ok().and_then(|id| self.profiles.get(&id))
    }

    pub fn list(&self) -> Vec<&FabricationProfile> {
        self.profiles.values().collect()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
