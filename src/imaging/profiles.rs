//! Named metadata profiles carried from the source image to the JPEG.
//!
//! A profile is an opaque byte block with a name. The converter never looks
//! inside one; it only decides which blocks survive (non-empty ones) and
//! hands them back to the backend after the format switch.
//!
//! | Name | Contents | JPEG carrier |
//! |---|---|---|
//! | `icc` | ICC colour profile | APP2 `ICC_PROFILE`, chunked |
//! | `exif` | TIFF-structured EXIF block (no `Exif\0\0` prefix) | APP1 `Exif` |
//! | `xmp` | XMP packet (UTF-8 XML) | APP1 `http://ns.adobe.com/xap/1.0/` |
//! | `iptc` | Photoshop image resource block (8BIM, contains IPTC-IIM) | APP13 `Photoshop 3.0` |

use std::fmt;

/// Name of a metadata profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileName {
    Icc,
    Exif,
    Xmp,
    Iptc,
    /// Anything else a backend reports. Kept so enumeration is lossless,
    /// even though the JPEG writer has no carrier for it.
    Other(String),
}

impl ProfileName {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "icc" | "icm" => Self::Icc,
            "exif" => Self::Exif,
            "xmp" => Self::Xmp,
            "iptc" | "8bim" => Self::Iptc,
            _ => Self::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Icc => "icc",
            Self::Exif => "exif",
            Self::Xmp => "xmp",
            Self::Iptc => "iptc",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: ProfileName,
    pub data: Vec<u8>,
}

impl Profile {
    pub fn new(name: ProfileName, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Profiles attached to an image, in the order they were attached.
///
/// At most one profile per name: [`set`](Self::set) replaces in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    profiles: Vec<Profile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a profile, replacing any existing profile with the same name.
    pub fn set(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn get(&self, name: &ProfileName) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    /// Clones of every profile whose serialized length is greater than zero.
    pub fn non_empty(&self) -> Vec<Profile> {
        self.profiles
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<Profile> for ProfileSet {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let mut set = Self::new();
        for profile in iter {
            set.set(profile);
        }
        set
    }
}
