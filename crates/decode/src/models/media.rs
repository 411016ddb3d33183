use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Where a media item came from, relative to the library owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Origin {
    /// Uploaded by the library owner.
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    Owner,
    /// Shared into the library by a partner account.
    Partner,
    /// Saved from a shared album or conversation.
    Shared,
}
impl Origin {
    /// Maps the remote origin code. Unknown codes are an error, not a default.
    pub fn from_code(code: i64) -> Result<Self, Error> {
        Ok(match code {
            1 => Self::Owner,
            3 => Self::Partner,
            4 => Self::Shared,
            _ => exn::bail!(ErrorKind::UnknownOrigin(code)),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Owner => "self",
            Origin::Partner => "partner",
            Origin::Shared => "shared",
        }
    }
}
impl FromStr for Origin {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "self" => Self::Owner,
            "partner" => Self::Partner,
            "shared" => Self::Shared,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "origin",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Optional geo block.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,
    pub id: Option<String>,
}

/// EXIF summary attached to photos.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Camera {
    pub make: Option<String>,
    pub model: Option<String>,
    /// F-number.
    pub aperture: Option<f64>,
    /// Exposure time in seconds.
    pub shutter_speed: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in millimetres.
    pub focal_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Photo {
    pub remote_url: String,
    pub width: u32,
    pub height: u32,
    pub is_edited: bool,
    pub camera: Camera,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Video {
    pub remote_url: String,
    /// Duration in milliseconds.
    pub duration: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub capture_frame_rate: Option<f64>,
    pub encoded_frame_rate: Option<f64>,
}

/// A photo with a short embedded motion clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MicroVideo {
    /// The still image, when the page carries it.
    pub still: Option<Photo>,
    /// Clip duration in milliseconds.
    pub duration: u64,
    pub width: u32,
    pub height: u32,
}

/// Payload shape of a media item, selected by which payload record is present.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MediaPayload {
    Photo(Photo),
    Video(Video),
    MicroVideo(MicroVideo),
    /// None of the known payload records were present.
    Unrecognized,
}
impl MediaPayload {
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            MediaPayload::Photo(photo) => Some(&photo.remote_url),
            MediaPayload::Video(video) => Some(&video.remote_url),
            MediaPayload::MicroVideo(micro) => micro.still.as_ref().map(|photo| photo.remote_url.as_str()),
            MediaPayload::Unrecognized => None,
        }
    }

    pub fn is_micro_video(&self) -> bool {
        matches!(self, MediaPayload::MicroVideo(_))
    }
}

/// One remote media object.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRecord {
    /// Remote-assigned, globally unique identifier.
    pub media_key: String,
    pub dedup_key: String,
    /// Remote type discriminator.
    pub media_type: i64,
    /// `false` if any property marks this item as an alternate representation.
    pub is_canonical: bool,
    pub origin: Origin,
    pub file_name: String,
    pub caption: Option<String>,
    pub collection_id: String,
    pub size_bytes: u64,
    pub quota_charged_bytes: u64,
    pub content_version: i64,
    /// Capture time, milliseconds since the Unix epoch (UTC).
    pub utc_timestamp: i64,
    pub server_creation_timestamp: i64,
    pub timezone_offset: i64,
    /// Zero unless the item is in the trash.
    pub trash_timestamp: i64,
    pub upload_status: i64,
    pub is_archived: bool,
    pub is_favorite: bool,
    pub is_locked: bool,
    pub is_original_quality: bool,
    pub location: Location,
    pub payload: MediaPayload,
}
