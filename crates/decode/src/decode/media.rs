//! Media item decoding.

use serde_json::Value;
use tracing::instrument;

use crate::dedup::dedup_key_from_sha1;
use crate::error::Result;
use crate::models::{Camera, Location, MediaPayload, MediaRecord, MicroVideo, Origin, Photo, Video};
use crate::scaled::{fixed32_to_f64, int32_to_f64, int64_to_f64};
use crate::tags::{
    at, bits64, block, bytes, flag, has, identifier, int, opt_int, opt_text, repeated, req_int, req_text, required,
};

/// Property type marking an item as an alternate (non-canonical) representation.
const NON_CANONICAL_PROPERTY: i64 = 27;

/// Payload records a media item may carry, by discriminating path.
enum Shape<'a> {
    Photo(&'a Value),
    Video(&'a Value),
    MicroVideo { still: Option<&'a Value>, motion: &'a Value },
    Unrecognized,
}
impl<'a> Shape<'a> {
    /// Motion clips take precedence over plain videos, which take precedence
    /// over photos: a micro-video also carries its still photo record.
    fn of(record: &'a Value) -> Self {
        let still = block(record, &["5", "2"]);
        if let Some(motion) = block(record, &["5", "5", "2", "4"]) {
            return Shape::MicroVideo { still, motion };
        }
        if let Some(video) = block(record, &["5", "3"]) {
            return Shape::Video(video);
        }
        match still {
            Some(photo) => Shape::Photo(photo),
            None => Shape::Unrecognized,
        }
    }
}

/// Decodes a single media item.
///
/// # Errors
///
/// Returns an error if a required field is missing or malformed, or if the
/// origin code is unknown. Optional blocks (location, camera, video details)
/// never cause an error by being absent.
#[instrument(level = "trace", skip(record), fields(media_key))]
pub fn decode_media(record: &Value) -> Result<MediaRecord> {
    let media_key = req_text(record, &["1"], "media_key")?;
    tracing::Span::current().record("media_key", media_key.as_str());
    let info = required(record, &["2"], "media_info")?;
    Ok(MediaRecord {
        dedup_key: self::dedup_key(info)?,
        media_type: req_int(record, &["5", "1"], "type")?,
        is_canonical: self::is_canonical(info),
        origin: Origin::from_code(req_int(info, &["30", "1"], "origin")?)?,
        file_name: req_text(info, &["4"], "file_name")?,
        caption: opt_text(info, &["3"], "caption")?.filter(|caption| !caption.is_empty()),
        collection_id: req_text(info, &["1", "1"], "collection_id")?,
        size_bytes: req_int(info, &["10"], "size_bytes")?,
        quota_charged_bytes: req_int(info, &["35", "2"], "quota_charged_bytes")?,
        content_version: req_int(info, &["26"], "content_version")?,
        utc_timestamp: req_int(info, &["7"], "utc_timestamp")?,
        server_creation_timestamp: req_int(info, &["9"], "server_creation_timestamp")?,
        timezone_offset: opt_int(info, &["8"], "timezone_offset")?.unwrap_or(0),
        trash_timestamp: opt_int(info, &["16", "3"], "trash_timestamp")?.unwrap_or(0),
        upload_status: req_int(info, &["11"], "upload_status")?,
        is_archived: flag(info, &["29", "1"], 1, "is_archived")?,
        is_favorite: flag(info, &["31", "1"], 1, "is_favorite")?,
        is_locked: flag(info, &["39", "1"], 1, "is_locked")?,
        is_original_quality: flag(info, &["35", "3"], 2, "is_original_quality")?,
        location: self::location(record)?,
        payload: self::payload(record)?,
        media_key,
    })
}

/// Resolves the dedup key.
///
/// Candidates live under any tag of field `21` starting with `1`. The map has
/// no defined order, so the lowest tag wins (shortest first, then lexical),
/// putting `1` ahead of `10`, `11`, etc. When the winning candidate is not
/// text, the key is derived from the raw SHA-1 bytes in `13.1` instead.
fn dedup_key(info: &Value) -> Result<String> {
    let candidate = at(info, &["21"]).and_then(Value::as_object).and_then(|candidates| {
        candidates
            .iter()
            .filter(|(tag, _)| tag.starts_with('1'))
            .min_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(|(_, value)| value)
    });
    if let Some(Value::String(key)) = candidate {
        return Ok(key.clone());
    }
    let digest = bytes(required(info, &["13", "1"], "dedup_key")?, "dedup_key")?;
    Ok(dedup_key_from_sha1(digest))
}

fn is_canonical(info: &Value) -> bool {
    !repeated(at(info, &["5"])).iter().any(|property| {
        at(property, &["1"]).and_then(|kind| int::<i64>(kind, "property").ok()) == Some(NON_CANONICAL_PROPERTY)
    })
}

fn location(record: &Value) -> Result<Location> {
    let mut location = Location::default();
    if let Some(coordinates) = block(record, &["17", "1"]) {
        location.latitude = Some(fixed32_to_f64(req_int(coordinates, &["1"], "latitude")?, "latitude")?);
        location.longitude = Some(fixed32_to_f64(req_int(coordinates, &["2"], "longitude")?, "longitude")?);
    }
    if let Some(place) = block(record, &["17", "5"]) {
        location.name = Some(req_text(place, &["2", "1"], "location_name")?);
        location.id = Some(identifier(required(place, &["3"], "location_id")?, "location_id")?);
    }
    Ok(location)
}

fn payload(record: &Value) -> Result<MediaPayload> {
    Ok(match Shape::of(record) {
        Shape::Photo(photo) => MediaPayload::Photo(self::photo(photo)?),
        Shape::Video(video) => MediaPayload::Video(self::video(video)?),
        Shape::MicroVideo { still, motion } => MediaPayload::MicroVideo(MicroVideo {
            still: still.map(self::photo).transpose()?,
            duration: req_int(motion, &["1"], "duration")?,
            width: req_int(motion, &["4"], "micro_video_width")?,
            height: req_int(motion, &["5"], "micro_video_height")?,
        }),
        Shape::Unrecognized => {
            tracing::debug!("media item carries no recognised payload");
            MediaPayload::Unrecognized
        },
    })
}

fn photo(payload: &Value) -> Result<Photo> {
    let image = required(payload, &["1"], "photo")?;
    Ok(Photo {
        remote_url: req_text(image, &["1"], "remote_url")?,
        width: req_int(image, &["9", "1"], "width")?,
        height: req_int(image, &["9", "2"], "height")?,
        is_edited: has(payload, &["4"]),
        camera: self::camera(image)?,
    })
}

fn camera(image: &Value) -> Result<Camera> {
    let Some(exif) = block(image, &["9", "5"]) else {
        return Ok(Camera::default());
    };
    let float32 = |tag: &str, field: &'static str| -> Result<Option<f64>> {
        opt_int::<i64>(exif, &[tag], field)?.map(|raw| int32_to_f64(raw, field)).transpose()
    };
    Ok(Camera {
        make: opt_text(exif, &["1"], "make")?,
        model: opt_text(exif, &["2"], "model")?,
        aperture: float32("4", "aperture")?,
        shutter_speed: float32("5", "shutter_speed")?,
        iso: opt_int(exif, &["6"], "iso")?,
        focal_length: float32("7", "focal_length")?,
    })
}

fn video(payload: &Value) -> Result<Video> {
    let details = block(payload, &["4"]);
    let float64 = |tag: &str, field: &'static str| -> Result<Option<f64>> {
        at(payload, &["6", tag]).map(|raw| bits64(raw, field).map(int64_to_f64)).transpose()
    };
    Ok(Video {
        remote_url: req_text(payload, &["2", "1"], "remote_url")?,
        duration: details.map(|d| opt_int(d, &["1"], "duration")).transpose()?.flatten(),
        width: details.map(|d| opt_int(d, &["4"], "width")).transpose()?.flatten(),
        height: details.map(|d| opt_int(d, &["5"], "height")).transpose()?.flatten(),
        capture_frame_rate: float64("4", "capture_frame_rate")?,
        encoded_frame_rate: float64("5", "encoded_frame_rate")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::fixtures;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_photo_item() {
        let item = decode_media(&fixtures::photo("AF1QipPhoto")).unwrap();
        assert_eq!(item.media_key, "AF1QipPhoto");
        assert_eq!(item.file_name, "IMG_0001.jpg");
        assert_eq!(item.dedup_key, "bjvmULLYvkVj8jWVQFu1Pl98hYA");
        assert_eq!(item.origin, Origin::Owner);
        assert_eq!(item.caption.as_deref(), Some("Tea time"));
        assert!(item.is_canonical);
        assert!(item.is_favorite);
        assert!(!item.is_archived);
        assert!(item.is_original_quality);
        assert_eq!(item.size_bytes, 2_048_576);
        assert_eq!(item.trash_timestamp, 0);
        assert_eq!(item.location.latitude, Some(51.50077));
        assert_eq!(item.location.longitude, Some(-0.1277));
        assert_eq!(item.location.name.as_deref(), Some("London"));
        assert_eq!(item.location.id.as_deref(), Some("ChIJdd4hrwug2EcRmSrV3Vo6llI"));
        let MediaPayload::Photo(photo) = item.payload else {
            panic!("expected a photo payload, got {:?}", item.payload);
        };
        assert_eq!((photo.width, photo.height), (4032, 3024));
        assert!(!photo.is_edited);
        assert_eq!(photo.camera.make.as_deref(), Some("Google"));
        assert_eq!(photo.camera.aperture, Some(f64::from(1.8f32)));
        assert_eq!(photo.camera.iso, Some(100));
    }

    #[test]
    fn test_video_item() {
        let item = decode_media(&fixtures::video("AF1QipVideo")).unwrap();
        let MediaPayload::Video(video) = item.payload else {
            panic!("expected a video payload, got {:?}", item.payload);
        };
        assert_eq!(video.remote_url, "https://video.example/AF1QipVideo");
        assert_eq!(video.duration, Some(12_500));
        assert_eq!((video.width, video.height), (Some(1920), Some(1080)));
        assert_eq!(video.capture_frame_rate, Some(29.97));
        assert_eq!(video.encoded_frame_rate, None);
    }

    #[test]
    fn test_micro_video_keeps_still_photo() {
        let mut record = fixtures::photo("AF1QipMotion");
        record["5"]["5"] = json!({"2": {"4": {"1": 1500, "4": 1440, "5": 1080}}});
        let item = decode_media(&record).unwrap();
        let MediaPayload::MicroVideo(micro) = &item.payload else {
            panic!("expected a micro-video payload, got {:?}", item.payload);
        };
        assert_eq!(micro.duration, 1500);
        assert_eq!((micro.width, micro.height), (1440, 1080));
        assert_eq!(micro.still.as_ref().map(|still| still.width), Some(4032));
        assert!(item.payload.is_micro_video());
    }

    #[test]
    fn test_missing_payload_is_kept_as_unrecognized() {
        let mut record = fixtures::photo("AF1QipBare");
        record["5"] = json!({"1": 1});
        let item = decode_media(&record).unwrap();
        assert_eq!(item.payload, MediaPayload::Unrecognized);
        assert_eq!(item.payload.remote_url(), None);
    }

    #[test]
    fn test_non_canonical_property_marker() {
        let mut record = fixtures::photo("AF1QipDupe");
        record["2"]["5"] = json!([{"1": 3}, {"1": 27}]);
        assert!(!decode_media(&record).unwrap().is_canonical);
        // A single property arrives as a bare record.
        record["2"]["5"] = json!({"1": 27});
        assert!(!decode_media(&record).unwrap().is_canonical);
    }

    #[test]
    fn test_unknown_origin_is_rejected() {
        let mut record = fixtures::photo("AF1QipOrigin");
        record["2"]["30"]["1"] = json!(2);
        let err = decode_media(&record).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownOrigin(2));
    }

    #[test]
    fn test_dedup_key_prefers_lowest_tag() {
        let mut record = fixtures::photo("AF1QipTags");
        record["2"]["21"] = json!({"10": "later", "2": "unrelated", "1": "first"});
        assert_eq!(decode_media(&record).unwrap().dedup_key, "first");
    }

    #[test]
    fn test_dedup_key_falls_back_to_digest_bytes() {
        let mut record = fixtures::photo("AF1QipDigest");
        record["2"]["21"] = json!({"1": {"1": 5}});
        assert_eq!(decode_media(&record).unwrap().dedup_key, "bjvmULLYvkVj8jWVQFu1Pl98hYA");
        record["2"]["13"]["1"] = json!("bjvmULLYvkVj8jWVQFu1Pl98hYA=");
        assert_eq!(decode_media(&record).unwrap().dedup_key, "bjvmULLYvkVj8jWVQFu1Pl98hYA");
    }

    #[test]
    fn test_dedup_key_missing_everywhere() {
        let mut record = fixtures::photo("AF1QipNoKey");
        record["2"]["21"] = json!({});
        record["2"].as_object_mut().unwrap().remove("13");
        assert_eq!(*decode_media(&record).unwrap_err(), ErrorKind::MissingField("dedup_key"));
    }

    #[test]
    fn test_empty_caption_is_none() {
        let mut record = fixtures::photo("AF1QipCaption");
        record["2"]["3"] = json!("");
        assert_eq!(decode_media(&record).unwrap().caption, None);
    }
}
