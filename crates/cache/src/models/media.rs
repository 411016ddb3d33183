use exn::{OptionExt, ResultExt};
use mediasync_decode::models::{Camera, Location, MediaPayload, MediaRecord, MicroVideo, Origin, Photo, Video};

use super::{flag, is_set, signed, unsigned};
use crate::error::{Error, ErrorKind};

const PHOTO: &str = "photo";
const VIDEO: &str = "video";
const MICRO_VIDEO: &str = "micro_video";
const UNRECOGNIZED: &str = "unrecognized";

/// Flat representation of a [`MediaRecord`]: one column per attribute, the
/// payload variant in `payload`, booleans as 0/1.
#[derive(sqlx::FromRow)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct MediaRow {
    pub(crate) media_key: String,
    pub(crate) dedup_key: String,
    #[sqlx(rename = "type")]
    pub(crate) media_type: i64,
    pub(crate) is_canonical: i64,
    pub(crate) origin: String,
    pub(crate) file_name: String,
    pub(crate) caption: Option<String>,
    pub(crate) collection_id: String,
    pub(crate) size_bytes: i64,
    pub(crate) quota_charged_bytes: i64,
    pub(crate) content_version: i64,
    pub(crate) utc_timestamp: i64,
    pub(crate) server_creation_timestamp: i64,
    pub(crate) timezone_offset: i64,
    pub(crate) trash_timestamp: i64,
    pub(crate) upload_status: i64,
    pub(crate) is_archived: i64,
    pub(crate) is_favorite: i64,
    pub(crate) is_locked: i64,
    pub(crate) is_original_quality: i64,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
    pub(crate) location_name: Option<String>,
    pub(crate) location_id: Option<String>,
    pub(crate) payload: String,
    pub(crate) remote_url: Option<String>,
    pub(crate) width: Option<i64>,
    pub(crate) height: Option<i64>,
    pub(crate) is_edited: i64,
    pub(crate) make: Option<String>,
    pub(crate) model: Option<String>,
    pub(crate) aperture: Option<f64>,
    pub(crate) shutter_speed: Option<f64>,
    pub(crate) iso: Option<i64>,
    pub(crate) focal_length: Option<f64>,
    pub(crate) duration: Option<i64>,
    pub(crate) capture_frame_rate: Option<f64>,
    pub(crate) encoded_frame_rate: Option<f64>,
    pub(crate) is_micro_video: i64,
    pub(crate) micro_video_width: Option<i64>,
    pub(crate) micro_video_height: Option<i64>,
}
impl TryFrom<&MediaRecord> for MediaRow {
    type Error = Error;
    fn try_from(item: &MediaRecord) -> Result<Self, Self::Error> {
        let (payload, photo, video, micro) = match &item.payload {
            MediaPayload::Photo(photo) => (PHOTO, Some(photo), None, None),
            MediaPayload::Video(video) => (VIDEO, None, Some(video), None),
            MediaPayload::MicroVideo(micro) => (MICRO_VIDEO, micro.still.as_ref(), None, Some(micro)),
            MediaPayload::Unrecognized => (UNRECOGNIZED, None, None, None),
        };
        let camera = photo.map(|photo| &photo.camera);
        Ok(Self {
            media_key: item.media_key.clone(),
            dedup_key: item.dedup_key.clone(),
            media_type: item.media_type,
            is_canonical: flag(item.is_canonical),
            origin: item.origin.as_str().to_string(),
            file_name: item.file_name.clone(),
            caption: item.caption.clone(),
            collection_id: item.collection_id.clone(),
            size_bytes: signed(item.size_bytes, "size bytes")?,
            quota_charged_bytes: signed(item.quota_charged_bytes, "quota charged bytes")?,
            content_version: item.content_version,
            utc_timestamp: item.utc_timestamp,
            server_creation_timestamp: item.server_creation_timestamp,
            timezone_offset: item.timezone_offset,
            trash_timestamp: item.trash_timestamp,
            upload_status: item.upload_status,
            is_archived: flag(item.is_archived),
            is_favorite: flag(item.is_favorite),
            is_locked: flag(item.is_locked),
            is_original_quality: flag(item.is_original_quality),
            latitude: item.location.latitude,
            longitude: item.location.longitude,
            location_name: item.location.name.clone(),
            location_id: item.location.id.clone(),
            payload: payload.to_string(),
            remote_url: item.payload.remote_url().map(str::to_string),
            width: photo.map(|photo| photo.width).or(video.and_then(|video| video.width)).map(i64::from),
            height: photo.map(|photo| photo.height).or(video.and_then(|video| video.height)).map(i64::from),
            is_edited: flag(photo.is_some_and(|photo| photo.is_edited)),
            make: camera.and_then(|camera| camera.make.clone()),
            model: camera.and_then(|camera| camera.model.clone()),
            aperture: camera.and_then(|camera| camera.aperture),
            shutter_speed: camera.and_then(|camera| camera.shutter_speed),
            iso: camera.and_then(|camera| camera.iso).map(i64::from),
            focal_length: camera.and_then(|camera| camera.focal_length),
            duration: video
                .and_then(|video| video.duration)
                .or(micro.map(|micro| micro.duration))
                .map(|duration| signed(duration, "duration"))
                .transpose()?,
            capture_frame_rate: video.and_then(|video| video.capture_frame_rate),
            encoded_frame_rate: video.and_then(|video| video.encoded_frame_rate),
            is_micro_video: flag(micro.is_some()),
            micro_video_width: micro.map(|micro| i64::from(micro.width)),
            micro_video_height: micro.map(|micro| i64::from(micro.height)),
        })
    }
}
impl MediaRow {
    fn photo(&self) -> Result<Photo, Error> {
        Ok(Photo {
            remote_url: self.remote_url.clone().ok_or_raise(|| ErrorKind::InvalidData("remote url"))?,
            width: unsigned(self.width.ok_or_raise(|| ErrorKind::InvalidData("width"))?, "width")?,
            height: unsigned(self.height.ok_or_raise(|| ErrorKind::InvalidData("height"))?, "height")?,
            is_edited: is_set(self.is_edited, "is edited")?,
            camera: Camera {
                make: self.make.clone(),
                model: self.model.clone(),
                aperture: self.aperture,
                shutter_speed: self.shutter_speed,
                iso: self.iso.map(|iso| unsigned(iso, "iso")).transpose()?,
                focal_length: self.focal_length,
            },
        })
    }

    fn video(&self) -> Result<Video, Error> {
        Ok(Video {
            remote_url: self.remote_url.clone().ok_or_raise(|| ErrorKind::InvalidData("remote url"))?,
            duration: self.duration.map(|duration| unsigned(duration, "duration")).transpose()?,
            width: self.width.map(|width| unsigned(width, "width")).transpose()?,
            height: self.height.map(|height| unsigned(height, "height")).transpose()?,
            capture_frame_rate: self.capture_frame_rate,
            encoded_frame_rate: self.encoded_frame_rate,
        })
    }

    fn micro_video(&self) -> Result<MicroVideo, Error> {
        Ok(MicroVideo {
            // The still photo is only stored when it carried a URL.
            still: self.remote_url.is_some().then(|| self.photo()).transpose()?,
            duration: unsigned(self.duration.ok_or_raise(|| ErrorKind::InvalidData("duration"))?, "duration")?,
            width: unsigned(
                self.micro_video_width.ok_or_raise(|| ErrorKind::InvalidData("micro video width"))?,
                "micro video width",
            )?,
            height: unsigned(
                self.micro_video_height.ok_or_raise(|| ErrorKind::InvalidData("micro video height"))?,
                "micro video height",
            )?,
        })
    }
}
impl TryFrom<MediaRow> for MediaRecord {
    type Error = Error;
    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let payload = match row.payload.as_str() {
            PHOTO => MediaPayload::Photo(row.photo()?),
            VIDEO => MediaPayload::Video(row.video()?),
            MICRO_VIDEO => MediaPayload::MicroVideo(row.micro_video()?),
            UNRECOGNIZED => MediaPayload::Unrecognized,
            _ => exn::bail!(ErrorKind::InvalidData("payload")),
        };
        Ok(Self {
            origin: row.origin.parse::<Origin>().or_raise(|| ErrorKind::InvalidData("origin"))?,
            media_key: row.media_key,
            dedup_key: row.dedup_key,
            media_type: row.media_type,
            is_canonical: is_set(row.is_canonical, "is canonical")?,
            file_name: row.file_name,
            caption: row.caption,
            collection_id: row.collection_id,
            size_bytes: unsigned(row.size_bytes, "size bytes")?,
            quota_charged_bytes: unsigned(row.quota_charged_bytes, "quota charged bytes")?,
            content_version: row.content_version,
            utc_timestamp: row.utc_timestamp,
            server_creation_timestamp: row.server_creation_timestamp,
            timezone_offset: row.timezone_offset,
            trash_timestamp: row.trash_timestamp,
            upload_status: row.upload_status,
            is_archived: is_set(row.is_archived, "is archived")?,
            is_favorite: is_set(row.is_favorite, "is favorite")?,
            is_locked: is_set(row.is_locked, "is locked")?,
            is_original_quality: is_set(row.is_original_quality, "is original quality")?,
            location: Location {
                latitude: row.latitude,
                longitude: row.longitude,
                name: row.location_name,
                id: row.location_id,
            },
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use rstest::rstest;

    #[rstest]
    #[case::photo(fixtures::photo("AF1QipPhoto"))]
    #[case::video(fixtures::video("AF1QipVideo"))]
    #[case::micro_video(fixtures::micro_video("AF1QipMicro", true))]
    #[case::micro_video_without_still(fixtures::micro_video("AF1QipMicro", false))]
    #[case::unrecognized(MediaRecord { payload: MediaPayload::Unrecognized, ..fixtures::photo("AF1QipBare") })]
    fn test_model_survives_row(#[case] model: MediaRecord) {
        let row = MediaRow::try_from(&model).unwrap();
        assert_eq!(MediaRecord::try_from(row).unwrap(), model);
    }

    #[test]
    fn test_model_to_row() {
        let row = MediaRow::try_from(&fixtures::micro_video("AF1QipMicro", true)).unwrap();
        assert_eq!(row.payload, MICRO_VIDEO);
        assert_eq!(row.is_micro_video, 1);
        assert_eq!(row.remote_url.as_deref(), Some("https://lh3.example.com/AF1QipMicro"));
        assert_eq!((row.width, row.height), (Some(4032), Some(3024)));
        assert_eq!((row.micro_video_width, row.micro_video_height), (Some(1440), Some(1080)));
        assert_eq!(row.duration, Some(1500));
        assert_eq!(row.origin, "self");
    }

    #[test]
    fn test_row_with_bad_flag_is_rejected() {
        let mut row = MediaRow::try_from(&fixtures::photo("AF1QipPhoto")).unwrap();
        row.is_favorite = 2;
        assert!(matches!(
            *MediaRecord::try_from(row).unwrap_err(),
            ErrorKind::InvalidData("is favorite")
        ));
    }

    #[rstest]
    #[case("payload", "animation")]
    #[case("origin", "somebody")]
    fn test_row_with_unknown_discriminator_is_rejected(#[case] field: &str, #[case] value: &str) {
        let mut row = MediaRow::try_from(&fixtures::photo("AF1QipPhoto")).unwrap();
        match field {
            "payload" => row.payload = value.to_string(),
            _ => row.origin = value.to_string(),
        }
        assert!(matches!(*MediaRecord::try_from(row).unwrap_err(), ErrorKind::InvalidData(f) if f == field));
    }
}
