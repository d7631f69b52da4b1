//! # Song Model
//!
//! Catalog payloads arrive in several shapes: `image` is either a URL or a
//! list of `{quality, url}` objects, artists come as a display string or as
//! structured lists, durations as numbers or numeric strings. [`RawSong`]
//! accepts all of them and [`Song::from_raw`] resolves them once into a
//! canonical [`Song`], so nothing downstream re-inspects the raw shape.

use bridge_traits::{TrackMetadata, TrackSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

// ============================================================================
// Quality preferences
// ============================================================================

/// Preferred streaming bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum StreamQuality {
    #[serde(rename = "12kbps")]
    Kbps12,
    #[serde(rename = "48kbps")]
    Kbps48,
    #[serde(rename = "96kbps")]
    Kbps96,
    #[default]
    #[serde(rename = "160kbps")]
    Kbps160,
    #[serde(rename = "320kbps")]
    Kbps320,
}

impl StreamQuality {
    pub fn kbps(&self) -> u32 {
        match self {
            StreamQuality::Kbps12 => 12,
            StreamQuality::Kbps48 => 48,
            StreamQuality::Kbps96 => 96,
            StreamQuality::Kbps160 => 160,
            StreamQuality::Kbps320 => 320,
        }
    }
}

/// Artwork size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl ImageQuality {
    /// Edge length in pixels of the catalog bucket (`50x50`, `150x150`, `500x500`).
    pub fn pixels(&self) -> u32 {
        match self {
            ImageQuality::Low => 50,
            ImageQuality::Medium => 150,
            ImageQuality::High => 500,
        }
    }
}

// ============================================================================
// Canonical song
// ============================================================================

/// URL tagged with its quality label (`"320kbps"`, `"500x500"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityUrl {
    pub quality: String,
    pub url: String,
}

impl QualityUrl {
    /// Leading number of the quality label; unlabeled entries rank lowest.
    pub fn rank(&self) -> u32 {
        leading_number(&self.quality).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: Option<String>,
    pub name: String,
}

/// Normalised catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    /// Artist line shown under the title.
    pub subtitle: String,
    pub album: Option<AlbumRef>,
    /// Ascending by size.
    pub images: Vec<QualityUrl>,
    /// Ascending by bitrate.
    pub sources: Vec<QualityUrl>,
    /// Downloaded copy; always preferred over remote sources.
    pub local_uri: Option<String>,
    pub duration: Option<Duration>,
}

impl Song {
    /// Build a song directly from a single remote URL.
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            subtitle: String::new(),
            album: None,
            images: Vec::new(),
            sources: vec![QualityUrl {
                quality: String::new(),
                url: url.into(),
            }],
            local_uri: None,
            duration: None,
        }
    }

    pub fn with_local_uri(mut self, uri: impl Into<String>) -> Self {
        self.local_uri = Some(uri.into());
        self
    }

    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        self.subtitle = artists.join(", ");
        self.artists = artists;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Resolve a raw catalog payload. Fails only when the id is missing.
    pub fn from_raw(raw: RawSong) -> Result<Self> {
        let id = raw
            .id
            .map(|id| id.into_string())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PlaybackError::InvalidSong("missing id".to_string()))?;

        let title = raw
            .name
            .or(raw.title)
            .map(|t| decode_entities(t.trim()))
            .unwrap_or_default();

        let artists = resolve_artists(raw.primary_artists, raw.artists, raw.subtitle.as_deref());
        let subtitle = if artists.is_empty() {
            raw.subtitle.map(|s| decode_entities(&s)).unwrap_or_default()
        } else {
            artists.join(", ")
        };

        let album = raw.album.and_then(RawAlbum::resolve);

        let mut images = match raw.image {
            Some(RawImage::Url(url)) if !url.is_empty() => vec![QualityUrl {
                quality: String::new(),
                url,
            }],
            Some(RawImage::List(list)) => list.into_iter().filter_map(RawLink::resolve).collect(),
            _ => Vec::new(),
        };
        images.sort_by_key(QualityUrl::rank);

        let mut sources: Vec<QualityUrl> = raw
            .download_url
            .unwrap_or_default()
            .into_iter()
            .filter_map(RawLink::resolve)
            .collect();
        if sources.is_empty() {
            if let Some(url) = raw.url.filter(|u| !u.is_empty()) {
                sources.push(QualityUrl {
                    quality: String::new(),
                    url,
                });
            }
        }
        sources.sort_by_key(QualityUrl::rank);

        let local_uri = raw.local_uri.or(raw.uri).filter(|u| !u.is_empty());
        let duration = raw
            .duration
            .and_then(RawDuration::seconds)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        Ok(Self {
            id,
            title,
            artists,
            subtitle,
            album,
            images,
            sources,
            local_uri,
            duration,
        })
    }

    pub fn is_playable(&self) -> bool {
        self.local_uri.is_some() || !self.sources.is_empty()
    }

    pub fn is_downloaded(&self) -> bool {
        self.local_uri.is_some()
    }

    /// Source to hand the transport.
    ///
    /// A local URI always wins. Otherwise the best remote source not above
    /// `quality`, falling back to the lowest bitrate available.
    pub fn playback_source(&self, quality: StreamQuality) -> Option<TrackSource> {
        if let Some(uri) = &self.local_uri {
            return Some(TrackSource::LocalFile(uri.clone()));
        }

        let wanted = quality.kbps();
        self.sources
            .iter()
            .rev()
            .find(|source| source.rank() <= wanted)
            .or_else(|| self.sources.first())
            .map(|source| TrackSource::Remote(source.url.clone()))
    }

    /// Closest artwork bucket to `quality`.
    pub fn image_url(&self, quality: ImageQuality) -> Option<&str> {
        let wanted = quality.pixels();
        self.images
            .iter()
            .min_by_key(|image| image.rank().abs_diff(wanted))
            .map(|image| image.url.as_str())
    }

    /// Metadata for the host's notification and lock screen.
    pub fn metadata(&self) -> TrackMetadata {
        TrackMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.subtitle.clone(),
            album: self.album.as_ref().map(|a| a.name.clone()),
            artwork_url: self.image_url(ImageQuality::High).map(str::to_string),
            duration: self.duration,
        }
    }
}

// ============================================================================
// Raw catalog payload
// ============================================================================

/// Catalog payload as received from search, playlists or NFC shares.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSong {
    pub id: Option<RawId>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub primary_artists: Option<RawArtistField>,
    pub artists: Option<RawArtistGroups>,
    pub album: Option<RawAlbum>,
    pub image: Option<RawImage>,
    pub download_url: Option<Vec<RawLink>>,
    pub url: Option<String>,
    pub local_uri: Option<String>,
    pub uri: Option<String>,
    pub duration: Option<RawDuration>,
}

impl RawSong {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlaybackError::InvalidSong(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawArtistField {
    Text(String),
    List(Vec<RawArtist>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArtistGroups {
    #[serde(default)]
    pub primary: Vec<RawArtist>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAlbum {
    Name(String),
    Ref { id: Option<RawId>, name: Option<String> },
}

impl RawAlbum {
    fn resolve(self) -> Option<AlbumRef> {
        match self {
            RawAlbum::Name(name) if !name.is_empty() => Some(AlbumRef {
                id: None,
                name: decode_entities(&name),
            }),
            RawAlbum::Ref {
                id,
                name: Some(name),
            } => Some(AlbumRef {
                id: id.map(RawId::into_string),
                name: decode_entities(&name),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    Url(String),
    List(Vec<RawLink>),
}

/// `{quality, url}` or `{quality, link}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub quality: Option<String>,
    pub url: Option<String>,
    pub link: Option<String>,
}

impl RawLink {
    fn resolve(self) -> Option<QualityUrl> {
        let url = self.url.or(self.link).filter(|u| !u.is_empty())?;
        Some(QualityUrl {
            quality: self.quality.unwrap_or_default(),
            url,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Seconds(f64),
    Text(String),
}

impl RawDuration {
    fn seconds(self) -> Option<f64> {
        let secs = match self {
            RawDuration::Seconds(secs) => secs,
            RawDuration::Text(text) => text.trim().parse().ok()?,
        };
        (secs.is_finite() && secs > 0.0).then_some(secs)
    }
}

fn resolve_artists(
    primary: Option<RawArtistField>,
    groups: Option<RawArtistGroups>,
    subtitle: Option<&str>,
) -> Vec<String> {
    let names: Vec<String> = match primary {
        Some(RawArtistField::Text(text)) => split_artist_line(&text),
        Some(RawArtistField::List(list)) => list.into_iter().map(|a| a.name).collect(),
        None => groups
            .map(|g| g.primary.into_iter().map(|a| a.name).collect())
            .unwrap_or_default(),
    };

    let names: Vec<String> = names
        .into_iter()
        .map(|n| decode_entities(n.trim()))
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        subtitle.map(split_artist_line).unwrap_or_default()
    } else {
        names
    }
}

fn split_artist_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|name| decode_entities(name.trim()))
        .filter(|name| !name.is_empty())
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn leading_number(label: &str) -> Option<u32> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
