use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of audio-feature columns used for similarity scoring
pub const FEATURE_COUNT: usize = 11;

/// Column names in the order they appear in a feature vector
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "danceability",
    "energy",
    "key",
    "loudness",
    "mode",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// Raw audio features for one track. Every field is absent when the catalog
/// had no audio analysis for the track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<f64>,
    pub loudness: Option<f64>,
    pub mode: Option<f64>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
}

impl AudioFeatures {
    /// Builds a fully populated feature set from a vector in `FEATURE_NAMES` order
    pub fn from_vector(values: [f64; FEATURE_COUNT]) -> Self {
        let [
            danceability,
            energy,
            key,
            loudness,
            mode,
            speechiness,
            acousticness,
            instrumentalness,
            liveness,
            valence,
            tempo,
        ] = values.map(Some);
        Self {
            danceability,
            energy,
            key,
            loudness,
            mode,
            speechiness,
            acousticness,
            instrumentalness,
            liveness,
            valence,
            tempo,
        }
    }

    /// Feature columns in `FEATURE_NAMES` order
    pub fn columns(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.danceability,
            self.energy,
            self.key,
            self.loudness,
            self.mode,
            self.speechiness,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.valence,
            self.tempo,
        ]
    }

    /// Returns the complete vector, or `None` if any feature is missing
    pub fn to_vector(&self) -> Option<[f64; FEATURE_COUNT]> {
        let columns = self.columns();
        let mut vector = [0.0; FEATURE_COUNT];
        for (slot, value) in vector.iter_mut().zip(columns) {
            *slot = value.filter(|v| v.is_finite())?;
        }
        Some(vector)
    }
}

/// One catalog track with its metadata and audio features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub track_id: String,
    pub album_id: String,
    pub name: String,
    /// Artist names joined with ", "
    pub artists: String,
    pub album_name: String,
    pub release_date: Option<NaiveDate>,
    /// Catalog popularity, 0-100
    pub popularity: Option<u8>,
    pub explicit: Option<bool>,
    pub external_url: Option<String>,
    pub duration_ms: Option<u32>,
    pub features: AudioFeatures,
}

/// The tracks of a single playlist, in playlist order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTable {
    rows: Vec<TrackRecord>,
}

impl TrackTable {
    pub fn new(rows: Vec<TrackRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TrackRecord] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&TrackRecord> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row whose name equals `name` exactly.
    ///
    /// Playlists may contain several tracks with the same name; only the
    /// first one in playlist order can be selected as a seed.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.name == name)
    }

    pub fn track_names(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.name.clone()).collect()
    }
}

impl FromIterator<TrackRecord> for TrackTable {
    fn from_iter<I: IntoIterator<Item = TrackRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A recommended track as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub name: String,
    pub artists: String,
    pub album_name: String,
    pub release_date: Option<NaiveDate>,
    /// Raw catalog popularity, or the recency-weighted score for the seed track
    pub popularity: Option<f64>,
}

impl RecommendationEntry {
    /// Projects a track using its raw catalog popularity
    pub fn from_track(track: &TrackRecord) -> Self {
        Self::with_popularity(track, track.popularity.map(f64::from))
    }

    pub fn with_popularity(track: &TrackRecord, popularity: Option<f64>) -> Self {
        Self {
            name: track.name.clone(),
            artists: track.artists.clone(),
            album_name: track.album_name.clone(),
            release_date: track.release_date,
            popularity,
        }
    }
}

/// Output of a recommendation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub entries: Vec<RecommendationEntry>,
    pub success: bool,
}

impl Recommendations {
    pub fn succeeded(entries: Vec<RecommendationEntry>) -> Self {
        Self {
            entries,
            success: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            entries: Vec::new(),
            success: false,
        }
    }
}
