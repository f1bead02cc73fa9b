use crate::models::{TrackTable, FEATURE_COUNT};

/// A complete audio-feature vector in `FEATURE_NAMES` order
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Observed range of one feature column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBounds {
    pub min: f64,
    pub max: f64,
}

impl ColumnBounds {
    /// Maps `value` linearly so that `min` becomes 0.0 and `max` becomes 1.0.
    /// A constant column maps everything to 0.0.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 {
            (value - self.min) / range
        } else {
            0.0
        }
    }
}

/// Min-max scaled feature vectors, parallel to the rows of a `TrackTable`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatureMatrix {
    rows: Vec<Option<FeatureVector>>,
    bounds: Option<[ColumnBounds; FEATURE_COUNT]>,
}

impl NormalizedFeatureMatrix {
    /// Scaled vector for table row `index`; `None` if the row was excluded
    pub fn row(&self, index: usize) -> Option<&FeatureVector> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    /// Number of table rows, usable or not
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn usable_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }

    /// Column bounds, absent when no row had a complete feature vector
    pub fn bounds(&self) -> Option<&[ColumnBounds; FEATURE_COUNT]> {
        self.bounds.as_ref()
    }
}

/// Rescales every feature column of `table` into [0, 1].
///
/// Rows missing any feature are excluded: they get no vector and do not
/// contribute to the column bounds.
pub fn normalize(table: &TrackTable) -> NormalizedFeatureMatrix {
    let raw: Vec<Option<FeatureVector>> = table
        .rows()
        .iter()
        .map(|track| track.features.to_vector())
        .collect();

    let excluded = raw.iter().filter(|row| row.is_none()).count();
    if excluded > 0 {
        tracing::debug!(
            excluded,
            total = raw.len(),
            "Excluding tracks with incomplete audio features"
        );
    }

    let bounds = column_bounds(raw.iter().flatten());

    let rows = match &bounds {
        Some(bounds) => raw
            .into_iter()
            .map(|row| {
                row.map(|vector| {
                    let mut scaled = [0.0; FEATURE_COUNT];
                    for ((out, value), column) in scaled.iter_mut().zip(vector).zip(bounds) {
                        *out = column.scale(value);
                    }
                    scaled
                })
            })
            .collect(),
        None => raw,
    };

    NormalizedFeatureMatrix { rows, bounds }
}

fn column_bounds<'a>(
    vectors: impl Iterator<Item = &'a FeatureVector>,
) -> Option<[ColumnBounds; FEATURE_COUNT]> {
    let mut bounds: Option<[ColumnBounds; FEATURE_COUNT]> = None;

    for vector in vectors {
        let current = bounds.get_or_insert_with(|| {
            (*vector).map(|value| ColumnBounds {
                min: value,
                max: value,
            })
        });
        for (column, &value) in current.iter_mut().zip(vector) {
            column.min = column.min.min(value);
            column.max = column.max.max(value);
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AudioFeatures, TrackRecord};

    fn track(name: &str, features: AudioFeatures) -> TrackRecord {
        TrackRecord {
            track_id: name.to_lowercase(),
            album_id: "album".to_string(),
            name: name.to_string(),
            artists: "Artist".to_string(),
            album_name: "Album".to_string(),
            release_date: None,
            popularity: None,
            explicit: None,
            external_url: None,
            duration_ms: None,
            features,
        }
    }

    fn vector_with(first: f64, tempo: f64) -> AudioFeatures {
        let mut values = [0.5; FEATURE_COUNT];
        values[0] = first;
        values[10] = tempo;
        AudioFeatures::from_vector(values)
    }

    #[test]
    fn test_non_constant_columns_span_zero_to_one() {
        let table: TrackTable = vec![
            track("A", vector_with(0.2, 90.0)),
            track("B", vector_with(0.8, 180.0)),
            track("C", vector_with(0.5, 120.0)),
        ]
        .into_iter()
        .collect();

        let matrix = normalize(&table);

        for column in [0, 10] {
            let values: Vec<f64> = (0..3).map(|i| matrix.row(i).unwrap()[column]).collect();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(min, 0.0);
            assert_eq!(max, 1.0);
        }

        assert!((matrix.row(2).unwrap()[0] - 0.5).abs() < 1e-9);
        assert!((matrix.row(2).unwrap()[10] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let table: TrackTable = vec![
            track("A", vector_with(0.2, 100.0)),
            track("B", vector_with(0.9, 100.0)),
        ]
        .into_iter()
        .collect();

        let matrix = normalize(&table);

        // Column 1 is 0.5 everywhere, tempo is 100 everywhere
        for i in 0..2 {
            let row = matrix.row(i).unwrap();
            assert_eq!(row[1], 0.0);
            assert_eq!(row[10], 0.0);
        }
    }

    #[test]
    fn test_rows_with_missing_features_are_excluded() {
        let mut incomplete = vector_with(5.0, 500.0);
        incomplete.valence = None;

        let table: TrackTable = vec![
            track("A", vector_with(0.0, 100.0)),
            track("Broken", incomplete),
            track("C", vector_with(1.0, 200.0)),
        ]
        .into_iter()
        .collect();

        let matrix = normalize(&table);

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.usable_rows(), 2);
        assert!(matrix.row(1).is_none());

        // The excluded row's outlier values must not stretch the bounds
        let bounds = matrix.bounds().unwrap();
        assert_eq!(bounds[0], ColumnBounds { min: 0.0, max: 1.0 });
        assert_eq!(bounds[10], ColumnBounds { min: 100.0, max: 200.0 });
    }

    #[test]
    fn test_table_without_features_has_no_bounds() {
        let table: TrackTable = vec![track("A", AudioFeatures::default())]
            .into_iter()
            .collect();

        let matrix = normalize(&table);

        assert_eq!(matrix.usable_rows(), 0);
        assert!(matrix.bounds().is_none());
        assert!(matrix.row(0).is_none());
    }

    #[test]
    fn test_empty_table() {
        let matrix = normalize(&TrackTable::default());
        assert!(matrix.is_empty());
        assert!(matrix.bounds().is_none());
    }

    #[test]
    fn test_bounds_are_recomputed_per_table() {
        let first: TrackTable = vec![
            track("A", vector_with(0.0, 60.0)),
            track("B", vector_with(1.0, 120.0)),
        ]
        .into_iter()
        .collect();
        let second: TrackTable = vec![
            track("A", vector_with(0.0, 60.0)),
            track("B", vector_with(1.0, 240.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(normalize(&first).row(1).unwrap()[10], 1.0);
        assert_eq!(normalize(&second).bounds().unwrap()[10].max, 240.0);
        assert_eq!(normalize(&first).bounds().unwrap()[10].max, 120.0);
    }
}
