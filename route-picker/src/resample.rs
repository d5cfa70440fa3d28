use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use log::warn;

use route_picker_graph::{coord_to_position, distance, line_string_coords};

/// The most points inserted between any one pair of vertices
pub const MAX_POINTS_PER_PAIR: usize = 10_000;

/// Pads a line with evenly spaced interior points. Every original vertex is kept in order, and
/// between each consecutive pair, `floor(length / spacing)` points are inserted along the straight
/// chord. The shape of the line doesn't change.
pub fn resample(line: &[Coord], spacing: f64) -> Vec<Coord> {
    if !(spacing.is_finite() && spacing > 0.0) {
        warn!("Can't resample with spacing {spacing}, leaving the line as is");
        return line.to_vec();
    }

    let mut result = Vec::with_capacity(line.len());
    for pair in line.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        result.push(start);

        // A zero-length pair gets no points
        let mut count = (distance(start, end) / spacing).floor() as usize;
        if count > MAX_POINTS_PER_PAIR {
            warn!("Spacing {spacing} is too small, only inserting {MAX_POINTS_PER_PAIR} points");
            count = MAX_POINTS_PER_PAIR;
        }
        let delta = end - start;
        for i in 1..=count {
            let ratio = i as f64 / (count + 1) as f64;
            result.push(start + delta * ratio);
        }
    }
    if let Some(last) = line.last() {
        result.push(*last);
    }
    result
}

/// Resamples every well-formed LineString in the collection. Other features, and the properties
/// of everything, pass through untouched.
pub fn resample_features(collection: &FeatureCollection, spacing: f64) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .map(|feature| resample_feature(feature, spacing))
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: collection.foreign_members.clone(),
    }
}

fn resample_feature(feature: &Feature, spacing: f64) -> Feature {
    let mut feature = feature.clone();
    if let Some(pts) = line_string_coords(&feature) {
        let padded = resample(&pts, spacing);
        feature.geometry = Some(Geometry::new(Value::LineString(
            padded.into_iter().map(coord_to_position).collect(),
        )));
    }
    feature
}
