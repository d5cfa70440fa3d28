use anyhow::Result;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use log::info;

use route_picker::{resample_features, Config, DrawEvent, RouteSession, SegmentKind};
use route_picker_graph::{coord_to_position, parse_feature_collection, point_coord};

/// Replays a GeoJSON file through a route session. LineStrings form the network, and Points are
/// placed as waypoints in file order. The output holds one LineString per segment, preceded by the
/// padded network when `pad_network` is set.
pub fn plan_route(
    input_string: &str,
    config: Config,
    pad_network: bool,
) -> Result<FeatureCollection> {
    let input = parse_feature_collection(input_string)?;

    let mut session = RouteSession::new(config.clone());
    for feature in &input.features {
        if let Some(pt) = point_coord(feature) {
            session.handle_event(&input.features, &DrawEvent::marker(pt));
        }
    }
    info!(
        "Placed {} waypoints, route is {} long",
        session.waypoints().len(),
        session.total_length()
    );

    let mut features = Vec::new();
    if pad_network {
        for mut f in resample_features(&input, config.spacing).features {
            if let Some(Value::LineString(_)) = f.geometry.as_ref().map(|g| &g.value) {
                f.set_property("backdrop", true);
                features.push(f);
            }
        }
    }
    for segment in session.segments() {
        let mut f = Feature::from(Geometry::new(Value::LineString(
            segment.coords.iter().copied().map(coord_to_position).collect(),
        )));
        f.set_property("key", segment.key);
        f.set_property(
            "kind",
            match segment.kind {
                SegmentKind::Routed { .. } => "routed",
                SegmentKind::Straight => "straight",
            },
        );
        f.set_property("length", segment.length());
        features.push(f);
    }
    Ok(features.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0, 0], [10, 0], [10, 10]] },
                    "properties": { "name": "track" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [0, 1] },
                    "properties": null
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [11, 10] },
                    "properties": null
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [50, 50] },
                    "properties": null
                }
            ]
        })
        .to_string()
    }

    #[test]
    fn test_plan_route() {
        let output = plan_route(&input(), Config::default(), false).unwrap();
        assert_eq!(output.features.len(), 2);

        let routed = &output.features[0];
        assert_eq!(routed.property("key"), Some(&json!(0)));
        assert_eq!(routed.property("kind"), Some(&json!("routed")));
        assert_eq!(routed.property("length"), Some(&json!(20.0)));
        assert_eq!(
            routed.geometry.as_ref().unwrap().value,
            Value::LineString(vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![10.0, 10.0]])
        );

        // (11, 10) and (50, 50) both snap to the end of the track, so there's nothing to route over
        let straight = &output.features[1];
        assert_eq!(straight.property("kind"), Some(&json!("straight")));
        assert_eq!(
            straight.geometry.as_ref().unwrap().value,
            Value::LineString(vec![vec![11.0, 10.0], vec![50.0, 50.0]])
        );
    }

    #[test]
    fn test_plan_route_with_backdrop() {
        let config = Config {
            spacing: 4.0,
            ..Default::default()
        };
        let output = plan_route(&input(), config, true).unwrap();
        assert_eq!(output.features.len(), 3);

        let backdrop = &output.features[0];
        assert_eq!(backdrop.property("backdrop"), Some(&json!(true)));
        assert_eq!(backdrop.property("name"), Some(&json!("track")));
        match &backdrop.geometry.as_ref().unwrap().value {
            // 2 points inserted along each of the two 10-long pieces
            Value::LineString(pts) => assert_eq!(pts.len(), 7),
            other => panic!("expected a LineString, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_other_geojson() {
        let single = json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [1, 2] },
            "properties": null
        })
        .to_string();
        assert!(plan_route(&single, Config::default(), false).is_err());
    }
}
