//! Incrementally build a multi-waypoint route over a drawn line network. Each new waypoint is
//! snapped onto the network and joined to the previous one by the shortest path, or by a straight
//! line when the network doesn't connect them.

pub mod resample;
pub mod route;
pub mod router;


use geo::Coord;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use route_picker_graph::{coord_to_position, parse_feature_collection};

pub use resample::{resample, resample_features};
pub use route::{DrawEvent, RouteSession, Segment, SegmentKind, SessionState};
pub use router::{find_path, Path, PathError};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Distance between points inserted when resampling lines for display
    pub spacing: f64,
    /// When set, network coordinates that round to the same multiple of this are one node.
    /// Otherwise only exactly equal coordinates are. Waypoints are still projected onto the nearest
    /// edge first; the grid only decides whether that projected point is an existing node.
    pub snap_precision: Option<f64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            spacing: 5.0,
            snap_precision: None,
        }
    }
}

/// The renderer takes positions as `[y, x]`. This is the only place that flips them.
pub fn to_render_order(pt: Coord) -> [f64; 2] {
    [pt.y, pt.x]
}

#[derive(Serialize)]
struct RenderedSegment {
    key: usize,
    positions: Vec<[f64; 2]>,
}

#[wasm_bindgen]
pub struct JsRoutePicker {
    // The latest snapshot of everything drawn or loaded
    network: FeatureCollection,
    session: RouteSession,
}

#[cfg(target_arch = "wasm32")]
static START: std::sync::Once = std::sync::Once::new();

#[wasm_bindgen]
impl JsRoutePicker {
    #[wasm_bindgen(constructor)]
    pub fn new(network_geojson: &str) -> Result<JsRoutePicker, JsValue> {
        // Panics shouldn't happen, but if they do, console.log them.
        #[cfg(target_arch = "wasm32")]
        START.call_once(|| {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);
        });

        let network = parse_feature_collection(network_geojson).map_err(err_to_js)?;
        log::info!("Got a network with {} features", network.features.len());

        Ok(Self {
            network,
            session: RouteSession::new(Config::default()),
        })
    }

    /// Updates configuration for segments created from now on.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, input: &str) {
        match serde_json::from_str(input) {
            Ok(config) => {
                self.session.set_config(config);
            }
            Err(err) => {
                log::warn!("Bad input to setConfig: {err}");
            }
        }
    }

    /// Replaces the network snapshot after the user edits it.
    #[wasm_bindgen(js_name = setNetwork)]
    pub fn set_network(&mut self, network_geojson: &str) -> Result<(), JsValue> {
        self.network = parse_feature_collection(network_geojson).map_err(err_to_js)?;
        Ok(())
    }

    /// Handles a create event from the drawing tools. True if a waypoint was placed and the
    /// caller should redraw.
    #[wasm_bindgen(js_name = onCreate)]
    pub fn on_create(&mut self, event: &str) -> bool {
        match serde_json::from_str::<DrawEvent>(event) {
            Ok(event) => self.session.handle_event(&self.network.features, &event),
            Err(err) => {
                log::warn!("Bad input to onCreate: {err}");
                false
            }
        }
    }

    /// Every segment as `{ key, positions }`, positions in render order.
    #[wasm_bindgen(js_name = renderSegments)]
    pub fn render_segments(&self) -> Result<String, JsValue> {
        let segments: Vec<RenderedSegment> = self
            .session
            .segments()
            .iter()
            .map(|segment| RenderedSegment {
                key: segment.key,
                positions: segment.coords.iter().copied().map(to_render_order).collect(),
            })
            .collect();
        serde_json::to_string(&segments).map_err(err_to_js)
    }

    /// The network with its lines padded, for drawing underneath the route.
    #[wasm_bindgen(js_name = renderBackdrop)]
    pub fn render_backdrop(&self) -> Result<String, JsValue> {
        let padded = resample_features(&self.network, self.session.config().spacing);
        serde_json::to_string(&padded).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = totalLength)]
    pub fn total_length(&self) -> f64 {
        self.session.total_length()
    }

    /// The whole route as one LineString feature, once there's at least one segment.
    #[wasm_bindgen(js_name = toFinalFeature)]
    pub fn to_final_feature(&self) -> Result<Option<String>, JsValue> {
        let mut pts: Vec<Coord> = Vec::new();
        for segment in self.session.segments() {
            pts.extend(&segment.coords);
        }
        pts.dedup();
        if pts.len() < 2 {
            return Ok(None);
        }

        let mut feature = Feature::from(Geometry::new(Value::LineString(
            pts.into_iter().map(coord_to_position).collect(),
        )));
        feature.set_property("length", self.session.total_length());
        serde_json::to_string_pretty(&feature)
            .map(Some)
            .map_err(err_to_js)
    }
}

fn err_to_js<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}
