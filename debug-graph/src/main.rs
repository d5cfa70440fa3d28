use anyhow::{bail, Result};
use geojson::{Feature, Geometry, Value};
use route_picker_graph::{coord_to_position, parse_feature_collection, RouteNetwork};

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 && args.len() != 3 {
        bail!("Pass in a .geojson file, and optionally a snap precision");
    }
    let input = parse_feature_collection(&std::fs::read_to_string(&args[1])?)?;
    let snap_precision = args.get(2).map(|x| x.parse::<f64>()).transpose()?;
    let network = RouteNetwork::build(&input.features, snap_precision);
    log::info!(
        "{} nodes and {} edges from {} features",
        network.nodes.len(),
        network.edges.len(),
        input.features.len()
    );

    let mut features = Vec::new();
    for (idx, edge) in network.edges.iter().enumerate() {
        let mut f = Feature::from(Geometry::new(Value::LineString(vec![
            coord_to_position(network.node(edge.node1)),
            coord_to_position(network.node(edge.node2)),
        ])));
        f.set_property("edge_id", idx);
        f.set_property("node1", edge.node1.0);
        f.set_property("node2", edge.node2.0);
        f.set_property("length", edge.length);
        features.push(f);
    }
    for (idx, pt) in network.nodes.iter().enumerate() {
        let mut f = Feature::from(Geometry::new(Value::Point(coord_to_position(*pt))));
        f.set_property("node_id", idx);
        features.push(f);
    }
    let gj = geojson::GeoJson::from(features.into_iter().collect::<geojson::FeatureCollection>());
    std::fs::write("debug.geojson", serde_json::to_string_pretty(&gj)?)?;
    Ok(())
}
