use std::fs::File;
use std::io::BufWriter;

use anyhow::Result;
use clap::Parser;
use geojson_to_route::plan_route;
use route_picker::Config;

#[derive(Parser)]
struct Args {
    /// Path to a .geojson file with LineStrings for the network and Points for the waypoints,
    /// in placement order
    #[arg(long)]
    input: String,

    /// Output file to write
    #[arg(long, default_value = "route.geojson")]
    output: String,

    /// Distance between points added when padding the network
    #[arg(long, default_value_t = 5.0)]
    spacing: f64,

    /// Merge network coordinates that round to the same multiple of this. By default, only exactly
    /// equal coordinates are joined.
    #[arg(long)]
    snap_precision: Option<f64>,

    /// Also write the padded network lines
    #[clap(long)]
    pad_network: bool,
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();
    let config = Config {
        spacing: args.spacing,
        snap_precision: args.snap_precision,
    };
    let route = plan_route(
        &std::fs::read_to_string(&args.input)?,
        config,
        args.pad_network,
    )?;

    let output = BufWriter::new(File::create(args.output)?);
    serde_json::to_writer_pretty(output, &route)?;
    Ok(())
}
