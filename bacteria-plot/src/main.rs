use anyhow::{Context, Result};
use bacteria_common::PopulationRecord;
use clap::Parser;
use env_logger::Builder;
use log::{debug, info, warn, LevelFilter};
use plotters::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the population plotter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input stats file written by bacteria-sim (.csv or .json)
    #[arg(short, long)]
    input: PathBuf,

    /// Output image file path (.png)
    #[arg(short, long, default_value = "population.png")]
    output: PathBuf,

    /// Width of the output image in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Height of the output image in pixels
    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Chart caption
    #[arg(long, default_value = "Bacteria population over time")]
    title: String,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env()
    .filter(None, LevelFilter::Info)
    .init();

    info!("Starting Population Plotter...");
    info!("Input file: {}", args.input.display());
    info!("Output image: {}", args.output.display());
    info!("Image dimensions: {}x{}", args.width, args.height);

    let start_time = Instant::now();
    let records = load_records(&args.input)?;
    info!("Loaded {} population records", records.len());

    if records.is_empty() {
        warn!("Input file contains no records. Exiting.");
        return Ok(());
    }

    draw_chart(&records, &args)?;

    info!(
        "Chart written to {} in {:.2?}",
        args.output.display(),
        start_time.elapsed()
    );
    Ok(())
}

/// Reads population records, choosing the decoder from the file extension.
fn load_records(path: &Path) -> Result<Vec<PopulationRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut records = if is_json {
        debug!("Decoding {} as JSON", path.display());
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse JSON stats from {}", path.display()))?
    } else {
        debug!("Decoding {} as CSV", path.display());
        parse_csv(reader)
            .with_context(|| format!("Failed to parse CSV stats from {}", path.display()))?
    };

    sort_records(&mut records);
    Ok(records)
}

fn parse_csv<R: std::io::Read>(reader: R) -> Result<Vec<PopulationRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        let record: PopulationRecord = row?;
        records.push(record);
    }
    Ok(records)
}

// Plots expect steps in order; duplicated steps keep the last value
fn sort_records(records: &mut Vec<PopulationRecord>) {
    records.reverse();
    records.sort_by_key(|r| r.step);
    records.dedup_by_key(|r| r.step);
}

/// Axis ranges covering every record, never empty.
fn axis_ranges(records: &[PopulationRecord]) -> (Range<u32>, Range<u64>) {
    let max_step = records.iter().map(|r| r.step).max().unwrap_or(0);
    let max_count = records.iter().map(|r| r.bacteria_count).max().unwrap_or(0);
    // Headroom on both axes so the last point is not drawn on the frame
    let count_top = max_count + (max_count / 10).max(1);
    (0..max_step + 1, 0..count_top)
}

fn draw_chart(records: &[PopulationRecord], args: &Args) -> Result<()> {
    let (x_range, y_range) = axis_ranges(records);

    let root = BitMapBackend::new(&args.output, (args.width, args.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("Failed to clear chart background: {}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&args.title, ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| anyhow::anyhow!("Failed to build chart axes: {}", e))?;

    chart
        .configure_mesh()
        .x_desc("Step")
        .y_desc("Bacteria count")
        .draw()
        .map_err(|e| anyhow::anyhow!("Failed to draw chart mesh: {}", e))?;

    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (r.step, r.bacteria_count)),
            &BLUE,
        ))
        .map_err(|e| anyhow::anyhow!("Failed to draw population line: {}", e))?;

    chart
        .draw_series(
            records
                .iter()
                .map(|r| Circle::new((r.step, r.bacteria_count), 3, BLUE.filled())),
        )
        .map_err(|e| anyhow::anyhow!("Failed to draw population points: {}", e))?;

    root.present()
        .map_err(|e| anyhow::anyhow!("Failed to write chart to {}: {}", args.output.display(), e))?;
    Ok(())
}

// Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulator_csv() {
        let text = "Step,BacteriaCount\n0,1\n1,2\n2,3\n";
        let records = parse_csv(text.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                PopulationRecord::new(0, 1),
                PopulationRecord::new(1, 2),
                PopulationRecord::new(2, 3),
            ]
        );
    }

    #[test]
    fn rejects_malformed_csv() {
        let text = "Step,BacteriaCount\n0,lots\n";
        assert!(parse_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn sort_keeps_last_duplicate() {
        let mut records = vec![
            PopulationRecord::new(2, 3),
            PopulationRecord::new(0, 1),
            PopulationRecord::new(2, 4),
        ];
        sort_records(&mut records);
        assert_eq!(records, vec![PopulationRecord::new(0, 1), PopulationRecord::new(2, 4)]);
    }

    #[test]
    fn axis_ranges_are_never_empty() {
        let (x, y) = axis_ranges(&[PopulationRecord::new(0, 0)]);
        assert_eq!(x, 0..1);
        assert_eq!(y, 0..1);

        let (x, y) = axis_ranges(&[PopulationRecord::new(0, 1), PopulationRecord::new(10, 55)]);
        assert_eq!(x, 0..11);
        assert_eq!(y, 0..60);
        assert!(x.contains(&10));
    }

    #[test]
    fn loads_json_by_extension() {
        let path = std::env::temp_dir().join(format!("bacteria-plot-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"Step":1,"BacteriaCount":2},{"Step":0,"BacteriaCount":1}]"#).unwrap();
        let records = load_records(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(records, vec![PopulationRecord::new(0, 1), PopulationRecord::new(1, 2)]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let path = std::env::temp_dir().join("bacteria-plot-does-not-exist.csv");
        let err = load_records(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to open input file"));
    }
}
