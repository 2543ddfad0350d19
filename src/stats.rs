use anyhow::{Context, Result};
use bacteria_common::{OutputConfig, PopulationRecord};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Consumer of the per-step population records.
pub trait StatsSink {
    fn record(&mut self, record: &PopulationRecord) -> Result<()>;

    /// Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl StatsSink for Vec<PopulationRecord> {
    fn record(&mut self, record: &PopulationRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

/// Discards everything, used when `save_stats` is off.
pub struct NullStats;

impl StatsSink for NullStats {
    fn record(&mut self, _record: &PopulationRecord) -> Result<()> {
        Ok(())
    }
}

/// Writes `Step,BacteriaCount` rows.
pub struct CsvStatsWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvStatsWriter<W> {
    pub fn new(out: W) -> Self {
        Self { writer: csv::Writer::from_writer(out) }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
    }
}

impl<W: Write> StatsSink for CsvStatsWriter<W> {
    fn record(&mut self, record: &PopulationRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects the records and writes them as one JSON array on `finish`.
///
/// `Simulation::run` calls `finish` on failed runs too, so records are kept.
pub struct JsonStatsWriter<W: Write> {
    out: W,
    records: Vec<PopulationRecord>,
}

impl<W: Write> JsonStatsWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, records: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatsSink for JsonStatsWriter<W> {
    fn record(&mut self, record: &PopulationRecord) -> Result<()> {
        self.records.push(*record);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer(&mut self.out, &self.records)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFormat {
    Csv,
    Json,
}

impl StatsFormat {
    /// Resolves the configured format name, falling back to CSV for unknown names.
    pub fn from_config(format: Option<&str>) -> Self {
        match format.unwrap_or("csv") {
            f if f.eq_ignore_ascii_case("csv") => StatsFormat::Csv,
            f if f.eq_ignore_ascii_case("json") => StatsFormat::Json,
            other => {
                warn!("Unknown output format: {}. Using CSV instead.", other);
                StatsFormat::Csv
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            StatsFormat::Csv => "csv",
            StatsFormat::Json => "json",
        }
    }
}

/// Path the stats file is written to for this output config.
pub fn stats_path(output: &OutputConfig) -> PathBuf {
    let format = StatsFormat::from_config(output.format.as_deref());
    PathBuf::from(format!("{}.{}", output.base_filename, format.extension()))
}

/// Opens the sink selected by the output config.
pub fn open_stats_sink(output: &OutputConfig) -> Result<Box<dyn StatsSink>> {
    if !output.save_stats {
        info!("Skipping population statistics as per config (save_stats is false).");
        return Ok(Box::new(NullStats));
    }

    let path = stats_path(output);
    let format = StatsFormat::from_config(output.format.as_deref());
    let file = create_output(&path)?;
    info!("Writing population statistics to {}", path.display());

    Ok(match format {
        StatsFormat::Csv => Box::new(CsvStatsWriter::new(file)),
        StatsFormat::Json => Box::new(JsonStatsWriter::new(file)),
    })
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create stats file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PopulationRecord> {
        vec![
            PopulationRecord::new(0, 1),
            PopulationRecord::new(1, 2),
            PopulationRecord::new(2, 3),
        ]
    }

    #[test]
    fn csv_has_header_and_one_row_per_step() {
        let mut sink = CsvStatsWriter::new(Vec::new());
        for record in sample() {
            sink.record(&record).unwrap();
        }
        sink.finish().unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(text, "Step,BacteriaCount\n0,1\n1,2\n2,3\n");
    }

    #[test]
    fn json_is_written_on_finish() {
        let mut sink = JsonStatsWriter::new(Vec::new());
        for record in sample() {
            sink.record(&record).unwrap();
        }
        assert!(sink.out.is_empty());
        sink.finish().unwrap();
        let parsed: Vec<PopulationRecord> = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn format_resolution() {
        assert_eq!(StatsFormat::from_config(None), StatsFormat::Csv);
        assert_eq!(StatsFormat::from_config(Some("JSON")), StatsFormat::Json);
        assert_eq!(StatsFormat::from_config(Some("bincode")), StatsFormat::Csv);

        let output = OutputConfig {
            base_filename: String::from("run"),
            save_stats: true,
            format: Some(String::from("json")),
        };
        assert_eq!(stats_path(&output), PathBuf::from("run.json"));
    }

    #[test]
    fn open_sink_writes_file() {
        let base = std::env::temp_dir().join(format!("bacteria-sim-stats-{}", std::process::id()));
        let output = OutputConfig {
            base_filename: base.to_string_lossy().into_owned(),
            save_stats: true,
            format: None,
        };
        {
            let mut sink = open_stats_sink(&output).unwrap();
            sink.record(&PopulationRecord::new(0, 1)).unwrap();
            sink.finish().unwrap();
        }
        let path = stats_path(&output);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text, "Step,BacteriaCount\n0,1\n");
    }

    #[test]
    fn open_sink_fails_for_missing_directory() {
        let output = OutputConfig {
            base_filename: String::from("/nonexistent-bacteria-dir/results"),
            save_stats: true,
            format: None,
        };
        let err = open_stats_sink(&output).err().unwrap();
        assert!(err.to_string().contains("Failed to create stats file"));
    }
}
