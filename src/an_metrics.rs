//! Per-timestep records and the sinks they are written to

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::an_centrality::{mean_score, CentralityMetric};
use crate::an_interface::{MetricsRecord, MetricsSink, RecordSchema, TimeStep};
use crate::an_network::Network;

/// Builds one record per timestep from the current network
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    schema: RecordSchema,
    diagnostic: Option<CentralityMetric>,
}

impl MetricsRecorder {
    /// `detection` selects whether Undetected is reported; a diagnostic metric adds the
    /// mean edge score column
    pub fn new(detection: bool, diagnostic: Option<CentralityMetric>) -> Self {
        let schema = match (detection, diagnostic) {
            (_, Some(_)) => RecordSchema::Centrality,
            (true, None) => RecordSchema::Detection,
            (false, None) => RecordSchema::Baseline,
        };
        Self { schema, diagnostic }
    }

    pub fn schema(&self) -> RecordSchema {
        self.schema
    }

    pub fn diagnostic(&self) -> Option<CentralityMetric> {
        self.diagnostic
    }

    pub fn record(&self, timestep: TimeStep, network: &Network) -> MetricsRecord {
        let mean_betweenness = self
            .diagnostic
            .map(|metric| mean_score(&metric.compute(network)));

        MetricsRecord {
            timestep,
            counts: network.counts(),
            mean_betweenness,
        }
    }
}

// ============================================================================
// Console Sink
// ============================================================================

/// Logs every record at info level
pub struct ConsoleMetricsSink;

impl MetricsSink for ConsoleMetricsSink {
    fn emit(&mut self, schema: RecordSchema, record: &MetricsRecord) -> std::io::Result<()> {
        let c = &record.counts;
        match schema {
            RecordSchema::Baseline => info!(
                "{:>5} S:{:<6} I:{:<6} R:{:<6}",
                record.timestep, c.susceptible, c.infectious, c.recovered
            ),
            RecordSchema::Detection => info!(
                "{:>5} S:{:<6} U:{:<6} I:{:<6} R:{:<6}",
                record.timestep, c.susceptible, c.undetected, c.infectious, c.recovered
            ),
            RecordSchema::Centrality => info!(
                "{:>5} S:{:<6} U:{:<6} I:{:<6} R:{:<6} mean:{:.6}",
                record.timestep,
                c.susceptible,
                c.undetected,
                c.infectious,
                c.recovered,
                record.mean_betweenness.unwrap_or(0.0)
            ),
        }
        Ok(())
    }
}

// ============================================================================
// CSV Sink
// ============================================================================

/// CSV export, header written on the first record
pub struct CsvMetricsSink<W: Write> {
    writer: W,
    header_written: bool,
}

impl CsvMetricsSink<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvMetricsSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for CsvMetricsSink<W> {
    fn emit(&mut self, schema: RecordSchema, record: &MetricsRecord) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{}", schema.header())?;
            self.header_written = true;
        }
        writeln!(self.writer, "{}", record.to_csv(schema))
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ============================================================================
// Memory Sink
// ============================================================================

/// Keeps every record in memory
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<MetricsRecord>,
}

impl MetricsSink for MemorySink {
    fn emit(&mut self, _schema: RecordSchema, record: &MetricsRecord) -> std::io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Fans records out to several sinks; every sink is tried, the first error is returned
pub struct MultiSink<'a> {
    sinks: Vec<&'a mut dyn MetricsSink>,
}

impl<'a> MultiSink<'a> {
    pub fn new(sinks: Vec<&'a mut dyn MetricsSink>) -> Self {
        Self { sinks }
    }
}

impl MetricsSink for MultiSink<'_> {
    fn emit(&mut self, schema: RecordSchema, record: &MetricsRecord) -> std::io::Result<()> {
        let mut result = Ok(());
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.emit(schema, record) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    fn finish(&mut self) -> std::io::Result<()> {
        let mut result = Ok(());
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}
