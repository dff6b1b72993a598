use anyhow::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::constants::PROGRESS_UPDATE_INTERVAL;
use crate::stream::BufferedLineStream;

/// Wire usage analysis results over a raw Bristol gate body (no header lines).
#[derive(Debug, Serialize, Deserialize)]
pub struct WireUsageReport {
    /// Total number of wires referenced anywhere in the gate list.
    pub total_wires: usize,
    /// Number of wires used as a gate input but never produced by one.
    pub primary_inputs: usize,
    /// Number of wires both produced and consumed.
    pub intermediate_wires: usize,
    /// Number of wires produced but never consumed.
    pub primary_outputs: usize,
    /// Number of gaps in wire numbering.
    pub missing_wires_count: usize,
    /// Wire usage counts: index = wire_id, value = usage_count.
    pub wire_usage_counts: Vec<usize>,
    /// Wire ids classified as primary inputs.
    pub primary_input_wires: Vec<usize>,
    /// Wire ids classified as primary outputs.
    pub primary_output_wires: Vec<usize>,
}

impl WireUsageReport {
    /// Save the full report as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        Ok(())
    }

    /// Export just the summary fields as JSON, omitting the per-wire vectors.
    pub fn export_summary_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let summary = serde_json::json!({
            "total_wires": self.total_wires,
            "primary_inputs": self.primary_inputs,
            "intermediate_wires": self.intermediate_wires,
            "primary_outputs": self.primary_outputs,
            "missing_wires_count": self.missing_wires_count,
        });
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;
        Ok(())
    }
}

struct Gate {
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

/// Parse a single gate line into input/output wire lists. Bristol format:
/// `"2 1 466 466 467 XOR"`.
fn parse_gate_line(line: &str) -> Result<Gate> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        bail!("invalid gate line: too few tokens: '{}'", line);
    }

    let num_inputs: usize = tokens[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid number of inputs: '{}'", tokens[0]))?;
    let num_outputs: usize = tokens[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid number of outputs: '{}'", tokens[1]))?;

    if tokens.len() < 2 + num_inputs + num_outputs + 1 {
        bail!(
            "invalid gate line: expected {} tokens, got {}: '{}'",
            2 + num_inputs + num_outputs + 1,
            tokens.len(),
            line
        );
    }

    let mut inputs = Vec::with_capacity(num_inputs);
    for i in 0..num_inputs {
        let wire_id: usize = tokens[2 + i]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid input wire id: '{}'", tokens[2 + i]))?;
        inputs.push(wire_id);
    }

    let mut outputs = Vec::with_capacity(num_outputs);
    for i in 0..num_outputs {
        let wire_id: usize = tokens[2 + num_inputs + i]
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid output wire id: '{}'", tokens[2 + num_inputs + i]))?;
        outputs.push(wire_id);
    }

    Ok(Gate { inputs, outputs })
}

#[inline]
fn ensure_capacity(vec: &mut Vec<usize>, wire_id: usize) {
    if wire_id >= vec.len() {
        vec.resize(wire_id + 1, 0);
    }
}

#[inline]
fn ensure_capacity_bool(vec: &mut Vec<bool>, wire_id: usize) {
    if wire_id >= vec.len() {
        vec.resize(wire_id + 1, false);
    }
}

/// Analyze wire usage patterns over `stream`'s gate lines (header lines
/// already consumed by the caller).
pub fn analyze_wire_usage(stream: &mut BufferedLineStream) -> Result<WireUsageReport> {
    let mut wire_usage_counts = Vec::new();
    let mut wire_has_producer = Vec::new();
    let mut line_number = 0;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Analyzing wire usage...");

    while let Some(line_result) = stream.next_line() {
        line_number += 1;
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let gate = parse_gate_line(line)?;

        for input_wire in &gate.inputs {
            ensure_capacity(&mut wire_usage_counts, *input_wire);
            wire_usage_counts[*input_wire] += 1;
        }
        for output_wire in &gate.outputs {
            ensure_capacity(&mut wire_usage_counts, *output_wire);
            ensure_capacity_bool(&mut wire_has_producer, *output_wire);
            wire_has_producer[*output_wire] = true;
        }

        if line_number % PROGRESS_UPDATE_INTERVAL as usize == 0 {
            pb.tick();
            pb.set_message(format!("Analyzing wire usage... {line_number} gates processed"));
        }
    }

    let total_wires = wire_usage_counts.len();
    let mut primary_input_wires = Vec::new();
    let mut primary_output_wires = Vec::new();
    let mut intermediate_count = 0;
    let mut missing_wires_count = 0;

    for wire_id in 0..total_wires {
        let usage_count = wire_usage_counts[wire_id];
        let has_producer = wire_id < wire_has_producer.len() && wire_has_producer[wire_id];

        if usage_count == 0 && !has_producer {
            missing_wires_count += 1;
        } else if !has_producer {
            primary_input_wires.push(wire_id);
        } else if usage_count == 0 {
            primary_output_wires.push(wire_id);
        } else {
            intermediate_count += 1;
        }
    }

    pb.finish_with_message(format!("Analyzed {line_number} gates, found {total_wires} wires"));

    Ok(WireUsageReport {
        total_wires,
        primary_inputs: primary_input_wires.len(),
        intermediate_wires: intermediate_count,
        primary_outputs: primary_output_wires.len(),
        missing_wires_count,
        wire_usage_counts,
        primary_input_wires,
        primary_output_wires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn stream_from(text: &str) -> BufferedLineStream {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        BufferedLineStream::new(File::open(file.path()).unwrap())
    }

    #[test]
    fn classifies_inputs_and_outputs() {
        let mut stream = stream_from("2 1 0 1 2 XOR\n1 1 2 3 INV\n");
        let report = analyze_wire_usage(&mut stream).unwrap();
        assert_eq!(report.primary_input_wires, vec![0, 1]);
        assert_eq!(report.primary_output_wires, vec![3]);
        assert_eq!(report.intermediate_wires, 1);
    }
}
