//! RGC artifact I/O (§6): the on-disk format a garbler writes and an
//! evaluator reads back, as three sibling ASCII files sharing a name stem:
//! `<name>_rgc_details.txt`, `<name>_rgc.txt`, `<name>_rgc_inputA.txt`.
//!
//! A thin adapter over [`GarbledCircuit`] — no garbling logic lives here,
//! only the textual encoding the format standardizes.

use std::io::Write as _;
use std::path::Path;

use crate::circuit::{Circuit, CircuitDetails, Gate};
use crate::error::{CrgcError, Result};
use crate::garbler::{FlipPattern, GarbledCircuit};
use crate::stream::BufferedLineStream;

fn details_path(stem: &Path) -> std::path::PathBuf {
    with_suffix(stem, "_rgc_details.txt")
}

fn gates_path(stem: &Path) -> std::path::PathBuf {
    with_suffix(stem, "_rgc.txt")
}

fn input_a_path(stem: &Path) -> std::path::PathBuf {
    with_suffix(stem, "_rgc_inputA.txt")
}

fn with_suffix(stem: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = stem.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    stem.with_file_name(name)
}

/// Write `garbled` and the caller's obfuscated input A′ (same bit order as
/// the original input sequence, not reversed) to the three RGC files rooted
/// at `stem`.
pub fn write_rgc(stem: &Path, garbled: &GarbledCircuit, a_prime: &[bool]) -> Result<()> {
    let d = garbled.circuit.details;

    let mut details = std::fs::File::create(details_path(stem))
        .map_err(|e| CrgcError::malformed(format!("cannot create RGC details file: {e}")))?;
    write!(
        details,
        "{} {}\n2 {} {}\n{} {}\n",
        d.num_gates, d.num_wires, d.input_a_bits, d.input_b_bits, d.num_outputs, d.output_bits
    )
    .map_err(|e| CrgcError::malformed(format!("cannot write RGC details file: {e}")))?;

    let mut gates = std::fs::File::create(gates_path(stem))
        .map_err(|e| CrgcError::malformed(format!("cannot create RGC gate file: {e}")))?;
    for gate in &garbled.circuit.gates {
        let t = gate.table;
        writeln!(
            gates,
            "{} {} {} {}{}{}{}",
            gate.left_parent,
            gate.right_parent,
            gate.output,
            t[0][0] as u8,
            t[0][1] as u8,
            t[1][0] as u8,
            t[1][1] as u8
        )
        .map_err(|e| CrgcError::malformed(format!("cannot write RGC gate file: {e}")))?;
    }

    if a_prime.len() != d.input_a_bits as usize {
        return Err(CrgcError::invalid_input(format!(
            "input A′ has {} bits, circuit expects {}",
            a_prime.len(),
            d.input_a_bits
        )));
    }
    let mut input_a = std::fs::File::create(input_a_path(stem))
        .map_err(|e| CrgcError::malformed(format!("cannot create RGC input-A file: {e}")))?;
    let line: String = a_prime.iter().map(|&b| if b { '1' } else { '0' }).collect();
    writeln!(input_a, "{line}").map_err(|e| CrgcError::malformed(format!("cannot write RGC input-A file: {e}")))?;

    Ok(())
}

/// Read the three RGC sibling files rooted at `stem` back into a
/// [`GarbledCircuit`] plus the obfuscated A′ bits.
pub fn read_rgc(stem: &Path) -> Result<(GarbledCircuit, Vec<bool>)> {
    let details_file = std::fs::File::open(details_path(stem))
        .map_err(|e| CrgcError::malformed(format!("cannot open RGC details file: {e}")))?;
    let mut stream = BufferedLineStream::new(details_file);

    let header1 = next_nonblank(&mut stream, "RGC details")?;
    let (num_gates, num_wires) = parse_two_u32(&header1, "RGC details line 1")?;

    let header2 = next_nonblank(&mut stream, "RGC details")?;
    let tokens: Vec<&str> = header2.split_whitespace().collect();
    if tokens.len() != 3 || tokens[0] != "2" {
        return Err(CrgcError::malformed("RGC details line 2 must be `2 input_a_bits input_b_bits`"));
    }
    let input_a_bits = parse_u32(tokens[1], "input_a_bits")?;
    let input_b_bits = parse_u32(tokens[2], "input_b_bits")?;

    let header3 = next_nonblank(&mut stream, "RGC details")?;
    let (num_outputs, output_bits) = parse_two_u32(&header3, "RGC details line 3")?;

    let details = CircuitDetails {
        num_wires,
        num_gates,
        num_outputs,
        input_a_bits,
        input_b_bits,
        output_bits,
    };

    let gates_file =
        std::fs::File::open(gates_path(stem)).map_err(|e| CrgcError::malformed(format!("cannot open RGC gate file: {e}")))?;
    let mut gate_stream = BufferedLineStream::new(gates_file);
    let mut gates = Vec::with_capacity(num_gates as usize);
    while let Some(line_result) = gate_stream.next_line() {
        let line = line_result.map_err(|e| CrgcError::malformed(format!("RGC gate file read error: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(CrgcError::malformed(format!("malformed RGC gate line: '{line}'")));
        }
        let left_parent = parse_u32(tokens[0], "left parent")?;
        let right_parent = parse_u32(tokens[1], "right parent")?;
        let output = parse_u32(tokens[2], "output")?;
        let bits = tokens[3];
        if bits.len() != 4 || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(CrgcError::malformed(format!("malformed RGC truth table field: '{bits}'")));
        }
        let b: Vec<bool> = bits.chars().map(|c| c == '1').collect();
        gates.push(Gate {
            left_parent,
            right_parent,
            output,
            table: [[b[0], b[1]], [b[2], b[3]]],
        });
    }
    if gates.len() != num_gates as usize {
        return Err(CrgcError::malformed(format!(
            "RGC gate file declares {} gates but header says {}",
            gates.len(),
            num_gates
        )));
    }

    let circuit = Circuit { details, gates };
    circuit.validate_topology()?;

    let input_a_text = std::fs::read_to_string(input_a_path(stem))
        .map_err(|e| CrgcError::malformed(format!("cannot read RGC input-A file: {e}")))?;
    let line = input_a_text.trim();
    if line.len() != input_a_bits as usize || !line.chars().all(|c| c == '0' || c == '1') {
        return Err(CrgcError::malformed(format!(
            "RGC input-A file has {} bits, expected {}",
            line.len(),
            input_a_bits
        )));
    }
    let a_prime: Vec<bool> = line.chars().map(|c| c == '1').collect();

    // encoding_key is not persisted by the RGC format itself (only C̃ and A′
    // are); callers that need it keep it alongside the artifact separately.
    let garbled = GarbledCircuit {
        circuit,
        encoding_key: FlipPattern(vec![false; input_a_bits as usize]),
    };
    Ok((garbled, a_prime))
}

fn next_nonblank(stream: &mut BufferedLineStream, ctx: &str) -> Result<String> {
    while let Some(line_result) = stream.next_line() {
        let line = line_result.map_err(|e| CrgcError::malformed(format!("{ctx} read error: {e}")))?;
        if !line.trim().is_empty() {
            return Ok(line.to_string());
        }
    }
    Err(CrgcError::malformed(format!("{ctx}: unexpected end of file")))
}

fn parse_two_u32(line: &str, ctx: &str) -> Result<(u32, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(CrgcError::malformed(format!("{ctx}: expected two fields, got '{line}'")));
    }
    Ok((parse_u32(tokens[0], ctx)?, parse_u32(tokens[1], ctx)?))
}

fn parse_u32(tok: &str, ctx: &str) -> Result<u32> {
    tok.parse().map_err(|_| CrgcError::malformed(format!("{ctx}: invalid integer '{tok}'")))
}
