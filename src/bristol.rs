//! Bristol Fashion parser, inverter elimination, and the inverse serializer.
//!
//! Bristol gate lines are `n_in n_out in1 [in2] out OP` with `OP` one of
//! `AND`, `XOR`, `OR`, `NOT`/`INV`. Inverters never survive into the in-memory
//! [`Circuit`]: a `NOT` whose output is not itself a circuit output is folded
//! into an alias (`alias[out] = alias[parent]`, `flipped[out] = !flipped[parent]`)
//! and emits no gate; a `NOT` whose output *is* a circuit output must physically
//! exist as a gate, so it is rewritten into a self-referencing gate (both
//! parents equal) whose table encodes the accumulated flip. When a chain of
//! folded inverters cancels out to identity at such an output, [`emit_bristol`]
//! writes the self-referencing gate back as a binary `AND` with both inputs
//! tied to the same wire, rather than inventing an operator outside the
//! Bristol grammar.

use crate::circuit::{Circuit, CircuitDetails, Gate};
use crate::error::{CrgcError, Result};
use crate::stream::BufferedLineStream;

pub(crate) const AND_TABLE: [[bool; 2]; 2] = [[false, false], [false, true]];
pub(crate) const XOR_TABLE: [[bool; 2]; 2] = [[false, true], [true, false]];
pub(crate) const OR_TABLE: [[bool; 2]; 2] = [[false, true], [true, true]];

enum RawGate {
    Binary {
        op: &'static str,
        left: u32,
        right: u32,
        out: u32,
    },
    Unary {
        invert: bool,
        parent: u32,
        out: u32,
    },
}

fn parse_header_line(
    stream: &mut BufferedLineStream,
    what: &str,
    line_no: usize,
) -> Result<Vec<u32>> {
    let line = stream
        .next_line()
        .ok_or_else(|| CrgcError::malformed_at(format!("missing {what} header line"), line_no))?
        .map_err(|e| CrgcError::malformed_at(format!("I/O error reading header: {e}"), line_no))?;

    line.split_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .map_err(|_| CrgcError::malformed_at(format!("invalid integer '{tok}' in {what}"), line_no))
        })
        .collect()
}

fn parse_gate_line(line: &str, line_no: usize) -> Result<RawGate> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return Err(CrgcError::malformed_at(format!("gate line too short: '{line}'"), line_no));
    }

    let parse_u32 = |tok: &str| -> Result<u32> {
        tok.parse()
            .map_err(|_| CrgcError::malformed_at(format!("invalid wire id '{tok}'"), line_no))
    };

    let n_in: usize = parse_u32(tokens[0])? as usize;
    let n_out: usize = parse_u32(tokens[1])? as usize;
    if tokens.len() != 2 + n_in + n_out + 1 {
        return Err(CrgcError::malformed_at(
            format!("arity mismatch: expected {} tokens, got {}", 2 + n_in + n_out + 1, tokens.len()),
            line_no,
        ));
    }

    let op = tokens[2 + n_in + n_out];
    match (n_in, n_out, op) {
        (2, 1, "AND") | (2, 1, "XOR") | (2, 1, "OR") => {
            let left = parse_u32(tokens[2])?;
            let right = parse_u32(tokens[3])?;
            let out = parse_u32(tokens[4])?;
            let op = match op {
                "AND" => "AND",
                "XOR" => "XOR",
                _ => "OR",
            };
            Ok(RawGate::Binary { op, left, right, out })
        }
        (1, 1, "NOT") | (1, 1, "INV") => {
            let parent = parse_u32(tokens[2])?;
            let out = parse_u32(tokens[3])?;
            Ok(RawGate::Unary { invert: true, parent, out })
        }
        _ => Err(CrgcError::malformed_at(format!("unsupported operator '{op}' with {n_in} inputs/{n_out} outputs"), line_no)),
    }
}

fn swap_rows(table: &mut [[bool; 2]; 2]) {
    table.swap(0, 1);
}

fn swap_cols(table: &mut [[bool; 2]; 2]) {
    for row in table.iter_mut() {
        row.swap(0, 1);
    }
}

/// Parse a Bristol Fashion circuit from a line stream, eliminating inverters
/// by folding them into wire aliases per the data-model contract.
pub fn parse_bristol(stream: &mut BufferedLineStream) -> Result<Circuit> {
    let header1 = parse_header_line(stream, "gate/wire count", 1)?;
    if header1.len() != 2 {
        return Err(CrgcError::malformed_at("expected 'num_gates num_wires'", 1));
    }
    let (declared_num_gates, num_wires) = (header1[0], header1[1]);

    let header2 = parse_header_line(stream, "input widths", 2)?;
    if header2.len() != 3 || header2[0] != 2 {
        return Err(CrgcError::malformed_at("expected '2 input_a_bits input_b_bits'", 2));
    }
    let (input_a_bits, input_b_bits) = (header2[1], header2[2]);

    let header3 = parse_header_line(stream, "output widths", 3)?;
    if header3.len() != 2 {
        return Err(CrgcError::malformed_at("expected 'num_outputs output_bits'", 3));
    }
    let (num_outputs, output_bits) = (header3[0], header3[1]);

    if num_outputs * output_bits > num_wires {
        return Err(CrgcError::malformed_at("declared outputs exceed wire count", 3));
    }

    let mut alias: Vec<u32> = (0..num_wires).collect();
    let mut flipped: Vec<bool> = vec![false; num_wires as usize];
    let first_output_wire = num_wires - num_outputs * output_bits;

    let mut gates = Vec::new();
    let mut body_lines = 0usize;
    let mut line_no = 3;

    loop {
        let Some(line_result) = stream.next_line() else { break };
        line_no += 1;
        let line = line_result.map_err(|e| CrgcError::malformed_at(format!("I/O error: {e}"), line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        body_lines += 1;

        match parse_gate_line(line, line_no)? {
            RawGate::Unary { invert, parent, out } => {
                if (parent as usize) >= alias.len() || (out as usize) >= alias.len() {
                    return Err(CrgcError::malformed_at("wire id out of range", line_no));
                }
                let is_output = out >= first_output_wire;
                if !is_output {
                    alias[out as usize] = alias[parent as usize];
                    flipped[out as usize] = flipped[parent as usize] ^ invert;
                } else {
                    let resolved = alias[parent as usize];
                    let parent_flip = flipped[parent as usize] ^ invert;
                    // Self-referencing gate: left == right, so only the diagonal is read.
                    let v0 = parent_flip; // value produced when parent bit is 0
                    let v1 = !parent_flip; // value produced when parent bit is 1
                    let table = [[v0, v0], [v1, v1]];
                    gates.push(Gate {
                        left_parent: resolved,
                        right_parent: resolved,
                        output: out,
                        table,
                    });
                }
            }
            RawGate::Binary { op, left, right, out } => {
                if (left as usize) >= alias.len() || (right as usize) >= alias.len() || (out as usize) >= alias.len() {
                    return Err(CrgcError::malformed_at("wire id out of range", line_no));
                }
                let mut table = match op {
                    "AND" => AND_TABLE,
                    "XOR" => XOR_TABLE,
                    _ => OR_TABLE,
                };
                if flipped[left as usize] {
                    swap_rows(&mut table);
                }
                if flipped[right as usize] {
                    swap_cols(&mut table);
                }
                gates.push(Gate {
                    left_parent: alias[left as usize],
                    right_parent: alias[right as usize],
                    output: out,
                    table,
                });
            }
        }
    }

    if body_lines != declared_num_gates as usize {
        return Err(CrgcError::malformed(format!(
            "declared {declared_num_gates} gates but body has {body_lines}"
        )));
    }

    let details = CircuitDetails {
        num_wires,
        num_gates: gates.len() as u32,
        num_outputs,
        input_a_bits,
        input_b_bits,
        output_bits,
    };
    let circuit = Circuit { details, gates };
    circuit.validate_topology()?;
    Ok(circuit)
}

/// Serialize a [`Circuit`] back to Bristol Fashion text.
///
/// Self-referencing gates (folded inverters forced to exist because their
/// output is a circuit output) are written back as a unary `NOT`, or, when the
/// accumulated flip happens to cancel out to identity, as a binary `AND` with
/// both inputs tied to the same wire — `AND`'s diagonal already reproduces its
/// single input, so no operator outside the Bristol grammar is needed. Every
/// other gate is matched against the three canonical binary tables. A
/// non-canonical table (possible only after garbling — see [`crate::garbler`])
/// cannot be represented in Bristol Fashion and is rejected; use the RGC
/// artifact format ([`crate::rgc`]) for garbled circuits instead.
pub fn emit_bristol(circuit: &Circuit) -> Result<String> {
    let d = circuit.details;
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", circuit.gates.len(), d.num_wires));
    out.push_str(&format!("2 {} {}\n", d.input_a_bits, d.input_b_bits));
    out.push_str(&format!("{} {}\n\n", d.num_outputs, d.output_bits));

    for gate in &circuit.gates {
        if gate.left_parent == gate.right_parent {
            let v0 = gate.table[0][0];
            let v1 = gate.table[1][1];
            match (v0, v1) {
                (true, false) => {
                    out.push_str(&format!("1 1 {} {} NOT\n", gate.left_parent, gate.output));
                }
                (false, true) => {
                    out.push_str(&format!(
                        "2 1 {} {} {} AND\n",
                        gate.left_parent, gate.right_parent, gate.output
                    ));
                }
                _ => {
                    return Err(CrgcError::malformed(format!(
                        "gate at wire {} is self-referencing but not a valid unary table",
                        gate.output
                    )));
                }
            };
        } else {
            let op = if gate.table == AND_TABLE {
                "AND"
            } else if gate.table == XOR_TABLE {
                "XOR"
            } else if gate.table == OR_TABLE {
                "OR"
            } else {
                return Err(CrgcError::malformed(format!(
                    "gate at wire {} has a non-canonical table and cannot be written as Bristol Fashion",
                    gate.output
                )));
            };
            out.push_str(&format!(
                "2 1 {} {} {} {op}\n",
                gate.left_parent, gate.right_parent, gate.output
            ));
        }
    }

    Ok(out)
}
