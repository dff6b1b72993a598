//! Circuit data model: [`CircuitDetails`], [`Gate`], and the [`Circuit`] they compose into.
//!
//! Wire id assignment is fixed across every component that touches a `Circuit`:
//! `[0, input_a_bits)` is generator input A, `[input_a_bits, input_a_bits +
//! input_b_bits)` is evaluator input B, and the remaining wires are gate outputs
//! in ascending id order, with the last `num_outputs * output_bits` of them being
//! the circuit's outputs. See [`crate::evaluate`] for the bit-endianness contract
//! this ordering implies.

use serde::{Deserialize, Serialize};

use crate::error::{CrgcError, Result};

/// Immutable header metadata for a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDetails {
    /// Total number of wires, including both inputs and all gate outputs.
    pub num_wires: u32,
    /// Total number of gates.
    pub num_gates: u32,
    /// Number of output words.
    pub num_outputs: u32,
    /// Bit width of generator input A.
    pub input_a_bits: u32,
    /// Bit width of evaluator input B.
    pub input_b_bits: u32,
    /// Bit width of a single output word.
    pub output_bits: u32,
}

impl CircuitDetails {
    /// Wire id of the first circuit-output wire (the MSB of the first output word).
    pub fn first_output_wire(&self) -> u32 {
        self.num_wires - self.num_outputs * self.output_bits
    }

    /// Whether `wire` is one of the circuit's declared output wires.
    pub fn is_output_wire(&self, wire: u32) -> bool {
        wire >= self.first_output_wire() && wire < self.num_wires
    }

    /// Map a bit index within an input bundle to its wire id, respecting the
    /// MSB-last wire assignment: the last element of the caller's bit sequence
    /// lands at wire 0 (see the evaluator's I/O endianness contract).
    pub fn wire_for_a_bit(&self, bit_index: u32) -> u32 {
        self.input_a_bits - 1 - bit_index
    }

    /// As [`Self::wire_for_a_bit`], for input B.
    pub fn wire_for_b_bit(&self, bit_index: u32) -> u32 {
        self.input_a_bits + self.input_b_bits - 1 - bit_index
    }
}

/// A single two-input, one-output gate with an explicit 2x2 truth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// Left parent wire id.
    pub left_parent: u32,
    /// Right parent wire id (may equal `left_parent`).
    pub right_parent: u32,
    /// Output wire id; strictly greater than both parents.
    pub output: u32,
    /// Truth table indexed `table[left_bit][right_bit]`.
    pub table: [[bool; 2]; 2],
}

impl Gate {
    /// Evaluate the gate's table given both parent bit values.
    pub fn eval(&self, left: bool, right: bool) -> bool {
        self.table[left as usize][right as usize]
    }

    /// Whether the table is constant (all entries equal) — garbled tables must
    /// never be constant.
    pub fn is_constant(&self) -> bool {
        let first = self.table[0][0];
        self.table[0][1] == first && self.table[1][0] == first && self.table[1][1] == first
    }
}

/// A parsed, topologically ordered circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    /// Immutable header metadata.
    pub details: CircuitDetails,
    /// Gates in topological (file) order.
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// Validate the structural invariants from the data model: gates appear in
    /// topological order, no wire is written twice, and every circuit-output
    /// wire is produced by some gate.
    pub fn validate_topology(&self) -> Result<()> {
        let mut written = vec![false; self.details.num_wires as usize];
        let num_inputs = (self.details.input_a_bits + self.details.input_b_bits) as usize;

        for (idx, gate) in self.gates.iter().enumerate() {
            if gate.left_parent >= gate.output || gate.right_parent >= gate.output {
                return Err(CrgcError::malformed_at(
                    format!(
                        "gate output {} does not exceed both parents ({}, {})",
                        gate.output, gate.left_parent, gate.right_parent
                    ),
                    idx + 1,
                ));
            }
            for parent in [gate.left_parent as usize, gate.right_parent as usize] {
                if parent >= num_inputs && !written[parent] {
                    return Err(CrgcError::malformed_at(
                        format!("gate references wire {parent} before any gate produces it"),
                        idx + 1,
                    ));
                }
            }
            let out = gate.output as usize;
            if out >= written.len() {
                return Err(CrgcError::malformed_at(
                    format!("gate output wire {out} exceeds declared wire count"),
                    idx + 1,
                ));
            }
            if written[out] {
                return Err(CrgcError::malformed_at(
                    format!("wire {out} written by more than one gate"),
                    idx + 1,
                ));
            }
            written[out] = true;
        }

        let first_output = self.details.first_output_wire() as usize;
        for wire in first_output..self.details.num_wires as usize {
            if !written[wire] {
                return Err(CrgcError::malformed(format!(
                    "circuit-output wire {wire} is not produced by any gate"
                )));
            }
        }

        Ok(())
    }

    /// The wire id of output word `w`, bit `j` (both 0-based, `j` MSB-first).
    pub fn output_wire(&self, word: u32, bit: u32) -> u32 {
        self.details.num_wires - 1 - bit - self.details.output_bits * word
    }
}
