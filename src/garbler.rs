//! Garbler pipeline (§4.3): input obfuscation, truth-table flipping, fixed-gate
//! identification with integrity repair, backward intermediary-gate discovery,
//! and randomization of the gates that discovery found to be pure leakage.
//!
//! The four phases run as four separate passes over the gate list, each one
//! indexed by wire id, rather than the interleaved mutation the construction's
//! own pseudocode suggests — keeps every pass auditable on its own.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, Gate};
use crate::error::Result;

/// A per-wire flip bit: whether a wire's observed value is the negation of
/// its semantic value in the original (un-garbled) circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipPattern(pub Vec<bool>);

impl FlipPattern {
    /// Number of bits in the pattern.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the pattern is empty (zero-width input A).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A garbled circuit: rewritten truth tables plus the encoding key needed to
/// re-obfuscate fresh input-A bundles against it (the "pk" of the construction,
/// named `encoding_key` here since it carries no public-key semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarbledCircuit {
    /// The circuit with gate tables rewritten by the garbler.
    pub circuit: Circuit,
    /// Flip pattern over input-A wires only.
    pub encoding_key: FlipPattern,
}

fn random_bit(rng: &mut impl RngCore) -> bool {
    rng.next_u32() & 1 == 1
}

fn swap_rows(table: &mut [[bool; 2]; 2]) {
    table.swap(0, 1);
}

fn swap_cols(table: &mut [[bool; 2]; 2]) {
    table[0].swap(0, 1);
    table[1].swap(0, 1);
}

fn negate_table(table: &mut [[bool; 2]; 2]) {
    for row in table.iter_mut() {
        for cell in row.iter_mut() {
            *cell = !*cell;
        }
    }
}

/// Garble `circuit` against plaintext input A, obfuscating it to a fresh A′.
///
/// Returns the garbled circuit (whose `encoding_key` is the flip pattern
/// `A′ ⊕ A`) together with the sampled `A′`, since callers that garble a
/// specific plaintext (as opposed to [`garble_fresh`]'s use from `PSetup`)
/// need both to evaluate the round-trip.
pub fn garble(circuit: &Circuit, input_a: &[bool], rng: &mut impl RngCore) -> Result<(GarbledCircuit, Vec<bool>)> {
    let d = circuit.details;
    if input_a.len() != d.input_a_bits as usize {
        return Err(crate::error::CrgcError::invalid_input(format!(
            "input A has {} bits, circuit expects {}",
            input_a.len(),
            d.input_a_bits
        )));
    }

    let a_prime: Vec<bool> = (0..d.input_a_bits).map(|_| random_bit(rng)).collect();
    let flip: Vec<bool> = a_prime.iter().zip(input_a).map(|(&ap, &a)| ap != a).collect();

    let garbled_circuit = run_pipeline(circuit, &flip, &a_prime, rng);
    let garbled = GarbledCircuit {
        circuit: garbled_circuit,
        encoding_key: FlipPattern(flip),
    };
    Ok((garbled, a_prime))
}

/// Garble `circuit` with no anchor plaintext: samples the encoding key
/// directly as a uniformly random bit vector over input-A wires (`PSetup`'s
/// "random base flip vector", §4.6). Equivalent to [`garble`] against the
/// implicit all-zero input A, since the flip pattern and the known-value of
/// an input-A wire then coincide.
pub fn garble_fresh(circuit: &Circuit, rng: &mut impl RngCore) -> GarbledCircuit {
    let d = circuit.details;
    let pk: Vec<bool> = (0..d.input_a_bits).map(|_| random_bit(rng)).collect();
    let garbled_circuit = run_pipeline(circuit, &pk, &pk, rng);
    GarbledCircuit {
        circuit: garbled_circuit,
        encoding_key: FlipPattern(pk),
    }
}

/// `a_flip` is the per-bit flip (§4.3.1's `flipped[wire_for_bit_i]`); `a_known`
/// is the resulting known value at that wire (the obfuscated bit itself).
/// They coincide when the anchor plaintext is all-zero ([`garble_fresh`]) and
/// differ in general ([`garble`]).
fn run_pipeline(circuit: &Circuit, a_flip: &[bool], a_known: &[bool], rng: &mut impl RngCore) -> Circuit {
    let d = circuit.details;
    let n = d.num_wires as usize;

    let mut flipped = vec![false; n];
    let mut is_known = vec![false; n];
    let mut known_val = vec![false; n];
    for i in 0..d.input_a_bits {
        let w = d.wire_for_a_bit(i) as usize;
        flipped[w] = a_flip[i as usize];
        is_known[w] = true;
        known_val[w] = a_known[i as usize];
    }

    let mut gates = circuit.gates.clone();

    // 4.3.2: circuit flipping.
    for gate in gates.iter_mut() {
        if flipped[gate.left_parent as usize] {
            swap_rows(&mut gate.table);
        }
        if flipped[gate.right_parent as usize] {
            swap_cols(&mut gate.table);
        }
        if !d.is_output_wire(gate.output) && random_bit(rng) {
            negate_table(&mut gate.table);
            flipped[gate.output as usize] = true;
        }
    }

    // 4.3.3: fixed-gate identification and integrity repair.
    let mut parents: Vec<Option<(u32, u32)>> = vec![None; n];
    for gate in gates.iter_mut() {
        parents[gate.output as usize] = Some((gate.left_parent, gate.right_parent));
        let l = gate.left_parent as usize;
        let r = gate.right_parent as usize;
        let out = gate.output as usize;
        let out_is_output = d.is_output_wire(gate.output);

        if is_known[l] && is_known[r] {
            if !out_is_output {
                is_known[out] = true;
                known_val[out] = gate.eval(known_val[l], known_val[r]);
            }
        } else if is_known[l] {
            let v = known_val[l] as usize;
            let row = gate.table[v];
            if row[0] == row[1] {
                if !out_is_output {
                    is_known[out] = true;
                    known_val[out] = row[0];
                }
            } else {
                gate.table[1 - v] = row;
            }
        } else if is_known[r] {
            let v = known_val[r] as usize;
            let col0 = gate.table[0][v];
            let col1 = gate.table[1][v];
            if col0 == col1 {
                if !out_is_output {
                    is_known[out] = true;
                    known_val[out] = col0;
                }
            } else {
                gate.table[0][1 - v] = col0;
                gate.table[1][1 - v] = col1;
            }
        }
    }

    // 4.3.4: backward BFS from outputs through non-known edges.
    let mut reachable = vec![false; n];
    let mut queue = std::collections::VecDeque::new();
    for wire in d.first_output_wire()..d.num_wires {
        let w = wire as usize;
        reachable[w] = true;
        queue.push_back(w);
    }
    while let Some(w) = queue.pop_front() {
        if is_known[w] {
            continue;
        }
        if let Some((l, r)) = parents[w] {
            for p in [l as usize, r as usize] {
                if !reachable[p] {
                    reachable[p] = true;
                    queue.push_back(p);
                }
            }
        }
    }

    // 4.3.5: regenerate pure-leakage gates.
    let input_wire_count = (d.input_a_bits + d.input_b_bits) as usize;
    for gate in gates.iter_mut() {
        let out = gate.output as usize;
        if is_known[out] && !reachable[out] {
            let is_level1 =
                (gate.left_parent as usize) < input_wire_count || (gate.right_parent as usize) < input_wire_count;
            if is_level1 {
                let b = random_bit(rng);
                gate.table = [[b, !b], [!b, b]];
            } else {
                loop {
                    let t = [[random_bit(rng), random_bit(rng)], [random_bit(rng), random_bit(rng)]];
                    let g = Gate {
                        left_parent: gate.left_parent,
                        right_parent: gate.right_parent,
                        output: gate.output,
                        table: t,
                    };
                    if !g.is_constant() {
                        gate.table = t;
                        break;
                    }
                }
            }
        }
    }

    Circuit { details: d, gates }
}
