//! Leakage diagnostic (§4.4): an input-independent analog of the garbler's
//! fixed-gate identification and backward BFS (§4.3.3–§4.3.4), run purely over
//! circuit structure so it can be asked of a circuit before any input or
//! garbling pass exists.
//!
//! This is advisory only — a conservative predictor, not a proof. It is
//! allowed (and, for gates with a mixed dependence on the fixed axis, expected)
//! to over-report: flagging a bit that a real garbling run would not actually
//! leak is a false positive a user can ignore, while under-reporting would
//! hide a real weakness.

use std::collections::VecDeque;

use crate::circuit::Circuit;

/// Result of running the leakage predictor over a circuit's structure.
#[derive(Debug, Clone)]
pub struct LeakageReport {
    /// Number of wires classified "potentially obfuscated" (forward taint
    /// from input A).
    pub potentially_obfuscated_wires: u32,
    /// Number of gate-output wires that are potentially obfuscated yet
    /// unreachable from any circuit output — pure leakage candidates, the
    /// ones §4.3.5 would regenerate during actual garbling.
    pub leakage_gates: u32,
    /// Per input-A-bit flag: whether the circuit's structure lets that bit be
    /// inferred from other, non-obfuscated information reaching an output.
    pub inferable_input_a_bits: Vec<bool>,
}

impl LeakageReport {
    /// Whether any input-A bit was flagged as inferable.
    pub fn has_inferable_bits(&self) -> bool {
        self.inferable_input_a_bits.iter().any(|&b| b)
    }
}

/// Run the leakage predictor over `circuit`.
pub fn predict_leakage(circuit: &Circuit) -> LeakageReport {
    let d = circuit.details;
    let n = d.num_wires as usize;

    // Forward taint propagation: a gate output is potentially obfuscated if
    // both parents are, or if one parent is and the table shows genuine
    // dependence on the other (non-obfuscated) parent for some fixing of the
    // obfuscated one.
    let mut obfuscated = vec![false; n];
    for i in 0..d.input_a_bits {
        obfuscated[d.wire_for_a_bit(i) as usize] = true;
    }

    let mut parents: Vec<Option<(u32, u32)>> = vec![None; n];
    for gate in &circuit.gates {
        let l = gate.left_parent as usize;
        let r = gate.right_parent as usize;
        let out = gate.output as usize;
        parents[out] = Some((gate.left_parent, gate.right_parent));

        obfuscated[out] = if obfuscated[l] && obfuscated[r] {
            true
        } else if obfuscated[l] {
            (gate.table[0][0] != gate.table[0][1]) || (gate.table[1][0] != gate.table[1][1])
        } else if obfuscated[r] {
            (gate.table[0][0] != gate.table[1][0]) || (gate.table[0][1] != gate.table[1][1])
        } else {
            false
        };
    }

    // Backward BFS from outputs, continuing only through potentially
    // obfuscated wires — the structural mirror of §4.3.4's known-edge stop.
    let mut reachable = vec![false; n];
    let mut queue = VecDeque::new();
    for wire in d.first_output_wire()..d.num_wires {
        let w = wire as usize;
        reachable[w] = true;
        queue.push_back(w);
    }
    while let Some(w) = queue.pop_front() {
        if !obfuscated[w] {
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

    let input_wire_count = (d.input_a_bits + d.input_b_bits) as usize;
    let mut leakage_gates = 0u32;
    let mut inferable = vec![false; d.input_a_bits as usize];

    for gate in &circuit.gates {
        let out = gate.output as usize;
        if obfuscated[out] && !reachable[out] {
            leakage_gates += 1;
        }
        if !reachable[out] {
            continue;
        }

        let l = gate.left_parent as usize;
        let r = gate.right_parent as usize;
        if l >= input_wire_count || r >= input_wire_count {
            continue;
        }
        // A level-1 gate, read by an output, that mixes one obfuscated
        // primary input directly with a non-obfuscated one: whichever is
        // obfuscated is inferable once the other is known to an evaluator.
        for (candidate, other, candidate_is_left) in [(l, r, true), (r, l, false)] {
            if !obfuscated[candidate] || obfuscated[other] {
                continue;
            }
            let differs = if candidate_is_left {
                (gate.table[0][0] != gate.table[0][1]) || (gate.table[1][0] != gate.table[1][1])
            } else {
                (gate.table[0][0] != gate.table[1][0]) || (gate.table[0][1] != gate.table[1][1])
            };
            if !differs {
                continue;
            }
            for i in 0..d.input_a_bits {
                if d.wire_for_a_bit(i) as usize == candidate {
                    inferable[i as usize] = true;
                }
            }
        }
    }

    LeakageReport {
        potentially_obfuscated_wires: obfuscated.iter().filter(|&&b| b).count() as u32,
        leakage_gates,
        inferable_input_a_bits: inferable,
    }
}
