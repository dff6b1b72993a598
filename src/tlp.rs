//! Time-Lock Puzzle on top of the CRGC engine (§4.5, §4.6).
//!
//! `f` is a caller-supplied sequential function circuit: λ-bit input, λ-bit
//! output, pure (`input_b_bits == 0`). [`build_ct`] unrolls it `T` times and
//! appends a λ-bit multiplexer selecting `m` or `x ⊕ z` on the control bit
//! `b`; [`psetup`]/[`pgen`]/[`psolve`] implement the puzzle algorithms over
//! the resulting circuit.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::bristol::{AND_TABLE, OR_TABLE, XOR_TABLE};
use crate::circuit::{Circuit, CircuitDetails, Gate};
use crate::error::{CrgcError, Result};
use crate::evaluate::evaluate;
use crate::garbler::{GarbledCircuit, garble_fresh};

/// Public parameters produced by [`psetup`]: the garbled, unrolled circuit
/// and the bookkeeping needed to shape future puzzles against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicParams {
    /// The garbled T-fold circuit C̃.
    pub garbled: GarbledCircuit,
    /// Bit width of `f`'s input/output and of the puzzle's secret-carrying
    /// registers.
    pub lambda: u32,
    /// Number of sequential applications of `f`.
    pub t: u32,
}

/// A single time-lock puzzle: `Z = (x_tilde_A, B_bundle, r, c)` from §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    /// Encoded A-side bundle `(b=0, x)`, length `lambda + 1`.
    pub x_tilde_a: Vec<bool>,
    /// Plain B-side bundle `(m, z=0^λ)`, length `2 * lambda`.
    pub b_bundle: Vec<bool>,
    /// Goldreich-Levin mask, length `lambda`.
    pub r: Vec<bool>,
    /// Masked secret bit.
    pub c: bool,
}

fn random_bit(rng: &mut impl RngCore) -> bool {
    rng.next_u32() & 1 == 1
}

fn random_bits(n: u32, rng: &mut impl RngCore) -> Vec<bool> {
    (0..n).map(|_| random_bit(rng)).collect()
}

/// Inner product mod 2: `popcount(a AND b) mod 2`.
fn inner_product(a: &[bool], b: &[bool]) -> bool {
    a.iter().zip(b).filter(|(&x, &y)| x && y).count() % 2 == 1
}

fn validate_f(f: &Circuit) -> Result<u32> {
    let d = f.details;
    if d.input_b_bits != 0 {
        return Err(CrgcError::invalid_input("TLP sequential function f must have input_b_bits == 0"));
    }
    if d.num_outputs != 1 || d.output_bits != d.input_a_bits {
        return Err(CrgcError::invalid_input(
            "TLP sequential function f must map its λ-bit input to a single λ-bit output",
        ));
    }
    Ok(d.input_a_bits)
}

/// Build C_T (§4.5): `t` serial copies of `f` over the `x` register, followed
/// by a λ-bit multiplexer selecting `m` (b = 0) or `x ⊕ z` (b = 1). The
/// iteration counter `i` from the construction is symbolic and omitted, per
/// spec.md §4.5's explicit allowance.
pub fn build_ct(f: &Circuit, t: u32) -> Result<Circuit> {
    let lambda = validate_f(f)?;
    if t == 0 {
        return Err(CrgcError::invalid_input("T must be at least 1"));
    }

    let input_a_bits = lambda + 1;
    let input_b_bits = 2 * lambda;
    let b_wire = lambda;
    let z_reg: Vec<u32> = (0..lambda).map(|i| input_a_bits + i).collect();
    let m_reg: Vec<u32> = (0..lambda).map(|i| input_a_bits + lambda + i).collect();

    let mut gates: Vec<Gate> = Vec::with_capacity((t * f.details.num_gates + 4 * lambda + 1) as usize);
    let mut next_wire = input_a_bits + input_b_bits;

    let mut x_reg: Vec<u32> = (0..lambda).collect();
    for _ in 0..t {
        let mut local_to_global: Vec<Option<u32>> = vec![None; f.details.num_wires as usize];
        for (i, &w) in x_reg.iter().enumerate() {
            local_to_global[i] = Some(w);
        }
        for gate in &f.gates {
            let left = local_to_global[gate.left_parent as usize]
                .ok_or_else(|| CrgcError::malformed("f references a parent wire before it is produced"))?;
            let right = local_to_global[gate.right_parent as usize]
                .ok_or_else(|| CrgcError::malformed("f references a parent wire before it is produced"))?;
            let out = next_wire;
            next_wire += 1;
            local_to_global[gate.output as usize] = Some(out);
            gates.push(Gate {
                left_parent: left,
                right_parent: right,
                output: out,
                table: gate.table,
            });
        }
        let first_output = (f.details.num_wires - lambda) as usize;
        x_reg = (0..lambda as usize)
            .map(|i| local_to_global[first_output + i].expect("f's output wires are always produced"))
            .collect();
    }
    let x_final = x_reg;

    // Final λ-bit multiplexer: out_i = (b AND (x_i XOR z_i)) OR (NOT b AND m_i).
    let notb_wire = next_wire;
    next_wire += 1;
    gates.push(Gate {
        left_parent: b_wire,
        right_parent: b_wire,
        output: notb_wire,
        table: [[true, true], [false, false]],
    });

    let mut xorz = Vec::with_capacity(lambda as usize);
    for i in 0..lambda as usize {
        let w = next_wire;
        next_wire += 1;
        gates.push(Gate {
            left_parent: x_final[i],
            right_parent: z_reg[i],
            output: w,
            table: XOR_TABLE,
        });
        xorz.push(w);
    }

    let mut and_b = Vec::with_capacity(lambda as usize);
    for i in 0..lambda as usize {
        let w = next_wire;
        next_wire += 1;
        gates.push(Gate {
            left_parent: b_wire,
            right_parent: xorz[i],
            output: w,
            table: AND_TABLE,
        });
        and_b.push(w);
    }

    let mut and_notb = Vec::with_capacity(lambda as usize);
    for i in 0..lambda as usize {
        let w = next_wire;
        next_wire += 1;
        gates.push(Gate {
            left_parent: notb_wire,
            right_parent: m_reg[i],
            output: w,
            table: AND_TABLE,
        });
        and_notb.push(w);
    }

    for i in 0..lambda as usize {
        let w = next_wire;
        next_wire += 1;
        gates.push(Gate {
            left_parent: and_b[i],
            right_parent: and_notb[i],
            output: w,
            table: OR_TABLE,
        });
    }

    let details = CircuitDetails {
        num_wires: next_wire,
        num_gates: gates.len() as u32,
        num_outputs: 1,
        input_a_bits,
        input_b_bits,
        output_bits: lambda,
    };
    let circuit = Circuit { details, gates };
    circuit.validate_topology()?;
    Ok(circuit)
}

/// PSetup(λ, T): build C_T, then garble it against a freshly sampled
/// encoding key (the construction's "random base flip vector", stored as
/// `pk`/`encoding_key`).
///
/// Per spec.md §9's Open Question resolution: the full four-phase garbler
/// pipeline (§4.3.1–§4.3.5) runs here, not only the circuit-flipping step
/// the literal algorithm text names, with the implicit canonical plaintext
/// A taken to be all-zero (so `encoding_key` and the obfuscated value of any
/// input-A wire coincide) — see DESIGN.md.
pub fn psetup(f: &Circuit, t: u32, rng: &mut impl RngCore) -> Result<PublicParams> {
    let lambda = validate_f(f)?;
    let ct = build_ct(f, t)?;
    let garbled = garble_fresh(&ct, rng);
    Ok(PublicParams { garbled, lambda, t })
}

/// PGen(pp, s): sample a fresh puzzle encoding secret bit `s`.
pub fn pgen(pp: &PublicParams, s: bool, rng: &mut impl RngCore) -> Result<Puzzle> {
    let lambda = pp.lambda;
    let x = random_bits(lambda, rng);
    let m = random_bits(lambda, rng);
    let r = random_bits(lambda, rng);
    let z = vec![false; lambda as usize];

    let mut a_bundle = Vec::with_capacity(lambda as usize + 1);
    a_bundle.push(false); // b = 0
    a_bundle.extend_from_slice(&x);

    if a_bundle.len() != pp.garbled.encoding_key.len() {
        return Err(CrgcError::incompatible("encoding key width does not match C_T's A-side bundle"));
    }
    let x_tilde_a: Vec<bool> = a_bundle
        .iter()
        .zip(&pp.garbled.encoding_key.0)
        .map(|(&bit, &flip)| bit != flip)
        .collect();

    let mut b_bundle = Vec::with_capacity(2 * lambda as usize);
    b_bundle.extend_from_slice(&m);
    b_bundle.extend_from_slice(&z);

    let c = inner_product(&r, &m) ^ s;

    Ok(Puzzle { x_tilde_a, b_bundle, r, c })
}

/// PSolve(pp, Z): evaluate C̃ and unmask the secret bit. The only expensive
/// step is the inner `evaluate` call, whose cost is `Θ(T · cost(f))` since
/// each of the `T` copies of `f` depends on the previous one's output.
pub fn psolve(pp: &PublicParams, z: &Puzzle) -> Result<bool> {
    let y = evaluate(&pp.garbled.circuit, &z.x_tilde_a, &z.b_bundle)?;
    Ok(z.c ^ inner_product(&y, &z.r))
}
