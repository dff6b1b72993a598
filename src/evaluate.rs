//! Gate-level circuit evaluator.
//!
//! Given a circuit and two input bit sequences, assigns wires, walks gates in
//! listed order, and extracts output bits. Total on any circuit that passed
//! [`Circuit::validate_topology`] — the evaluator itself never fails once the
//! circuit is well-formed; callers get [`CrgcError::InvalidInput`] only for a
//! mismatched input length.

use crate::circuit::Circuit;
use crate::error::{CrgcError, Result};

/// Evaluate `circuit` on input bundles `input_a` and `input_b`, returning the
/// output bits (MSB-first per output word, outputs concatenated in word order).
///
/// Input bits are written into wires in reverse order of the caller's slice:
/// the last element of `input_a` lands at wire 0. See the module docs for why
/// this reversal is load-bearing rather than an implementation detail.
pub fn evaluate(circuit: &Circuit, input_a: &[bool], input_b: &[bool]) -> Result<Vec<bool>> {
    let d = circuit.details;
    if input_a.len() != d.input_a_bits as usize {
        return Err(CrgcError::invalid_input(format!(
            "input A has {} bits, circuit expects {}",
            input_a.len(),
            d.input_a_bits
        )));
    }
    if input_b.len() != d.input_b_bits as usize {
        return Err(CrgcError::invalid_input(format!(
            "input B has {} bits, circuit expects {}",
            input_b.len(),
            d.input_b_bits
        )));
    }

    let mut val = vec![false; d.num_wires as usize];
    for (i, &bit) in input_a.iter().enumerate() {
        val[d.wire_for_a_bit(i as u32) as usize] = bit;
    }
    for (i, &bit) in input_b.iter().enumerate() {
        val[d.wire_for_b_bit(i as u32) as usize] = bit;
    }

    for gate in &circuit.gates {
        let left = val[gate.left_parent as usize];
        let right = val[gate.right_parent as usize];
        val[gate.output as usize] = gate.eval(left, right);
    }

    let mut outputs = Vec::with_capacity((d.num_outputs * d.output_bits) as usize);
    for word in 0..d.num_outputs {
        for bit in 0..d.output_bits {
            outputs.push(val[circuit.output_wire(word, bit) as usize]);
        }
    }
    Ok(outputs)
}

/// Interpret a slice of MSB-first bits as an unsigned integer. Test/diagnostic helper.
pub fn bits_to_u64(bits: &[bool]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64)
}

/// Inverse of [`bits_to_u64`]: produce the low `width` bits of `value`, MSB-first.
pub fn u64_to_bits(value: u64, width: usize) -> Vec<bool> {
    (0..width).rev().map(|i| (value >> i) & 1 == 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bristol::parse_bristol;
    use crate::stream::BufferedLineStream;
    use std::fs::File;
    use std::io::Write;

    fn stream_from(text: &str) -> BufferedLineStream {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        BufferedLineStream::new(File::open(file.path()).unwrap())
    }

    fn ripple_carry_adder(width: usize) -> String {
        // A-side: wires [0, width), B-side: wires [width, 2*width).
        // sum bits computed low-to-high then emitted MSB-first as the (width+1)-bit output.
        let mut gates = Vec::new();
        let mut next_wire = 2 * width as u32;
        let mut carry: Option<u32> = None;
        let mut sum_wires = Vec::with_capacity(width + 1);

        for i in 0..width {
            let a = i as u32;
            let b = (width + i) as u32;
            let axb = next_wire;
            gates.push(format!("2 1 {a} {b} {axb} XOR"));
            next_wire += 1;

            let sum_wire;
            match carry {
                None => {
                    sum_wire = axb;
                }
                Some(c) => {
                    let s = next_wire;
                    gates.push(format!("2 1 {axb} {c} {s} XOR"));
                    next_wire += 1;
                    sum_wire = s;
                }
            }
            sum_wires.push(sum_wire);

            if i + 1 < width {
                let axb_and_b = next_wire;
                gates.push(format!("2 1 {a} {b} {axb_and_b} AND"));
                next_wire += 1;
                let new_carry = match carry {
                    None => axb_and_b,
                    Some(c) => {
                        let axb_and_c = next_wire;
                        gates.push(format!("2 1 {axb} {c} {axb_and_c} AND"));
                        next_wire += 1;
                        let merged = next_wire;
                        gates.push(format!("2 1 {axb_and_b} {axb_and_c} {merged} OR"));
                        next_wire += 1;
                        merged
                    }
                };
                carry = Some(new_carry);
            } else {
                // final carry-out becomes the MSB of the (width+1)-bit sum
                let final_carry = match carry {
                    None => {
                        let c = next_wire;
                        gates.push(format!("2 1 {a} {b} {c} AND"));
                        next_wire += 1;
                        c
                    }
                    Some(c) => {
                        let axb_and_b = next_wire;
                        gates.push(format!("2 1 {a} {b} {axb_and_b} AND"));
                        next_wire += 1;
                        let axb_and_c = next_wire;
                        gates.push(format!("2 1 {axb} {c} {axb_and_c} AND"));
                        next_wire += 1;
                        let merged = next_wire;
                        gates.push(format!("2 1 {axb_and_b} {axb_and_c} {merged} OR"));
                        next_wire += 1;
                        merged
                    }
                };
                sum_wires.push(final_carry);
            }
        }

        // Outputs must be the LAST (width+1) wires, MSB-first: wire N-1 is MSB.
        // Our sum_wires are LSB-first (sum_wires[0] = bit0). Append identity
        // gates (AND of a wire with itself) to relocate them into the
        // required trailing, descending-id layout.
        let out_base = next_wire;
        for (i, &w) in sum_wires.iter().enumerate() {
            let dest = out_base + i as u32;
            gates.push(format!("2 1 {w} {w} {dest} AND"));
        }
        let num_wires = out_base + width as u32 + 1;

        let mut text = format!("{} {}\n2 {} {}\n1 {}\n\n", gates.len(), num_wires, width, width, width + 1);
        for g in gates {
            text.push_str(&g);
            text.push('\n');
        }
        text
    }

    #[test]
    fn adder_baseline() {
        let width = 8;
        let text = ripple_carry_adder(width);
        let mut stream = stream_from(&text);
        let circuit = parse_bristol(&mut stream).unwrap();

        let a = u64_to_bits(42, width);
        let b = u64_to_bits(17, width);
        let out = evaluate(&circuit, &a, &b).unwrap();
        assert_eq!(bits_to_u64(&out), 59);
    }

    #[test]
    fn adder_overflow_wraps_within_width_plus_one_bits() {
        let width = 8;
        let text = ripple_carry_adder(width);
        let mut stream = stream_from(&text);
        let circuit = parse_bristol(&mut stream).unwrap();

        let max = (1u64 << width) - 1;
        let a = u64_to_bits(max, width);
        let b = u64_to_bits(1, width);
        let out = evaluate(&circuit, &a, &b).unwrap();
        // (2^width - 1) + 1 = 2^width, representable exactly in width+1 bits.
        assert_eq!(bits_to_u64(&out), 1u64 << width);
    }

    #[test]
    fn rejects_wrong_length_input() {
        let text = ripple_carry_adder(4);
        let mut stream = stream_from(&text);
        let circuit = parse_bristol(&mut stream).unwrap();
        let a = vec![false; 3];
        let b = vec![false; 4];
        assert!(evaluate(&circuit, &a, &b).is_err());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let text = ripple_carry_adder(6);
        let mut stream = stream_from(&text);
        let circuit = parse_bristol(&mut stream).unwrap();
        let a = u64_to_bits(13, 6);
        let b = u64_to_bits(25, 6);
        let out1 = evaluate(&circuit, &a, &b).unwrap();
        let out2 = evaluate(&circuit, &a, &b).unwrap();
        assert_eq!(out1, out2);
    }
}
