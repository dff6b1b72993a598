//! Completely Reusable Garbled Circuit (CRGC) engine and a lattice-style
//! Time-Lock Puzzle built on top of it: parse Bristol Fashion circuits,
//! evaluate them, garble them into a form that can be safely reused across
//! many inputs, and compose a sequential function into a puzzle whose
//! solution takes a prescribed amount of sequential work to recover.

/// Shared constants used across the library.
pub mod constants;
/// Circuit gate counting utilities.
pub mod counter;
/// Circuit data model: wires, gates, and the structural invariants they obey.
pub mod circuit;
/// Bristol Fashion parser, inverter elimination, and the inverse serializer.
pub mod bristol;
/// Gate-level circuit evaluator.
pub mod evaluate;
/// Error kinds for the circuit/garbling/TLP core.
pub mod error;
/// Garbler pipeline: input obfuscation, circuit flipping, and leakage repair.
pub mod garbler;
/// Leakage diagnostic: predicts garbling weaknesses from circuit structure alone.
pub mod leakage;
/// RGC artifact read/write (garbler output, evaluator input).
pub mod rgc;
/// High-performance streaming file reader.
pub mod stream;
/// Time-lock puzzle circuit builder and PSetup/PGen/PSolve algorithms.
pub mod tlp;
/// Wire usage analysis over raw Bristol gate lines.
pub mod wire_analyzer;

pub use bristol::{emit_bristol, parse_bristol};
pub use circuit::{Circuit, CircuitDetails, Gate};
pub use error::{CrgcError, Result};
pub use evaluate::evaluate;
pub use garbler::{FlipPattern, GarbledCircuit, garble, garble_fresh};
pub use leakage::{LeakageReport, predict_leakage};
pub use tlp::{PublicParams, Puzzle, build_ct, pgen, psetup, psolve};
