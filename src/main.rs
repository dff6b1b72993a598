use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crgc::constants::BUFFER_SIZE;
use crgc::counter::count_gate_types;
use crgc::stream::BufferedLineStream;
use crgc::wire_analyzer::analyze_wire_usage;
use crgc::{evaluate, garble, parse_bristol, pgen, predict_leakage, psetup, psolve};

/// CRGC / TLP circuit tool: Bristol Fashion analysis, garbling, and
/// time-lock puzzle construction.
#[derive(Parser, Debug)]
#[command(name = "crgc")]
#[command(about = "Garbled circuit and time-lock puzzle tooling")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Buffer size for reading (e.g., 128MB, 256MB, 512MB)
    #[arg(
        short = 'b',
        long = "buffer-size",
        global = true,
        help = "Buffer size for file reading (supports MB/GB suffixes); defaults to 256MB"
    )]
    buffer_size: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count occurrences of each gate type in a Bristol circuit.
    Count {
        /// Bristol circuit file.
        file: PathBuf,
    },
    /// Analyze wire usage patterns and connectivity.
    WireAnalysis {
        /// Bristol circuit file.
        file: PathBuf,
        /// Output file for the JSON report (default: `<input>.wire_analysis.json`).
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Parse a Bristol circuit and print its header summary.
    Parse {
        /// Bristol circuit file.
        file: PathBuf,
    },
    /// Evaluate a Bristol circuit on explicit bit strings.
    Eval {
        /// Bristol circuit file.
        file: PathBuf,
        /// Input A as a string of '0'/'1' characters.
        #[arg(long = "a")]
        input_a: String,
        /// Input B as a string of '0'/'1' characters.
        #[arg(long = "b")]
        input_b: String,
    },
    /// Garble a Bristol circuit against a plaintext input A.
    Garble {
        /// Bristol circuit file.
        file: PathBuf,
        /// Plaintext input A as a string of '0'/'1' characters.
        #[arg(long = "a")]
        input_a: String,
        /// Seed (as a decimal integer) for the garbling RNG.
        #[arg(long = "seed")]
        seed: u64,
        /// Output file stem for the RGC artifact (writes `<stem>_rgc*.txt`).
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// Run the leakage diagnostic over a Bristol circuit's structure.
    Leakage {
        /// Bristol circuit file.
        file: PathBuf,
    },
    /// PSetup: build and garble the unrolled T-fold circuit for a sequential function.
    TlpSetup {
        /// Bristol circuit file for the sequential function `f` (λ-bit in/out, no B input).
        f_file: PathBuf,
        /// Number of sequential applications of `f`.
        #[arg(long)]
        t: u32,
        /// Seed (as a decimal integer) for the garbling RNG.
        #[arg(long)]
        seed: u64,
        /// Output file for the serialized public parameters (JSON).
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// PGen: sample a fresh puzzle encoding a secret bit against public parameters.
    TlpGen {
        /// Public parameters file produced by `tlp-setup`.
        pp_file: PathBuf,
        /// Secret bit to encode (0 or 1).
        #[arg(long)]
        s: u8,
        /// Seed (as a decimal integer) for the puzzle RNG.
        #[arg(long)]
        seed: u64,
        /// Output file for the serialized puzzle (JSON).
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
    /// PSolve: solve a puzzle against public parameters and print the recovered bit.
    TlpSolve {
        /// Public parameters file produced by `tlp-setup`.
        pp_file: PathBuf,
        /// Puzzle file produced by `tlp-gen`.
        puzzle_file: PathBuf,
    },
}

/// Parse buffer size string (e.g., "64MB", "128MB", "1GB") to bytes.
fn parse_buffer_size(size_str: &str) -> Result<usize> {
    let size_str = size_str.to_uppercase();
    if let Some(num_str) = size_str.strip_suffix("GB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0 * 1024.0 * 1024.0) as usize)
    } else if let Some(num_str) = size_str.strip_suffix("MB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0 * 1024.0) as usize)
    } else if let Some(num_str) = size_str.strip_suffix("KB") {
        let num: f64 = num_str.parse()?;
        Ok((num * 1024.0) as usize)
    } else {
        Ok(size_str.parse()?)
    }
}

fn parse_bits(s: &str) -> Result<Vec<bool>> {
    s.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => bail!("invalid bit character '{other}', expected '0' or '1'"),
        })
        .collect()
}

fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

fn open_stream(path: &PathBuf, buffer_size: usize) -> Result<BufferedLineStream> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(BufferedLineStream::with_buffer_size(file, buffer_size))
}

/// Discard the three Bristol header lines (plus any blank separator), so the
/// remaining stream is a pure gate body for [`count_gate_types`]/[`analyze_wire_usage`].
fn skip_bristol_header(stream: &mut BufferedLineStream) -> Result<()> {
    let mut seen = 0;
    while seen < 3 {
        match stream.next_line() {
            Some(line) => {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                seen += 1;
            }
            None => bail!("file ended before three Bristol header lines were read"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let buffer_size = match &args.buffer_size {
        Some(s) => parse_buffer_size(s)?,
        None => BUFFER_SIZE,
    };

    match args.command {
        Commands::Count { file } => {
            let mut stream = open_stream(&file, buffer_size)?;
            skip_bristol_header(&mut stream)?;
            let counts = count_gate_types(&mut stream)?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        Commands::WireAnalysis { file, output } => {
            let mut stream = open_stream(&file, buffer_size)?;
            skip_bristol_header(&mut stream)?;
            let report = analyze_wire_usage(&mut stream)?;

            let output_path = output.unwrap_or_else(|| {
                let mut path = file.clone();
                path.set_extension("wire_analysis.json");
                path
            });
            report.save_json(&output_path)?;

            println!("Wire analysis saved to: {}", output_path.display());
            println!("Total wires: {}", report.total_wires);
            println!("Primary inputs: {}", report.primary_inputs);
            println!("Intermediate wires: {}", report.intermediate_wires);
            println!("Primary outputs: {}", report.primary_outputs);
            println!("Missing/unused wires: {}", report.missing_wires_count);
        }
        Commands::Parse { file } => {
            let mut stream = open_stream(&file, buffer_size)?;
            let circuit = parse_bristol(&mut stream)?;
            let d = circuit.details;
            println!(
                "wires={} gates={} input_a_bits={} input_b_bits={} num_outputs={} output_bits={}",
                d.num_wires, d.num_gates, d.input_a_bits, d.input_b_bits, d.num_outputs, d.output_bits
            );
        }
        Commands::Eval { file, input_a, input_b } => {
            let mut stream = open_stream(&file, buffer_size)?;
            let circuit = parse_bristol(&mut stream)?;
            let a = parse_bits(&input_a)?;
            let b = parse_bits(&input_b)?;
            let out = evaluate(&circuit, &a, &b)?;
            println!("{}", bits_to_string(&out));
        }
        Commands::Garble { file, input_a, seed, output } => {
            let mut stream = open_stream(&file, buffer_size)?;
            let circuit = parse_bristol(&mut stream)?;
            let a = parse_bits(&input_a)?;
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let (garbled, a_prime) = garble(&circuit, &a, &mut rng)?;
            crgc::rgc::write_rgc(&output, &garbled, &a_prime)?;
            println!("Garbled circuit written to {}_rgc*.txt", output.display());
            println!("Obfuscated A′: {}", bits_to_string(&a_prime));
        }
        Commands::Leakage { file } => {
            let mut stream = open_stream(&file, buffer_size)?;
            let circuit = parse_bristol(&mut stream)?;
            let report = predict_leakage(&circuit);
            println!("Potentially obfuscated wires: {}", report.potentially_obfuscated_wires);
            println!("Pure-leakage gates: {}", report.leakage_gates);
            println!("Inferable input-A bits: {}", bits_to_string(&report.inferable_input_a_bits));
        }
        Commands::TlpSetup { f_file, t, seed, output } => {
            let mut stream = open_stream(&f_file, buffer_size)?;
            let f = parse_bristol(&mut stream)?;
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let pp = psetup(&f, t, &mut rng)?;
            let json = serde_json::to_string_pretty(&pp)?;
            std::fs::write(&output, json)?;
            println!("Public parameters (λ={}, T={}) written to {}", pp.lambda, pp.t, output.display());
        }
        Commands::TlpGen { pp_file, s, seed, output } => {
            let pp = serde_json::from_str(&std::fs::read_to_string(&pp_file)?)?;
            let secret = match s {
                0 => false,
                1 => true,
                other => bail!("secret bit must be 0 or 1, got {other}"),
            };
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let puzzle = pgen(&pp, secret, &mut rng)?;
            std::fs::write(&output, serde_json::to_string_pretty(&puzzle)?)?;
            println!("Puzzle encoding s={secret} written to {}", output.display());
        }
        Commands::TlpSolve { pp_file, puzzle_file } => {
            let pp = serde_json::from_str(&std::fs::read_to_string(&pp_file)?)?;
            let puzzle = serde_json::from_str(&std::fs::read_to_string(&puzzle_file)?)?;
            let start = std::time::Instant::now();
            let recovered = psolve(&pp, &puzzle)?;
            println!("s = {}", recovered as u8);
            println!("solved in {:?}", start.elapsed());
        }
    }

    Ok(())
}
