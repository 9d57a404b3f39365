//! `noiseguard` — denoise a WAV file through the real-time frame processor.
//!
//! The file is downmixed to mono, resampled to the model rate, run through
//! `FrameProcessor` one frame at a time exactly as the live pipeline would,
//! then resampled back and written as 32-bit float WAV.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use noiseguard_core::{
    audio::RateConverter, default_provider, engine::pipeline::process_buffer, EngineConfig,
    FrameProcessor, ProcessorParams, FRAME_SIZE, MODEL_SAMPLE_RATE,
};
use std::sync::Arc;
use tracing::{info, warn};

const RESAMPLE_CHUNK: usize = 1024;

#[derive(Debug)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    level: Option<f32>,
    threshold: Option<f32>,
    comfort_noise: Option<bool>,
    print_metrics: bool,
}

const USAGE: &str = "Usage: noiseguard <input.wav> <output.wav> \
[--level <0..1>] [--threshold <0..1>] [--no-comfort] [--config <file.json>] [--metrics]";

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut level = None;
    let mut threshold = None;
    let mut comfort_noise = None;
    let mut print_metrics = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--level" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --level");
                };
                level = Some(v.parse::<f32>().context("invalid value for --level")?);
            }
            "--threshold" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --threshold");
                };
                threshold = Some(v.parse::<f32>().context("invalid value for --threshold")?);
            }
            "--config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                config = Some(PathBuf::from(v));
            }
            "--no-comfort" => comfort_noise = Some(false),
            "--metrics" => print_metrics = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown argument: {other}"),
            other => positional.push(PathBuf::from(other)),
        }
    }

    let [input, output]: [PathBuf; 2] = positional
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected input and output paths\n{USAGE}"))?;

    Ok(Args {
        input,
        output,
        config,
        level,
        threshold,
        comfort_noise,
        print_metrics,
    })
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Read any PCM/float WAV as mono f32 in [-1, 1].
fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("decoding float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .context("decoding integer samples")?
        }
    };

    if channels > 1 {
        info!(channels, "downmixing to mono");
    }
    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

fn write_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("creating {}", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    let mut rc = RateConverter::new(from, to, RESAMPLE_CHUNK)?;
    let mut out = rc.process(samples)?;
    out.extend(rc.flush()?);
    Ok(out)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let params = Arc::new(ProcessorParams::new(
        args.level.unwrap_or(config.suppression_level),
        args.threshold.unwrap_or(config.vad_threshold),
        args.comfort_noise.unwrap_or(config.comfort_noise),
    ));

    let (input, source_rate) = read_mono(&args.input)?;
    info!(
        path = %args.input.display(),
        samples = input.len(),
        sample_rate = source_rate,
        "input loaded"
    );

    let mut working = resample(&input, source_rate, MODEL_SAMPLE_RATE)?;
    let original_len = working.len();
    let remainder = working.len() % FRAME_SIZE;
    if remainder != 0 {
        working.resize(working.len() + FRAME_SIZE - remainder, 0.0);
    }

    let mut processor = FrameProcessor::with_params(default_provider(), Arc::clone(&params));
    processor
        .init()
        .with_context(|| format!("initializing {} backend", processor.backend_name()))?;

    let frames = process_buffer(&mut processor, &mut working)?;
    let metrics = processor.metrics().snapshot();
    processor.destroy();
    working.truncate(original_len);

    info!(
        frames,
        backend = processor.backend_name(),
        level = params.suppression_level(),
        threshold = params.vad_threshold(),
        "denoised"
    );

    let output = resample(&working, MODEL_SAMPLE_RATE, source_rate)?;
    if output.len() < input.len() {
        warn!(
            missing = input.len() - output.len(),
            "output shorter than input after resampling"
        );
    }
    write_mono(&args.output, &output, source_rate)?;
    info!(path = %args.output.display(), "output written");

    if args.print_metrics {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }

    Ok(())
}

fn main() {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("noiseguard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = parse_args().and_then(run);
    if let Err(e) = result {
        eprintln!("noiseguard failed: {e:#}");
        std::process::exit(1);
    }
}
