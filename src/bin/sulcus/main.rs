//! Sulcus CLI - spectral surface alignment driver.
//!
//! Usage: sulcus --ref <DIR> --sub <DIR> --out <DIR> [OPTIONS]
//!
//! Run `sulcus --help` for the full flag list.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sulcus::algo::embedding::SpectralEmbedding;
use sulcus::algo::register::{align, AlignOptions, IcpOptions, Matching};
use sulcus::algo::spectrum::SpectrumOptions;
use sulcus::io::{load_surface, save_records, MeshRecord, SpectralRecord, SurfaceLayout};

/// Default sample budget for the fast (partial-matching) mode.
const FAST_MATCHING_SAMPLES: usize = 10_000;

#[derive(Parser)]
#[command(name = "sulcus")]
#[command(author, version, about = "Spectral alignment of cortical surface meshes", long_about = None)]
struct Cli {
    /// Directory of the reference brain (last path component is the subject id)
    #[arg(short = 'r', long = "ref")]
    reference: PathBuf,

    /// Directory of the brain to be aligned
    #[arg(short = 's', long = "sub")]
    subject: PathBuf,

    /// Output directory for saving data
    #[arg(short = 'o', long = "out")]
    out: PathBuf,

    /// Hemisphere to align ("lh" or "rh")
    #[arg(long, default_value = "lh")]
    hemi: String,

    /// Number of eigenvectors to decompose
    #[arg(long = "eig", default_value = "5")]
    eigenvectors: usize,

    /// Sulcal depth weight for alignment matching (0 disables the channel)
    #[arg(long = "sul", default_value = "1.0")]
    sulcal_weight: f64,

    /// Initialize with the first 3 less ambiguous eigenvectors
    #[arg(long)]
    two_step: bool,

    /// Robust alignment: complete matching over all points
    /// (default is faster partial matching on a sample)
    #[arg(long)]
    robust: bool,

    /// Seed for partial-matching subsampling
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Use single-threaded execution
    #[arg(long)]
    sequential: bool,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (ref_base, ref_id) = split_subject_dir(&cli.reference)?;
    let (sub_base, sub_id) = split_subject_dir(&cli.subject)?;

    let matching = if cli.robust {
        println!("Using robust alignment with all points");
        Matching::Complete
    } else {
        println!("Using faster alignment with {} samples", FAST_MATCHING_SAMPLES);
        Matching::Partial {
            samples: FAST_MATCHING_SAMPLES,
        }
    };

    let layout = SurfaceLayout::default();
    let spectrum_options = SpectrumOptions::default();
    let start = Instant::now();

    if ref_id == sub_id {
        // Self alignment: the embedding is its own aligned frame.
        println!("Self alignment - skipping registration");

        println!("Loading {} as reference mesh", ref_id);
        let ref_data = load_surface(ref_base, ref_id, &cli.hemi, &layout)?;

        println!("Computing spectral embedding of {} as reference", ref_id);
        let embedding =
            SpectralEmbedding::compute(&ref_data, cli.eigenvectors, &spectrum_options)?;

        let spectral = SpectralRecord::from_embedding(&embedding);
        let mesh = MeshRecord::new(&ref_data, &embedding);
        save_records(&cli.out, &format!("{}_{}", ref_id, cli.hemi), &spectral, &mesh)?;
    } else {
        println!("Loading {} as reference mesh", ref_id);
        let ref_data = load_surface(ref_base, ref_id, &cli.hemi, &layout)?;
        println!("Computing spectral embedding of {} as reference", ref_id);
        let reference =
            SpectralEmbedding::compute(&ref_data, cli.eigenvectors, &spectrum_options)?;

        println!("Loading {} as subject mesh", sub_id);
        let sub_data = load_surface(sub_base, sub_id, &cli.hemi, &layout)?;
        println!("Computing spectral embedding of {} as subject", sub_id);
        let subject =
            SpectralEmbedding::compute(&sub_data, cli.eigenvectors, &spectrum_options)?;

        println!(
            "Aligning subject {} spectral embedding to {} reference",
            sub_id, ref_id
        );
        let mut options = AlignOptions::default()
            .with_krot(cli.eigenvectors)
            .with_sulcal_weight(cli.sulcal_weight)
            .with_seed(cli.seed);
        options.matching = matching;
        options.icp = if cli.sequential {
            IcpOptions::default().sequential()
        } else {
            IcpOptions::default()
        };
        if cli.two_step {
            options = options.with_two_step();
        }

        let alignment = align(&reference, &subject, &options)?;
        if !alignment.converged {
            println!(
                "Warning: registration hit the iteration cap (rmse {:.6})",
                alignment.rmse
            );
        }

        let spectral = SpectralRecord::from_alignment(&subject, &alignment);
        let mesh = MeshRecord::new(&sub_data, &subject);
        save_records(&cli.out, &format!("{}_{}", sub_id, cli.hemi), &spectral, &mesh)?;
    }

    println!("Time taken: {:.2?}", start.elapsed());
    Ok(())
}

/// Split a subject directory into (base directory, subject id).
fn split_subject_dir(path: &Path) -> Result<(&Path, &str), String> {
    let id = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("{} has no subject component", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok((base, id))
}
