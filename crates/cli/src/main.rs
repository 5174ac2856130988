mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use facegate_core::detection::domain::face_locator::FaceLocator;
use facegate_core::detection::infrastructure::cascade_face_locator::{
    CascadeFaceLocator, DetectionParams,
};
use facegate_core::detection::infrastructure::haar_cascade::HaarCascade;
use facegate_core::identity::infrastructure::directory_reference_store::DirectoryReferenceStore;
use facegate_core::imaging::domain::image_decoder::ImageDecoder;
use facegate_core::imaging::infrastructure::image_crate_decoder::ImageCrateDecoder;
use facegate_core::matching::infrastructure::histogram_face_matcher::HistogramFaceMatcher;
use facegate_core::pipeline::authenticate_use_case::AuthenticateUseCase;
use facegate_core::pipeline::register_face_use_case::{
    EnrollOutcome, RegisterFaceUseCase, RegisterOutcome,
};
use facegate_core::shared::cascade_resolver::{self, CascadeSource};
use facegate_core::shared::constants::{CASCADE_MODEL_NAME, CASCADE_MODEL_URL};

use settings::Settings;

/// Exit status for a negative outcome (no match, no face, taken name).
const EXIT_REJECTED: i32 = 2;

/// Face-photo registration and login.
#[derive(Parser)]
#[command(name = "facegate", version)]
struct Cli {
    /// Settings file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding users' reference photos.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Haar cascade XML file.
    #[arg(long, global = true)]
    cascade: Option<PathBuf>,

    /// Minimum histogram correlation for a match (-1.0 to 1.0).
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Overlapping detections a face needs before it is reported.
    #[arg(long, global = true)]
    min_neighbors: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a user with their first reference photo.
    Register { username: String, image: PathBuf },
    /// Add a newer reference photo for an existing user.
    Enroll { username: String, image: PathBuf },
    /// Check a photo against a user's latest reference photo.
    Login { username: String, image: PathBuf },
    /// Compare two photos directly.
    Compare { reference: PathBuf, submitted: PathBuf },
    /// List the faces found in a photo.
    Detect { image: PathBuf },
}

fn main() {
    env_logger::init();

    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = effective_settings(&cli)?;

    match &cli.command {
        Command::Register { username, image } => {
            let outcome = register_use_case(&settings)?.register(username, &read(image)?)?;
            println!("{outcome}");
            Ok(exit_code(outcome == RegisterOutcome::Registered))
        }
        Command::Enroll { username, image } => {
            let outcome = register_use_case(&settings)?.enroll(username, &read(image)?)?;
            println!("{outcome}");
            Ok(exit_code(outcome == EnrollOutcome::Enrolled))
        }
        Command::Login { username, image } => {
            let outcome = authenticate_use_case(&settings)?.execute(username, &read(image)?)?;
            println!("{outcome}");
            Ok(exit_code(outcome.is_success()))
        }
        Command::Compare {
            reference,
            submitted,
        } => {
            let outcome =
                authenticate_use_case(&settings)?.compare(&read(reference)?, &read(submitted)?);
            println!("{outcome}");
            Ok(exit_code(outcome.is_success()))
        }
        Command::Detect { image } => {
            let decoded = ImageCrateDecoder::new().decode(&read(image)?)?;
            let faces = build_locator(&settings)?.locate(&decoded);
            for face in &faces {
                println!("{} {} {} {}", face.x, face.y, face.width, face.height);
            }
            log::info!("{} face(s) in {}", faces.len(), image.display());
            Ok(exit_code(!faces.is_empty()))
        }
    }
}

/// Settings file overlaid with command-line flags, validated.
fn effective_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(store) = &cli.store {
        settings.store_dir = Some(store.clone());
    }
    if let Some(cascade) = &cli.cascade {
        settings.cascade_path = Some(cascade.clone());
    }
    if let Some(threshold) = cli.threshold {
        settings.threshold = threshold;
    }
    if let Some(min_neighbors) = cli.min_neighbors {
        settings.min_neighbors = min_neighbors;
    }
    settings.validate()?;
    Ok(settings)
}

fn register_use_case(settings: &Settings) -> Result<RegisterFaceUseCase, Box<dyn std::error::Error>> {
    Ok(RegisterFaceUseCase::new(
        Box::new(open_store(settings)?),
        Box::new(ImageCrateDecoder::new()),
    ))
}

fn authenticate_use_case(
    settings: &Settings,
) -> Result<AuthenticateUseCase, Box<dyn std::error::Error>> {
    Ok(AuthenticateUseCase::new(
        Box::new(open_store(settings)?),
        Box::new(ImageCrateDecoder::new()),
        Box::new(build_locator(settings)?),
        Box::new(HistogramFaceMatcher::new(settings.threshold)),
    ))
}

fn open_store(settings: &Settings) -> Result<DirectoryReferenceStore, Box<dyn std::error::Error>> {
    let dir = settings
        .resolved_store_dir()
        .ok_or("Could not determine a store directory; pass --store")?;
    log::debug!("Using reference store {}", dir.display());
    Ok(DirectoryReferenceStore::new(dir))
}

fn build_locator(settings: &Settings) -> Result<CascadeFaceLocator, Box<dyn std::error::Error>> {
    let bundled_dir = bundled_models_dir();
    let source = CascadeSource {
        explicit: settings.cascade_path.as_deref(),
        bundled_dir: bundled_dir.as_deref(),
    };
    log::info!("Resolving cascade: {CASCADE_MODEL_NAME}");
    let path = cascade_resolver::resolve(
        CASCADE_MODEL_NAME,
        CASCADE_MODEL_URL,
        &source,
        Some(Box::new(download_progress)),
    )?;

    let cascade = Arc::new(HaarCascade::load(&path)?);
    let params = DetectionParams {
        scale_factor: settings.scale_factor,
        min_neighbors: settings.min_neighbors,
        min_size: settings.min_face_size,
    };
    Ok(CascadeFaceLocator::new(cascade, params)?)
}

/// `models/` next to the executable, if the binary location is known.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
}

fn read(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    fs::read(path).map_err(|e| format!("Cannot read {}: {e}", path.display()).into())
}

fn exit_code(accepted: bool) -> i32 {
    if accepted {
        0
    } else {
        EXIT_REJECTED
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face cascade... {pct}%");
    } else {
        eprint!("\rDownloading face cascade... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
