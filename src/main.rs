use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use stegkey::payload::BODY_LEN;
use stegkey::{Error, Pipeline, Progress, Stage, Storage, stego};
use tracing::info;
use tracing_subscriber::EnvFilter;
mod auth;

const LOG_ENV: &str = "STEGKEY_LOG";

#[derive(Debug, Parser)]
#[command(name = "stegkey")]
#[command(
    version,
    about = "Encrypt files with a PIN and hide the key inside a cover image."
)]
struct Cli {
    /// Print debug logs to stderr (overridden by STEGKEY_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a file and hides its key in a cover image
    #[command(arg_required_else_help = true)]
    Encrypt {
        /// File to encrypt
        input: PathBuf,

        /// Lossless cover image (PNG) that will carry the key
        #[arg(long, value_name = "PNG")]
        cover: PathBuf,

        /// Directory for `<name>.enc` and `<name>.key.png`
        #[arg(long, value_name = "DIR", default_value = ".", env = "STEGKEY_OUT_DIR")]
        out_dir: PathBuf,

        /// Overwrite an existing ciphertext and key image
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Decrypts a file using the key hidden in a key image
    #[command(arg_required_else_help = true)]
    Decrypt {
        /// Encrypted file produced by `encrypt`
        input: PathBuf,

        /// Key image produced by `encrypt`
        #[arg(long = "key-image", value_name = "PNG")]
        key_image: PathBuf,

        /// Output path (default: input without its `.enc` extension)
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Overwrite the output if it exists
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Shows whether an image carries an embedded key
    #[command(arg_required_else_help = true)]
    Inspect { image: PathBuf },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg:>10} [{bar:30}] {pos:>3}%")?.progress_chars("=> "),
    );
    Ok(bar)
}

fn report(bar: &ProgressBar, progress: Progress) {
    let label = match progress.stage {
        Stage::Idle => "waiting",
        Stage::Deriving => "deriving",
        Stage::Encrypting => "encrypting",
        Stage::Decrypting => "decrypting",
        Stage::Verifying => "verifying",
        Stage::Done => "done",
        Stage::Failed => "failed",
    };
    bar.set_message(label);
    bar.set_position(progress.percent.into());
}

fn file_name(path: &Path) -> Result<String> {
    Ok(path
        .file_name()
        .context("input path has no file name")?
        .to_string_lossy()
        .into_owned())
}

fn default_output(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == "enc" => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".dec");
            PathBuf::from(name)
        }
    }
}

fn encrypt(input: PathBuf, cover: PathBuf, out_dir: PathBuf, force: bool) -> Result<()> {
    let name = file_name(&input)?;
    let enc = Storage::new(out_dir.join(format!("{name}.enc")));
    let key = Storage::new(out_dir.join(format!("{name}.key.png")));
    if !force {
        // a replaced key image strands the ciphertext it belonged to
        for target in [&enc, &key] {
            if target.exists() {
                bail!("{} already exists (use --force to overwrite)", target.path().display());
            }
        }
    }

    let data = Storage::new(input.clone()).load()?;
    if data.is_empty() {
        return Err(Error::Validation(format!("{} is empty", input.display())).into());
    }

    let mut cover = Storage::new(cover).load_image()?;
    if cover.pixel_count() < stego::MIN_PIXELS {
        return Err(Error::Capacity {
            required: stego::MIN_PIXELS,
            available: cover.pixel_count(),
        }
        .into());
    }

    let pin = auth::read_new_pin_with_confirmation()?;

    let bar = progress_bar()?;
    let result = Pipeline::new()
        .on_progress(|p| report(&bar, p))
        .encrypt_file(&data, &pin);
    bar.finish_and_clear();
    let result = result?;

    result.embed_into(&mut cover)?;

    enc.save(result.ciphertext())?;
    key.save_image(&cover)?;
    info!(ciphertext = %enc.path().display(), key_image = %key.path().display(), "encryption complete");

    println!("encrypted file: {}", enc.path().display());
    println!("key image:      {}", key.path().display());
    println!("keep the key image private: it decrypts the file without the PIN");
    Ok(())
}

fn decrypt(input: PathBuf, key_image: PathBuf, out: Option<PathBuf>, force: bool) -> Result<()> {
    let out = Storage::new(out.unwrap_or_else(|| default_output(&input)));
    if out.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", out.path().display());
    }

    let ciphertext = Storage::new(input).load()?;
    let key_image = Storage::new(key_image).load_image()?;
    let pin = auth::read_pin()?;

    let bar = progress_bar()?;
    let plaintext = Pipeline::new()
        .on_progress(|p| report(&bar, p))
        .decrypt_file(&ciphertext, &key_image, &pin);
    bar.finish_and_clear();
    let plaintext = plaintext?;

    out.save(&plaintext)?;
    info!(output = %out.path().display(), bytes = plaintext.len(), "decryption complete");

    println!("decrypted file: {}", out.path().display());
    Ok(())
}

fn inspect(image: PathBuf) -> Result<()> {
    let storage = Storage::new(image);
    let pixels = storage.load_image()?;

    println!("image:      {}", storage.path().display());
    println!("dimensions: {}x{}", pixels.width(), pixels.height());
    println!(
        "capacity:   {} bytes ({} pixels, {} needed for a key)",
        stego::capacity_bytes(&pixels),
        pixels.pixel_count(),
        stego::MIN_PIXELS
    );

    match stego::extract(&pixels, BODY_LEN) {
        Ok(_) => println!("embedded key: present"),
        Err(Error::Format(reason)) => println!("embedded key: absent ({reason})"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Encrypt {
            input,
            cover,
            out_dir,
            force,
        } => encrypt(input, cover, out_dir, force),
        Commands::Decrypt {
            input,
            key_image,
            out,
            force,
        } => decrypt(input, key_image, out, force),
        Commands::Inspect { image } => inspect(image),
    }
}
