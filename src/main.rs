use clap::{Parser, Subcommand};
use log::info;
use pangpak::litexml;
use pangpak::pak::{PakFs, Reader};
use pangpak::updatelist::{ListCache, ListVersion};
use pangpak::xtea::{self, Key, Region, ALL_KEYS, KEY_US};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pangpak", version, about = "PangYa pak archive and update-list tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a set of pak files into a directory
    ///
    /// The paks are layered in argument order and treated as a single
    /// incremental archive.
    Extract {
        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,
        /// Region code (us, jp, th, eu, id, kr); auto-detected when omitted
        #[arg(short, long)]
        region: Option<String>,
        #[arg(required = true, num_args = 1..)]
        paks: Vec<PathBuf>,
    },
    /// List the unified file table of a set of pak files
    List {
        /// Region code (us, jp, th, eu, id, kr); auto-detected when omitted
        #[arg(short, long)]
        region: Option<String>,
        #[arg(required = true, num_args = 1..)]
        paks: Vec<PathBuf>,
    },
    /// Show trailer metadata for each pak file
    Info {
        #[arg(required = true, num_args = 1..)]
        paks: Vec<PathBuf>,
    },
    /// Build an update-list XML for a game folder
    UpdatelistGenerate {
        /// Game folder to index
        dir: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value = "FakeVer")]
        patch_ver: String,
        #[arg(long, default_value = "9999")]
        patch_num: i32,
        #[arg(long, default_value = "20090331")]
        updatelist_ver: String,
    },
    /// Encrypt an update-list XML document for a client
    UpdatelistEncrypt {
        /// Region code (us, jp, th, eu, id, kr)
        #[arg(short, long, default_value = "us")]
        region: String,
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
        /// Output file; stdout when omitted
        output: Option<PathBuf>,
    },
    /// Decrypt an encrypted update-list back to plaintext XML
    UpdatelistDecrypt {
        /// Region code (us, jp, th, eu, id, kr)
        #[arg(short, long, default_value = "us")]
        region: String,
        /// Input file; stdin when omitted
        input: Option<PathBuf>,
        /// Output file; stdout when omitted
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    match Cli::parse().command {
        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract {
            output,
            region,
            paks,
        } => {
            let key = pak_key(region.as_deref(), &paks)?;
            let fs = PakFs::load_paths(key, &paks)?;
            fs.extract(&output)?;
            println!(
                "Extracted {} file(s), {} dir(s) → {}",
                fs.file_count(),
                fs.dir_count(),
                output.display()
            );
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { region, paks } => {
            let key = pak_key(region.as_deref(), &paks)?;
            let fs = PakFs::load_paths(key, &paks)?;
            println!("{:>12}  {:>8}  Path", "Size", "Inode");
            for file in fs.files() {
                let size = fs.file_size(file)?;
                println!("{:>12}  {:>8}  {}", size, file.inode(), file.path());
            }
            println!(
                "{} file(s), {} dir(s) across {} pak(s)",
                fs.file_count(),
                fs.dir_count(),
                paks.len()
            );
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { paks } => {
            for path in &paks {
                // The trailer does not depend on the region key.
                let reader = Reader::open(KEY_US, path)?;
                let trailer = reader.trailer();
                println!("{}:", path.display());
                println!("  file table offset  {}", trailer.file_list_offset);
                println!("  file count         {}", trailer.file_count);
            }
        }

        // ── Update-list generation ───────────────────────────────────────────
        Commands::UpdatelistGenerate {
            dir,
            output,
            patch_ver,
            patch_num,
            updatelist_ver,
        } => {
            let version = ListVersion {
                patch_ver,
                patch_num,
                updatelist_ver,
            };
            let doc = ListCache::new(dir).build(&version)?;
            let xml = litexml::to_vec(&doc)?;
            match output {
                Some(path) => File::create(path)?.write_all(&xml)?,
                None => io::stdout().write_all(&xml)?,
            }
        }

        // ── Update-list stream transforms ────────────────────────────────────
        Commands::UpdatelistEncrypt {
            region,
            input,
            output,
        } => {
            let key = region_key(&region)?;
            let (r, w) = open_streams(input, output)?;
            xtea::encipher_stream_pad_null(key, r, w)?;
        }
        Commands::UpdatelistDecrypt {
            region,
            input,
            output,
        } => {
            let key = region_key(&region)?;
            let (r, w) = open_streams(input, output)?;
            xtea::decipher_stream_trim_null(key, r, w)?;
        }
    }

    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn region_key(code: &str) -> Result<Key, Box<dyn Error>> {
    Ok(Region::from_code(code)
        .ok_or_else(|| format!("invalid region {code:?} (valid: us, jp, th, eu, id, kr)"))?
        .key())
}

fn pak_key(region: Option<&str>, paks: &[PathBuf]) -> Result<Key, Box<dyn Error>> {
    match region {
        Some(code) => region_key(code),
        None => {
            info!("auto-detecting pak region (use --region to skip the startup delay)");
            let key = pangpak::detect_region(paks, &ALL_KEYS)?;
            if let Some(region) = Region::from_key(key) {
                info!("detected pak region as {}", region.code().to_uppercase());
            }
            Ok(key)
        }
    }
}

fn open_streams(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(Box<dyn Read>, Box<dyn Write>), Box<dyn Error>> {
    let r: Box<dyn Read> = match input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let w: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    Ok((r, w))
}
