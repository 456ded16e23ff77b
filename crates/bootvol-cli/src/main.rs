use std::fs::File;
use std::io::{Read as _, Seek, SeekFrom, Write as _};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bootvol::{BootVolContext, FsKind};
use bootvol_part::{DiskError, DiskRead, PartGetStatus, Volume};
use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List the partitions found on a disk image (GPT, falling back to MBR/EBR).
    Partitions(PartitionsArgs),
    /// Print the volume label of a filesystem on a disk image or one of its partitions.
    Label(VolumeArgs),
    /// Read a file out of a filesystem on a disk image or one of its partitions.
    Read(ReadArgs),
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Partitions(a) => a.verbose,
            Command::Label(a) => a.verbose,
            Command::Read(a) => a.verbose,
        }
    }
}

#[derive(Debug, Clone, Parser)]
struct PartitionsArgs {
    image: PathBuf,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Parser)]
struct VolumeArgs {
    image: PathBuf,
    /// Partition index to open (as returned by `partitions`); the whole disk if omitted.
    #[arg(short, long)]
    partition: Option<u32>,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Parser)]
struct ReadArgs {
    image: PathBuf,
    path: String,
    #[arg(short, long)]
    partition: Option<u32>,
    /// Write the file's contents here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Fall back to case-insensitive path lookup.
    #[arg(short, long)]
    case_insensitive: bool,
    #[arg(short, long)]
    verbose: bool,
}

/// A `DiskRead` over a plain file, for the CLI's std-only inspection use.
struct FileDisk(File);

impl DiskRead for FileDisk {
    fn read_sectors(&mut self, lba_512: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError> {
        self.0
            .seek(SeekFrom::Start(lba_512 * 512))
            .map_err(|_| DiskError::NoMedia)?;
        self.0.read_exact(buf).map_err(|_| DiskError::NoMedia)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::SimpleLogger::new()
        .with_level(if args.cmd.verbose() {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Warn
        })
        .init()
        .unwrap();

    match args.cmd {
        Command::Partitions(a) => partitions(&a.image),
        Command::Label(a) => label(&a.image, a.partition),
        Command::Read(a) => read(&a),
    }
}

fn open_disk(image: &PathBuf) -> Result<(FileDisk, Volume)> {
    let file = File::open(image).with_context(|| format!("opening {}", image.display()))?;
    let len_sectors = file.metadata()?.len() / 512;
    let disk = FileDisk(file);
    let volume = Volume::new_disk(0, 512, 1, Some(len_sectors), false);
    Ok((disk, volume))
}

fn partitions(image: &PathBuf) -> Result<()> {
    let (mut disk, root) = open_disk(image)?;
    println!("{:<6} {:>12} {:>12}", "index", "first_sect", "sect_count");
    for index in 0.. {
        match bootvol_part::part_get(&mut disk, &root, index)? {
            (PartGetStatus::Ok, Some(volume)) => {
                println!(
                    "{:<6} {:>12} {:>12}",
                    index,
                    volume.first_sect,
                    volume.sect_count.unwrap_or(0)
                );
            }
            (PartGetStatus::NoPartition, _) | (PartGetStatus::Ok, None) => continue,
            (PartGetStatus::EndOfTable | PartGetStatus::InvalidTable, _) => break,
        }
        if index > 127 {
            break;
        }
    }
    Ok(())
}

fn resolve_volume(disk: &mut FileDisk, root: Volume, partition: Option<u32>) -> Result<Volume> {
    match partition {
        None => Ok(root),
        Some(index) => match bootvol_part::part_get(disk, &root, index)? {
            (PartGetStatus::Ok, Some(volume)) => Ok(volume),
            _ => bail!("partition {index} not found"),
        },
    }
}

fn label(image: &PathBuf, partition: Option<u32>) -> Result<()> {
    let (mut disk, root) = open_disk(image)?;
    let mut volume = resolve_volume(&mut disk, root, partition)?;
    let label = bootvol::fs_get_label(&mut disk, &mut volume)?;
    println!("{label}");
    Ok(())
}

fn read(args: &ReadArgs) -> Result<()> {
    let (mut disk, root) = open_disk(&args.image)?;
    let mut volume = resolve_volume(&mut disk, root, args.partition)?;
    let ctx = BootVolContext {
        case_insensitive_fopen: args.case_insensitive,
    };
    let handle = bootvol::open(&mut disk, &mut volume, &ctx, &args.path)?;
    log::info!("opened {} ({:?}, {} bytes)", args.path, handle.kind(), handle.size());
    if handle.kind() == FsKind::Iso9660 {
        log::debug!("backed by ISO9660 extents");
    }

    let mut buf = vec![0u8; handle.size() as usize];
    handle.read(&mut disk, &mut volume, &mut buf, 0)?;

    match &args.output {
        Some(path) => std::fs::write(path, &buf)?,
        None => std::io::stdout().write_all(&buf)?,
    }
    Ok(())
}
