//! Command-line inspector for compound files.
//!
//! # Usage
//!
//! ```sh
//! olecf report.doc
//! olecf report.doc --dir --fat
//! olecf report.doc --yaml
//! ```

use clap::Parser;
use log::LevelFilter;
use olecf::ole::{Container, Header, ParseOptions, parse_file};
use olecf::ole::consts::ENDOFCHAIN;
use std::path::PathBuf;
use std::process::ExitCode;

/// Inspect the header, directory and summary properties of an OLE2 compound file
#[derive(Parser, Debug)]
#[command(name = "olecf", version)]
struct Args {
    /// Compound file to inspect
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print the directory entries
    #[arg(long)]
    dir: bool,

    /// Print the allocated part of the FAT
    #[arg(long)]
    fat: bool,

    /// Print the summary as YAML instead of the raw property list
    #[arg(long)]
    yaml: bool,

    /// Do not fail when the file has no SummaryInformation stream
    #[arg(long)]
    allow_missing_summary: bool,

    /// Cap the number of sectors in any chain
    #[arg(long, value_name = "SECTORS")]
    max_chain_sectors: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}: {}", args.input.display(), e);
            ExitCode::FAILURE
        },
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = ParseOptions::new()
        .with_require_summary_information(!args.allow_missing_summary)
        .with_max_chain_sectors(args.max_chain_sectors);

    println!("-- Parsing file {}", args.input.display());
    let container = parse_file(&args.input, &options)?;

    print_header(&container.header);
    if args.dir {
        print_directory(&container);
    }
    if args.fat {
        print_fat(&container);
    }
    if args.yaml {
        print!("{}", container.summary().to_yaml()?);
    } else {
        print_properties(&container);
    }
    Ok(())
}

fn print_header(header: &Header) {
    println!("-- Header");
    println!("  major version: {}", header.major_version);
    println!("  sector shift: {}", header.sector_shift);
    println!("  num_fat_sectors: {}", header.num_fat_sectors);
    println!("  num_dir_sectors: {}", header.num_dir_sectors);
    if header.dir_sector_start != ENDOFCHAIN {
        println!("  dir_sector_start: {}", header.dir_sector_start);
    }
    println!("  num_minifat_sectors: {}", header.num_minifat_sectors);
    if header.minifat_sector_start != ENDOFCHAIN {
        println!("  minifat_sector_start: {}", header.minifat_sector_start);
    }
    println!("  num_difat_sectors: {}", header.num_difat_sectors);
    if header.difat_sector_start != ENDOFCHAIN {
        println!("  difat_sector_start: {}", header.difat_sector_start);
    }
}

fn print_directory(container: &Container) {
    println!("-- Directory");
    for entry in container.directory.visible() {
        println!("  {}", entry.name.escape_default());
        println!("    obj_type {}", entry.obj_type);
        if let Some(left) = entry.left_id {
            println!("    left {}", left);
        }
        if let Some(right) = entry.right_id {
            println!("    right {}", right);
        }
        if let Some(child) = entry.child_id {
            println!("    child {}", child);
        }
        println!("    start sector {}", entry.start_sector);
        println!("    stream size {}", entry.stream_size);
    }
}

fn print_fat(container: &Container) {
    println!("-- FAT");
    for (index, kind) in container.fat.allocated() {
        println!("  [{:03}] --> {}", index, kind);
    }
}

fn print_properties(container: &Container) {
    println!("-- Properties");
    for (id, value) in &container.properties {
        println!("  {}: {}", id, value);
    }
}
