use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rayon::prelude::*;
use sc4dbpf::{qfs, ExemplarFormat, Package, PackageResource, ResourceFormat, TGIKeys, TypedResource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const ARCHIVE_EXTENSIONS: &[&str] = &["dat", "sc4lot", "sc4desc", "sc4model", "sc4"];

fn is_debug_mode() -> bool {
    std::env::var("SC4DBPF_DEBUG_MODE").map(|v| v == "1").unwrap_or(false)
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    let debug = is_debug_mode();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("--help");
    let wants_help = args.iter().skip(2).any(|a| a == "--help");

    match cmd {
        "info" => {
            if wants_help {
                println!("Usage: sc4dbpf info <file>");
                println!("\nPrints the DBPF header and the index of an archive.");
                return Ok(());
            }
            let file = args.get(2).ok_or_else(|| anyhow!("Usage: sc4dbpf info <file>"))?;
            run_info(Path::new(file))?;
        }
        "investigate" => {
            if wants_help {
                println!("Usage: sc4dbpf investigate <file>");
                println!("\nDecodes every entry and reports per-format counts and RAW fallbacks.");
                return Ok(());
            }
            let file = args.get(2).ok_or_else(|| anyhow!("Usage: sc4dbpf investigate <file>"))?;
            run_investigate(Path::new(file))?;
        }
        "export" => {
            if wants_help {
                println!("Usage: sc4dbpf export <file> <dir>");
                println!("\nWrites every exemplar and cohort of an archive as text, one file per entry.");
                println!("\nExample:");
                println!("  sc4dbpf export ./SimCity_1.dat ./exemplars");
                return Ok(());
            }
            if args.len() < 4 {
                return Err(anyhow!(
                    "Usage: sc4dbpf export <file> <dir>\nTry 'sc4dbpf export --help' for more information."
                ));
            }
            run_export(Path::new(&args[2]), Path::new(&args[3]))?;
        }
        "rewrite" => {
            if wants_help {
                println!("Usage: sc4dbpf rewrite <in> <out> [--text|--binary]");
                println!("\nReads an archive and writes it back out, rebuilding the directory.");
                println!("With --text or --binary every exemplar and cohort is converted to that form.");
                return Ok(());
            }
            if args.len() < 4 {
                return Err(anyhow!(
                    "Usage: sc4dbpf rewrite <in> <out> [--text|--binary]\nTry 'sc4dbpf rewrite --help' for more information."
                ));
            }
            let target = if args.iter().any(|a| a == "--text") {
                Some(ExemplarFormat::Text)
            } else if args.iter().any(|a| a == "--binary") {
                Some(ExemplarFormat::Binary)
            } else {
                None
            };
            run_rewrite(Path::new(&args[2]), Path::new(&args[3]), target)?;
        }
        "scan" => {
            if wants_help {
                println!("Usage: sc4dbpf scan <folder>");
                println!("\nOpens every archive under a folder and reports entry counts and failures.");
                return Ok(());
            }
            let folder = args.get(2).ok_or_else(|| anyhow!("Usage: sc4dbpf scan <folder>"))?;
            run_scan(Path::new(folder))?;
        }
        "--help" | "-h" | "help" => {
            println!("SC4 DBPF Tool");
            println!("\nUsage: sc4dbpf <command> [args]");
            println!("\nAvailable commands:");
            println!("  export      Export exemplars and cohorts as text");
            println!("  rewrite     Rewrite an archive, optionally converting exemplars");
            println!("  scan        Open every archive in a folder");
            if debug {
                println!("  info        Dump DBPF header and index (Debug)");
                println!("  investigate Decode every entry and report fallbacks (Debug)");
            }
            println!("\nRun 'sc4dbpf <command> --help' for more information on a specific command.");
        }
        _ => {
            println!("Unknown command: {}", cmd);
            println!(
                "Available commands: export, rewrite, scan{}",
                if debug { ", info, investigate" } else { "" }
            );
            println!("Run 'sc4dbpf --help' for usage information.");
        }
    }
    Ok(())
}

fn run_info(path: &Path) -> Result<()> {
    info!("Reading: {:?}", path);
    let pkg = Package::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    println!("Archive: {}", path.display());
    println!("Version: {}.{}", pkg.header.major, pkg.header.minor);
    println!("Created: {}  Modified: {}", pkg.header.created, pkg.header.modified);
    println!("Index Type: {}", pkg.header.index_type);
    println!(
        "Index: {} entries at 0x{:08X} ({} bytes)",
        pkg.header.index_count, pkg.header.index_position, pkg.header.index_size
    );

    let directory = pkg.directory().context("Failed to read directory resource")?;
    for (i, entry) in pkg.entries.iter().enumerate() {
        let head = pkg.entry_bytes(entry).map(|b| &b[..b.len().min(9)]).unwrap_or(&[]);
        let listed = directory
            .as_ref()
            .and_then(|d| d.decompressed_size_of(&entry.tgi))
            .map(|s| format!(" -> {}", s))
            .unwrap_or_default();
        println!(
            "[{:>5}] {} {:<12} off 0x{:08X} size {}{}{}",
            i,
            entry.tgi,
            TGIKeys::label_of(&entry.tgi),
            entry.offset,
            entry.size,
            listed,
            if qfs::is_compressed(head) { " (QFS)" } else { "" }
        );
    }
    Ok(())
}

fn run_investigate(path: &Path) -> Result<()> {
    info!("Investigating: {:?}", path);
    let pkg = Package::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut counts: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
    let mut failures = Vec::new();
    for entry in &pkg.entries {
        let expected = TGIKeys::format_of(&entry.tgi);
        let resource = match pkg.read_resource(entry) {
            Ok(r) => r,
            Err(e) => {
                failures.push(format!("{}: {}", entry.tgi, e));
                continue;
            }
        };
        let slot = counts.entry(expected.name()).or_insert((0, 0));
        slot.0 += 1;
        if expected != ResourceFormat::Raw && resource.resource.is_raw() {
            slot.1 += 1;
        }
    }

    println!("\nFormat Summary:");
    for (name, (count, fallbacks)) in &counts {
        let status = if *fallbacks > 0 { format!("{} fell back to RAW", fallbacks) } else { "OK".to_string() };
        println!("  {:<10} | Count: {:>5} | {}", name, count, status);
    }
    if !failures.is_empty() {
        println!("\nRead Failures:");
        for failure in &failures {
            println!("  {}", failure);
        }
    }
    Ok(())
}

fn run_export(path: &Path, out_dir: &Path) -> Result<()> {
    info!("Exporting exemplars from: {:?}", path);
    let pkg = Package::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    std::fs::create_dir_all(out_dir).context("Failed to create export directory")?;

    let mut exported = 0;
    for entry in &pkg.entries {
        let resource = pkg.read_resource(entry)?;
        let (text, ext) = match &resource.resource {
            TypedResource::Exemplar(e) => (e.encode_as(ExemplarFormat::Text, None)?, "exemplar"),
            TypedResource::Cohort(c) => (c.encode_as(ExemplarFormat::Text, None)?, "cohort"),
            _ => continue,
        };
        let name = format!(
            "{:08X}-{:08X}-{:08X}.{}.txt",
            entry.tgi.res_type, entry.tgi.res_group, entry.tgi.instance, ext
        );
        std::fs::write(out_dir.join(&name), text).with_context(|| format!("Failed to write {}", name))?;
        exported += 1;
    }

    info!("Exported {} exemplars and cohorts to {:?}", exported, out_dir);
    Ok(())
}

fn convert(resource: &mut PackageResource, target: ExemplarFormat) {
    match &mut resource.resource {
        TypedResource::Exemplar(e) => e.format = target,
        TypedResource::Cohort(c) => c.format = target,
        _ => {}
    }
}

fn run_rewrite(input: &Path, output: &Path, target: Option<ExemplarFormat>) -> Result<()> {
    info!("Rewriting {:?} -> {:?}", input, output);
    let mut resources = {
        let pkg = Package::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        pkg.read_all().context("Failed to read archive entries")?
    };

    if let Some(target) = target {
        resources.iter_mut().for_each(|r| convert(r, target));
    }

    let fallbacks = resources
        .iter()
        .filter(|r| r.format() != ResourceFormat::Raw && r.resource.is_raw())
        .count();
    if fallbacks > 0 {
        warn!("{} entries could not be decoded and are copied unchanged", fallbacks);
    }

    Package::write(output, &mut resources, None).context("Failed to write archive")?;
    info!("Rewrite complete: {} resources", resources.len());
    Ok(())
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| ARCHIVE_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

fn run_scan(folder: &Path) -> Result<()> {
    info!("Searching for archives in: {:?}", folder);
    let files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_archive(p))
        .collect();

    if files.is_empty() {
        warn!("No archives found under {:?}", folder);
        return Ok(());
    }
    info!("Found {} archives.", files.len());

    let results: Vec<(PathBuf, Result<(usize, usize)>)> = files
        .par_iter()
        .map(|path| {
            let summary = Package::open(path)
                .map_err(anyhow::Error::from)
                .and_then(|pkg| {
                    let exemplars = pkg
                        .read_all()?
                        .iter()
                        .filter(|r| matches!(r.resource, TypedResource::Exemplar(_) | TypedResource::Cohort(_)))
                        .count();
                    Ok((pkg.entries.len(), exemplars))
                });
            (path.clone(), summary)
        })
        .collect();

    let mut failed = 0;
    for (path, result) in &results {
        match result {
            Ok((entries, exemplars)) => {
                println!("{}: {} entries, {} exemplars/cohorts", path.display(), entries, exemplars)
            }
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    info!("Scanned {} archives, {} failed.", results.len(), failed);
    Ok(())
}
