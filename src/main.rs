//! unify - merge two directory trees into one, unifying duplicates.
//!
//! Usage:
//!   unify IN1 IN2 OUT        Plan the merge, show it, ask, then execute
//!   unify -y IN1 IN2 OUT     Skip the confirmation prompt
//!   unify -j 4 IN1 IN2 OUT   Cap execution at 4 parallel steps
//!
//! Files that are duplicates by content or by path keep their most recent
//! copy in place; every other copy is preserved in a hidden `.{name}_hist`
//! directory beside the winner. Nothing is deleted or overwritten.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use unify_core::{Arena, ContentIndex};
use unify_exec::{PlanExecutor, DEFAULT_MAX_PARALLEL};
use unify_plan::plan_merge;
use unify_scan::{ScanConfig, TreeScanner, TreeSnapshot};

#[derive(Parser)]
#[command(
    name = "unify",
    version,
    about = "Merge two directory trees into one, unifying duplicate files",
    long_about = "unify merges the trees at IN1 and IN2 into a new tree at OUT.\n\n\
                  Duplicate files (identical content, or the same relative path)\n\
                  keep their most recent copy at the natural destination; all\n\
                  other copies are preserved in a hidden history directory\n\
                  beside it. The merge never deletes or overwrites anything."
)]
struct Cli {
    /// First input tree
    in1: PathBuf,

    /// Second input tree
    in2: PathBuf,

    /// Output path for the merged tree
    out: PathBuf,

    /// Proceed without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Maximum number of steps to run in parallel
    #[arg(short = 'j', long, default_value_t = DEFAULT_MAX_PARALLEL)]
    jobs: usize,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let mut arena = Arena::new();
    let mut index = ContentIndex::new();
    let scanner = TreeScanner::new();

    eprintln!("Exploring tree at {}", cli.in1.display());
    let tree1 = scanner
        .scan(&ScanConfig::new(&cli.in1), &mut arena, &mut index)
        .context("Failed to scan first input")?;
    println!("=== Tree 1 ===");
    print_tree(&arena, &tree1);

    eprintln!("Exploring tree at {}", cli.in2.display());
    let tree2 = scanner
        .scan(&ScanConfig::new(&cli.in2), &mut arena, &mut index)
        .context("Failed to scan second input")?;
    println!("=== Tree 2 ===");
    print_tree(&arena, &tree2);

    eprintln!("Planning merged tree at {}", cli.out.display());
    let plan = plan_merge(&mut arena, tree1.root, tree2.root, &cli.out, &index);
    println!("=== Merged tree ===");
    println!("{}", arena.render(plan.root));
    println!("{} steps planned", plan.len());

    if !cli.yes && !confirm()? {
        println!("Nothing done; the filesystem is untouched.");
        return Ok(());
    }

    let executor = PlanExecutor::new(cli.jobs);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let report = runtime
        .block_on(executor.execute(&mut arena, plan))
        .context("Merge execution failed")?;

    println!(
        "Created {} entries ({} copied)",
        report.completed,
        format_size(report.bytes_copied)
    );

    Ok(())
}

/// Print one scanned tree with its summary line.
fn print_tree(arena: &Arena, tree: &TreeSnapshot) {
    println!("{}", arena.render(tree.root));
    println!(
        " {} files, {} directories, {}",
        tree.stats.total_files,
        tree.stats.total_dirs,
        format_size(tree.stats.total_size)
    );
    println!();
}

/// Ask until the user answers `Y` or `n`. EOF counts as declining.
fn confirm() -> Result<bool> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Do you wish to proceed with transformation? (Y, n): ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim() {
            "Y" => return Ok(true),
            "n" => return Ok(false),
            _ => {}
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
