use std::path::PathBuf;

use autofea::{
    classify_inventory, load_glyph_list, regenerate, AutofeaError, Document, STANDARD,
};
use clap::Parser;
use similar::TextDiff;

/// Regenerate the automatic parts of a feature file from a font's glyph names
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UFO source, or a glyph list with one name per line (.txt)
    source: PathBuf,

    /// Take glyph names from this list instead of from the source
    #[arg(long)]
    glyphs_file: Option<PathBuf>,

    /// Feature file to merge into (defaults to the UFO's features.fea)
    #[arg(long)]
    features: Option<PathBuf>,

    /// Output feature file (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a diff and exit with status 1 if the feature code would change
    #[arg(long)]
    check: bool,

    /// Print the glyph buckets as JSON instead of feature code
    #[arg(long)]
    dump_buckets: bool,

    /// Print the feature blocks of the result, grouped by tag
    #[arg(long)]
    summary: bool,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();
    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    }
}

/// Returns false when `--check` finds the feature code out of date
fn run(args: &Args) -> Result<bool, AutofeaError> {
    let mut source = autofea::load(&args.source)?;
    if let Some(glyphs_file) = &args.glyphs_file {
        source.inventory = load_glyph_list(glyphs_file)?.inventory;
    }

    if args.dump_buckets {
        let classification = classify_inventory(&source.inventory, &STANDARD);
        let json = serde_json::to_string_pretty(&classification)
            .map_err(|e| AutofeaError::General(e.to_string()))?;
        println!("{}", json);
        return Ok(true);
    }

    let existing = match &args.features {
        Some(path) if path.exists() => Some(std::fs::read_to_string(path)?),
        Some(path) => {
            log::info!("{} does not exist yet, starting afresh", path.display());
            None
        }
        None => source.features.take(),
    };
    let result = regenerate(&source.inventory, existing.as_deref(), &STANDARD)?;
    for warning in result.warnings.iter() {
        log::warn!("{}", warning);
    }

    if args.summary {
        let document = Document::parse(&result.text)?;
        for (tag, blocks) in document.feature_summary() {
            for block in blocks {
                println!("{} ({})", tag, block.provenance);
                for lookup in block.lookups {
                    println!(
                        "    lookup {}{}{}",
                        lookup.name,
                        lookup
                            .script
                            .map(|script| format!(" [{}]", script))
                            .unwrap_or_default(),
                        if lookup.defined { "" } else { " (reference)" }
                    );
                }
            }
        }
        return Ok(true);
    }

    if args.check {
        if result.changed {
            let old = existing.unwrap_or_default();
            let diff = TextDiff::from_lines(&old, &result.text);
            print!(
                "{}",
                diff.unified_diff().header("current", "regenerated")
            );
        }
        return Ok(!result.changed);
    }

    match &args.output {
        Some(path) => {
            log::info!("Writing feature code to {}", path.display());
            std::fs::write(path, &result.text)?;
        }
        None => print!("{}", result.text),
    }
    Ok(true)
}
