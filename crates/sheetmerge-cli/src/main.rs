mod catalog;
mod config;
mod output;

use anyhow::{Context, Result};
use catalog::DirCatalog;
use clap::{ArgAction, Args, Parser, Subcommand};
use config::CliConfig;
use sheetmerge_core::{
    ComposeOptions, ComposeReport, Composer, ExtractRequest, MergeRequest, TemplateCatalog,
    TemplateSource,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sheetmerge",
    version,
    about = "Extract sheets and merge data into xlsx templates"
)]
struct Cli {
    /// YAML file with `templates_dir` and a `compose` section.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep one sheet of a workbook with every formula replaced by its cached value.
    Extract(ExtractArgs),
    /// Copy a data workbook into a template and keep the template's output sheet.
    Merge(MergeArgs),
    /// List the templates available in the templates directory.
    Templates(TemplatesArgs),
}

#[derive(Args, Debug)]
struct ComposeFlags {
    /// Print the composition report as JSON on stdout.
    #[arg(long)]
    report: bool,

    /// Turn gridlines off on the returned sheet.
    #[arg(long, conflicts_with = "show_gridlines")]
    hide_gridlines: bool,

    /// Turn gridlines on for the returned sheet.
    #[arg(long)]
    show_gridlines: bool,

    /// Keep non-ASCII characters in text cells.
    #[arg(long)]
    keep_unicode: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    workbook: PathBuf,

    /// Sheet to keep.
    #[arg(long)]
    sheet: String,

    /// Output path. Defaults to `<SHEET>.xlsx` in the current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ComposeFlags,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Template path, or the file name of a template in the templates directory.
    #[arg(long)]
    template: String,

    /// Data workbook whose first sheet is copied into the template.
    #[arg(long)]
    data: PathBuf,

    #[arg(long)]
    input_sheet: Option<String>,

    #[arg(long)]
    output_sheet: Option<String>,

    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Output path. Defaults to `<OUTPUT_SHEET>.xlsx` in the current directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ComposeFlags,
}

#[derive(Args, Debug)]
struct TemplatesArgs {
    #[arg(long)]
    templates_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    match cli.command {
        Command::Extract(args) => run_extract(&config, args),
        Command::Merge(args) => run_merge(&config, args),
        Command::Templates(args) => run_templates(&config, args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn compose_options(config: &CliConfig, flags: &ComposeFlags) -> ComposeOptions {
    let mut options = config.compose.clone();
    if flags.hide_gridlines {
        options.view.show_grid_lines = Some(false);
    } else if flags.show_gridlines {
        options.view.show_grid_lines = Some(true);
    }
    if flags.keep_unicode {
        options.normalize_text = false;
    }
    options
}

fn run_extract(config: &CliConfig, args: ExtractArgs) -> Result<()> {
    let workbook = std::fs::read(&args.workbook)
        .with_context(|| format!("reading workbook {}", args.workbook.display()))?;
    let composer = Composer::new(compose_options(config, &args.flags));
    let result = composer
        .extract(ExtractRequest::new(workbook, args.sheet.clone()))
        .with_context(|| format!("extracting sheet `{}`", args.sheet))?;

    let dest = args
        .output
        .unwrap_or_else(|| default_output_path(&result.sheet_name));
    output::write_atomic(&dest, &result.bytes)?;
    finish(&dest, &result.report, args.flags.report)
}

fn run_merge(config: &CliConfig, args: MergeArgs) -> Result<()> {
    let catalog = DirCatalog::new(config.templates_dir(args.templates_dir.as_deref()));
    let template = resolve_template(&args.template)?;
    let data = std::fs::read(&args.data)
        .with_context(|| format!("reading data workbook {}", args.data.display()))?;

    let composer =
        Composer::new(compose_options(config, &args.flags)).with_catalog(Arc::new(catalog));
    let mut request = MergeRequest::new(template, data);
    request.input_sheet = args.input_sheet;
    request.output_sheet = args.output_sheet;
    let result = composer
        .merge(request)
        .with_context(|| format!("merging into template `{}`", args.template))?;

    let dest = args
        .output
        .unwrap_or_else(|| default_output_path(&result.report.sheet));
    output::write_atomic(&dest, &result.bytes)?;
    finish(&dest, &result.report, args.flags.report)
}

fn run_templates(config: &CliConfig, args: TemplatesArgs) -> Result<()> {
    let catalog = DirCatalog::new(config.templates_dir(args.templates_dir.as_deref()));
    let ids = catalog.template_ids();
    if ids.is_empty() {
        tracing::info!(dir = %catalog.root().display(), "no templates found");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

/// An existing file is read directly; anything else is looked up by name in
/// the templates directory.
fn resolve_template(arg: &str) -> Result<TemplateSource> {
    let path = Path::new(arg);
    if path.is_file() {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
        return Ok(TemplateSource::Bytes(bytes));
    }
    Ok(TemplateSource::Named(arg.to_string()))
}

fn default_output_path(sheet: &str) -> PathBuf {
    PathBuf::from(format!("{sheet}.xlsx"))
}

fn finish(dest: &Path, report: &ComposeReport, print_report: bool) -> Result<()> {
    if print_report {
        let json = serde_json::to_string_pretty(report).context("serializing report")?;
        println!("{json}");
    } else {
        println!("{}", dest.display());
    }
    Ok(())
}
