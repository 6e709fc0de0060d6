use clap::{Parser, Subcommand, ValueEnum};
use gallery_tools::assign::{self, PlacementAction};
use gallery_tools::builder::{self, BuildRequest, IndexTarget};
use gallery_tools::config::{self, ToolConfig};
use gallery_tools::index::{self, IndexKind, IndexRepository};
use gallery_tools::mapping::Mapping;
use gallery_tools::output;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gallery-tools")]
#[command(about = "Assign photos to categories and build thumbnail indexes")]
#[command(long_about = "\
Assign photos to categories and build thumbnail indexes

Two commands for maintaining a static photo gallery:

  assign-categories    place photos into <dst>/<category>/ from a mapping file
  generate-thumbnails  write thumbnails and upsert one entry into a JSON index

Mapping files (assign-categories):

  YAML, flat:        a.jpg: trip
  YAML, grouped:     trip: [a.jpg, b.jpg]
  CSV:               photo,album
                     a.jpg,trip

Output layout (generate-thumbnails --mode album --album-id trip --dst site):

  site/
  ├── albums/trip/a.jpg               # copy of the original (unless --no-copy)
  └── thumbnails/albums/trip/a.jpg    # thumbnail, always JPEG

  data/photos/by-album.json           # index; other albums are left untouched

Photo dates (first available wins):
  EXIF capture date → YYYYMMDD / YYMMDD in filename → YYYY/MM-DD directory → mtime

Run 'gallery-tools gen-config' to generate a documented gallery.toml.
Set RUST_LOG=debug for per-file detail.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./gallery.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place photos into category directories from a mapping file
    AssignCategories(AssignArgs),
    /// Generate thumbnails and upsert an entry into the JSON index
    GenerateThumbnails(ThumbnailArgs),
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct AssignArgs {
    /// Mapping file (.yaml, .yml or .csv)
    #[arg(long)]
    mapping: PathBuf,

    /// Directory holding the source photos
    #[arg(long)]
    src: PathBuf,

    /// Destination root; one subdirectory per category
    #[arg(long)]
    dst: PathBuf,

    /// copy, move or symlink (default: assign.action from config)
    #[arg(long)]
    action: Option<PlacementAction>,
}

#[derive(clap::Args)]
struct ThumbnailArgs {
    /// Which index to build
    #[arg(long, value_enum)]
    mode: Mode,

    /// Directory holding the source photos
    #[arg(long)]
    src: PathBuf,

    /// Destination root for copies and thumbnails
    #[arg(long)]
    dst: PathBuf,

    /// Album id (album mode)
    #[arg(long)]
    album_id: Option<String>,

    /// Category name; the id is its slug (category mode)
    #[arg(long)]
    category: Option<String>,

    /// Date bucket, e.g. 2025-01 (date mode)
    #[arg(long)]
    date: Option<String>,

    /// Display title for the album (default: humanized album id)
    #[arg(long)]
    album_title: Option<String>,

    /// Thumbnail width in pixels (default: thumbnails.width from config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    thumb_width: Option<u32>,

    /// Index file (default: <index.dir>/by-<mode>.json)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Prefix for path and thumbnail references (default: --dst as given)
    #[arg(long)]
    url_prefix: Option<String>,

    /// Reference originals in --src instead of copying them under --dst
    #[arg(long)]
    no_copy: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Album,
    Category,
    Date,
}

impl From<Mode> for IndexKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Album => IndexKind::Album,
            Mode::Category => IndexKind::Category,
            Mode::Date => IndexKind::Date,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_failure_code(&e));
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(1)
        }
    }
}

/// Exit status for a command line clap refused. Usage errors are
/// configuration errors (1); `--help` and `--version` also arrive as
/// errors and exit 0.
fn parse_failure_code(error: &clap::Error) -> u8 {
    if error.use_stderr() { 1 } else { 0 }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::AssignCategories(args) => {
            let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            assign_categories(args, &config)
        }
        Command::GenerateThumbnails(args) => {
            let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
            generate_thumbnails(args, &config)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
    }
}

fn assign_categories(args: AssignArgs, config: &ToolConfig) -> Result<(), Box<dyn Error>> {
    let action = match args.action {
        Some(action) => action,
        None => config.assign_action()?,
    };
    let mapping = Mapping::load(&args.mapping)?;
    if mapping.is_empty() {
        log::warn!("Empty mapping file");
        for line in output::format_empty_mapping() {
            println!("{}", line);
        }
        return Ok(());
    }

    log::info!(
        "Loaded {} assignment(s) from {}",
        mapping.len(),
        args.mapping.display()
    );
    let report = assign::assign(&mapping, &args.src, &args.dst, action)?;
    output::print_assign_summary(&report);
    Ok(())
}

fn generate_thumbnails(args: ThumbnailArgs, config: &ToolConfig) -> Result<(), Box<dyn Error>> {
    let kind = IndexKind::from(args.mode);
    let target = IndexTarget::resolve(
        kind,
        args.album_id.as_deref(),
        args.category.as_deref(),
        args.date.as_deref(),
        args.album_title.as_deref(),
    )?;

    let index_path = args
        .index
        .unwrap_or_else(|| index::default_index_path(&config.index_dir(), kind));
    let repository = IndexRepository::new(index_path, kind);

    let request = BuildRequest {
        source_dir: args.src,
        dest_base: args.dst,
        target,
        thumbnail: config.thumbnail_config(args.thumb_width),
        url_prefix: args.url_prefix,
        copy_originals: !args.no_copy,
        dates: config.date_options(),
        title_style: config.titles.style,
    };

    log::info!(
        "Building {} '{}' from {}",
        kind.label(),
        request.target.id,
        request.source_dir.display()
    );
    let report = builder::build_index(&request, &repository)?;
    output::print_build_summary(&report);
    Ok(())
}
