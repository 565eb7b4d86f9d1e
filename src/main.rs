use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use photo_picker_lib::commands::scan::stream_device_media;
use photo_picker_lib::{open_source, LoadConfig, LoadEvent, MediaLoader, SourceSpec, FIRST_PAGE_LIMIT};

/// List the images and videos in a media index as JSON lines, one line per
/// delivered phase.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite media index to query
    #[arg(long, conflicts_with = "dir", required_unless_present = "dir")]
    index: Option<PathBuf>,

    /// Directory tree to walk instead of an index
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Descend into symlinked directories (with --dir)
    #[arg(long, requires = "dir")]
    follow_links: bool,

    /// JSON file with load options; flags below are applied on top
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also group results by folder
    #[arg(long)]
    folder_mode: bool,

    /// Include videos alongside images
    #[arg(long)]
    include_video: bool,

    /// Only list videos
    #[arg(long)]
    only_video: bool,

    /// Allow animated images (GIF)
    #[arg(long)]
    include_animation: bool,

    /// Skip this path (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    excluded: Vec<PathBuf>,

    /// Row limit of the first, fast page
    #[arg(long, default_value_t = FIRST_PAGE_LIMIT)]
    first_page_limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> Result<LoadConfig> {
        let mut config = match &self.config {
            Some(path) => LoadConfig::from_json_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => LoadConfig::default(),
        };

        config.folder_mode |= self.folder_mode;
        config.include_video |= self.include_video;
        config.only_video |= self.only_video;
        config.include_animation |= self.include_animation;
        for path in &self.excluded {
            config = config.exclude(path);
        }
        Ok(config)
    }

    fn source_spec(&self) -> Result<SourceSpec> {
        match (&self.index, &self.dir) {
            (Some(index), None) => Ok(SourceSpec::Index(index.clone())),
            (None, Some(dir)) => Ok(SourceSpec::Directory {
                root: dir.clone(),
                follow_links: self.follow_links,
            }),
            _ => bail!("pass exactly one of --index or --dir"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.load_config()?;
    let spec = args.source_spec()?;
    let source = open_source(&spec).with_context(|| format!("opening {:?}", spec))?;
    let loader = MediaLoader::new(source).with_first_page_limit(args.first_page_limit);

    info!("Scanning {:?} for {}", spec, config.filter());

    let mut events = stream_device_media(&loader, config);
    let mut stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        match event {
            LoadEvent::Result(result) => {
                info!("{}: {} items", result.phase, result.items.len());
                serde_json::to_writer(&mut stdout, &result)?;
                writeln!(stdout)?;
                stdout.flush()?;
            }
            LoadEvent::Failure(e) => {
                loader.abort_load_process();
                return Err(e).context("media load failed");
            }
        }
    }

    loader.abort_load_process();
    Ok(())
}
