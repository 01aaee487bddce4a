use bilifetch::{BiliVideo, Bilibili, Config, Listing, VideoPlatform, picker};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "List a bilibili uploader's videos and download their streams")]
struct Args {
    /// Config file, defaults to <config dir>/bilifetch/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entries per listing page
    #[arg(long, global = true)]
    page_size: Option<u32>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every upload of a user
    List {
        /// User id (mid)
        mid: u64,
        /// Print json instead of tab separated lines
        #[arg(long)]
        json: bool,
    },
    /// Save the video and audio streams of one video
    Download {
        /// Canonical video id, e.g. BV1P7411H7tX
        bvid: String,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List a user's uploads, choose one with fzf and download it
    Pick {
        mid: u64,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Search videos by keyword
    Search { keyword: Vec<String> },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_listing(listing: &Listing) {
    for video in &listing.videos {
        println!("{}\t{}\t{}", video.bvid, video.aid, video.video.name);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Command::Download {
        output_dir: Some(dir),
        ..
    }
    | Command::Pick {
        output_dir: Some(dir),
        ..
    } = &args.command
    {
        config.output_dir = dir.clone();
    }

    let platform = Bilibili::new(config)?;

    match args.command {
        Command::List { mid, json } => {
            let listing = platform.search_by_user(mid).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing.videos)?);
            } else {
                print_listing(&listing);
            }
        }
        Command::Download { bvid, .. } => {
            let saved = platform.download(&BiliVideo::from_bvid(bvid)).await?;
            println!("{}", saved.video_path.display());
            println!("{}", saved.audio_path.display());
        }
        Command::Pick { mid, .. } => {
            let listing = platform.search_by_user(mid).await?;
            if listing.videos.is_empty() {
                return Err(format!("no videos found for user {mid}").into());
            }
            let selected = picker::pick(&listing.videos)?;
            let video = &listing.videos[selected];
            info!("Selected {} ({})", video.video.name, video.bvid);
            let saved = platform.download(video).await?;
            println!("{}", saved.video_path.display());
            println!("{}", saved.audio_path.display());
        }
        Command::Search { keyword } => {
            let keyword = keyword.join(" ");
            platform.search_video(keyword.trim()).await?;
        }
    }

    Ok(())
}
