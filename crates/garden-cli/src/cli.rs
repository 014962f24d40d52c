use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use garden_api::{Resolution, SubtitleLanguage};

#[derive(Parser, Debug)]
#[command(
    name = "animation-garden",
    version,
    about = "Search anime topics, star searches and track watched episodes"
)]
pub struct Cli {
    /// Directory holding `data/app.yml` (overrides the config file).
    #[arg(long, global = true, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Config file to use instead of the platform default.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the topic feed.
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Feed category id.
        #[arg(long)]
        category: Option<String>,
        /// Fansub group (alliance) id.
        #[arg(long)]
        alliance: Option<String>,
        /// Fetch one page instead of following every page.
        #[arg(long)]
        single_page: bool,
        #[command(flatten)]
        filters: Filters,
    },
    /// List starred searches.
    Starred,
    /// Star a search.
    Star {
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Name to show instead of the keywords.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        filters: Filters,
    },
    /// Remove a starred search.
    Unstar {
        #[arg(required = true)]
        keywords: Vec<String>,
    },
    /// Mark an episode of a starred search as watched.
    Watched {
        #[arg(required = true)]
        keywords: Vec<String>,
        #[arg(long, short)]
        episode: String,
    },
    /// Check whether an episode of a starred search was watched.
    IsWatched {
        #[arg(required = true)]
        keywords: Vec<String>,
        #[arg(long, short)]
        episode: String,
    },
    /// List persons credited on a Bangumi subject.
    Persons { subject_id: i64 },
}

/// Topic filters. On a starred search they become its preferences.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct Filters {
    /// Only show this resolution, e.g. `1080p` or `4k`.
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,
    /// Only show this subtitle language, e.g. `chs`, `cht` or `jp`.
    #[arg(long, value_parser = parse_subtitle)]
    pub subtitle: Option<SubtitleLanguage>,
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    Resolution::parse(s).ok_or_else(|| format!("unknown resolution: {s}"))
}

fn parse_subtitle(s: &str) -> Result<SubtitleLanguage, String> {
    SubtitleLanguage::parse(s).ok_or_else(|| format!("unknown subtitle language: {s}"))
}

/// Join positional words into one keyword string.
pub fn join_keywords(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}
