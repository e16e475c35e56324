mod filter;
mod html_parser;
mod models;
mod network_client;
mod selector;
mod settings;
mod skill;
mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use rand::Rng;
use serde_json::{json, Map, Value};
use url::Url;

use models::{FilterConfig, Problem};
use network_client::{build_client, fetch_page_html, LeetCodeApi, DEFAULT_SITE};
use selector::{RemoteFilter, SelectError};
use settings::{JsonFileStore, SettingKey, SettingsStore};
use skill::{DifficultyMapping, SkillModel, SolvedBreakdown};

// Custom Application Error Type
enum AppError {
    Network(network_client::NetworkError),
    Parse(html_parser::ParseError),
    Select(SelectError),
    Settings(settings::SettingsError),
    Io(std::io::Error),
    Json(serde_json::Error),
    UrlParse(url::ParseError),
    Usage(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Parse(err) => write!(f, "{}", err),
            AppError::Select(err) => write!(f, "{}", err),
            AppError::Settings(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "IO error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::UrlParse(err) => write!(f, "URL parsing error: {}", err),
            AppError::Usage(message) => write!(f, "{}", message),
        }
    }
}

// `main` reports errors through Debug; keep that readable.
impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Network(err) => Some(err),
            AppError::Parse(err) => Some(err),
            AppError::Select(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::UrlParse(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl From<network_client::NetworkError> for AppError {
    fn from(err: network_client::NetworkError) -> Self {
        AppError::Network(err)
    }
}

impl From<html_parser::ParseError> for AppError {
    fn from(err: html_parser::ParseError) -> Self {
        AppError::Parse(err)
    }
}

impl From<SelectError> for AppError {
    fn from(err: SelectError) -> Self {
        AppError::Select(err)
    }
}

impl From<settings::SettingsError> for AppError {
    fn from(err: settings::SettingsError) -> Self {
        AppError::Settings(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlParse(err)
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Pick a random LeetCode problem that fits your filters and skill level", long_about = None)]
struct Args {
    /// Settings file (defaults to <config dir>/leetpick/settings.json)
    #[clap(long, global = true)]
    settings: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick one problem matching the stored filters and print its URL
    Pick {
        #[clap(flatten)]
        source: PickSource,

        /// LEETCODE_SESSION cookie (falls back to the LEETCODE_SESSION env var)
        #[clap(long)]
        session: Option<String>,

        /// Widen each skill tier's recommended difficulties by one level
        #[clap(long)]
        wide: bool,

        /// Print the chosen problem as JSON
        #[clap(long)]
        json: bool,
    },
    /// Estimate a skill level from solved problems
    Assess {
        #[clap(flatten)]
        input: AssessInput,

        /// Use the weighted score instead of the plain solved count
        #[clap(long, conflicts_with = "solved")]
        weighted: bool,

        /// Store the result as the skillLevel setting
        #[clap(long)]
        save: bool,

        #[clap(long)]
        session: Option<String>,
    },
    /// Inspect or change stored filter settings
    Settings {
        #[clap(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct PickSource {
    /// Saved problem-list page
    #[clap(long)]
    html: Option<PathBuf>,

    /// Problem-list page to fetch and scrape
    #[clap(long)]
    url: Option<String>,

    /// Let the API filter server-side and pick by offset
    #[clap(long)]
    remote: bool,
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct AssessInput {
    /// Saved problem-list page
    #[clap(long)]
    html: Option<PathBuf>,

    /// Problem-list page to fetch
    #[clap(long)]
    url: Option<String>,

    /// Number of solved problems
    #[clap(long)]
    solved: Option<u32>,

    /// Solved counts per difficulty
    #[clap(long, num_args = 3, value_names = ["EASY", "MEDIUM", "HARD"])]
    breakdown: Option<Vec<u32>>,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print every setting
    Show,
    /// Print one setting
    Get { key: String },
    /// Store a setting; VALUE is JSON, bare words are taken as strings
    Set { key: String, value: String },
    /// Restore defaults
    Reset,
}

fn session_token(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var("LEETCODE_SESSION").ok()).filter(|s| !s.is_empty())
}

/// Loads page HTML from a file or over HTTP, along with the base URL for relative links.
async fn load_page(html: Option<PathBuf>, url: Option<String>, session: Option<String>) -> Result<(String, Url), AppError> {
    if let Some(path) = html {
        info!("Reading problem list from {}", path.display());
        return Ok((std::fs::read_to_string(path)?, Url::parse(DEFAULT_SITE)?));
    }
    let url = url.ok_or_else(|| AppError::Usage("Pass --html FILE or --url URL".to_string()))?;
    let site = Url::parse(DEFAULT_SITE)?;
    let page = Url::parse(&url)?;
    let client = build_client(&site, session_token(session).as_deref())?;
    info!("Fetching problem list from {}", page);
    let html = fetch_page_html(&client, page.as_str()).await?;
    Ok((html, page))
}

fn pick_from_problems<R: Rng>(
    problems: &[Problem],
    config: &FilterConfig,
    mapping: DifficultyMapping,
    rng: &mut R,
) -> Result<Problem, AppError> {
    if problems.is_empty() {
        return Err(html_parser::ParseError::ExtractionUnavailable.into());
    }
    let eligible = filter::filter_with_mapping(problems, config, mapping);
    info!("Filtered down to {} problems", eligible.len());
    Ok(selector::pick_local(&eligible, rng)?.clone())
}

async fn run_pick(
    store: &JsonFileStore,
    source: PickSource,
    session: Option<String>,
    mapping: DifficultyMapping,
    json_output: bool,
) -> Result<(), AppError> {
    let config = settings::load_filter_config(store);
    debug!("Applying random pick with settings: {:?}", config);
    let mut rng = rand::thread_rng();

    let chosen = if source.remote {
        let site = Url::parse(DEFAULT_SITE)?;
        let client = build_client(&site, session_token(session).as_deref())?;
        let api = LeetCodeApi::new(client, site)?;
        match selector::pick_remote(&api, &config, mapping, &mut rng).await {
            Err(SelectError::Untranslatable(reason)) => {
                warn!("{}; listing problems from the API and filtering locally", reason);
                let problems = api.list_problems(&RemoteFilter::listing(&config)).await?;
                pick_from_problems(&problems, &config, mapping, &mut rng)?
            }
            result => result?,
        }
    } else {
        let (html, base) = load_page(source.html, source.url, session).await?;
        let problems = html_parser::extract_problems(&html, &base)?;
        info!("Collected {} problems from the page", problems.len());
        pick_from_problems(&problems, &config, mapping, &mut rng)?
    };

    info!("Chosen problem: {} ({}, {})", chosen.title, chosen.difficulty, chosen.id);
    if json_output {
        let rendered = serde_json::to_string_pretty(&chosen)?;
        println!("{}", rendered);
    } else {
        println!("Navigating to: {}", chosen.title);
        println!("{}", chosen.url);
    }
    Ok(())
}

async fn run_assess(
    store: &mut JsonFileStore,
    input: AssessInput,
    weighted: bool,
    save: bool,
    session: Option<String>,
) -> Result<(), AppError> {
    let model = if weighted { SkillModel::Weighted } else { SkillModel::Count };

    let tier = if let Some(solved) = input.solved {
        skill::estimate_skill(solved)
    } else if let Some(counts) = input.breakdown {
        let breakdown = match counts.as_slice() {
            [easy, medium, hard] => SolvedBreakdown { easy: *easy, medium: *medium, hard: *hard },
            _ => return Err(AppError::Usage("--breakdown takes exactly three counts".to_string())),
        };
        model.assess(&breakdown)
    } else {
        let (html, base) = load_page(input.html, input.url, session).await?;
        match model {
            SkillModel::Count => skill::estimate_skill(html_parser::count_solved_rows(&html)?),
            SkillModel::Weighted => {
                let problems = html_parser::extract_problems(&html, &base)?;
                let mut breakdown = SolvedBreakdown::default();
                for problem in problems.iter().filter(|p| p.solved) {
                    match problem.difficulty {
                        models::Difficulty::Easy => breakdown.easy += 1,
                        models::Difficulty::Medium => breakdown.medium += 1,
                        models::Difficulty::Hard => breakdown.hard += 1,
                    }
                }
                debug!("Solved breakdown from page: {:?}", breakdown);
                model.assess(&breakdown)
            }
        }
    };

    let recommended: Vec<String> = skill::recommended_difficulties(tier)
        .into_iter()
        .map(|d| d.to_string())
        .collect();
    println!("Skill level: {}", tier);
    println!("Recommended difficulties: {}", recommended.join(", "));

    if save {
        store.set(SettingKey::SkillLevel, json!(tier.as_str()))?;
        info!("Saved skill level to {}", store.path().display());
    }
    Ok(())
}

fn run_settings(store: &mut JsonFileStore, action: SettingsAction) -> Result<(), AppError> {
    match action {
        SettingsAction::Show => {
            let all: Map<String, Value> = SettingKey::ALL
                .into_iter()
                .map(|key| (key.as_str().to_string(), store.get(key)))
                .collect();
            let rendered = serde_json::to_string_pretty(&all)?;
            println!("{}", rendered);
        }
        SettingsAction::Get { key } => {
            let key: SettingKey = key.parse()?;
            println!("{}", store.get(key));
        }
        SettingsAction::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            store.set(key, value)?;
            info!("Updated {} in {}", key.as_str(), store.path().display());
        }
        SettingsAction::Reset => {
            store.reset()?;
            println!("Settings restored to defaults");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    env_logger::init(); // Initialize logger

    let settings_path = match args.settings {
        Some(path) => path,
        None => settings::default_settings_path()?,
    };
    let mut store = JsonFileStore::open(&settings_path);

    match args.command {
        Command::Pick { source, session, wide, json } => {
            let mapping = if wide { DifficultyMapping::Wide } else { DifficultyMapping::Narrow };
            run_pick(&store, source, session, mapping, json).await
        }
        Command::Assess { input, weighted, save, session } => run_assess(&mut store, input, weighted, save, session).await,
        Command::Settings { action } => run_settings(&mut store, action),
    }
}
