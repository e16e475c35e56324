use std::collections::BTreeSet;

use log::{debug, info};
use rand::Rng;

use crate::filter::effective_difficulties;
use crate::models::{topic_slug, Difficulty, FilterConfig, Problem};
use crate::network_client::NetworkError;
use crate::skill::DifficultyMapping;
use crate::utils::random_offset;

#[derive(Debug)]
pub enum SelectError {
    /// Nothing satisfies the current filters.
    NoMatch,
    /// The remote total was positive but the page at the drawn offset was empty.
    InconsistentRemoteState { total: u64, skip: u64 },
    /// The filters cannot be expressed as a remote query.
    Untranslatable(String),
    Remote(NetworkError),
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectError::NoMatch => write!(f, "No problems match your criteria. Try adjusting your filters."),
            SelectError::InconsistentRemoteState { total, skip } => write!(
                f,
                "Remote reported {} matching problems but returned none at offset {}; try again",
                total, skip
            ),
            SelectError::Untranslatable(reason) => write!(f, "Filters cannot be sent to the API: {}", reason),
            SelectError::Remote(e) => write!(f, "Remote selection failed: {}", e),
        }
    }
}

impl std::error::Error for SelectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectError::Remote(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NetworkError> for SelectError {
    fn from(err: NetworkError) -> Self {
        SelectError::Remote(err)
    }
}

/// Picks one eligible problem uniformly at random.
pub fn pick_local<'a, R: Rng>(eligible: &'a [Problem], rng: &mut R) -> Result<&'a Problem, SelectError> {
    if eligible.is_empty() {
        return Err(SelectError::NoMatch);
    }
    let index = random_offset(rng, eligible.len() as u64) as usize;
    debug!("Picked index {} of {} eligible problems", index, eligible.len());
    eligible.get(index).ok_or(SelectError::NoMatch)
}

/// One query the API can evaluate server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFilter {
    pub difficulty: Option<Difficulty>,
    /// Tag slugs; the API requires all of them.
    pub tags: Vec<String>,
    /// Restrict to problems the user has not started.
    pub not_started_only: bool,
    /// `Some(false)` hides paid-only problems.
    pub premium_only: Option<bool>,
}

impl RemoteFilter {
    /// Splits a config into one filter per eligible difficulty. The union of the
    /// buckets is exactly the remote view of the eligible set, and buckets never
    /// overlap.
    pub fn buckets(config: &FilterConfig, mapping: DifficultyMapping) -> Result<Vec<RemoteFilter>, SelectError> {
        if !config.excluded_topics.is_empty() {
            return Err(SelectError::Untranslatable("excluded topics are not supported".to_string()));
        }
        if config.included_topics.len() > 1 {
            return Err(SelectError::Untranslatable(
                "the API matches all tags, not any of several".to_string(),
            ));
        }
        let tags: Vec<String> = config.included_topics.iter().map(|t| topic_slug(t)).collect();
        let difficulties: BTreeSet<Difficulty> = effective_difficulties(config, mapping);
        Ok(difficulties
            .into_iter()
            .map(|difficulty| RemoteFilter {
                difficulty: Some(difficulty),
                tags: tags.clone(),
                not_started_only: config.hide_solved,
                premium_only: config.hide_premium.then_some(false),
            })
            .collect())
    }

    /// Server-side prefilter for listing the whole catalogue before filtering
    /// locally. Only constraints whose remote meaning matches the local rule
    /// are sent; `NOT_STARTED` would also hide attempted problems.
    pub fn listing(config: &FilterConfig) -> RemoteFilter {
        RemoteFilter {
            difficulty: None,
            tags: Vec::new(),
            not_started_only: false,
            premium_only: config.hide_premium.then_some(false),
        }
    }
}

/// A service that filters server-side and exposes a count plus page-at-offset access.
pub trait RemoteProblemSource {
    async fn count(&self, filter: &RemoteFilter) -> Result<u64, NetworkError>;

    /// Returns the single problem at `skip`, or `None` if the page is empty.
    async fn fetch_at(&self, filter: &RemoteFilter, skip: u64) -> Result<Option<Problem>, NetworkError>;
}

/// Maps a global offset onto the bucket holding it and the offset within that bucket.
fn locate(counts: &[u64], skip: u64) -> Option<(usize, u64)> {
    let mut remaining = skip;
    for (index, &count) in counts.iter().enumerate() {
        if remaining < count {
            return Some((index, remaining));
        }
        remaining -= count;
    }
    None
}

/// Picks one problem uniformly among everything the remote service reports as
/// eligible. Counts are taken first, then exactly one record is fetched with
/// the same filter that produced its bucket's count.
pub async fn pick_remote<S, R>(
    source: &S,
    config: &FilterConfig,
    mapping: DifficultyMapping,
    rng: &mut R,
) -> Result<Problem, SelectError>
where
    S: RemoteProblemSource,
    R: Rng,
{
    let buckets = RemoteFilter::buckets(config, mapping)?;
    let mut counts = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        counts.push(source.count(bucket).await?);
    }
    let total: u64 = counts.iter().sum();
    info!("Remote reports {} matching problems across {} buckets", total, buckets.len());
    if total == 0 {
        return Err(SelectError::NoMatch);
    }

    let skip = random_offset(rng, total);
    let (bucket_index, offset) = locate(&counts, skip).ok_or(SelectError::InconsistentRemoteState { total, skip })?;
    let bucket = &buckets[bucket_index];
    debug!("Fetching offset {} of bucket {:?} (global skip {})", offset, bucket.difficulty, skip);

    source
        .fetch_at(bucket, offset)
        .await?
        .ok_or(SelectError::InconsistentRemoteState { total, skip })
}
