use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::models::{normalize_topic, Difficulty, Problem};
use crate::selector::{RemoteFilter, RemoteProblemSource};

pub const DEFAULT_SITE: &str = "https://leetcode.com/";
const LIST_PAGE_SIZE: u64 = 100;

const QUESTION_LIST_QUERY: &str = r#"
query problemsetQuestionList($categorySlug: String, $limit: Int, $skip: Int, $filters: QuestionListFilterInput) {
  problemsetQuestionList: questionList(categorySlug: $categorySlug, limit: $limit, skip: $skip, filters: $filters) {
    total: totalNum
    questions: data {
      difficulty
      paidOnly: isPaidOnly
      status
      title
      titleSlug
      topicTags { name slug }
    }
  }
}"#;

static BASE_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://leetcode.com"));
    headers.insert(REFERER, HeaderValue::from_static("https://leetcode.com/problemset/"));
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
    headers
});

#[derive(Debug)]
pub enum NetworkError {
    Reqwest(ReqwestError),
    ApiError { status: StatusCode, message: String },
    GraphQl(String),
    UrlParseError(url::ParseError),
    SerdeJsonError(serde_json::Error),
}

impl From<ReqwestError> for NetworkError {
    fn from(err: ReqwestError) -> NetworkError {
        NetworkError::Reqwest(err)
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> NetworkError {
        NetworkError::UrlParseError(err)
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> NetworkError {
        NetworkError::SerdeJsonError(err)
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::Reqwest(e) => write!(f, "HTTP request error: {}", e),
            NetworkError::ApiError { status, message } => write!(f, "API error ({}): {}", status, message),
            NetworkError::GraphQl(message) => write!(f, "GraphQL error: {}", message),
            NetworkError::UrlParseError(e) => write!(f, "URL parsing error: {}", e),
            NetworkError::SerdeJsonError(e) => write!(f, "JSON deserialization error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Builds a client with browser-like headers. A session token lets the site
/// report solved status for the signed-in user.
pub fn build_client(site: &Url, session: Option<&str>) -> Result<Client, NetworkError> {
    let jar = Jar::default();
    if let Some(token) = session {
        let host = site.host_str().unwrap_or("leetcode.com");
        jar.add_cookie_str(&format!("LEETCODE_SESSION={}; Domain={}; Path=/", token, host), site);
        debug!("Added session cookie for {}", host);
    }
    let client = Client::builder()
        .default_headers(BASE_HEADERS.clone())
        .cookie_provider(Arc::new(jar))
        .build()?;
    Ok(client)
}

/// Fetches the HTML of a page such as the problem list.
pub async fn fetch_page_html(client: &Client, url_str: &str) -> Result<String, NetworkError> {
    let start_time = Instant::now();
    let response_result = client.get(url_str).send().await;
    let duration = start_time.elapsed();
    info!("[TIMING] fetch_page_html for {} took {:.2?}", url_str, duration);

    let response = response_result?;
    if !response.status().is_success() {
        return Err(NetworkError::ApiError {
            status: response.status(),
            message: format!("Failed to fetch page: {}", url_str),
        });
    }
    Ok(response.text().await?)
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<QuestionListData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionListData {
    problemset_question_list: QuestionList,
}

#[derive(Debug, Deserialize)]
struct QuestionList {
    total: u64,
    #[serde(default)]
    questions: Vec<ApiQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiQuestion {
    pub title_slug: String,
    pub title: String,
    pub difficulty: String,
    #[serde(default)]
    pub topic_tags: Vec<ApiTopicTag>,
    pub status: Option<String>,
    #[serde(default)]
    pub paid_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTopicTag {
    pub name: String,
    pub slug: Option<String>,
}

impl ApiQuestion {
    /// Converts an API record; unknown difficulties yield `None`.
    pub fn into_problem(self, site: &Url) -> Option<Problem> {
        let difficulty = Difficulty::classify(&self.difficulty)?;
        let url = site.join(&format!("/problems/{}/", self.title_slug)).ok()?.to_string();
        let topics = self
            .topic_tags
            .iter()
            .map(|tag| normalize_topic(tag.slug.as_deref().unwrap_or(&tag.name)))
            .filter(|t| !t.is_empty())
            .collect();
        Some(Problem {
            id: self.title_slug,
            title: self.title.trim().to_string(),
            url,
            difficulty,
            topics,
            solved: self.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("ac")),
            premium: self.paid_only,
        })
    }
}

/// Converts API records in order, dropping unknown difficulties and repeated URLs.
pub fn problems_from_records(records: impl IntoIterator<Item = ApiQuestion>, site: &Url) -> Vec<Problem> {
    let mut seen_urls = HashSet::new();
    let mut problems = Vec::new();
    for record in records {
        let slug = record.title_slug.clone();
        let Some(problem) = record.into_problem(site) else {
            debug!("Skipping {}: unrecognised difficulty", slug);
            continue;
        };
        if seen_urls.insert(problem.url.clone()) {
            problems.push(problem);
        } else {
            debug!("Skipping {}: already collected", problem.url);
        }
    }
    problems
}

/// Translates a remote filter into the `QuestionListFilterInput` payload.
pub fn filter_payload(filter: &RemoteFilter) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    if let Some(difficulty) = filter.difficulty {
        payload.insert("difficulty".to_string(), json!(difficulty.api_name()));
    }
    if !filter.tags.is_empty() {
        payload.insert("tags".to_string(), json!(filter.tags));
    }
    if filter.not_started_only {
        payload.insert("status".to_string(), json!("NOT_STARTED"));
    }
    if let Some(premium_only) = filter.premium_only {
        payload.insert("premiumOnly".to_string(), json!(premium_only));
    }
    serde_json::Value::Object(payload)
}

/// GraphQL-backed problem source.
pub struct LeetCodeApi {
    client: Client,
    site: Url,
    endpoint: Url,
}

impl LeetCodeApi {
    pub fn new(client: Client, site: Url) -> Result<Self, NetworkError> {
        let endpoint = site.join("/graphql/")?;
        Ok(Self { client, site, endpoint })
    }

    async fn question_list(&self, filter: &RemoteFilter, limit: u64, skip: u64) -> Result<QuestionList, NetworkError> {
        let body = json!({
            "query": QUESTION_LIST_QUERY,
            "variables": {
                "categorySlug": "",
                "limit": limit,
                "skip": skip,
                "filters": filter_payload(filter),
            },
        });
        debug!("[API] Sending POST to {}", self.endpoint);
        debug!("[API] variables: {}", body["variables"]);

        let start_time = Instant::now();
        let response_result = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await;
        info!("[TIMING] question_list (skip {}) took {:.2?}", skip, start_time.elapsed());

        let response = response_result?;
        if !response.status().is_success() {
            let status_code = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error body (detail: {}). Original status: {}", e, status_code),
            };
            return Err(NetworkError::ApiError {
                status: status_code,
                message: format!("Question list query failed. Server response: {}", error_text),
            });
        }

        let response_text = response.text().await?;
        debug!("[API] response body: {}", response_text);
        parse_question_list(&response_text)
    }

    /// Pages through every question matching `filter`.
    pub async fn list_problems(&self, filter: &RemoteFilter) -> Result<Vec<Problem>, NetworkError> {
        let mut records = Vec::new();
        let mut skip = 0;
        loop {
            let page = self.question_list(filter, LIST_PAGE_SIZE, skip).await?;
            let received = page.questions.len() as u64;
            records.extend(page.questions);
            skip += received;
            debug!("[API] listed {} of {} questions", skip, page.total);
            if received == 0 || skip >= page.total {
                break;
            }
        }
        let problems = problems_from_records(records, &self.site);
        info!("Collected {} problems from the API", problems.len());
        Ok(problems)
    }
}

fn parse_question_list(response_text: &str) -> Result<QuestionList, NetworkError> {
    let parsed: GraphQlResponse = serde_json::from_str(response_text)?;
    if !parsed.errors.is_empty() {
        let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
        return Err(NetworkError::GraphQl(messages.join("; ")));
    }
    parsed
        .data
        .map(|data| data.problemset_question_list)
        .ok_or_else(|| NetworkError::GraphQl("response carried no data".to_string()))
}

impl RemoteProblemSource for LeetCodeApi {
    async fn count(&self, filter: &RemoteFilter) -> Result<u64, NetworkError> {
        Ok(self.question_list(filter, 1, 0).await?.total)
    }

    async fn fetch_at(&self, filter: &RemoteFilter, skip: u64) -> Result<Option<Problem>, NetworkError> {
        let list = self.question_list(filter, 1, skip).await?;
        let Some(question) = list.questions.into_iter().next() else {
            return Ok(None);
        };
        let slug = question.title_slug.clone();
        let problem = question.into_problem(&self.site);
        if problem.is_none() {
            warn!("Question {} has no recognised difficulty", slug);
        }
        Ok(problem)
    }
}
