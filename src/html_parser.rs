//! Problem-list scraping.
//!
//! The site's markup changes between layouts, so every field is read through an
//! ordered list of independent probes and the first probe that produces a value
//! wins. Supporting a new layout means appending a probe to the relevant list.

use std::collections::{BTreeSet, HashSet};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{normalize_topic, Difficulty, Problem};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Failed to parse selector {css:?}: {e:?}"))
}

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"div[role="row"], tr[role="row"]"#));
static HEADER_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"[role="columnheader"]"#));
static PROBLEM_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="/problems/"]"#));
static TITLE_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div:nth-child(2), td:nth-child(2)"));
static STATUS_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div:first-child, td:first-child"));
static TAG_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div:nth-child(6), td:nth-child(6)"));
static TRUNCATE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(".truncate"));
static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span"));
static SPAN_OR_DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span, div"));
static TEXT_WITH_CLASS_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span[class], p[class], div[class]"));
static DIFFICULTY_LABEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector(r#"span[class*="difficulty"], span.text-xs"#));
static ICON_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("svg, i"));
static TAG_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="/tag/"]"#));
static TAG_ELEMENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector(r#"a[href*="/tag/"], span[class*="tag"], div[class*="tag"]"#));
static SOLVED_INDICATOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    selector(concat!(
        r#"svg.text-green-s, svg[data-icon="fa-check"], .text-green-s, "#,
        r#"[data-status="ac"], [data-status="solved"], "#,
        r#"svg[class*="text-green"], svg[class*="check"], .text-green-500, .text-green-600, .text-ac"#,
    ))
});
static PREMIUM_INDICATOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    selector(concat!(
        r#"svg[data-icon="fa-lock"], svg[data-icon="fa-crown"], .text-yellow-s, "#,
        r#"[data-premium="true"], .premium-badge, "#,
        r#"svg[class*="lock"], svg[class*="crown"], svg[class*="text-yellow"], svg[class*="text-orange"], "#,
        r#".text-brand-orange"#,
    ))
});

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s*").expect("Failed to compile ordinal regex"));
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/problems/([^/?#]+)").expect("Failed to compile slug regex"));

#[derive(Debug)]
pub enum ParseError {
    /// The document had no problem-list rows to scan at all.
    ExtractionUnavailable,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::ExtractionUnavailable => {
                write!(f, "Could not find any problems on the page. Try refreshing the problem list.")
            }
        }
    }
}

impl std::error::Error for ParseError {}

type RowProbe<T> = fn(ElementRef<'_>) -> Option<T>;
type RowFlag = fn(ElementRef<'_>) -> bool;

const TITLE_PROBES: &[RowProbe<String>] = &[
    title_from_truncate,
    title_from_span,
    title_from_link_text,
    title_from_text_nodes,
];

const DIFFICULTY_PROBES: &[RowProbe<Difficulty>] = &[
    difficulty_from_label,
    difficulty_from_cell_text,
    difficulty_from_parent_class,
    difficulty_from_colour_class,
];

const TOPIC_PROBES: &[RowProbe<BTreeSet<String>>] = &[topics_from_tag_column, topics_from_tag_links];

const SOLVED_PROBES: &[RowFlag] = &[solved_by_indicator, solved_by_status_icon];

const PREMIUM_PROBES: &[RowFlag] = &[premium_by_indicator];

fn first_match<T>(element: ElementRef<'_>, probes: &[RowProbe<T>]) -> Option<T> {
    probes.iter().find_map(|probe| probe(element))
}

fn any_flag(row: ElementRef<'_>, probes: &[RowFlag]) -> bool {
    probes.iter().any(|probe| probe(row))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn class_of(element: ElementRef<'_>) -> String {
    element.value().attr("class").unwrap_or_default().to_lowercase()
}

/// Removes a leading `"<digits>. "` ordinal from a problem title.
pub fn strip_ordinal(title: &str) -> String {
    ORDINAL_RE.replace(title.trim(), "").trim().to_string()
}

fn clean_title(raw: &str) -> Option<String> {
    let title = strip_ordinal(raw);
    if title.chars().count() < 2 || title.contains("<svg") {
        return None;
    }
    Some(title)
}

fn title_from_truncate(link: ElementRef<'_>) -> Option<String> {
    link.select(&TRUNCATE_SELECTOR).next().and_then(|el| clean_title(&text_of(el)))
}

fn title_from_span(link: ElementRef<'_>) -> Option<String> {
    link.select(&SPAN_SELECTOR).next().and_then(|el| clean_title(&text_of(el)))
}

fn title_from_link_text(link: ElementRef<'_>) -> Option<String> {
    clean_title(&text_of(link))
}

fn title_from_text_nodes(link: ElementRef<'_>) -> Option<String> {
    let direct: Vec<String> = link
        .children()
        .filter_map(|node| node.value().as_text().map(|text| text.trim().to_string()))
        .filter(|text| !text.is_empty())
        .collect();
    clean_title(&direct.join(" "))
}

struct ProblemLink {
    slug: String,
    title: String,
    url: String,
}

fn find_problem_link(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.select(&TITLE_CELL_SELECTOR)
        .next()
        .and_then(|cell| cell.select(&PROBLEM_LINK_SELECTOR).next())
        .or_else(|| row.select(&PROBLEM_LINK_SELECTOR).next())
}

fn problem_link(row: ElementRef<'_>, base_url: &Url) -> Option<ProblemLink> {
    let link = find_problem_link(row)?;
    let href = link.value().attr("href")?;
    let slug = SLUG_RE.captures(href)?.get(1)?.as_str().to_string();
    let title = first_match(link, TITLE_PROBES)?;
    let url = base_url.join(&format!("/problems/{slug}/")).ok()?.to_string();
    Some(ProblemLink { slug, title, url })
}

fn difficulty_from_label(row: ElementRef<'_>) -> Option<Difficulty> {
    row.select(&DIFFICULTY_LABEL_SELECTOR).find_map(|el| Difficulty::classify(&text_of(el)))
}

fn difficulty_from_cell_text(row: ElementRef<'_>) -> Option<Difficulty> {
    row.select(&SPAN_OR_DIV_SELECTOR).find_map(|el| Difficulty::classify(&text_of(el)))
}

fn difficulty_from_parent_class(row: ElementRef<'_>) -> Option<Difficulty> {
    row.select(&SPAN_OR_DIV_SELECTOR).find_map(|el| {
        let parent_class = el.parent().and_then(ElementRef::wrap).map(class_of)?;
        Difficulty::ALL
            .into_iter()
            .find(|d| parent_class.contains(&format!("difficulty-{}", d.as_str())))
    })
}

fn difficulty_from_colour_class(row: ElementRef<'_>) -> Option<Difficulty> {
    row.select(&TEXT_WITH_CLASS_SELECTOR).find_map(|el| {
        el.value().classes().find_map(|class| match class {
            "text-olive" | "text-sd-easy" | "text-difficulty-easy" => Some(Difficulty::Easy),
            "text-yellow" | "text-sd-medium" | "text-difficulty-medium" => Some(Difficulty::Medium),
            "text-pink" | "text-sd-hard" | "text-difficulty-hard" => Some(Difficulty::Hard),
            _ => None,
        })
    })
}

fn topic_from_tag_element(el: ElementRef<'_>) -> Option<String> {
    if let Some(href) = el.value().attr("href") {
        let path = href.split(['?', '#']).next().unwrap_or_default();
        return path.split('/').filter(|s| !s.is_empty()).last().map(normalize_topic);
    }
    let text = text_of(el);
    (text.chars().count() > 1).then(|| normalize_topic(&text))
}

fn topics_from_tag_column(row: ElementRef<'_>) -> Option<BTreeSet<String>> {
    let topics: BTreeSet<String> = row
        .select(&TAG_CELL_SELECTOR)
        .flat_map(|cell| cell.select(&TAG_ELEMENT_SELECTOR))
        .filter_map(topic_from_tag_element)
        .filter(|t| !t.is_empty())
        .collect();
    (!topics.is_empty()).then_some(topics)
}

fn topics_from_tag_links(row: ElementRef<'_>) -> Option<BTreeSet<String>> {
    let topics: BTreeSet<String> = row
        .select(&TAG_LINK_SELECTOR)
        .filter_map(topic_from_tag_element)
        .filter(|t| !t.is_empty())
        .collect();
    (!topics.is_empty()).then_some(topics)
}

fn solved_by_indicator(row: ElementRef<'_>) -> bool {
    row.select(&SOLVED_INDICATOR_SELECTOR).next().is_some()
}

fn solved_by_status_icon(row: ElementRef<'_>) -> bool {
    let Some(status_cell) = row.select(&STATUS_CELL_SELECTOR).next() else {
        return false;
    };
    status_cell.select(&ICON_SELECTOR).any(|icon| {
        let class = class_of(icon);
        if class.contains("green") || class.contains("check") {
            return true;
        }
        // Colour is sometimes set on a wrapper instead of the icon.
        icon.ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|ancestor| ancestor.id() != row.id())
            .any(|ancestor| class_of(ancestor).contains("text-green"))
    })
}

fn premium_by_indicator(row: ElementRef<'_>) -> bool {
    row.select(&PREMIUM_INDICATOR_SELECTOR).next().is_some()
}

fn is_problem_row(row: ElementRef<'_>) -> bool {
    row.select(&HEADER_SELECTOR).next().is_none() && row.select(&PROBLEM_LINK_SELECTOR).next().is_some()
}

/// Turns one row into a problem, or `None` for header rows, rows without a
/// problem link and rows whose difficulty cannot be classified.
pub fn problem_from_row(row: ElementRef<'_>, base_url: &Url) -> Option<Problem> {
    if !is_problem_row(row) {
        return None;
    }
    let link = problem_link(row, base_url)?;
    let difficulty = first_match(row, DIFFICULTY_PROBES)?;
    Some(Problem {
        id: link.slug,
        title: link.title,
        url: link.url,
        difficulty,
        topics: first_match(row, TOPIC_PROBES).unwrap_or_default(),
        solved: any_flag(row, SOLVED_PROBES),
        premium: any_flag(row, PREMIUM_PROBES),
    })
}

/// Extracts problems from already-selected rows, dropping repeated URLs.
pub fn extract_rows<'a>(rows: impl IntoIterator<Item = ElementRef<'a>>, base_url: &Url) -> Vec<Problem> {
    let mut seen_urls = HashSet::new();
    let mut problems = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        let Some(problem) = problem_from_row(row, base_url) else {
            continue;
        };
        if !seen_urls.insert(problem.url.clone()) {
            debug!("Skipping row {} ({}): already collected", index, problem.url);
            continue;
        }
        problems.push(problem);
    }
    problems
}

/// Extracts every classifiable problem from a rendered problem-list page.
pub fn extract_problems(html_content: &str, base_url: &Url) -> Result<Vec<Problem>, ParseError> {
    let document = Html::parse_document(html_content);
    let rows: Vec<ElementRef<'_>> = document.select(&ROW_SELECTOR).collect();
    debug!("Found {} potential row elements", rows.len());
    if rows.is_empty() {
        return Err(ParseError::ExtractionUnavailable);
    }
    let problems = extract_rows(rows, base_url);
    info!("Collected {} valid problems with difficulty", problems.len());
    Ok(problems)
}

/// Counts the problem rows on the page that carry a solved marker.
pub fn count_solved_rows(html_content: &str) -> Result<u32, ParseError> {
    let document = Html::parse_document(html_content);
    let rows: Vec<ElementRef<'_>> = document.select(&ROW_SELECTOR).collect();
    if rows.is_empty() {
        return Err(ParseError::ExtractionUnavailable);
    }
    let solved = rows
        .into_iter()
        .filter(|row| is_problem_row(*row) && any_flag(*row, SOLVED_PROBES))
        .count();
    info!("Found {} solved problems on page", solved);
    Ok(solved as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBLEM_LIST: &str = r#"
<html><body>
<div role="table">
  <div role="rowgroup">
    <div role="row">
      <div role="columnheader">Status</div>
      <div role="columnheader">Title</div>
      <div role="columnheader">Difficulty</div>
    </div>
    <div role="row">
      <div role="cell"><svg class="text-green-s" data-icon="fa-check"></svg></div>
      <div role="cell"><a href="/problems/two-sum/"><div class="truncate">1. Two Sum</div></a></div>
      <div role="cell"><span class="text-olive">Easy</span></div>
      <div role="cell">49.1%</div>
      <div role="cell"></div>
      <div role="cell"><a href="/tag/array/">Array</a><a href="/tag/hash-table/">Hash Table</a><a href="/tag/array/">Array</a></div>
    </div>
    <div role="row">
      <div role="cell"></div>
      <div role="cell"><a href="https://leetcode.com/problems/add-two-numbers/description/"><span>2. Add Two Numbers</span></a><svg data-icon="fa-lock"></svg></div>
      <div role="cell"><span class="text-xs text-yellow">Medium</span></div>
      <div role="cell">40.2%</div>
      <div role="cell"></div>
      <div role="cell"><a href="/tag/linked-list/">Linked List</a></div>
    </div>
    <div role="row">
      <div role="cell"></div>
      <div role="cell"><a href="/problems/two-sum/description/"><div class="truncate">1. Two Sum</div></a></div>
      <div role="cell"><span>Easy</span></div>
      <div role="cell">49.1%</div>
      <div role="cell"></div>
      <div role="cell"></div>
    </div>
    <div role="row">
      <div role="cell"></div>
      <div role="cell"><a href="/problems/mystery/">4. Mystery</a></div>
      <div role="cell"><span>N/A</span></div>
    </div>
    <div role="row"><div>Loading more problems</div></div>
  </div>
</div>
</body></html>
"#;

    fn base() -> Url {
        Url::parse("https://leetcode.com/problemset/").unwrap()
    }

    fn first_row(html: &Html) -> ElementRef<'_> {
        html.select(&ROW_SELECTOR).next().expect("fixture has a row")
    }

    #[test]
    fn extracts_classifiable_rows() {
        let problems = extract_problems(PROBLEM_LIST, &base()).unwrap();
        let ids: Vec<&str> = problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["two-sum", "add-two-numbers"]);

        let two_sum = &problems[0];
        assert_eq!(two_sum.title, "Two Sum");
        assert_eq!(two_sum.url, "https://leetcode.com/problems/two-sum/");
        assert_eq!(two_sum.difficulty, Difficulty::Easy);
        assert!(two_sum.solved);
        assert!(!two_sum.premium);
        let topics: Vec<&str> = two_sum.topics.iter().map(String::as_str).collect();
        assert_eq!(topics, vec!["array", "hash table"]);

        let add = &problems[1];
        assert_eq!(add.title, "Add Two Numbers");
        assert_eq!(add.url, "https://leetcode.com/problems/add-two-numbers/");
        assert_eq!(add.difficulty, Difficulty::Medium);
        assert!(!add.solved);
        assert!(add.premium);
        assert!(add.topics.contains("linked list"));
    }

    #[test]
    fn repeated_urls_are_collected_once() {
        let problems = extract_problems(PROBLEM_LIST, &base()).unwrap();
        let urls: HashSet<&str> = problems.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls.len(), problems.len());
        let two_sum = problems.iter().find(|p| p.id == "two-sum").unwrap();
        assert!(two_sum.solved, "first occurrence wins");
    }

    #[test]
    fn empty_page_is_unavailable() {
        let result = extract_problems("<html><body><p>Sign in</p></body></html>", &base());
        assert!(matches!(result, Err(ParseError::ExtractionUnavailable)));
        assert!(matches!(count_solved_rows("<html></html>"), Err(ParseError::ExtractionUnavailable)));
    }

    #[test]
    fn tag_text_and_tag_href_give_the_same_topic() {
        let html = r#"
<div role="row">
  <div role="cell"></div>
  <div role="cell"><a href="/problems/kth-largest-element-in-an-array/">215. Kth Largest Element in an Array</a></div>
  <div role="cell"><span>Medium</span></div>
  <div role="cell"></div>
  <div role="cell"></div>
  <div role="cell"><a href="/tag/heap-priority-queue/">Heap (Priority Queue)</a></div>
</div>
<div role="row">
  <div role="cell"></div>
  <div role="cell"><a href="/problems/last-stone-weight/">1046. Last Stone Weight</a></div>
  <div role="cell"><span>Easy</span></div>
  <div role="cell"></div>
  <div role="cell"></div>
  <div role="cell"><span class="tag-pill">Heap (Priority Queue)</span></div>
</div>"#;
        let problems = extract_problems(html, &base()).unwrap();
        assert_eq!(problems.len(), 2);
        for problem in &problems {
            assert!(problem.topics.contains("heap priority queue"), "{:?}", problem.topics);
        }
    }

    #[test]
    fn rows_without_problems_yield_empty_list() {
        let html = r#"<div role="row"><div role="columnheader">Title</div></div>"#;
        assert!(extract_problems(html, &base()).unwrap().is_empty());
    }

    #[test]
    fn strips_leading_ordinal() {
        assert_eq!(strip_ordinal("146. LRU Cache"), "LRU Cache");
        assert_eq!(strip_ordinal("1.Two Sum"), "Two Sum");
        assert_eq!(strip_ordinal("3Sum"), "3Sum");
        assert_eq!(strip_ordinal("  15. 3Sum "), "3Sum");
    }

    #[test]
    fn difficulty_from_parent_class_name() {
        let html = Html::parse_fragment(
            r#"<div role="row"><div><a href="/problems/jump-game-ii/">45. Jump Game II</a></div><div class="difficulty-hard"><span>H</span></div></div>"#,
        );
        let problem = problem_from_row(first_row(&html), &base()).unwrap();
        assert_eq!(problem.difficulty, Difficulty::Hard);
        assert_eq!(problem.title, "Jump Game II");
        assert!(problem.topics.is_empty());
    }

    #[test]
    fn difficulty_from_colour_class_only() {
        let html = Html::parse_fragment(
            r#"<div role="row"><a href="/problems/lru-cache/">146. LRU Cache</a><p class="mx-2 text-sd-medium">?</p></div>"#,
        );
        let row = first_row(&html);
        assert_eq!(difficulty_from_colour_class(row), Some(Difficulty::Medium));
        assert_eq!(problem_from_row(row, &base()).unwrap().difficulty, Difficulty::Medium);
    }

    #[test]
    fn abbreviated_medium_label() {
        let html = Html::parse_fragment(
            r#"<div role="row"><a href="/problems/3sum/">15. 3Sum</a><span>Med.</span></div>"#,
        );
        let problem = problem_from_row(first_row(&html), &base()).unwrap();
        assert_eq!(problem.difficulty, Difficulty::Medium);
        assert_eq!(problem.title, "3Sum");
    }

    #[test]
    fn table_layout_with_status_icon_wrapper() {
        let html = Html::parse_document(
            r#"<table><tbody>
            <tr role="row">
              <td><span class="text-green-500"><i class="fa"></i></span></td>
              <td><a href="/problems/word-ladder/">127. Word Ladder</a></td>
              <td><span class="difficulty-label">Hard</span></td>
              <td></td><td></td>
              <td><span class="tag">Breadth-First-Search</span></td>
            </tr>
            </tbody></table>"#,
        );
        let problems = extract_rows(html.select(&ROW_SELECTOR), &base());
        assert_eq!(problems.len(), 1);
        let problem = &problems[0];
        assert_eq!(problem.difficulty, Difficulty::Hard);
        assert!(problem.solved);
        assert!(problem.topics.contains("breadth first search"));
    }

    #[test]
    fn status_icon_probe_reads_wrapper_colour() {
        let html = Html::parse_fragment(
            r#"<div role="row"><div class="text-green-s"><svg></svg></div><a href="/problems/a/">A problem</a></div>"#,
        );
        assert!(solved_by_status_icon(first_row(&html)));
    }

    #[test]
    fn titles_fall_back_to_text_nodes() {
        let html = Html::parse_fragment(
            r#"<div role="row"><a href="/problems/valid-anagram/"><span>1</span> 242. Valid Anagram </a><span>Easy</span></div>"#,
        );
        let link = find_problem_link(first_row(&html)).unwrap();
        assert_eq!(title_from_span(link), None);
        assert_eq!(title_from_text_nodes(link).as_deref(), Some("Valid Anagram"));
    }

    #[test]
    fn counts_solved_problem_rows() {
        assert_eq!(count_solved_rows(PROBLEM_LIST).unwrap(), 1);
    }
}
