//! Static site catalog: which sites to crawl on which day, and how to tag them.
//!
//! Each weekday has a [`ContentPlan`] and a pair of [`DayTags`]. Articles are
//! classified by URL into a source id with [`guess_source_from_url`], and the
//! source id is turned into a display hashtag with [`source_tag`].
//!
//! # Weekly plan
//!
//! | Day | Sites | Cap | Publication |
//! |-----|-------|-----|-------------|
//! | Monday | AI vendors | 40 | top 5 posts |
//! | Tuesday | Python | 40 | top 5 posts |
//! | Wednesday | Data engineering | 40 | top 5 posts |
//! | Thursday | Security | 40 | top 5 posts |
//! | Friday | Developer tools | 40 | top 5 posts |
//! | Saturday | Developer tools + Python | 60 | tools digest |
//! | Sunday | Everything | 80 | weekly digest |

use chrono::Weekday;

pub const SITES_AI: &[&str] = &[
    "https://openai.com",
    "https://blog.google/technology/ai/",
    "https://www.anthropic.com/news",
    "https://huggingface.co/blog",
    "https://stability.ai/news",
];

pub const SITES_PYTHON: &[&str] = &[
    "https://www.python.org/blogs/",
    "https://realpython.com/tutorials/news/",
    "https://blog.jetbrains.com/pycharm/",
    "https://www.pythonweekly.com/",
];

pub const SITES_DATA_ENG: &[&str] = &[
    "https://www.databricks.com/blog",
    "https://www.confluent.io/blog/",
    "https://aws.amazon.com/blogs/big-data/",
];

pub const SITES_SECURITY: &[&str] = &[
    "https://thehackernews.com/",
    "https://gbhackers.com/",
    "https://cybersecuritynews.com/",
];

pub const SITES_DEVTOOLS: &[&str] = &[
    "https://github.blog/news-insights/",
    "https://code.visualstudio.com/updates",
    "https://www.docker.com/blog/",
];

/// Ordered (URL substring, source id) table; the first match wins.
const SOURCE_PATTERNS: &[(&str, &str)] = &[
    ("openai.com", "openai"),
    ("blog.google/technology/ai", "google_ai_blog"),
    ("anthropic.com", "anthropic"),
    ("huggingface.co", "huggingface"),
    ("stability.ai", "stability_ai"),
    ("python.org", "python_org"),
    ("realpython.com", "realpython"),
    ("blog.jetbrains.com/pycharm", "pycharm_blog"),
    ("pythonweekly.com", "python_weekly"),
    ("databricks.com", "databricks"),
    ("confluent.io", "confluent"),
    ("aws.amazon.com/blogs/big-data", "aws_bigdata"),
    ("thehackernews.com", "the_hacker_news"),
    ("gbhackers.com", "gbhackers"),
    ("cybersecuritynews.com", "cybersecuritynews"),
    ("github.blog", "github_blog"),
    ("code.visualstudio.com/updates", "vscode_updates"),
    ("docker.com/blog", "docker_blog"),
];

const AI_SOURCES: &[&str] = &[
    "openai",
    "anthropic",
    "huggingface",
    "stability_ai",
    "google_ai_blog",
];
const PYTHON_SOURCES: &[&str] = &["python_org", "realpython", "pycharm_blog", "python_weekly"];
const DATA_SOURCES: &[&str] = &["databricks", "confluent", "aws_bigdata"];
const SECURITY_SOURCES: &[&str] = &["the_hacker_news", "gbhackers", "cybersecuritynews"];
const DEVTOOLS_SOURCES: &[&str] = &["github_blog", "vscode_updates", "docker_blog"];

/// (source ids, display tag). Shared by the daily posts and both digests.
const SOURCE_TAGS: &[(&[&str], &str)] = &[
    (AI_SOURCES, "#AI"),
    (PYTHON_SOURCES, "#Python"),
    (DATA_SOURCES, "#DataEngineering"),
    (SECURITY_SOURCES, "#Security"),
    (DEVTOOLS_SOURCES, "#DevTools"),
];

const USE_CASES: &[(&[&str], &str)] = &[
    (
        &["github_blog"],
        "Keep up with new GitHub features and tighten your repository and CI/CD workflow.",
    ),
    (
        &["vscode_updates"],
        "Pick up new VS Code features and make everyday coding more comfortable.",
    ),
    (
        &["docker_blog"],
        "Simplify containerising applications and managing environments with Docker.",
    ),
    (
        PYTHON_SOURCES,
        "Level up your Python development and follow what is new in the ecosystem.",
    ),
    (
        DATA_SOURCES,
        "Make data pipelines, streaming and big-data analytics easier to run.",
    ),
];

const GENERIC_USE_CASE: &str = "Takes some routine off a developer's plate and saves time.";

/// Default source tag used by the Saturday digest.
pub const TOOLS_FALLBACK_TAG: &str = "#Tools";
/// Default source tag used by the Sunday digest.
pub const DIGEST_FALLBACK_TAG: &str = "#ITNews";

/// What to crawl on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPlan {
    pub sites: Vec<&'static str>,
    /// Only links containing this substring are considered articles.
    pub url_filter: String,
    /// Hard cap on successfully fetched new articles per run.
    pub max_new_articles: usize,
}

/// Hashtags attached to every post published on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTags {
    pub topic_tag: &'static str,
    /// Used for articles whose source has no entry in the tag table.
    pub source_tag: &'static str,
}

/// How the day's articles get published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationMode {
    /// One post per article, top five by score.
    DailyTop,
    /// One combined post of the top five tools.
    ToolsDigest,
    /// One combined post of the week's best articles.
    WeeklyDigest,
}

impl PublicationMode {
    pub fn for_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Sat => PublicationMode::ToolsDigest,
            Weekday::Sun => PublicationMode::WeeklyDigest,
            Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => {
                PublicationMode::DailyTop
            }
        }
    }
}

/// Map a 0-based weekday index (0 = Monday) to a [`Weekday`].
pub fn weekday_from_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// The content plan for a day; `url_filter` is usually `/<year>/`.
pub fn content_plan(day: Weekday, url_filter: &str) -> ContentPlan {
    let (sites, max_new_articles): (Vec<&'static str>, usize) = match day {
        Weekday::Mon => (SITES_AI.to_vec(), 40),
        Weekday::Tue => (SITES_PYTHON.to_vec(), 40),
        Weekday::Wed => (SITES_DATA_ENG.to_vec(), 40),
        Weekday::Thu => (SITES_SECURITY.to_vec(), 40),
        Weekday::Fri => (SITES_DEVTOOLS.to_vec(), 40),
        Weekday::Sat => ([SITES_DEVTOOLS, SITES_PYTHON].concat(), 60),
        Weekday::Sun => (
            [SITES_AI, SITES_PYTHON, SITES_DATA_ENG, SITES_SECURITY, SITES_DEVTOOLS].concat(),
            80,
        ),
    };
    ContentPlan {
        sites,
        url_filter: url_filter.to_string(),
        max_new_articles,
    }
}

pub fn day_tags(day: Weekday) -> DayTags {
    let (topic_tag, source_tag) = match day {
        Weekday::Mon => ("#AI", "#NeuralNets"),
        Weekday::Tue => ("#Python", "#Development"),
        Weekday::Wed => ("#DataEngineering", "#BigData"),
        Weekday::Thu => ("#Security", "#DevSecOps"),
        Weekday::Fri => ("#Tools", "#DevTools"),
        Weekday::Sat => ("#Tools", "#Roundup"),
        Weekday::Sun => ("#Digest", "#WeeklyDigest"),
    };
    DayTags {
        topic_tag,
        source_tag,
    }
}

/// Tags for a raw weekday index, falling back to generic IT tags when the
/// index is out of range.
pub fn day_tags_for_index(index: u32) -> DayTags {
    weekday_from_index(index)
        .map(day_tags)
        .unwrap_or(DayTags {
            topic_tag: "#ITNews",
            source_tag: "#IT",
        })
}

/// Classify a URL into a source id, `"other"` if it matches no known site.
pub fn guess_source_from_url(url: &str) -> &'static str {
    let url = url.to_lowercase();
    SOURCE_PATTERNS
        .iter()
        .find(|(pattern, _)| url.contains(pattern))
        .map(|(_, source)| *source)
        .unwrap_or("other")
}

/// Display hashtag for a source id, or `default` when the source is unknown.
pub fn source_tag<'a>(source: &str, default: &'a str) -> &'a str {
    SOURCE_TAGS
        .iter()
        .find(|(sources, _)| sources.contains(&source))
        .map(|(_, tag)| *tag)
        .unwrap_or(default)
}

/// Canned "use case" line for the Saturday tools digest.
pub fn tool_use_case(source: &str) -> &'static str {
    let source = source.to_lowercase();
    USE_CASES
        .iter()
        .find(|(sources, _)| sources.contains(&source.as_str()))
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC_USE_CASE)
}
