//! Rendering of Telegram posts.
//!
//! Every post shares one layout built by [`build_post_html`]: what happened,
//! why it matters, a source link, a joke and a hashtag line. All external
//! text is HTML-escaped because posts are sent with the HTML parse mode.
//!
//! Length handling lives here too: [`truncate_message`] shortens a post to
//! the channel limit and [`split_chunks`] cuts anything still too long into
//! sendable pieces.

use crate::models::DigestItem;
use itertools::Itertools;
use tracing::warn;

/// Telegram's hard limit for a single message, in characters.
pub const TELEGRAM_MAX_LEN: usize = 4096;

const NEWS_WHY: &str = "Part of the latest shifts in IT and AI; worth knowing to keep up with the trends.";
const NEWS_HUMOR: &str = "Looks like the news updates faster than our pet projects on GitHub 😅";

const TOOLS_HASHTAGS: &str = "#ITNews #Tools #Roundup";
const TOOLS_INTRO: &str = "Here is a fresh batch of tools and services for developers 👇\n";
const TOOLS_WHY: &str = "Tools like these save time, cut routine and leave more room for shipping features.";
const TOOLS_HUMOR: &str = "Just don't install all of them at once and spend the weekend configuring your setup 😅";

const WEEKLY_HASHTAGS: &str = "#ITNews #Digest #WeeklyDigest";
const WEEKLY_INTRO: &str = "A few important things happened in IT and AI this week. \
Here is a short digest so you don't have to dig through the feed all day 👇\n";
const WEEKLY_WHY: &str = "A weekly slice shows the bigger picture: where AI models are heading, \
which technologies are gaining momentum and which are quietly leaving the stage.";
const WEEKLY_HUMOR: &str = "Missed a whole week of news? No problem, it's all in one post 😅";

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn take_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// The five parts of a post, as plain (unescaped) text.
#[derive(Debug, Clone)]
pub struct Post<'a> {
    pub what: &'a str,
    pub why: &'a str,
    pub source_url: &'a str,
    pub humor: &'a str,
    pub hashtags: &'a str,
}

pub fn build_post_html(post: &Post<'_>) -> String {
    format!(
        "💡 What happened: {}\n\n📌 Why it matters: {}\n\n🔗 Source: {}\n\n😅 Humor: {}\n\n{}",
        escape_html(post.what),
        escape_html(post.why),
        escape_html(post.source_url),
        escape_html(post.humor),
        escape_html(post.hashtags),
    )
}

/// Headline (≤200 chars) and body (≤800 chars) of an article's text.
pub fn split_title_and_body(content: &str) -> (String, String) {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    match lines.split_first() {
        None => ("Fresh news from the IT world".to_string(), String::new()),
        Some((first, rest)) => (take_chars(first, 200), take_chars(&rest.join(" "), 800)),
    }
}

/// A single-article post for the weekday feed.
pub fn format_news_message(url: &str, content: &str, topic_tag: &str, source_tag: &str) -> String {
    let (title, body) = split_title_and_body(content);
    let what = if body.is_empty() {
        title
    } else {
        format!("{title}\n\n{body}")
    };
    let hashtags = format!("#ITNews {topic_tag} {source_tag}");

    build_post_html(&Post {
        what: &what,
        why: NEWS_WHY,
        source_url: url,
        humor: NEWS_HUMOR,
        hashtags: &hashtags,
    })
}

/// The Saturday tools roundup as one post.
pub fn format_tools_digest_message(tools: &[DigestItem]) -> String {
    let Some(first) = tools.first() else {
        return build_post_html(&Post {
            what: "Found no tools worth a roundup this week.",
            why: "A good excuse to pay down tech debt and finish those tests 😄",
            source_url: "",
            humor: "Sometimes the best tool is a pause and a clean backlog 😅",
            hashtags: TOOLS_HASHTAGS,
        });
    };

    let blocks = tools
        .iter()
        .enumerate()
        .map(|(idx, tool)| {
            let use_case = tool
                .use_case
                .as_deref()
                .unwrap_or("Makes a developer's life a little easier.");
            format!(
                "{}) {} {}\n   {}\n   Use case: {}\n   🔗 {}\n",
                idx + 1,
                tool.title,
                tool.source_tag,
                tool.summary,
                use_case,
                tool.url
            )
        })
        .join("\n");
    let what = format!("{TOOLS_INTRO}\n{blocks}");

    build_post_html(&Post {
        what: what.trim(),
        why: TOOLS_WHY,
        source_url: &first.url,
        humor: TOOLS_HUMOR,
        hashtags: TOOLS_HASHTAGS,
    })
}

/// The Sunday digest of the week's best articles as one post.
pub fn format_weekly_digest_message(events: &[DigestItem]) -> String {
    let Some(first) = events.first() else {
        return build_post_html(&Post {
            what: "Hardly any big news this week; a great chance to catch up on pet projects.",
            why: "Even a quiet news week is a signal: time to learn and experiment in peace.",
            source_url: "",
            humor: "Sometimes the best release is a break from the news feed 😅",
            hashtags: WEEKLY_HASHTAGS,
        });
    };

    let blocks = events
        .iter()
        .enumerate()
        .map(|(idx, ev)| {
            format!(
                "{}) {} {}\n   {}\n   🔗 {}\n",
                idx + 1,
                ev.title,
                ev.source_tag,
                ev.summary,
                ev.url
            )
        })
        .join("\n");
    let what = format!("{WEEKLY_INTRO}\n{blocks}");

    build_post_html(&Post {
        what: what.trim(),
        why: WEEKLY_WHY,
        source_url: &first.url,
        humor: WEEKLY_HUMOR,
        hashtags: WEEKLY_HASHTAGS,
    })
}

/// Shorten `text` to at most `limit` characters.
///
/// Cuts at the last newline, or failing that the last space, as long as it
/// lies past 60% of the budget, and appends a marker saying so.
pub fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    warn!(limit, "Message exceeds the length limit; truncating");

    let safe_limit = limit.saturating_sub(50);
    let cropped = take_chars(text, safe_limit);
    let threshold = safe_limit as f64 * 0.6;
    let past_threshold = |idx: usize| cropped[..idx].chars().count() as f64 > threshold;

    if let Some(nl) = cropped.rfind('\n').filter(|&i| past_threshold(i)) {
        return format!("{}\n...\n(text shortened to fit the message limit)", &cropped[..nl]);
    }
    if let Some(sp) = cropped.rfind(' ').filter(|&i| past_threshold(i)) {
        return format!("{} … (shortened)", &cropped[..sp]);
    }
    format!("{cropped} … (shortened)")
}

/// Split `text` into pieces of at most `limit` characters, preferring to
/// break before a newline that is more than 200 characters into the piece.
pub fn split_chunks(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some((end, _)) = rest.char_indices().nth(limit) else {
            chunks.push(rest);
            break;
        };
        let window = &rest[..end];
        let cut = match window.rfind('\n') {
            Some(nl) if window[..nl].chars().count() > 200 => nl,
            _ => end,
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize, tag: &str, use_case: Option<&str>) -> DigestItem {
        DigestItem {
            url: format!("https://site.com/2025/{n}"),
            title: format!("Item {n}"),
            summary: format!("Summary {n}"),
            score: n as f64,
            use_case: use_case.map(str::to_string),
            source_tag: tag.to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn test_news_message_layout() {
        let msg = format_news_message(
            "https://openai.com/2025/x",
            "GPT <5> launch\nIt is here.\nMore text.",
            "#AI",
            "#AI",
        );
        assert!(msg.starts_with("💡 What happened: GPT &lt;5&gt; launch\n\nIt is here. More text."));
        assert!(msg.contains("🔗 Source: https://openai.com/2025/x"));
        assert!(msg.ends_with("#ITNews #AI #AI"));
    }

    #[test]
    fn test_split_title_and_body_defaults() {
        let (title, body) = split_title_and_body("   \n\n");
        assert_eq!(title, "Fresh news from the IT world");
        assert!(body.is_empty());

        let long = "x".repeat(300);
        let (title, _) = split_title_and_body(&long);
        assert_eq!(title.chars().count(), 200);
    }

    #[test]
    fn test_tools_digest_lists_every_item() {
        let tools = vec![
            item(1, "#DevTools", Some("Ship faster")),
            item(2, "#Python", None),
        ];
        let msg = format_tools_digest_message(&tools);
        assert!(msg.contains("1) Item 1 #DevTools"));
        assert!(msg.contains("Use case: Ship faster"));
        assert!(msg.contains("2) Item 2 #Python"));
        assert!(msg.contains("🔗 Source: https://site.com/2025/1"));
        assert!(msg.ends_with(TOOLS_HASHTAGS));
    }

    #[test]
    fn test_weekly_digest_empty_and_filled() {
        let empty = format_weekly_digest_message(&[]);
        assert!(empty.contains("Hardly any big news"));

        let msg = format_weekly_digest_message(&[item(7, "#AI", None)]);
        assert!(msg.contains("1) Item 7 #AI"));
        assert!(msg.ends_with(WEEKLY_HASHTAGS));
    }

    #[test]
    fn test_truncate_message_prefers_newline() {
        let text = format!("{}\n{}", "a".repeat(80), "b".repeat(100));
        let out = truncate_message(&text, 150);
        assert!(out.starts_with(&"a".repeat(80)));
        assert!(out.ends_with("(text shortened to fit the message limit)"));
        assert!(!out.contains('b'));
    }

    #[test]
    fn test_truncate_message_hard_cut() {
        let text = "z".repeat(500);
        let out = truncate_message(&text, 100);
        assert_eq!(out, format!("{} … (shortened)", "z".repeat(50)));
        assert_eq!(truncate_message("short", 100), "short");
    }

    #[test]
    fn test_split_chunks() {
        assert_eq!(split_chunks("hello", 10), vec!["hello"]);

        let text = "x".repeat(25);
        let chunks = split_chunks(&text, 10);
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![10, 10, 5]);

        let text = format!("{}\n{}", "a".repeat(250), "b".repeat(100));
        let chunks = split_chunks(&text, 300);
        assert_eq!(chunks[0], "a".repeat(250));
        assert_eq!(chunks[1], format!("\n{}", "b".repeat(100)));
    }
}
