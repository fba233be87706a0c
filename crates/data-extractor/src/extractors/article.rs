use once_cell::sync::Lazy;
use perceiver_structural::{LiveDocument, SelectorList};

use super::fixed;
use crate::cascade::Cascade;
use crate::model::Article;

pub const MIN_PARAGRAPH_CHARS: usize = 25;
pub const MAX_PARAGRAPHS: usize = 200;

static TITLE: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "article.title",
        &[
            "article h1",
            "[itemprop=headline]",
            "h1",
            r#"meta[property="og:title"]"#,
            "title",
        ],
    )
});

static BYLINE: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "article.byline",
        &[
            "[itemprop=author]",
            "[rel=author]",
            ".byline",
            ".author",
            r#"meta[name="author"]"#,
        ],
    )
});

static PUBLISHED: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "article.published",
        &[
            "[itemprop=datePublished]",
            r#"meta[property="article:published_time"]"#,
            "article time[datetime]",
            "time[datetime]",
        ],
    )
});

static BODY: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(
        "article.body",
        &[
            "article",
            "[itemprop=articleBody]",
            "main",
            "[role=main]",
            ".post-content, .entry-content, .article-body",
            "#content",
        ],
    )
});

static PARAGRAPHS: Lazy<SelectorList> = Lazy::new(|| fixed("p"));

pub fn extract(doc: &LiveDocument) -> Option<Article> {
    let root = doc.arena().root();
    let container = BODY.first_node(doc, root).unwrap_or_else(|| doc.body());
    let paragraphs: Vec<String> = doc
        .select_within(container, &PARAGRAPHS)
        .into_iter()
        .map(|node| doc.text(node))
        .filter(|text| text.chars().count() >= MIN_PARAGRAPH_CHARS)
        .take(MAX_PARAGRAPHS)
        .collect();
    if paragraphs.is_empty() {
        return None;
    }
    let content = paragraphs.join("\n\n");
    Some(Article {
        title: TITLE.first_text(doc, root),
        byline: BYLINE.first_text(doc, root),
        published: PUBLISHED.first_text(doc, root),
        word_count: content.split_whitespace().count(),
        paragraphs,
        content,
    })
}
