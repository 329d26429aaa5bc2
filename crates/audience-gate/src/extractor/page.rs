use super::numeric::parse_exact;
use scraper::{Html, Selector};
use std::cell::OnceCell;
use std::sync::LazyLock;

static DESCRIPTION_META: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='description'], meta[property='og:description']")
        .expect("description selector parses")
});
static TITLED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[title]").expect("title selector parses"));

/// Captured markup plus a lazily parsed DOM shared by the strategies of one cascade.
pub struct Page<'a> {
    markup: &'a str,
    html: OnceCell<Html>,
    visible_text: OnceCell<String>,
}

impl<'a> Page<'a> {
    pub fn new(markup: &'a str) -> Self {
        Self {
            markup,
            html: OnceCell::new(),
            visible_text: OnceCell::new(),
        }
    }

    pub fn markup(&self) -> &'a str {
        self.markup
    }

    pub fn html(&self) -> &Html {
        self.html.get_or_init(|| Html::parse_document(self.markup))
    }

    /// Contents of the description metadata tags, in document order.
    pub fn description_meta(&self) -> Vec<&str> {
        self.html()
            .select(&DESCRIPTION_META)
            .filter_map(|meta| meta.value().attr("content"))
            .collect()
    }

    /// Exact integers held in `title` attributes.
    pub fn title_integers(&self) -> Vec<u64> {
        self.html()
            .select(&TITLED)
            .filter_map(|element| element.value().attr("title"))
            .filter_map(parse_exact)
            .collect()
    }

    /// Text a visitor would see: every text node outside script, style, and template.
    pub fn visible_text(&self) -> &str {
        self.visible_text.get_or_init(|| {
            let mut text = String::new();
            for node in self.html().tree.nodes() {
                let Some(fragment) = node.value().as_text() else {
                    continue;
                };
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element())
                    .map(|element| matches!(element.name(), "script" | "style" | "template"))
                    .unwrap_or(false);
                if !hidden {
                    text.push_str(fragment);
                    text.push(' ');
                }
            }
            text
        })
    }

    pub fn mentions_any(&self, needles: &[&str]) -> bool {
        let lower = self.markup.to_lowercase();
        needles.iter().any(|needle| lower.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts() {
        let page = Page::new(
            "<html><body><p>1,234 followers</p><script>var x = '99 followers';</script></body></html>",
        );
        let text = page.visible_text();
        assert!(text.contains("1,234 followers"));
        assert!(!text.contains("99 followers"));
    }

    #[test]
    fn title_integers_ignore_text_titles() {
        let page = Page::new(r#"<span title="12,345">12K</span><a title="profile">x</a>"#);
        assert_eq!(page.title_integers(), vec![12_345]);
    }
}
