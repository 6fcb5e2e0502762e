//! Answer Assembler: turns the nodes after a question heading into answer
//! fragments.
//!
//! Walks the question's following siblings in document order and stops at
//! the next question heading. Answer paragraphs become one fragment each;
//! every list item becomes one prefixed line, nested lists indented two
//! spaces per level. When nothing structured is found, every answer
//! paragraph of the enclosing container is used instead.

use crate::text;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Separator between fragments in a joined answer.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";
/// Prefix for unordered list items.
pub const BULLET: &str = "- ";
/// Indent added per list nesting level.
pub const NEST_INDENT: &str = "  ";

/// How ordered list items are numbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrdinalMode {
    /// Number is one more than the fragments emitted so far for this answer,
    /// so numbering continues across paragraphs and earlier lists.
    #[default]
    Cumulative,
    /// Number is the item's 1-based position within its own list.
    PerList,
}

impl FromStr for OrdinalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cumulative" => Ok(Self::Cumulative),
            "per-list" | "per_list" => Ok(Self::PerList),
            other => Err(format!(
                "unknown ordinal mode `{other}` (expected `cumulative` or `per-list`)"
            )),
        }
    }
}

impl std::fmt::Display for OrdinalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cumulative => f.write_str("cumulative"),
            Self::PerList => f.write_str("per-list"),
        }
    }
}

/// Following element siblings of `node`, in document order.
pub fn following_siblings<'a>(node: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    node.next_siblings().filter_map(ElementRef::wrap)
}

fn is_list(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "ul" | "ol")
}

/// Outermost `<ul>`/`<ol>` elements below `item`, at any depth, in document
/// order. These are exactly the lists [`text::own_text`] leaves out.
fn nearest_lists(item: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut lists = Vec::new();
    for child in item.children().filter_map(ElementRef::wrap) {
        if is_list(child) {
            lists.push(child);
        } else {
            lists.extend(nearest_lists(child));
        }
    }
    lists
}

/// Join fragments into one answer string. No fragments gives `""`.
pub fn join_fragments(fragments: &[String]) -> String {
    fragments.join(FRAGMENT_SEPARATOR)
}

pub struct AnswerAssembler<'s> {
    question: &'s Selector,
    answer: &'s Selector,
    ordinals: OrdinalMode,
}

impl<'s> AnswerAssembler<'s> {
    /// `question` identifies the node that ends an answer, `answer` the
    /// paragraphs carrying answer text.
    pub fn new(question: &'s Selector, answer: &'s Selector, ordinals: OrdinalMode) -> Self {
        Self {
            question,
            answer,
            ordinals,
        }
    }

    /// Assemble fragments from `following`, the nodes after one question.
    ///
    /// `container` is the content container the question lives in; it is
    /// only consulted when `following` yields no fragments at all.
    pub fn assemble<'a, I>(&self, following: I, container: Option<ElementRef<'a>>) -> Vec<String>
    where
        I: IntoIterator<Item = ElementRef<'a>>,
    {
        let mut fragments = Vec::new();

        for node in following {
            if self.question.matches(&node) {
                break;
            }

            if is_list(node) {
                self.push_list(node, 0, &mut fragments);
            } else if self.answer.matches(&node) {
                let paragraph = text::inner_text(node);
                if !paragraph.is_empty() {
                    fragments.push(paragraph);
                }
            }
        }

        if fragments.is_empty() {
            if let Some(container) = container {
                fragments = self.loose_paragraphs(container);
            }
        }

        fragments
    }

    /// Assemble the answer following `question` and join it.
    pub fn answer_for<'a>(&self, question: ElementRef<'a>, container: Option<ElementRef<'a>>) -> String {
        join_fragments(&self.assemble(following_siblings(question), container))
    }

    fn push_list(&self, list: ElementRef<'_>, depth: usize, fragments: &mut Vec<String>) {
        let ordered = list.value().name() == "ol";
        let indent = NEST_INDENT.repeat(depth);
        let mut position = 0;

        for item in list.children().filter_map(ElementRef::wrap) {
            if item.value().name() != "li" {
                continue;
            }

            let item_text = text::own_text(item);
            if !item_text.is_empty() {
                position += 1;
                let prefix = if ordered {
                    let ordinal = match self.ordinals {
                        OrdinalMode::Cumulative => fragments.len() + 1,
                        OrdinalMode::PerList => position,
                    };
                    format!("{ordinal}. ")
                } else {
                    BULLET.to_string()
                };
                fragments.push(format!("{indent}{prefix}{item_text}"));
            }

            for nested in nearest_lists(item) {
                self.push_list(nested, depth + 1, fragments);
            }
        }
    }

    fn loose_paragraphs(&self, container: ElementRef<'_>) -> Vec<String> {
        container
            .select(self.answer)
            .map(text::inner_text)
            .filter(|paragraph| !paragraph.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    struct Fixture {
        doc: Html,
        question: Selector,
        answer: Selector,
        container: Selector,
    }

    impl Fixture {
        fn new(body: &str) -> Self {
            Self {
                doc: Html::parse_document(&format!(
                    "<html><body><div class='card-body'>{body}</div></body></html>"
                )),
                question: Selector::parse("h6.card-title").unwrap(),
                answer: Selector::parse("p.card-text").unwrap(),
                container: Selector::parse("div.card-body").unwrap(),
            }
        }

        /// Fragments for the `n`th question heading.
        fn fragments(&self, n: usize, ordinals: OrdinalMode) -> Vec<String> {
            let assembler = AnswerAssembler::new(&self.question, &self.answer, ordinals);
            let container = self.doc.select(&self.container).next();
            let question = self.doc.select(&self.question).nth(n).unwrap();
            assembler.assemble(following_siblings(question), container)
        }
    }

    #[test]
    fn test_paragraph_unchanged() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6><p class='card-text'>You can search for free.</p>",
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::Cumulative),
            ["You can search for free."]
        );
    }

    #[test]
    fn test_unordered_and_ordered_lists() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q1</h6><ul><li>A</li><li>B</li></ul>\
             <h6 class='card-title'>Q2</h6><ol><li>A</li><li>B</li></ol>",
        );
        assert_eq!(f.fragments(0, OrdinalMode::Cumulative), ["- A", "- B"]);
        assert_eq!(f.fragments(1, OrdinalMode::Cumulative), ["1. A", "2. B"]);
    }

    #[test]
    fn test_stops_at_next_question() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q1</h6><p class='card-text'>one</p>\
             <h6 class='card-title'>Q2</h6><p class='card-text'>two</p>",
        );
        assert_eq!(f.fragments(0, OrdinalMode::Cumulative), ["one"]);
        assert_eq!(f.fragments(1, OrdinalMode::Cumulative), ["two"]);
    }

    #[test]
    fn test_nested_list_is_indented() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6>\
             <ol><li>First<ul><li>X</li></ul></li><li>Second</li></ol>",
        );
        let fragments = f.fragments(0, OrdinalMode::Cumulative);
        assert_eq!(fragments, ["1. First", "  - X", "3. Second"]);
        assert!(fragments[1].starts_with("  "));
        assert!(!fragments[0].starts_with(' '));
    }

    #[test]
    fn test_list_wrapped_inside_item_is_kept() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6>\
             <ul><li>Bring documents:<div><ul><li>Photo ID</li><li>Deed</li></ul></div></li></ul>",
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::Cumulative),
            ["- Bring documents:", "  - Photo ID", "  - Deed"]
        );
    }

    #[test]
    fn test_nested_list_uses_its_own_tag() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6>\
             <ul><li>Docs<ol><li>ID</li><li>Deed</li></ol></li></ul>",
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::PerList),
            ["- Docs", "  1. ID", "  2. Deed"]
        );
    }

    #[test]
    fn test_cumulative_ordinals_continue_after_paragraph() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6><p class='card-text'>Steps:</p>\
             <ol><li>Search</li><li>Claim</li></ol>",
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::Cumulative),
            ["Steps:", "2. Search", "3. Claim"]
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::PerList),
            ["Steps:", "1. Search", "2. Claim"]
        );
    }

    #[test]
    fn test_fallback_uses_container_paragraphs() {
        let f = Fixture::new(
            "<div><p class='card-text'>Loose one</p></div>\
             <h6 class='card-title'>Q</h6><span>no answer markup</span>\
             <div><p class='card-text'>Loose two</p></div>",
        );
        assert_eq!(
            f.fragments(0, OrdinalMode::Cumulative),
            ["Loose one", "Loose two"]
        );
    }

    #[test]
    fn test_fallback_does_not_override_structured_content() {
        let f = Fixture::new(
            "<p class='card-text'>Elsewhere</p>\
             <h6 class='card-title'>Q</h6><ul><li>Only this</li></ul>",
        );
        assert_eq!(f.fragments(0, OrdinalMode::Cumulative), ["- Only this"]);
    }

    #[test]
    fn test_empty_answer() {
        let f = Fixture::new("<h6 class='card-title'>Q</h6><p class='card-text'>   </p>");
        let fragments = f.fragments(0, OrdinalMode::Cumulative);
        assert!(fragments.is_empty());
        assert_eq!(join_fragments(&fragments), "");
    }

    #[test]
    fn test_unmarked_paragraphs_are_ignored() {
        let f = Fixture::new(
            "<h6 class='card-title'>Q</h6><p>plain</p><p class='card-text'>marked</p>",
        );
        assert_eq!(f.fragments(0, OrdinalMode::Cumulative), ["marked"]);
    }

    #[test]
    fn test_join_uses_blank_line() {
        let fragments = vec!["a".to_string(), "- b".to_string()];
        assert_eq!(join_fragments(&fragments), "a\n\n- b");
    }

    #[test]
    fn test_ordinal_mode_parse() {
        assert_eq!("per-list".parse::<OrdinalMode>(), Ok(OrdinalMode::PerList));
        assert_eq!("cumulative".parse::<OrdinalMode>(), Ok(OrdinalMode::Cumulative));
        assert!("sequential".parse::<OrdinalMode>().is_err());
    }
}
