//! Question Extractor: one [`FaqRecord`] per question heading (or per link,
//! for link-list categories) inside a category's content container.

use crate::assembler::{following_siblings, join_fragments, AnswerAssembler, OrdinalMode};
use crate::category::{CategoryConfig, ExtractionStrategy};
use crate::error::{ExtractError, Result};
use crate::model::FaqRecord;
use crate::text;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

/// Parse a CSS selector, mapping the parser error into [`ExtractError`].
pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Whether `css` matches any element of `html`.
pub fn selector_present(html: &str, css: &str) -> Result<bool> {
    let selector = parse_selector(css)?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}

/// The selectors of a [`CategoryConfig`], compiled once per extraction.
struct CompiledSelectors {
    container: Selector,
    question: Selector,
    question_fallback: Option<Selector>,
    answer: Selector,
    link: Selector,
}

impl CompiledSelectors {
    fn compile(config: &CategoryConfig) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&config.container_selector)?,
            question: parse_selector(&config.question_selector)?,
            question_fallback: config
                .question_fallback_selector
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            answer: parse_selector(&config.answer_selector)?,
            link: parse_selector(&config.link_selector)?,
        })
    }
}

/// Records of one category page plus the questions that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryExtraction {
    pub records: Vec<FaqRecord>,
    pub skipped: Vec<ExtractError>,
    /// False when the page had no content container at all.
    pub container_found: bool,
}

/// Options that apply to every category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub ordinals: OrdinalMode,
}

/// Extract records from a parsed page.
///
/// A missing container yields an empty extraction with a warning. A question
/// that cannot be read is skipped and reported in `skipped`; the rest of the
/// category is still extracted. Only an invalid selector in `config` is an
/// error.
pub fn extract(
    document: &Html,
    config: &CategoryConfig,
    options: ExtractOptions,
) -> Result<CategoryExtraction> {
    let selectors = CompiledSelectors::compile(config)?;

    let Some(container) = document.select(&selectors.container).next() else {
        warn!(
            category = %config.id,
            selector = %config.container_selector,
            "no content container found"
        );
        return Ok(CategoryExtraction::default());
    };

    let mut extraction = match config.strategy {
        ExtractionStrategy::QaCards => extract_questions(container, &selectors, options),
        ExtractionStrategy::LinkList => extract_links(container, &selectors),
    };
    extraction.container_found = true;

    info!(
        category = %config.id,
        strategy = %config.strategy,
        records = extraction.records.len(),
        skipped = extraction.skipped.len(),
        "extracted category"
    );
    Ok(extraction)
}

/// Parse `html` and extract records from it.
pub fn extract_html(
    html: &str,
    config: &CategoryConfig,
    options: ExtractOptions,
) -> Result<CategoryExtraction> {
    let document = Html::parse_document(html);
    extract(&document, config, options)
}

fn extract_questions(
    container: ElementRef<'_>,
    selectors: &CompiledSelectors,
    options: ExtractOptions,
) -> CategoryExtraction {
    let mut question_selector = &selectors.question;
    let mut questions: Vec<ElementRef<'_>> = container.select(question_selector).collect();

    if questions.is_empty() {
        if let Some(fallback) = &selectors.question_fallback {
            questions = container.select(fallback).collect();
            if !questions.is_empty() {
                debug!(count = questions.len(), "using fallback question marker");
                question_selector = fallback;
            }
        }
    }

    info!(count = questions.len(), "found questions");

    let assembler = AnswerAssembler::new(question_selector, &selectors.answer, options.ordinals);
    let mut extraction = CategoryExtraction::default();

    for (i, question) in questions.into_iter().enumerate() {
        match read_question(i + 1, question, container, &assembler) {
            Ok(record) => {
                if !record.has_answer() {
                    warn!(question = %record.question, "no answer found for question");
                }
                extraction.records.push(record);
            }
            Err(e) => {
                warn!("skipping question: {e}");
                extraction.skipped.push(e);
            }
        }
    }

    extraction
}

fn read_question(
    index: usize,
    question: ElementRef<'_>,
    container: ElementRef<'_>,
    assembler: &AnswerAssembler<'_>,
) -> Result<FaqRecord> {
    let question_text = text::inner_text(question);
    if question_text.is_empty() {
        return Err(ExtractError::EmptyQuestion { index });
    }
    debug!(index, question = %question_text, "processing question");

    let fragments = assembler.assemble(following_siblings(question), Some(container));
    Ok(FaqRecord::new(question_text, join_fragments(&fragments)))
}

fn extract_links(container: ElementRef<'_>, selectors: &CompiledSelectors) -> CategoryExtraction {
    let links: Vec<ElementRef<'_>> = container.select(&selectors.link).collect();
    info!(count = links.len(), "found links");

    let mut extraction = CategoryExtraction::default();
    for (i, link) in links.into_iter().enumerate() {
        match read_link(i + 1, link) {
            Ok(record) => extraction.records.push(record),
            Err(e) => {
                debug!("skipping link: {e}");
                extraction.skipped.push(e);
            }
        }
    }
    extraction
}

fn read_link(index: usize, link: ElementRef<'_>) -> Result<FaqRecord> {
    let link_text = text::inner_text(link).replace('\n', " ");
    if link_text.is_empty() {
        return Err(ExtractError::EmptyLinkText { index });
    }
    let href = link.value().attr("href").map(str::trim).unwrap_or("");
    if href.is_empty() {
        return Err(ExtractError::MissingHref {
            index,
            text: link_text,
        });
    }
    let answer = format!("[{link_text}]({href})");
    Ok(FaqRecord::new(link_text, answer))
}
