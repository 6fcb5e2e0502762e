//! FaqHarvest core: question/answer extraction from card-based FAQ pages.
//!
//! Everything here is synchronous and works on already-rendered HTML. The
//! browser, persistence and metrics live in `faq-harvest-runtime`.

pub mod assembler;
pub mod category;
pub mod error;
pub mod extractor;
pub mod model;
pub mod navigation;
pub mod text;

pub use assembler::{join_fragments, AnswerAssembler, OrdinalMode};
pub use category::{
    category_display_name, select_strategy, CategoryConfig, CategoryId, ExtractionStrategy,
};
pub use error::ExtractError;
pub use extractor::{extract, extract_html, CategoryExtraction, ExtractOptions};
pub use model::{CategoryResult, FaqRecord, ScrapeOutcome};
pub use navigation::{discover_category_urls, fallback_category_urls};
