// zcl-config/src/lib.rs
// ============================================================================
// Crate: zcl-config
// Description: Campaign spec loading, lint, schema, and docs generation.
// Purpose: Single source of truth for `campaign.toml`/`suite.toml` semantics.
// Dependencies: zcl-core, zcl-gate, serde, toml
// ============================================================================

//! # zcl-config
//!
//! Campaign and suite documents are untrusted input: [`load`] fails closed
//! on oversized files, path traversal, and malformed TOML before a single
//! field is validated. [`lint`] then checks the cross-field rules a bare
//! `Deserialize` cannot express (tool-policy shape, prompt-mode vocabulary,
//! oracle wiring).

#![deny(missing_docs)]

pub mod docs;
pub mod examples;
pub mod lint;
pub mod load;
pub mod schema;

pub use docs::config_docs_markdown;
pub use examples::campaign_toml_example;
pub use lint::LintFinding;
pub use lint::lint;
pub use load::ConfigError;
pub use load::load_campaign;
pub use load::load_suite;
