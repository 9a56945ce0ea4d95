//! # callgate-ts
//!
//! Tree-sitter based [`AstAdapter`](callgate_core::AstAdapter) for Java and
//! Kotlin sources.
//!
//! Each language plugs in through [`LanguageExtractor`], which turns a
//! syntax tree into [`FileFacts`]: package, imports, declared types, typed
//! variables and method calls. A per-file [`SymbolTable`] then resolves the
//! owner type of every call.
//!
//! - [`JavaExtractor`] for `.java`
//! - [`KotlinExtractor`] for `.kt` / `.kts`
//! - [`TreeSitterAdapter`] combining both behind the core adapter trait

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
pub mod extractor;
pub mod java;
pub mod kotlin;
pub mod symbols;

pub use adapter::TreeSitterAdapter;
pub use extractor::{FileFacts, LanguageExtractor};
pub use java::JavaExtractor;
pub use kotlin::KotlinExtractor;
pub use symbols::SymbolTable;
