//! [`AstAdapter`] implementation backed by Tree-sitter extractors.

use callgate_core::{AstAdapter, CallSite, Location, ParseError, SourceUnit};
use tree_sitter::Parser;

use crate::extractor::{first_error, FileFacts, LanguageExtractor};
use crate::java::JavaExtractor;
use crate::kotlin::KotlinExtractor;
use crate::symbols::SymbolTable;

/// Parses Java and Kotlin units and resolves call owners file-locally.
///
/// Owners are resolved during [`traverse`](AstAdapter::traverse), so the
/// default [`resolve_owner_type`](AstAdapter::resolve_owner_type) applies.
pub struct TreeSitterAdapter {
    extractors: Vec<Box<dyn LanguageExtractor>>,
    extensions: Vec<&'static str>,
}

impl TreeSitterAdapter {
    /// Adapter for Java (`.java`) and Kotlin (`.kt`, `.kts`).
    #[must_use]
    pub fn new() -> Self {
        Self::empty()
            .with_extractor(JavaExtractor::new())
            .with_extractor(KotlinExtractor::new())
    }

    /// Adapter with no languages registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Registers another language. Extensions already claimed stay with
    /// the earlier extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl LanguageExtractor + 'static) -> Self {
        for ext in extractor.extensions() {
            if !self.extensions.contains(ext) {
                self.extensions.push(ext);
            }
        }
        self.extractors.push(Box::new(extractor));
        self
    }

    fn extractor_for(&self, extension: &str) -> Option<&dyn LanguageExtractor> {
        self.extractors
            .iter()
            .find(|e| e.extensions().contains(&extension))
            .map(|e| e.as_ref())
    }

    /// Parses `source` and extracts its facts, failing on any syntax error.
    fn parse(
        extractor: &dyn LanguageExtractor,
        source: &str,
    ) -> Result<FileFacts, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&extractor.language())
            .map_err(|e| ParseError::Parser(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::Parser("parser produced no tree".into()))?;
        let root = tree.root_node();

        if let Some(node) = first_error(root) {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                "unexpected syntax".to_owned()
            };
            return Err(ParseError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            });
        }

        Ok(extractor.extract(root, source.as_bytes()))
    }
}

impl Default for TreeSitterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AstAdapter for TreeSitterAdapter {
    fn extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    fn traverse(&self, unit: &SourceUnit, source: &str) -> Result<Vec<CallSite>, ParseError> {
        let extension = unit.extension();
        let extractor =
            self.extractor_for(&extension)
                .ok_or_else(|| ParseError::UnsupportedLanguage {
                    extension: extension.clone(),
                })?;

        let facts = Self::parse(extractor, source)?;
        let symbols = SymbolTable::new(&facts, extractor.implicit_types());

        let calls: Vec<CallSite> = facts
            .calls
            .into_iter()
            .map(|call| {
                let location = Location::new(unit.path().to_path_buf(), call.line, call.column)
                    .with_span(call.offset, call.length);
                match call.receiver {
                    Some(receiver) => {
                        let owner = symbols.resolve_receiver(&receiver);
                        CallSite::with_receiver(receiver, call.method, owner, location)
                    }
                    None => {
                        let owner = symbols.resolve_bare(&call.method);
                        CallSite::bare(call.method, owner, location)
                    }
                }
            })
            .collect();

        tracing::trace!(
            "{}: {} calls ({})",
            unit.path().display(),
            calls.len(),
            extractor.language_id()
        );
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callgate_core::OwnerType;

    fn traverse(path: &str, source: &str) -> Result<Vec<CallSite>, ParseError> {
        let unit = SourceUnit::in_memory(path, source);
        TreeSitterAdapter::new().traverse(&unit, source)
    }

    fn owner_of<'a>(calls: &'a [CallSite], receiver: &str, method: &str) -> &'a OwnerType {
        &calls
            .iter()
            .find(|c| c.receiver.as_deref() == Some(receiver) && c.method == method)
            .unwrap()
            .owner
    }

    #[test]
    fn registers_java_and_kotlin_extensions() {
        let adapter = TreeSitterAdapter::new();
        assert_eq!(adapter.extensions(), &[".java", ".kt", ".kts"]);
    }

    #[test]
    fn resolves_java_log_import() {
        let calls = traverse(
            "Main.java",
            "import android.util.Log;\nclass Main { void f() { Log.d(\"t\", \"m\"); } }\n",
        )
        .unwrap();
        assert_eq!(
            owner_of(&calls, "Log", "d"),
            &OwnerType::Resolved("android.util.Log".into())
        );
    }

    #[test]
    fn resolves_java_field_type() {
        let calls = traverse(
            "Main.java",
            "import com.example.MyLogger;\nclass Main {\n  MyLogger myLogger;\n  void f() { myLogger.d(\"t\"); }\n}\n",
        )
        .unwrap();
        assert_eq!(
            owner_of(&calls, "myLogger", "d"),
            &OwnerType::Resolved("com.example.MyLogger".into())
        );
    }

    #[test]
    fn wildcard_import_stays_unresolved() {
        let calls = traverse(
            "Main.java",
            "import android.util.*;\nclass Main { void f() { Log.d(\"t\", \"m\"); } }\n",
        )
        .unwrap();
        assert_eq!(owner_of(&calls, "Log", "d"), &OwnerType::Unresolved);
    }

    #[test]
    fn java_lang_is_implicit() {
        let calls = traverse(
            "Main.java",
            "class Main { void f() { System.exit(0); } }\n",
        )
        .unwrap();
        assert_eq!(
            owner_of(&calls, "System", "exit"),
            &OwnerType::Resolved("java.lang.System".into())
        );
    }

    #[test]
    fn malformed_java_is_a_syntax_error() {
        let err = traverse("Bad.java", "class Bad { void f( { }\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn unsupported_extension() {
        let err = traverse("notes.txt", "Log.d()").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedLanguage {
                extension: ".txt".into()
            }
        );
    }

    #[test]
    fn resolves_kotlin_log_import() {
        let calls = traverse(
            "Main.kt",
            "import android.util.Log\n\nfun f() {\n    Log.d(\"t\", \"m\")\n}\n",
        )
        .unwrap();
        assert_eq!(
            owner_of(&calls, "Log", "d"),
            &OwnerType::Resolved("android.util.Log".into())
        );
    }

    #[test]
    fn call_locations_carry_the_unit_path() {
        let calls = traverse(
            "src/Main.java",
            "class Main { void f() { x(); } }\n",
        )
        .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].location.file, std::path::PathBuf::from("src/Main.java"));
        assert!(!calls[0].has_receiver());
    }
}
