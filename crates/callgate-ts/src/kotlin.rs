//! Kotlin language extractor using Tree-sitter.

use tree_sitter::{Language, Node};

use crate::extractor::{
    compact_text, declared_name, enclosing_types, is_identifier, normalize_type, raw_call,
    starts_uppercase, text, walk, DeclInfo, FileFacts, ImportInfo, ImportKind, LanguageExtractor,
    VarDecl,
};

const TYPE_DECLARATIONS: &[&str] = &["class_declaration", "object_declaration"];

const TYPE_NODES: &[&str] = &["user_type", "nullable_type", "type", "type_identifier"];

/// Extracts imports, declarations, typed properties and method calls from Kotlin source.
pub struct KotlinExtractor {
    language: Language,
}

impl KotlinExtractor {
    /// Creates a new Kotlin extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }

    /// Join identifier children of a `qualified_identifier` node with dots.
    fn qualified_id(node: &Node<'_>, src: &[u8]) -> String {
        if node.kind() != "qualified_identifier" {
            return compact_text(node, src);
        }
        let mut parts = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "identifier" {
                parts.push(text(&child, src).to_owned());
            }
        }
        parts.join(".")
    }

    fn extract_package(node: &Node<'_>, src: &[u8]) -> Option<String> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "qualified_identifier" | "identifier"))
            .map(|c| Self::qualified_id(&c, src));
        found
    }

    /// `import a.b.C`, `import a.b.C as D`, `import a.b.*`, `import a.b.C.member`.
    fn extract_import(node: &Node<'_>, src: &[u8]) -> Option<ImportInfo> {
        let mut path = None;
        let mut alias = None;
        let mut is_wildcard = false;
        let mut after_as = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "qualified_identifier" if path.is_none() => {
                    path = Some(Self::qualified_id(&child, src));
                }
                "identifier" if path.is_none() && !after_as => {
                    path = Some(text(&child, src).to_owned());
                }
                "identifier" | "simple_identifier" | "type_identifier" if after_as => {
                    alias = Some(text(&child, src).to_owned());
                }
                "import_alias" => {
                    alias = declared_name(&child, src);
                }
                "as" => after_as = true,
                "*" | ".*" | "wildcard_import" => is_wildcard = true,
                _ => {}
            }
        }

        let path = path?;
        let segments: Vec<&str> = path.split('.').collect();
        let kind = if is_wildcard {
            ImportKind::Wildcard
        } else {
            match segments.as_slice() {
                [.., owner, member] if starts_uppercase(owner) && !starts_uppercase(member) => {
                    ImportKind::Member
                }
                [.., last] if !starts_uppercase(last) => {
                    // Top-level function or package; nothing to resolve against.
                    return None;
                }
                _ => ImportKind::Type,
            }
        };

        Some(ImportInfo {
            path,
            alias,
            kind,
        })
    }

    fn extract_declaration(node: &Node<'_>, src: &[u8]) -> Option<DeclInfo> {
        let name = declared_name(node, src)?;
        let mut nested = enclosing_types(node, src, TYPE_DECLARATIONS);
        nested.push(name.clone());
        Some(DeclInfo {
            name,
            nested_name: nested.join("."),
        })
    }

    fn first_named<'t>(node: &Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| kinds.contains(&c.kind()));
        found
    }

    /// `name: Type` inside a `variable_declaration`, `parameter` or `class_parameter`.
    fn typed_name(node: &Node<'_>, src: &[u8]) -> (Option<String>, Option<String>) {
        let name = Self::first_named(node, &["identifier", "simple_identifier"])
            .map(|n| text(&n, src).to_owned());
        let type_name =
            Self::first_named(node, TYPE_NODES).map(|t| normalize_type(text(&t, src)));
        (name, type_name)
    }

    /// `val x: Type = ..` or `val x = Type(..)`.
    fn extract_property(node: &Node<'_>, src: &[u8]) -> Option<VarDecl> {
        let declaration = Self::first_named(node, &["variable_declaration"])?;
        let (name, declared) = Self::typed_name(&declaration, src);
        let name = name?;
        let type_name = declared.or_else(|| {
            let init = Self::first_named(node, &["call_expression"])?;
            let callee = init.named_child(0)?;
            let callee_text = text(&callee, src);
            (callee.kind() == "identifier" && starts_uppercase(callee_text))
                .then(|| callee_text.to_owned())
        })?;
        Some(VarDecl { name, type_name })
    }

    fn extract_parameter(node: &Node<'_>, src: &[u8]) -> Option<VarDecl> {
        match Self::typed_name(node, src) {
            (Some(name), Some(type_name)) => Some(VarDecl { name, type_name }),
            _ => None,
        }
    }

    /// Method name node of a navigation, looking through `navigation_suffix` when present.
    fn member_name<'t>(navigation: &Node<'t>) -> Option<Node<'t>> {
        let mut cursor = navigation.walk();
        let children: Vec<Node<'t>> = navigation.named_children(&mut cursor).collect();
        if children.len() < 2 {
            return None;
        }
        let last = *children.last()?;
        if last.kind() == "navigation_suffix" {
            let mut cursor = last.walk();
            let found = last.named_children(&mut cursor).last();
            return found;
        }
        Some(last)
    }

    fn extract_call(node: &Node<'_>, src: &[u8], facts: &mut FileFacts) {
        let Some(callee) = node.named_child(0) else {
            return;
        };
        match callee.kind() {
            "navigation_expression" => {
                let receiver = callee.named_child(0);
                let (Some(receiver), Some(name)) = (receiver, Self::member_name(&callee)) else {
                    return;
                };
                let method = text(&name, src)
                    .trim_start_matches(&['?', '.', ':'][..])
                    .to_owned();
                if !is_identifier(&method) {
                    return;
                }
                let receiver = compact_text(&receiver, src);
                facts.calls.push(raw_call(node, &name, Some(receiver), method));
            }
            "identifier" | "simple_identifier" => {
                let method = text(&callee, src).to_owned();
                // `Foo()` is a constructor call.
                if starts_uppercase(&method) {
                    return;
                }
                facts.calls.push(raw_call(node, &callee, None, method));
            }
            _ => {}
        }
    }
}

impl Default for KotlinExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for KotlinExtractor {
    fn language_id(&self) -> &'static str {
        "kotlin"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".kt", ".kts"]
    }

    fn language(&self) -> Language {
        self.language.clone()
    }

    fn extract(&self, root: Node<'_>, src: &[u8]) -> FileFacts {
        let mut facts = FileFacts::default();

        walk(root, |node| match node.kind() {
            "package_header" => facts.package = Self::extract_package(&node, src),
            "import" | "import_header" => {
                if let Some(import) = Self::extract_import(&node, src) {
                    facts.imports.push(import);
                }
            }
            "class_declaration" | "object_declaration" => {
                if let Some(decl) = Self::extract_declaration(&node, src) {
                    facts.declarations.push(decl);
                }
            }
            "property_declaration" => {
                if let Some(var) = Self::extract_property(&node, src) {
                    facts.variables.push(var);
                }
            }
            "parameter" | "class_parameter" => {
                if let Some(var) = Self::extract_parameter(&node, src) {
                    facts.variables.push(var);
                }
            }
            "call_expression" => Self::extract_call(&node, src, &mut facts),
            _ => {}
        });

        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn extract(source: &str) -> FileFacts {
        let extractor = KotlinExtractor::new();
        let mut parser = Parser::new();
        parser.set_language(&extractor.language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        extractor.extract(tree.root_node(), source.as_bytes())
    }

    #[test]
    fn extracts_package() {
        let facts = extract("package com.example.domain.model\n");
        assert_eq!(facts.package.as_deref(), Some("com.example.domain.model"));
    }

    #[test]
    fn extracts_imports() {
        let facts = extract(
            "package com.example.app\nimport android.util.Log\nimport com.example.MyLogger\n",
        );
        let paths: Vec<_> = facts.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["android.util.Log", "com.example.MyLogger"]);
        assert!(facts.imports.iter().all(|i| i.kind == ImportKind::Type));
    }

    #[test]
    fn extracts_aliased_import() {
        let facts = extract("import timber.log.Timber as T\n");
        assert_eq!(facts.imports.len(), 1);
        let import = &facts.imports[0];
        assert_eq!(import.path, "timber.log.Timber");
        assert_eq!(import.alias.as_deref(), Some("T"));
        assert_eq!(import.kind, ImportKind::Type);
        assert_eq!(import.local_name(), "T");
    }

    #[test]
    fn types_parameters_and_class_parameters() {
        let facts = extract(
            "class A(private val log: MyLogger) {\n    fun f(other: Other) {\n        log.d(\"t\", \"m\")\n    }\n}\n",
        );
        let vars: Vec<(&str, &str)> = facts
            .variables
            .iter()
            .map(|v| (v.name.as_str(), v.type_name.as_str()))
            .collect();
        assert!(vars.contains(&("log", "MyLogger")), "{vars:?}");
        assert!(vars.contains(&("other", "Other")), "{vars:?}");
    }

    #[test]
    fn infers_property_type_from_constructor_call() {
        let facts = extract("fun f() {\n    val logger = MyLogger()\n    logger.d(\"t\")\n}\n");
        assert_eq!(
            facts.variables,
            vec![VarDecl {
                name: "logger".into(),
                type_name: "MyLogger".into(),
            }]
        );
        assert_eq!(facts.calls.len(), 1);
        assert_eq!(facts.calls[0].receiver.as_deref(), Some("logger"));
    }

    #[test]
    fn extracts_class() {
        let facts = extract("package com.example.domain\nclass User(val id: Long)\n");
        assert_eq!(facts.declarations.len(), 1);
        assert_eq!(facts.declarations[0].name, "User");
    }

    #[test]
    fn extracts_object() {
        let facts = extract("package com.example.domain\nobject Factory { }\n");
        assert_eq!(facts.declarations[0].name, "Factory");
    }

    #[test]
    fn extracts_receiver_calls() {
        let facts = extract("fun f() {\n    Log.d(\"tag\", \"msg\")\n}\n");
        assert_eq!(facts.calls.len(), 1);
        let call = &facts.calls[0];
        assert_eq!(call.receiver.as_deref(), Some("Log"));
        assert_eq!(call.method, "d");
        assert_eq!(call.line, 2);
    }

    #[test]
    fn constructor_calls_are_not_method_calls() {
        let facts = extract("fun f() {\n    val x = Foo()\n}\n");
        assert!(facts.calls.is_empty());
    }

    #[test]
    fn empty_source() {
        let facts = extract("");
        assert!(facts.package.is_none());
        assert!(facts.imports.is_empty());
        assert!(facts.declarations.is_empty());
        assert!(facts.calls.is_empty());
    }
}
