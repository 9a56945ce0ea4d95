//! Java language extractor using Tree-sitter.

use tree_sitter::{Language, Node};

use crate::extractor::{
    compact_text, declared_name, enclosing_types, is_identifier, normalize_type, raw_call, text,
    walk, DeclInfo, FileFacts, ImportInfo, ImportKind, LanguageExtractor, VarDecl,
};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

/// `java.lang` types visible without an import.
const JAVA_LANG: &[(&str, &str)] = &[
    ("Boolean", "java.lang.Boolean"),
    ("Byte", "java.lang.Byte"),
    ("Character", "java.lang.Character"),
    ("Class", "java.lang.Class"),
    ("Double", "java.lang.Double"),
    ("Enum", "java.lang.Enum"),
    ("Error", "java.lang.Error"),
    ("Exception", "java.lang.Exception"),
    ("Float", "java.lang.Float"),
    ("Integer", "java.lang.Integer"),
    ("Long", "java.lang.Long"),
    ("Math", "java.lang.Math"),
    ("Object", "java.lang.Object"),
    ("Runtime", "java.lang.Runtime"),
    ("RuntimeException", "java.lang.RuntimeException"),
    ("Short", "java.lang.Short"),
    ("String", "java.lang.String"),
    ("StringBuilder", "java.lang.StringBuilder"),
    ("System", "java.lang.System"),
    ("Thread", "java.lang.Thread"),
    ("Throwable", "java.lang.Throwable"),
];

/// Extracts imports, declarations, typed variables and method calls from Java source.
pub struct JavaExtractor {
    language: Language,
}

impl JavaExtractor {
    /// Creates a new Java extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn extract_package(node: &Node<'_>, src: &[u8]) -> Option<String> {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| compact_text(&c, src));
        found
    }

    fn extract_import(node: &Node<'_>, src: &[u8]) -> Option<ImportInfo> {
        let mut is_static = false;
        let mut is_wildcard = false;
        let mut path = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => is_wildcard = true,
                "scoped_identifier" | "identifier" => path = Some(compact_text(&child, src)),
                _ => {}
            }
        }

        let kind = match (is_wildcard, is_static) {
            (true, _) => ImportKind::Wildcard,
            (false, true) => ImportKind::Member,
            (false, false) => ImportKind::Type,
        };
        Some(ImportInfo {
            path: path?,
            alias: None,
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

    /// `Type a, b = ..;` for fields and locals. `var x = new Type()` infers `Type`.
    fn extract_variables(node: &Node<'_>, src: &[u8], out: &mut Vec<VarDecl>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let written = normalize_type(text(&type_node, src));

        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let type_name = if written == "var" {
                match declarator.child_by_field_name("value") {
                    Some(value) if value.kind() == "object_creation_expression" => value
                        .child_by_field_name("type")
                        .map(|t| normalize_type(text(&t, src))),
                    _ => None,
                }
            } else {
                Some(written.clone())
            };
            if let Some(type_name) = type_name {
                out.push(VarDecl {
                    name: text(&name, src).to_owned(),
                    type_name,
                });
            }
        }
    }

    /// Parameters, enhanced-for variables and try-with-resources.
    fn extract_typed_name(node: &Node<'_>, src: &[u8]) -> Option<VarDecl> {
        let type_node = node.child_by_field_name("type")?;
        let name = node.child_by_field_name("name")?;
        let type_name = normalize_type(text(&type_node, src));
        (type_name != "var").then(|| VarDecl {
            name: text(&name, src).to_owned(),
            type_name,
        })
    }

    fn extract_call(node: &Node<'_>, src: &[u8], facts: &mut FileFacts) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let method = text(&name, src).to_owned();
        if !is_identifier(&method) {
            return;
        }
        let receiver = node
            .child_by_field_name("object")
            .map(|object| compact_text(&object, src));
        facts.calls.push(raw_call(node, &name, receiver, method));
    }
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for JavaExtractor {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".java"]
    }

    fn language(&self) -> Language {
        self.language.clone()
    }

    fn extract(&self, root: Node<'_>, src: &[u8]) -> FileFacts {
        let mut facts = FileFacts::default();

        walk(root, |node| match node.kind() {
            "package_declaration" => facts.package = Self::extract_package(&node, src),
            "import_declaration" => {
                if let Some(import) = Self::extract_import(&node, src) {
                    facts.imports.push(import);
                }
            }
            kind if TYPE_DECLARATIONS.contains(&kind) => {
                if let Some(decl) = Self::extract_declaration(&node, src) {
                    facts.declarations.push(decl);
                }
            }
            "field_declaration" | "local_variable_declaration" => {
                Self::extract_variables(&node, src, &mut facts.variables);
            }
            "formal_parameter" | "enhanced_for_statement" | "resource" => {
                if let Some(var) = Self::extract_typed_name(&node, src) {
                    facts.variables.push(var);
                }
            }
            "method_invocation" => Self::extract_call(&node, src, &mut facts),
            _ => {}
        });

        facts
    }

    fn implicit_types(&self) -> &'static [(&'static str, &'static str)] {
        JAVA_LANG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn extract(source: &str) -> FileFacts {
        let extractor = JavaExtractor::new();
        let mut parser = Parser::new();
        parser.set_language(&extractor.language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        extractor.extract(tree.root_node(), source.as_bytes())
    }

    const ACTIVITY: &str = r#"package com.example.app;

import android.util.Log;
import com.example.MyLogger;
import static android.util.Log.w;
import java.util.*;

public class MainActivity {
    private MyLogger myLogger = new MyLogger();

    void onCreate(String tag) {
        Log.d(tag, "created");
        myLogger.d(tag, "ok");
        w(tag, "bare");
    }

    static class Inner { }
}
"#;

    #[test]
    fn extracts_package() {
        assert_eq!(extract(ACTIVITY).package.as_deref(), Some("com.example.app"));
    }

    #[test]
    fn extracts_imports_by_kind() {
        let facts = extract(ACTIVITY);
        let kinds: Vec<_> = facts
            .imports
            .iter()
            .map(|i| (i.path.as_str(), i.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("android.util.Log", ImportKind::Type),
                ("com.example.MyLogger", ImportKind::Type),
                ("android.util.Log.w", ImportKind::Member),
                ("java.util", ImportKind::Wildcard),
            ]
        );
    }

    #[test]
    fn extracts_nested_declarations() {
        let facts = extract(ACTIVITY);
        let names: Vec<_> = facts
            .declarations
            .iter()
            .map(|d| d.nested_name.as_str())
            .collect();
        assert_eq!(names, vec!["MainActivity", "MainActivity.Inner"]);
    }

    #[test]
    fn extracts_fields_and_parameters() {
        let facts = extract(ACTIVITY);
        assert!(facts.variables.contains(&VarDecl {
            name: "myLogger".into(),
            type_name: "MyLogger".into(),
        }));
        assert!(facts.variables.contains(&VarDecl {
            name: "tag".into(),
            type_name: "String".into(),
        }));
    }

    #[test]
    fn extracts_calls_with_receivers() {
        let facts = extract(ACTIVITY);
        let calls: Vec<_> = facts
            .calls
            .iter()
            .map(|c| (c.receiver.as_deref(), c.method.as_str(), c.line))
            .collect();
        assert_eq!(
            calls,
            vec![
                (Some("Log"), "d", 12),
                (Some("myLogger"), "d", 13),
                (None, "w", 14),
            ]
        );
    }

    #[test]
    fn call_location_points_at_method_name() {
        let facts = extract("class A { void f() { Log.d(\"t\", \"m\"); } }");
        let call = &facts.calls[0];
        assert_eq!(call.line, 1);
        assert_eq!(call.column, 26);
        assert_eq!(call.length, "d(\"t\", \"m\")".len());
    }

    #[test]
    fn var_infers_constructor_type() {
        let facts = extract("class A { void f() { var log = new MyLogger(); var n = 1; } }");
        assert_eq!(
            facts.variables,
            vec![VarDecl {
                name: "log".into(),
                type_name: "MyLogger".into(),
            }]
        );
    }

    #[test]
    fn fully_qualified_receiver_text() {
        let facts = extract("class A { void f() { android.util.Log.e(\"t\", \"m\"); } }");
        assert_eq!(facts.calls[0].receiver.as_deref(), Some("android.util.Log"));
    }
}
