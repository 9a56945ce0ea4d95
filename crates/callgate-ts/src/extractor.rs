//! Language-agnostic extraction types and trait.
//!
//! `LanguageExtractor` is the extension point for adding new languages.
//! Implement it to teach callgate-ts how to pull imports, declarations,
//! variable types and method calls out of a Tree-sitter syntax tree.

use tree_sitter::{Language, Node};

/// How an import statement brings names into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import a.b.Type` (optionally aliased).
    Type,
    /// `import static a.b.Type.member` / Kotlin `import a.b.Type.member`.
    Member,
    /// `import a.b.*`; contributes nothing to resolution.
    Wildcard,
}

/// A single import statement extracted from source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Fully qualified import path without any trailing `.*`.
    pub path: String,
    /// Local name given with `as`, if any.
    pub alias: Option<String>,
    /// What the import brings into scope.
    pub kind: ImportKind,
}

impl ImportInfo {
    /// The name this import is visible under in the file.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| last_segment(&self.path))
    }

    /// For a member import, the declaring type (`a.b.Type` for `a.b.Type.member`).
    #[must_use]
    pub fn member_owner(&self) -> Option<&str> {
        match self.kind {
            ImportKind::Member => self.path.rsplit_once('.').map(|(owner, _)| owner),
            _ => None,
        }
    }
}

/// A type declared in the file being analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    /// Simple name.
    pub name: String,
    /// Name qualified by enclosing types, without the package (`Outer.Inner`).
    pub nested_name: String,
}

/// A variable, field or parameter with a declared (or inferable) type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    /// Variable name.
    pub name: String,
    /// Type as written, normalized by [`normalize_type`].
    pub type_name: String,
}

/// A method invocation before owner resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall {
    /// Receiver expression text with whitespace removed.
    pub receiver: Option<String>,
    /// Invoked method name.
    pub method: String,
    /// Line of the method name (1-indexed).
    pub line: usize,
    /// Column of the method name (1-indexed).
    pub column: usize,
    /// Byte offset of the method name.
    pub offset: usize,
    /// Bytes from the method name to the end of the call.
    pub length: usize,
}

/// Everything an extractor learned about one file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    /// Package declaration, if present.
    pub package: Option<String>,
    /// All import statements found.
    pub imports: Vec<ImportInfo>,
    /// Type declarations, including nested ones.
    pub declarations: Vec<DeclInfo>,
    /// Typed variables, fields and parameters.
    pub variables: Vec<VarDecl>,
    /// Method invocations in source order.
    pub calls: Vec<RawCall>,
}

/// Trait for language-specific Tree-sitter extraction.
///
/// Implement this to add support for a new language. The extractor receives
/// an already-parsed, error-free tree and returns the [`FileFacts`] the
/// symbol table resolves calls against.
pub trait LanguageExtractor: Send + Sync {
    /// Language identifier (e.g., `"kotlin"`, `"java"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g., `&[".kt", ".kts"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// The Tree-sitter grammar.
    fn language(&self) -> Language;

    /// Extract package, imports, declarations, variables and calls.
    fn extract(&self, root: Node<'_>, src: &[u8]) -> FileFacts;

    /// Types visible without an import, as `(simple name, qualified name)`.
    fn implicit_types(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

pub(crate) fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// Source text of `node` with all whitespace removed (`android . util . Log` → `android.util.Log`).
pub(crate) fn compact_text(node: &Node<'_>, src: &[u8]) -> String {
    text(node, src).split_whitespace().collect()
}

pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Strips generics, array brackets and nullability from a written type.
///
/// `List<String>` → `List`, `Log[]` → `Log`, `MyLogger?` → `MyLogger`.
#[must_use]
pub fn normalize_type(raw: &str) -> String {
    let head = raw.split('<').next().unwrap_or(raw);
    let compact: String = head.split_whitespace().collect();
    compact
        .trim_end_matches("[]")
        .trim_end_matches('?')
        .to_owned()
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

pub(crate) fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

/// Builds a [`RawCall`] located at `name`, spanning to the end of `call`.
pub(crate) fn raw_call(
    call: &Node<'_>,
    name: &Node<'_>,
    receiver: Option<String>,
    method: String,
) -> RawCall {
    let pos = name.start_position();
    RawCall {
        receiver,
        method,
        line: pos.row + 1,
        column: pos.column + 1,
        offset: name.start_byte(),
        length: call.end_byte().saturating_sub(name.start_byte()),
    }
}

/// Collects the names of the type declarations enclosing `node`, outermost first.
pub(crate) fn enclosing_types(node: &Node<'_>, src: &[u8], decl_kinds: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if decl_kinds.contains(&parent.kind()) {
            if let Some(name) = declared_name(&parent, src) {
                names.push(name);
            }
        }
        current = parent.parent();
    }
    names.reverse();
    names
}

/// Name of a type declaration: the `name` field, else the first identifier child.
pub(crate) fn declared_name(node: &Node<'_>, src: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(text(&name, src).to_owned());
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "type_identifier" | "simple_identifier"))
        .map(|c| text(&c, src).to_owned());
    found
}

/// Calls `visit` for every node of the tree in pre-order.
pub(crate) fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

/// The first `ERROR` or `MISSING` node in document order, if any.
pub(crate) fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}
