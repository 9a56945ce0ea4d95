//! Declarative forbidden-call rules.
//!
//! A [`Rule`] is data, not code: it names an owner type, a set of method
//! names and whether the call must have an explicit receiver. New checks are
//! added by writing a new rule record, never by touching the matcher.

use crate::types::Severity;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Errors from constructing a malformed rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RuleDefinitionError {
    /// Rule id is empty.
    #[error("rule id must not be empty")]
    #[diagnostic(code(callgate::rule::empty_id))]
    EmptyId,

    /// Rule id contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid rule id `{id}`: only ASCII letters, digits, `_` and `-` are allowed")]
    #[diagnostic(code(callgate::rule::invalid_id))]
    InvalidId {
        /// The offending id.
        id: String,
    },

    /// No method names were given.
    #[error("rule `{id}` has an empty method set")]
    #[diagnostic(code(callgate::rule::no_methods))]
    NoMethods {
        /// Rule id.
        id: String,
    },

    /// No owner types were given, or one of them is blank.
    #[error("rule `{id}` has an empty owner type")]
    #[diagnostic(code(callgate::rule::no_owner))]
    NoOwner {
        /// Rule id.
        id: String,
    },

    /// The message template references an unknown placeholder.
    #[error("unknown placeholder `{{{name}}}` in message template")]
    #[diagnostic(
        code(callgate::rule::placeholder),
        help("supported placeholders: {{method}}, {{owner}}, {{receiver}}")
    )]
    UnknownPlaceholder {
        /// Placeholder name without braces.
        name: String,
    },

    /// The message template has an unterminated `{`.
    #[error("unclosed `{{` in message template `{template}`")]
    #[diagnostic(code(callgate::rule::unclosed_brace))]
    UnclosedBrace {
        /// The raw template.
        template: String,
    },
}

/// A validated rule identifier (e.g., `LogUsage`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule id.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or contains invalid characters.
    pub fn new(id: &str) -> Result<Self, RuleDefinitionError> {
        if id.is_empty() {
            return Err(RuleDefinitionError::EmptyId);
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RuleDefinitionError::InvalidId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which declaring types a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerPredicate {
    /// A single fully-qualified type, e.g. `android.util.Log`.
    Exact(String),
    /// Any of several fully-qualified types.
    AnyOf(BTreeSet<String>),
}

impl OwnerPredicate {
    /// Tests a resolved owner type against this predicate.
    #[must_use]
    pub fn accepts(&self, owner: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == owner,
            Self::AnyOf(set) => set.contains(owner),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Exact(t) => t.trim().is_empty(),
            Self::AnyOf(set) => set.is_empty() || set.iter().any(|t| t.trim().is_empty()),
        }
    }
}

impl fmt::Display for OwnerPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(t) => f.write_str(t),
            Self::AnyOf(set) => {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Method,
    Owner,
    Receiver,
}

/// Values substituted into a [`MessageTemplate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageArgs<'a> {
    /// Matched method name.
    pub method: &'a str,
    /// Resolved owner type.
    pub owner: &'a str,
    /// Receiver expression text, empty when the call has none.
    pub receiver: &'a str,
}

/// A finding message with `{method}`, `{owner}` and `{receiver}` placeholders.
///
/// `{{` and `}}` render literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns error on unknown placeholders or an unclosed `{`.
    pub fn parse(raw: &str) -> Result<Self, RuleDefinitionError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(RuleDefinitionError::UnclosedBrace {
                            template: raw.to_string(),
                        });
                    }
                    let segment = match name.trim() {
                        "method" => Segment::Method,
                        "owner" => Segment::Owner,
                        "receiver" => Segment::Receiver,
                        _ => return Err(RuleDefinitionError::UnknownPlaceholder { name }),
                    };
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(segment);
                }
                other => text.push(other),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Renders the template with the matched values.
    #[must_use]
    pub fn render(&self, args: &MessageArgs<'_>) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Method => out.push_str(args.method),
                Segment::Owner => out.push_str(args.owner),
                Segment::Receiver => out.push_str(args.receiver),
            }
        }
        out
    }

    /// Returns the template source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Serialize for MessageTemplate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// A forbidden-call rule.
///
/// Immutable once built; use [`Rule::builder`] to construct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    id: RuleId,
    title: String,
    description: String,
    severity: Severity,
    owner: OwnerPredicate,
    methods: BTreeSet<String>,
    requires_receiver: bool,
    message: MessageTemplate,
}

impl Rule {
    /// Starts building a rule with the given id.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(id)
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// Returns the short human-readable title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the long explanation, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the severity of findings from this rule.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the owner-type predicate.
    #[must_use]
    pub fn owner(&self) -> &OwnerPredicate {
        &self.owner
    }

    /// Returns the forbidden method names.
    #[must_use]
    pub fn methods(&self) -> &BTreeSet<String> {
        &self.methods
    }

    /// Whether only calls with an explicit receiver can match.
    #[must_use]
    pub fn requires_receiver(&self) -> bool {
        self.requires_receiver
    }

    /// Returns the message template.
    #[must_use]
    pub fn message(&self) -> &MessageTemplate {
        &self.message
    }

    /// Returns a copy of this rule with a different severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Builder for [`Rule`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    title: String,
    description: String,
    severity: Severity,
    owners: BTreeSet<String>,
    methods: BTreeSet<String>,
    requires_receiver: bool,
    message: Option<String>,
}

impl RuleBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            severity: Severity::Error,
            owners: BTreeSet::new(),
            methods: BTreeSet::new(),
            requires_receiver: false,
            message: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the long description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the severity (default: error).
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds an owner type. Calling this more than once builds a set predicate.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.insert(owner.into());
        self
    }

    /// Adds forbidden method names.
    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Sets whether an explicit receiver is required (default: false).
    #[must_use]
    pub fn requires_receiver(mut self, required: bool) -> Self {
        self.requires_receiver = required;
        self
    }

    /// Sets the message template. Defaults to the title.
    #[must_use]
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Validates and builds the rule.
    ///
    /// # Errors
    ///
    /// Returns error if the id, owner set, method set or template is invalid.
    pub fn build(self) -> Result<Rule, RuleDefinitionError> {
        let id = RuleId::new(&self.id)?;

        if self.methods.is_empty() || self.methods.iter().any(|m| m.trim().is_empty()) {
            return Err(RuleDefinitionError::NoMethods { id: self.id });
        }

        let owner = if self.owners.len() == 1 {
            let only = self.owners.into_iter().next().unwrap_or_default();
            OwnerPredicate::Exact(only)
        } else {
            OwnerPredicate::AnyOf(self.owners)
        };
        if owner.is_blank() {
            return Err(RuleDefinitionError::NoOwner { id: self.id });
        }

        let title = if self.title.is_empty() {
            self.id.clone()
        } else {
            self.title
        };
        let message = match self.message.as_deref() {
            Some(template) => MessageTemplate::parse(template)?,
            // The title is literal text, not a template.
            None => MessageTemplate::parse(&title.replace('{', "{{").replace('}', "}}"))?,
        };

        Ok(Rule {
            id,
            title,
            description: self.description,
            severity: self.severity,
            owner,
            methods: self.methods,
            requires_receiver: self.requires_receiver,
            message,
        })
    }
}
