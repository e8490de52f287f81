//! Structural validation of rendered deploy item lists.
//!
//! Every violation is collected; callers get the full list so a broken
//! multi-item render can be fixed in one pass.

use crate::templates::DeployItemTemplate;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            return Self::root(name);
        }
        Self(format!("{}.{}", self.0, name))
    }

    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// FieldError / ErrorList
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Invalid,
    Duplicate,
    NotFound,
}

impl FieldErrorKind {
    fn describe(self) -> &'static str {
        match self {
            FieldErrorKind::Required => "Required value",
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::Duplicate => "Duplicate value",
            FieldErrorKind::NotFound => "Not found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub path: FieldPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub detail: String,
}

impl FieldError {
    pub fn required(path: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Required,
            path,
            value: None,
            detail: detail.into(),
        }
    }

    pub fn invalid(path: FieldPath, value: &str, detail: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::Invalid,
            path,
            value: Some(value.to_string()),
            detail: detail.into(),
        }
    }

    pub fn duplicate(path: FieldPath, value: &str) -> Self {
        Self {
            kind: FieldErrorKind::Duplicate,
            path,
            value: Some(value.to_string()),
            detail: String::new(),
        }
    }

    pub fn not_found(path: FieldPath, value: &str, detail: impl Into<String>) -> Self {
        Self {
            kind: FieldErrorKind::NotFound,
            path,
            value: Some(value.to_string()),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind.describe())?;
        if let Some(v) = &self.value {
            write!(f, ": {v:?}")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Err(self)` when any violation was recorded.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", msgs.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Internal model
// ---------------------------------------------------------------------------

/// Borrowed view the rules run against, decoupled from the wire types.
pub(crate) mod model {
    use crate::templates::DeployItemTemplate;

    pub struct Target<'a> {
        pub name: &'a str,
        pub namespace: &'a str,
    }

    pub struct DeployItem<'a> {
        pub name: &'a str,
        pub item_type: &'a str,
        pub target: Option<Target<'a>>,
        pub has_config: bool,
        pub depends_on: &'a [String],
    }

    impl<'a> From<&'a DeployItemTemplate> for DeployItem<'a> {
        fn from(t: &'a DeployItemTemplate) -> Self {
            Self {
                name: &t.name,
                item_type: &t.item_type,
                target: t.target.as_ref().map(|r| Target {
                    name: &r.name,
                    namespace: &r.namespace,
                }),
                has_config: !t.config.is_null(),
                depends_on: &t.depends_on,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

static DNS_LABEL_RE: OnceLock<Regex> = OnceLock::new();
static ITEM_TYPE_RE: OnceLock<Regex> = OnceLock::new();

fn dns_label_re() -> &'static Regex {
    DNS_LABEL_RE.get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap())
}

fn item_type_re() -> &'static Regex {
    ITEM_TYPE_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?(/[a-z0-9]([-a-z0-9.]*[a-z0-9])?)*$").unwrap()
    })
}

/// Whether `s` is a DNS label of at most 63 characters, the rule applied to
/// deploy item names and target references.
pub fn is_dns_label(s: &str) -> bool {
    s.len() <= 63 && dns_label_re().is_match(s)
}

fn validate_item(path: &FieldPath, item: &model::DeployItem<'_>, errs: &mut ErrorList) {
    if item.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "name must not be empty"));
    } else if !is_dns_label(item.name) {
        errs.push(FieldError::invalid(
            path.child("name"),
            item.name,
            "must be a lowercase alphanumeric name of at most 63 characters",
        ));
    }

    if item.item_type.is_empty() {
        errs.push(FieldError::required(path.child("type"), "type must not be empty"));
    } else if !item_type_re().is_match(item.item_type) {
        errs.push(FieldError::invalid(
            path.child("type"),
            item.item_type,
            "must look like <domain>/<name>",
        ));
    }

    if !item.has_config {
        errs.push(FieldError::required(path.child("config"), "config must not be empty"));
    }

    if let Some(target) = &item.target {
        let tpath = path.child("target");
        if target.name.is_empty() {
            errs.push(FieldError::required(tpath.child("name"), "target name must not be empty"));
        } else if !is_dns_label(target.name) {
            errs.push(FieldError::invalid(
                tpath.child("name"),
                target.name,
                "must be a lowercase alphanumeric name",
            ));
        }
        if !target.namespace.is_empty() && !is_dns_label(target.namespace) {
            errs.push(FieldError::invalid(
                tpath.child("namespace"),
                target.namespace,
                "must be a lowercase alphanumeric name",
            ));
        }
    }
}

/// Validate an aggregated deploy item list rooted at `fld_path`.
pub fn validate_deploy_item_template_list(
    fld_path: &FieldPath,
    list: &[DeployItemTemplate],
) -> Result<(), ErrorList> {
    let items: Vec<model::DeployItem<'_>> = list.iter().map(model::DeployItem::from).collect();
    let mut errs = ErrorList::default();

    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        let path = fld_path.index(i);
        validate_item(&path, item, &mut errs);
        if item.name.is_empty() {
            continue;
        }
        if first_index.contains_key(item.name) {
            errs.push(FieldError::duplicate(path.child("name"), item.name));
        } else {
            first_index.insert(item.name, i);
        }
    }

    let names: HashSet<&str> = first_index.keys().copied().collect();
    for (i, item) in items.iter().enumerate() {
        let dpath = fld_path.index(i).child("dependsOn");
        for (j, dep) in item.depends_on.iter().enumerate() {
            if dep == item.name {
                errs.push(FieldError::invalid(
                    dpath.index(j),
                    dep,
                    "a deploy item cannot depend on itself",
                ));
            } else if !names.contains(dep.as_str()) {
                errs.push(FieldError::not_found(
                    dpath.index(j),
                    dep,
                    "no deploy item with this name",
                ));
            }
        }
    }

    errs.into_result()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
