//! Line-prefix skeletonizer.
//!
//! Reduces code files to declarations, comments and blank lines, and pulls
//! import statements out into their own list. This is a heuristic over line
//! prefixes, not a parser.

use serde::{Deserialize, Serialize};

const INIT_FILE: &str = "__init__.py";
const IMPORT_PREFIXES: &[&str] = &["import ", "from "];
const COMMENT_PREFIXES: &[&str] = &["#", "//"];
const DOC_DELIMITERS: &[&str] = &["\"\"\"", "'''"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonProfile {
    /// Python error-handling/resource-scope keywords plus a Dart-only set.
    #[default]
    Extended,
    /// One narrower keyword set shared by every reducible extension.
    Compact,
}

/// Keywords that mark a structural line. `extensions == None` applies to
/// every reducible extension.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    pub extensions: Option<Vec<String>>,
    pub keywords: Vec<String>,
}

impl KeywordSet {
    fn new(extensions: Option<&[&str]>, keywords: &[&str]) -> Self {
        KeywordSet {
            extensions: extensions.map(|e| e.iter().map(|s| s.to_string()).collect()),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn applies_to(&self, ext: &str) -> bool {
        match &self.extensions {
            Some(list) => list.iter().any(|e| e == ext),
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkeletonRules {
    pub reducible: Vec<String>,
    pub structural: Vec<KeywordSet>,
}

impl SkeletonRules {
    pub fn for_profile(profile: SkeletonProfile) -> Self {
        let structural = match profile {
            SkeletonProfile::Extended => vec![
                KeywordSet::new(
                    None,
                    &[
                        "class ", "def ", "async def ", "@dataclass", "@property",
                        "if __name__", "try:", "except:", "finally:", "with ",
                    ],
                ),
                KeywordSet::new(
                    Some(&[".dart"]),
                    &[
                        "class ", "abstract class ", "enum ", "extension ",
                        "void ", "Future", "Widget ", "State<",
                    ],
                ),
            ],
            SkeletonProfile::Compact => vec![KeywordSet::new(
                None,
                &[
                    "class ", "def ", "async def ", "@dataclass", "@property",
                    "void ", "Future", "Widget ",
                ],
            )],
        };

        SkeletonRules {
            reducible: vec![".py".into(), ".dart".into()],
            structural,
        }
    }

    fn is_structural(&self, stripped: &str, ext: &str) -> bool {
        self.structural
            .iter()
            .filter(|set| set.applies_to(ext))
            .any(|set| set.keywords.iter().any(|kw| stripped.starts_with(kw.as_str())))
    }
}

impl Default for SkeletonRules {
    fn default() -> Self {
        SkeletonRules::for_profile(SkeletonProfile::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Import,
    Structural,
    Comment,
    Blank,
    Drop,
}

type LineRule = (LineKind, fn(&str, &str, &str, &SkeletonRules) -> bool);

fn is_import(_line: &str, stripped: &str, _ext: &str, _rules: &SkeletonRules) -> bool {
    IMPORT_PREFIXES.iter().any(|p| stripped.starts_with(*p))
}

fn is_structural(_line: &str, stripped: &str, ext: &str, rules: &SkeletonRules) -> bool {
    rules.is_structural(stripped, ext)
}

fn is_comment(line: &str, stripped: &str, _ext: &str, _rules: &SkeletonRules) -> bool {
    COMMENT_PREFIXES.iter().any(|p| stripped.starts_with(*p))
        || DOC_DELIMITERS.iter().any(|d| line.contains(*d))
}

fn is_blank(_line: &str, stripped: &str, _ext: &str, _rules: &SkeletonRules) -> bool {
    stripped.is_empty()
}

// Precedence is the order of this table; the first match wins.
const LINE_RULES: &[LineRule] = &[
    (LineKind::Import, is_import),
    (LineKind::Structural, is_structural),
    (LineKind::Comment, is_comment),
    (LineKind::Blank, is_blank),
];

pub fn classify_line(line: &str, ext: &str, rules: &SkeletonRules) -> LineKind {
    let stripped = line.trim_start();
    LINE_RULES
        .iter()
        .find(|(_, matches)| matches(line, stripped, ext, rules))
        .map(|(kind, _)| *kind)
        .unwrap_or(LineKind::Drop)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    pub content: String,
    pub imports: Vec<String>,
}

impl Skeleton {
    fn passthrough(content: &str) -> Self {
        Skeleton {
            content: content.to_string(),
            imports: Vec::new(),
        }
    }
}

/// `ext` is lowercase with its leading dot.
pub fn skeletonize(content: &str, ext: &str, filename: &str, rules: &SkeletonRules) -> Skeleton {
    if filename.eq_ignore_ascii_case(INIT_FILE) {
        return Skeleton::passthrough(content);
    }
    if !rules.reducible.iter().any(|r| r == ext) {
        return Skeleton::passthrough(content);
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut imports = Vec::new();

    for line in content.split('\n') {
        match classify_line(line, ext, rules) {
            LineKind::Import => imports.push(line.trim().to_string()),
            LineKind::Structural | LineKind::Comment | LineKind::Blank => kept.push(line),
            LineKind::Drop => {}
        }
    }

    Skeleton {
        content: kept.join("\n"),
        imports,
    }
}
