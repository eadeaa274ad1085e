//! Heuristic language classification for code snippets.
//!
//! An ordered table of `(language, predicate)` rules; the first rule that
//! matches wins and `text` is the fallback. This is pattern matching on
//! language-defining tokens, not parsing, so short or ambiguous snippets can
//! be misclassified.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    C,
    Java,
    Python,
    Javascript,
    Html,
    Css,
    Sql,
    Bash,
    Php,
    Csharp,
    Ruby,
    Go,
    Rust,
    Text,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Java => "java",
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Sql => "sql",
            Language::Bash => "bash",
            Language::Php => "php",
            Language::Csharp => "csharp",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Text => "text",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precomputed views of the snippet shared by every rule.
struct Snippet<'a> {
    content: &'a str,
    lower: String,
    first_line: &'a str,
}

impl<'a> Snippet<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            lower: content.to_lowercase(),
            first_line: content.lines().next().unwrap_or(""),
        }
    }

    fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }
}

type Rule = (Language, fn(&Snippet<'_>) -> bool);

/// Evaluated top to bottom: C++ before C, Python before JavaScript.
const RULES: &[Rule] = &[
    (Language::Cpp, is_cpp),
    (Language::C, is_c),
    (Language::Java, is_java),
    (Language::Python, is_python),
    (Language::Javascript, is_javascript),
    (Language::Html, is_html),
    (Language::Css, is_css),
    (Language::Sql, is_sql),
    (Language::Bash, is_bash),
    (Language::Php, is_php),
    (Language::Csharp, is_csharp),
    (Language::Ruby, is_ruby),
    (Language::Go, is_go),
    (Language::Rust, is_rust),
];

/// Classifies a snippet believed to be source code.
pub fn detect_language(content: &str) -> Language {
    if content.trim().is_empty() {
        return Language::Text;
    }
    let snippet = Snippet::new(content);
    RULES
        .iter()
        .find(|(_, matches)| matches(&snippet))
        .map(|(language, _)| *language)
        .unwrap_or(Language::Text)
}

static CPP_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#include\s*<[a-z_]+>").unwrap());
static CPP_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"template\s*<").unwrap());
static CPP_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+\w+[^\n]*\{").unwrap());
static C_MAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bint\s+main\s*\(").unwrap());
static JAVA_MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"public\s+static\s+void\s+main").unwrap());
static PY_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+[\w.]+\s+import\s+\S|import\s+[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+)*\s*$)")
        .unwrap()
});
static JS_EXPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s+(?:default\s+)?(?:function|class|const)").unwrap());
static JS_REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"require\(['"]"#).unwrap());
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-z][a-z0-9-]*(?:\s[^<>]*)?/?>").unwrap());
static CSS_DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[a-z-]+\s*:\s*[^;{}=()]+;\s*$").unwrap());
static SQL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:select|insert|update|delete|from|where|join|inner|outer|group by|order by)\b")
        .unwrap()
});
static SHELL_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:echo|cd|ls|mkdir|rm|cp|mv|grep|find)\s+").unwrap());

fn is_cpp(p: &Snippet<'_>) -> bool {
    CPP_HEADER_RE.is_match(&p.lower)
        || p.has_any(&["std::", "cout", "cin >>", "using namespace"])
        || CPP_TEMPLATE_RE.is_match(p.content)
        || (CPP_CLASS_RE.is_match(p.content) && p.content.contains("};"))
}

fn is_c(p: &Snippet<'_>) -> bool {
    p.has_any(&["#include", "printf("]) || C_MAIN_RE.is_match(p.content)
}

fn is_java(p: &Snippet<'_>) -> bool {
    p.has_any(&["public class", "system.out", "string[] args"]) || JAVA_MAIN_RE.is_match(p.content)
}

fn is_python(p: &Snippet<'_>) -> bool {
    p.has_any(&["def ", "print(", "__main__"]) || PY_IMPORT_RE.is_match(p.content)
}

fn is_javascript(p: &Snippet<'_>) -> bool {
    // `let` is shared with Rust; leave snippets with Rust markers to the Rust rule.
    if p.has_any(&["fn main", "println!", "let mut "]) {
        return false;
    }
    p.has_any(&["function", "const ", "let ", "=>", "console.log", "document."])
        || JS_EXPORT_RE.is_match(p.content)
        || JS_REQUIRE_RE.is_match(p.content)
}

fn is_html(p: &Snippet<'_>) -> bool {
    p.has_any(&["<!doctype", "<html", "<div"]) || HTML_TAG_RE.is_match(&p.lower)
}

fn is_css(p: &Snippet<'_>) -> bool {
    p.content.contains('{')
        && p.content.contains('}')
        && (CSS_DECL_RE.is_match(p.content) || p.content.contains("@media"))
}

fn is_sql(p: &Snippet<'_>) -> bool {
    SQL_RE.is_match(p.content)
}

fn is_bash(p: &Snippet<'_>) -> bool {
    p.lower.starts_with("#!") || p.has("#!/bin/") || SHELL_FIRST_RE.is_match(p.first_line)
}

fn is_php(p: &Snippet<'_>) -> bool {
    p.has_any(&["<?php", "$_", "echo "])
}

fn is_csharp(p: &Snippet<'_>) -> bool {
    p.has_any(&["using system", "console.writeline", "namespace "])
}

fn is_ruby(p: &Snippet<'_>) -> bool {
    p.has("def ") && p.has_any(&["puts", "end"])
}

fn is_go(p: &Snippet<'_>) -> bool {
    p.has_any(&["package main", "import \"", "func main()"])
}

fn is_rust(p: &Snippet<'_>) -> bool {
    p.has_any(&["fn main", "println!"]) || (p.has("let ") && p.has(": "))
}
