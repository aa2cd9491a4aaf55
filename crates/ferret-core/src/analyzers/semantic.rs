//! AST-based semantic detection for code blocks (tree-sitter).
//!
//! Runs a rule's `semantic_patterns` against parsed TypeScript/JavaScript:
//! fenced code blocks inside markdown, and whole ts/js/tsx/jsx files.
//! Symbol matching is dotted-chain aware: `axios` matches `axios(...)`,
//! `axios.get`, and `foo.axios.get`, never `myaxios`.

use chrono::Utc;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as MarkdownParser, Tag, TagEnd};
use tree_sitter::{Node, Parser};

use ferret_rules::{FileType, Rule, SemanticPatternKind};

use crate::discovery::DiscoveredFile;
use crate::finding::{ContextLine, Finding};
use crate::matcher::LineIndex;

/// AST analysis is skipped above this resident-set size; the file still
/// gets pattern-matcher findings.
const MEMORY_THRESHOLD_BYTES: u64 = 1_536 * 1024 * 1024;

/// Fence languages routed to the parser.
const SUPPORTED_LANGS: &[&str] = &["typescript", "ts", "javascript", "js", "tsx", "jsx"];

/// Base confidence for a structural match; eval-chain adds 0.2.
const BASE_CONFIDENCE: f64 = 0.7;

/// A parsed unit of code plus where it starts in the host file.
struct CodeBlock {
    source: String,
    /// 1-based line in the host file where the code's first line sits.
    first_line: usize,
    tsx: bool,
}

/// Everything interesting collected in one walk of a parse tree.
#[derive(Default)]
struct TreeFacts {
    /// (chain, row, is_new, has_nonliteral_arg)
    calls: Vec<(String, usize, bool, bool)>,
    /// Dynamic `import(...)` callsites: (row, has_nonliteral_arg)
    dynamic_imports: Vec<(usize, bool)>,
    /// (chain, row)
    members: Vec<(String, usize)>,
    /// Object-literal keys: (key, row)
    pairs: Vec<(String, usize)>,
    imports: Vec<String>,
    variables: Vec<String>,
}

/// Current resident memory, if the platform exposes it.
fn resident_memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * 4096)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Run semantic analysis for every rule carrying semantic patterns.
pub fn analyze(
    rules: &[&Rule],
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
) -> Vec<Finding> {
    let semantic_rules: Vec<&&Rule> = rules
        .iter()
        .filter(|r| r.enabled && !r.semantic_patterns.is_empty())
        .collect();
    if semantic_rules.is_empty() {
        return Vec::new();
    }

    if let Some(resident) = resident_memory_bytes() {
        if resident > MEMORY_THRESHOLD_BYTES {
            tracing::warn!(
                resident,
                path = %file.relative_path,
                "skipping AST analysis: resident memory above threshold"
            );
            return Vec::new();
        }
    }

    let blocks = match file.file_type {
        FileType::Md => extract_markdown_blocks(content, index),
        FileType::Ts | FileType::Js => vec![CodeBlock {
            source: content.to_string(),
            first_line: 1,
            tsx: false,
        }],
        FileType::Tsx | FileType::Jsx => vec![CodeBlock {
            source: content.to_string(),
            first_line: 1,
            tsx: true,
        }],
        _ => Vec::new(),
    };
    if blocks.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for block in &blocks {
        let Some(facts) = parse_block(block) else {
            continue;
        };
        for rule in &semantic_rules {
            findings.extend(match_facts(rule, &facts, block, file, content, index));
        }
    }
    findings
}

fn extract_markdown_blocks(content: &str, index: &LineIndex) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, bool)> = None;
    let mut text = String::new();
    let mut first_offset = None;

    for (event, range) in MarkdownParser::new_ext(content, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                let lang = lang.split_whitespace().next().unwrap_or("").to_lowercase();
                if SUPPORTED_LANGS.contains(&lang.as_str()) {
                    let tsx = matches!(lang.as_str(), "tsx" | "jsx");
                    current = Some((lang, tsx));
                    text.clear();
                    first_offset = None;
                }
            }
            Event::Text(chunk) if current.is_some() => {
                if first_offset.is_none() {
                    first_offset = Some(range.start);
                }
                text.push_str(&chunk);
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((_, tsx)) = current.take() {
                    if !text.trim().is_empty() {
                        let first_line = first_offset
                            .map(|offset| index.line_col(offset).0)
                            .unwrap_or(1);
                        blocks.push(CodeBlock {
                            source: std::mem::take(&mut text),
                            first_line,
                            tsx,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    blocks
}

fn parse_block(block: &CodeBlock) -> Option<TreeFacts> {
    let language = if block.tsx {
        tree_sitter_typescript::LANGUAGE_TSX
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT
    };
    let mut parser = Parser::new();
    parser.set_language(&language.into()).ok()?;
    let tree = parser.parse(&block.source, None)?;

    let mut facts = TreeFacts::default();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        collect_node(&node, block.source.as_bytes(), &mut facts);
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
    Some(facts)
}

fn collect_node(node: &Node, source: &[u8], facts: &mut TreeFacts) {
    let row = node.start_position().row;
    match node.kind() {
        "call_expression" => {
            let Some(function) = node.child_by_field_name("function") else {
                return;
            };
            let nonliteral_arg = node
                .child_by_field_name("arguments")
                .map(|args| has_nonliteral_argument(&args))
                .unwrap_or(false);
            if function.kind() == "import" {
                facts.dynamic_imports.push((row, nonliteral_arg));
                return;
            }
            if let Some(chain) = node_chain(&function, source) {
                facts.calls.push((chain, row, false, nonliteral_arg));
            }
        }
        "new_expression" => {
            let Some(constructor) = node.child_by_field_name("constructor") else {
                return;
            };
            let nonliteral_arg = node
                .child_by_field_name("arguments")
                .map(|args| has_nonliteral_argument(&args))
                .unwrap_or(false);
            if let Some(chain) = node_chain(&constructor, source) {
                facts.calls.push((chain, row, true, nonliteral_arg));
            }
        }
        "member_expression" => {
            if let Some(chain) = node_chain(node, source) {
                facts.members.push((chain, row));
            }
        }
        "pair" => {
            if let Some(key) = node.child_by_field_name("key") {
                if let Ok(text) = key.utf8_text(source) {
                    facts
                        .pairs
                        .push((text.trim_matches(['"', '\'']).to_string(), row));
                }
            }
        }
        "import_statement" => {
            if let Some(source_node) = node.child_by_field_name("source") {
                if let Ok(text) = source_node.utf8_text(source) {
                    facts.imports.push(text.trim_matches(['"', '\'']).to_string());
                }
            }
        }
        "variable_declarator" => {
            if let Some(name) = node.child_by_field_name("name") {
                if let Ok(text) = name.utf8_text(source) {
                    facts.variables.push(text.to_string());
                }
            }
        }
        _ => {}
    }
}

/// True when any argument is not a plain string literal.
fn has_nonliteral_argument(arguments: &Node) -> bool {
    (0..arguments.named_child_count())
        .filter_map(|i| arguments.named_child(i))
        .any(|arg| arg.kind() != "string")
}

/// Flatten an identifier/member chain into `a.b.c`. Returns `None` for
/// computed access and other shapes that are not plain chains.
fn node_chain(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "property_identifier" => {
            node.utf8_text(source).ok().map(|s| s.to_string())
        }
        "member_expression" => {
            let object = node.child_by_field_name("object")?;
            let property = node.child_by_field_name("property")?;
            let head = node_chain(&object, source)?;
            let tail = property.utf8_text(source).ok()?;
            Some(format!("{head}.{tail}"))
        }
        _ => None,
    }
}

/// Dotted-chain matching: the pattern's segments must appear as a
/// contiguous run of the chain's segments.
pub fn chain_matches(chain: &str, pattern: &str) -> bool {
    let chain_segments: Vec<&str> = chain.split('.').collect();
    let pattern_segments: Vec<&str> = pattern.split('.').collect();
    if pattern_segments.is_empty() || chain_segments.len() < pattern_segments.len() {
        return false;
    }
    chain_segments
        .windows(pattern_segments.len())
        .any(|window| window == pattern_segments.as_slice())
}

fn match_facts(
    rule: &Rule,
    facts: &TreeFacts,
    block: &CodeBlock,
    file: &DiscoveredFile,
    content: &str,
    index: &LineIndex,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for pattern in &rule.semantic_patterns {
        let mut hits: Vec<(usize, String, f64)> = Vec::new();
        match pattern.kind {
            SemanticPatternKind::FunctionCall => {
                for (chain, row, is_new, _) in &facts.calls {
                    if !is_new && chain_matches(chain, &pattern.pattern) {
                        hits.push((*row, format!("call_expression: {chain}()"), BASE_CONFIDENCE));
                    }
                }
            }
            SemanticPatternKind::PropertyAccess => {
                for (chain, row) in &facts.members {
                    if chain_matches(chain, &pattern.pattern) {
                        hits.push((*row, format!("member_expression: {chain}"), BASE_CONFIDENCE));
                    }
                }
            }
            SemanticPatternKind::DynamicImport => {
                for (row, nonliteral) in &facts.dynamic_imports {
                    if *nonliteral {
                        hits.push((
                            *row,
                            "call_expression: import(<non-literal>)".to_string(),
                            BASE_CONFIDENCE,
                        ));
                    }
                }
            }
            SemanticPatternKind::EvalChain => {
                for (chain, row, is_new, _) in &facts.calls {
                    let direct = !is_new
                        && matches!(chain.as_str(), "eval" | "globalThis.eval" | "window.eval")
                        && chain_matches(chain, &pattern.pattern);
                    let constructed = *is_new
                        && chain == "Function"
                        && chain_matches(chain, &pattern.pattern);
                    if direct || constructed {
                        hits.push((
                            *row,
                            format!("eval_chain: {chain}"),
                            BASE_CONFIDENCE + 0.2,
                        ));
                    }
                }
            }
            SemanticPatternKind::ObjectStructure => {
                for (key, row) in &facts.pairs {
                    if key == &pattern.pattern {
                        hits.push((*row, format!("pair: {key}"), BASE_CONFIDENCE));
                    }
                }
            }
        }

        for (row, summary, confidence) in hits {
            let line = block.first_line + row;
            let line = line.min(index.line_count());
            let mut finding = Finding {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                severity: rule.severity,
                category: rule.category,
                path: file.path.clone(),
                relative_path: file.relative_path.clone(),
                line,
                column: None,
                matched: summary.clone(),
                context: vec![ContextLine {
                    line_number: line,
                    content: index.line_content(content, line).to_string(),
                    is_match: true,
                }],
                remediation: rule.remediation.clone(),
                metadata: None,
                timestamp: Utc::now(),
                risk_score: rule.severity.weight() as u8,
            };
            finding.set_metadata("astNode", serde_json::json!(summary));
            finding.set_metadata(
                "confidence",
                serde_json::json!((confidence * 100.0).round() / 100.0),
            );
            finding.set_metadata(
                "semanticContext",
                serde_json::json!({
                    "imports": facts.imports,
                    "variables": facts.variables,
                    "callChain": facts.calls.iter().map(|(c, _, _, _)| c).collect::<Vec<_>>(),
                }),
            );
            findings.push(finding);
        }
    }
    findings
}
