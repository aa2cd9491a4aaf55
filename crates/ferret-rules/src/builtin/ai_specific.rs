//! AI-tooling-specific rules (AI-001 to AI-010).
//!
//! Risks that only exist because the scanned files configure an AI
//! assistant: tool poisoning, auto-approval, memory manipulation.

use crate::model::{
    ComponentType, FileType, Rule, SemanticPatternKind, Severity, ThreatCategory,
};

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "AI-001",
            "Confirmation bypass instruction",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("Instruction content telling the assistant to act without user approval")
        .pattern(r"(?:without|skip|bypass|don'?t\s+(?:ask|wait)\s+for)\s+(?:asking|confirmation|user\s+(?:approval|consent|permission))")
        .file_types(&[FileType::Md, FileType::Json, FileType::Yaml, FileType::Yml])
        .remediation("Keep the user in the loop; remove the bypass instruction")
        .build(),
        Rule::builder(
            "AI-002",
            "Auto-approve enabled",
            ThreatCategory::AiSpecific,
            Severity::High,
        )
        .description("Tool or server configuration that auto-approves every invocation")
        .pattern(r#""auto[_-]?approve"\s*:\s*(?:true|\[\s*"\*")"#)
        .pattern(r"\bautoApprove\b[^\n]*(?:true|\*)")
        .file_types(&[FileType::Json, FileType::Yaml, FileType::Yml])
        .semantic(SemanticPatternKind::ObjectStructure, "autoApprove")
        .remediation("Approve tool calls individually or per-tool, never blanket")
        .build(),
        Rule::builder(
            "AI-003",
            "Memory poisoning directive",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("Instructions planting persistent hidden behavior in agent memory")
        .pattern(r"(?:always|never)\s+(?:remember|include|apply)[^\n]{0,60}(?:secret(?:ly)?|hidden|silent(?:ly)?|without)")
        .file_types(&[FileType::Md])
        .remediation("Memory entries must describe visible, user-approved behavior")
        .reference("https://atlas.mitre.org/techniques/AML.T0070")
        .build(),
        Rule::builder(
            "AI-004",
            "Tool-description injection",
            ThreatCategory::AiSpecific,
            Severity::High,
        )
        .description("A tool description carrying instructions aimed at the model, not the user")
        .pattern(r#""description"\s*:\s*"[^"]*(?:ignore\s+previous|do\s+not\s+(?:tell|mention)|secretly|always\s+call\s+this)[^"]*""#)
        .file_types(&[FileType::Json])
        .components(&[ComponentType::Mcp, ComponentType::Plugin, ComponentType::Settings])
        .remediation("Tool descriptions describe the tool; directives in them are poisoning")
        .build(),
        Rule::builder(
            "AI-005",
            "Broad tool grant in skill frontmatter",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("A skill requesting wildcard or unrestricted Bash tools")
        .pattern(r"(?m)allowed-tools:\s*\[?[^\n\]]*(?:\*|Bash\s*(?:,|\]|$))")
        .file_types(&[FileType::Md])
        .components(&[ComponentType::Skill])
        .remediation("Request the narrowest tool set the skill needs")
        .build(),
        Rule::builder(
            "AI-006",
            "Model endpoint override to plaintext HTTP",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("An API base URL pointing at unencrypted or unexpected endpoints")
        .pattern(r#""(?:baseUrl|base_url|api_base|apiBase|endpoint)"\s*:\s*"http://"#)
        .file_types(&[FileType::Json, FileType::Yaml, FileType::Yml])
        .exclude_pattern(r"localhost|127\.0\.0\.1")
        .remediation("Use https endpoints; plaintext transports expose prompts and keys")
        .build(),
        Rule::builder(
            "AI-007",
            "Conversation harvesting",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("Configuration that captures chat history to files or endpoints")
        .pattern(r"(?:chat|conversation|session)[_-]?(?:history|log|transcript)s?[^\n]{0,40}(?:upload|send|post|save\s+to|write\s+to)")
        .remediation("Transcript capture must be explicit, user-visible functionality")
        .build(),
        Rule::builder(
            "AI-008",
            "Self-modification instruction",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("Instructions telling the assistant to silently edit its own configuration")
        .pattern(r"(?:edit|modify|update|rewrite)\s+(?:this|your\s+own)\s+(?:file|skill|config(?:uration)?|instructions)[^\n]{0,40}(?:silently|without|secretly)")
        .file_types(&[FileType::Md])
        .remediation("Configuration changes must be user-driven")
        .build(),
        Rule::builder(
            "AI-009",
            "Cross-agent instruction relay",
            ThreatCategory::AiSpecific,
            Severity::Low,
        )
        .description("Content instructing one agent to pass directives to another")
        .pattern(r"tell\s+(?:the\s+)?(?:other|next|sub)[\s-]?agents?\s+to\b")
        .file_types(&[FileType::Md])
        .remediation("Agent-to-agent directives bypass review; remove the relay")
        .build(),
        Rule::builder(
            "AI-010",
            "Hidden MCP server addition",
            ThreatCategory::AiSpecific,
            Severity::High,
        )
        .description("Instruction content that asks the assistant to register a new MCP server")
        .pattern(r"(?:add|register|install)\s+(?:an?\s+)?(?:new\s+)?mcp\s+server[^\n]{0,60}(?:https?://|npx)")
        .file_types(&[FileType::Md])
        .remediation("MCP servers are added by the user through settings, not by instruction files")
        .build(),
        Rule::builder(
            "AI-011",
            "Built-in tool name shadowing",
            ThreatCategory::AiSpecific,
            Severity::High,
        )
        .description("An MCP tool named after a built-in tool, hijacking its call sites")
        .pattern(r#""name"\s*:\s*"(?:bash|read|write|edit|grep|glob|webfetch|task)""#)
        .file_types(&[FileType::Json])
        .components(&[ComponentType::Mcp, ComponentType::Plugin])
        .remediation("Rename the tool; shadowed names silently intercept built-in calls")
        .build(),
        Rule::builder(
            "AI-012",
            "Sub-agent spawn with elevated access",
            ThreatCategory::AiSpecific,
            Severity::Medium,
        )
        .description("Instructions directing spawned sub-agents to run without restrictions")
        .pattern(r"(?:spawn|launch|create)\s+(?:an?\s+)?(?:sub)?[\s-]?agent[^\n]{0,60}(?:--dangerously|bypass|all\s+tools|no\s+restrictions)")
        .file_types(&[FileType::Md])
        .remediation("Sub-agents inherit scoped permissions; remove the elevation request")
        .build(),
    ]
}
