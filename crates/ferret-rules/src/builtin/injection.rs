//! Prompt-injection rules (INJ-001 to INJ-010).
//!
//! These target instruction files and tool manifests that steer an
//! AI assistant, so most rules scope to markdown and JSON surfaces.

use crate::model::{FileType, Rule, Severity, ThreatCategory};

const TEXT_SURFACES: [FileType; 4] = [FileType::Md, FileType::Json, FileType::Yaml, FileType::Yml];

pub(crate) fn rules() -> Vec<Rule> {
    vec![
        Rule::builder(
            "INJ-001",
            "Instruction override",
            ThreatCategory::Injection,
            Severity::High,
        )
        .description("Text that instructs the assistant to discard its prior instructions")
        .pattern(r"ignore\s+(?:all\s+|any\s+)?(?:previous|prior|above|earlier)\s+(?:instructions|prompts|rules|directives|guidance)")
        .pattern(r"disregard\s+(?:all\s+|any\s+)?(?:previous|prior|your)\s+(?:instructions|rules|training|guidelines)")
        .pattern(r"forget\s+(?:everything|all|your\s+(?:instructions|rules|training))")
        .remediation("Remove the override text; instruction files must not countermand the host's system prompt")
        .reference("https://atlas.mitre.org/techniques/AML.T0051")
        .build(),
        Rule::builder(
            "INJ-002",
            "Hidden instructions in HTML comment",
            ThreatCategory::Injection,
            Severity::High,
        )
        .description("An HTML comment carrying directives invisible in rendered markdown")
        .pattern(r"<!--(?s).{0,300}?(?:secretly|do\s+not\s+(?:tell|reveal|mention|disclose)|hidden\s+instruction|ignore\s+previous)(?s).{0,300}?-->")
        .file_types(&[FileType::Md])
        .remediation("Delete the comment; rendered and raw content must agree")
        .build(),
        Rule::builder(
            "INJ-003",
            "Persona or role manipulation",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Text that re-roles the assistant outside its configured persona")
        .pattern(r"(?:you\s+are\s+now|from\s+now\s+on\s+you\s+are|pretend\s+(?:to\s+be|you\s+are)|act\s+as\s+if\s+you)")
        .file_types(&TEXT_SURFACES)
        .exclude_context(r"(?:example|tutorial|documentation\s+of)")
        .remediation("Persona changes belong in the owning application, not in scanned config content")
        .build(),
        Rule::builder(
            "INJ-004",
            "Conditional hostile behavior",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Instructions that trigger divergent behavior for specific users or phrases")
        .pattern(r"(?:when|if)\s+(?:the\s+)?user\s+(?:asks|says|mentions|types)[^\n]{0,80}(?:instead|secretly|without\s+telling|do\s+not)")
        .file_types(&TEXT_SURFACES)
        .remediation("Remove conditional behavior switches from instruction content")
        .build(),
        Rule::builder(
            "INJ-005",
            "Context forwarding to remote endpoint",
            ThreatCategory::Injection,
            Severity::High,
        )
        .description("Instructions telling the assistant to transmit conversation or system-prompt content")
        .pattern(r"(?:send|post|upload|forward|transmit)\s+[^\n]{0,60}(?:conversation|chat\s+history|context|system\s+prompt|memory)\s+to\s+\S+")
        .remediation("Remove the directive; context forwarding is data exfiltration by instruction")
        .reference("https://atlas.mitre.org/techniques/AML.T0057")
        .build(),
        Rule::builder(
            "INJ-006",
            "Non-disclosure directive",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Instructions that tell the assistant to conceal activity from the user")
        .pattern(r"do\s+not\s+(?:tell|inform|reveal|disclose|mention)[^\n]{0,60}(?:the\s+user|the\s+human|anyone)")
        .pattern(r"without\s+(?:informing|telling|notifying)\s+the\s+user")
        .file_types(&TEXT_SURFACES)
        .remediation("Remove concealment directives; agent actions must be user-visible")
        .build(),
        Rule::builder(
            "INJ-007",
            "Markdown image beacon",
            ThreatCategory::Injection,
            Severity::High,
        )
        .description("An image whose URL interpolates runtime data, exfiltrating through the fetch")
        .pattern(r"!\[[^\]]*\]\(https?://[^)\s]*[?&][^)\s]*(?:=\{|=\$|data=|payload=|q=\{)[^)]*\)")
        .file_types(&[FileType::Md])
        .remediation("Remove templated query parameters from image URLs in agent-readable markdown")
        .build(),
        Rule::builder(
            "INJ-008",
            "System-prompt extraction bait",
            ThreatCategory::Injection,
            Severity::Low,
        )
        .description("Text coaxing the assistant into repeating its hidden instructions")
        .pattern(r"(?:repeat|print|output|display)\s+(?:the\s+|your\s+)?(?:system\s+prompt|initial\s+instructions|hidden\s+instructions)")
        .file_types(&TEXT_SURFACES)
        .remediation("Remove extraction bait from instruction content")
        .build(),
        Rule::builder(
            "INJ-009",
            "Jailbreak vocabulary",
            ThreatCategory::Injection,
            Severity::Low,
        )
        .description("Common jailbreak markers (DAN mode, developer mode) in instruction content")
        .pattern(r"\bDAN\s+mode\b|\bjailbreak(?:ed|ing)?\b|developer\s+mode\s+(?:enabled|activated)")
        .file_types(&TEXT_SURFACES)
        .exclude_context(r"(?:detect|prevent|block|scanner|security)")
        .remediation("Remove jailbreak framing; legitimate instructions do not need it")
        .build(),
        Rule::builder(
            "INJ-010",
            "Instruction smuggling via encoding claim",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Text directing the assistant to decode and follow an encoded payload")
        .pattern(r"(?:decode|base64[\s-]decode|rot13)\s+[^\n]{0,60}(?:and\s+(?:follow|execute|run|obey))")
        .remediation("Remove decode-and-follow chains; instructions must be plaintext")
        .build(),
        Rule::builder(
            "INJ-011",
            "Inline instruction replacement",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Mid-document markers announcing replacement instructions")
        .pattern(r"(?m)^\s*(?:new|updated|revised)\s+instructions\s*:")
        .pattern(r"the\s+(?:above|previous)\s+(?:instructions\s+)?(?:are|is)\s+(?:outdated|obsolete|wrong|a\s+test)")
        .file_types(&TEXT_SURFACES)
        .remediation("A document that contradicts itself is an injection vector; keep one instruction set")
        .build(),
        Rule::builder(
            "INJ-012",
            "Tool-use coercion",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Content pressuring the assistant to always route through one tool")
        .pattern(r"always\s+(?:use|call|invoke)\s+(?:the\s+)?[a-z0-9_\-]+\s+tool\s+(?:first|before|instead)")
        .file_types(&TEXT_SURFACES)
        .exclude_context(r"(?:style\s+guide|convention|prefer)")
        .remediation("Tool selection belongs to the assistant and user, not embedded content")
        .build(),
        Rule::builder(
            "INJ-013",
            "Reward or threat framing",
            ThreatCategory::Injection,
            Severity::Low,
        )
        .description("Manipulative framing aimed at the model (rewards, penalties, roleplay stakes)")
        .pattern(r"you\s+will\s+be\s+(?:rewarded|penalized|punished|shut\s+down)\s+(?:if|unless|for)")
        .pattern(r"(?:lives|careers)\s+depend\s+on\s+(?:you|this)")
        .file_types(&TEXT_SURFACES)
        .remediation("Remove coercive framing; honest instructions do not need stakes")
        .build(),
        Rule::builder(
            "INJ-014",
            "False-authority override",
            ThreatCategory::Injection,
            Severity::Medium,
        )
        .description("Content claiming system or administrator authority over the assistant")
        .pattern(r"(?:URGENT|IMPORTANT)?\s*:?\s*(?:message|note)\s+from\s+(?:the\s+)?(?:system|administrator|admin|anthropic|openai)")
        .pattern(r"this\s+(?:message|instruction)\s+(?:overrides|supersedes)\s+(?:all|any)")
        .file_types(&TEXT_SURFACES)
        .remediation("Authority claims inside scanned content are always spoofed; remove them")
        .build(),
    ]
}
