// Shared prompt fragments. Each module that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that keeps output to plain prose.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise recruiting assistant. \
    Respond in plain text only. \
    Do NOT use markdown, headings, bullet characters, or code fences. \
    Do NOT include apologies or meta commentary.";

/// Instruction appended to prompts that must not invent facts.
pub const GROUNDING_INSTRUCTION: &str = "\
    Only state qualifications that appear in the candidate material provided. \
    If the material does not support a claim, leave it out.";
