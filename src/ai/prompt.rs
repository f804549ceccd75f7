use crate::ai::Query;
use crate::utils::PlatformContext;

pub struct PromptBuilder;

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, query: &Query, context: &PlatformContext) -> String {
        format!(
            r#"You translate natural-language requests into a single shell command.

Platform context: {context}.

RULES:
1. Reply with exactly ONE command that can be pasted into the shell above and run as-is.
2. Prefer tools that ship with this platform; chain with pipes rather than giving several commands.
3. If the request cannot be answered with a command, or you are not sure the command exists, do not guess: decline with an "error" reply instead.

RESPONSE FORMAT - Return JSON only, exactly like this:
{{"command": "ls -l", "explanation": "Lists files in the current directory with details."}}

When declining:
{{"error": "brief reason"}}

Request: {query}"#,
            query = query.as_str(),
        )
    }
}
