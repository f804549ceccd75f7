use log::debug;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Parsed result of one model call. Immutable once built; edits made by the
/// user live in the action loop, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    command: String,
    explanation: Option<String>,
    raw_response: String,
}

impl Resolution {
    pub fn new(
        command: impl Into<String>,
        explanation: Option<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            explanation,
            raw_response: raw_response.into(),
        }
    }

    /// May be empty when the model declined; that is not an error.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub command: String,
    pub explanation: Option<String>,
}

/// Ways of reading a command out of a free-form model reply, tried in
/// [`ExtractionStrategy::ORDERED`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    FencedBlock,
    StructuredField,
    FirstLine,
}

impl ExtractionStrategy {
    pub const ORDERED: [ExtractionStrategy; 3] = [
        ExtractionStrategy::FencedBlock,
        ExtractionStrategy::StructuredField,
        ExtractionStrategy::FirstLine,
    ];

    pub fn extract(self, raw: &str) -> Option<Extraction> {
        match self {
            ExtractionStrategy::FencedBlock => fenced_block(raw),
            ExtractionStrategy::StructuredField => structured_field(raw),
            ExtractionStrategy::FirstLine => first_line(raw),
        }
    }
}

pub struct ResponseParser;

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> Resolution {
        for strategy in ExtractionStrategy::ORDERED {
            let Some(extraction) = strategy.extract(raw) else {
                continue;
            };

            let command = strip_wrapping(&extraction.command).to_string();
            if command.is_empty() && extraction.explanation.is_none() {
                continue;
            }

            debug!("Extracted command via {strategy:?}");
            return Resolution::new(command, extraction.explanation, raw);
        }

        debug!("No command found in response");
        Resolution::new(String::new(), Some(raw.to_string()), raw)
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// `None` only if the pattern fails to compile, which disables the fenced
/// strategies rather than the whole parser.
fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[^\n]*\n(.*?)```").ok())
        .as_ref()
}

fn fenced_block(raw: &str) -> Option<Extraction> {
    for caps in fence_regex()?.captures_iter(raw) {
        let (Some(whole), Some(lang), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        if lang.as_str().eq_ignore_ascii_case("json") || parses_as_object(body.as_str()) {
            continue;
        }

        let command = body
            .as_str()
            .lines()
            .map(str::trim_end)
            .filter(|line| {
                let t = line.trim_start();
                !t.is_empty() && !(t.starts_with('#') && !t.starts_with("#!"))
            })
            .collect::<Vec<_>>()
            .join("\n");
        if command.trim().is_empty() {
            continue;
        }

        let surrounding = format!("{}{}", &raw[..whole.start()], &raw[whole.end()..]);
        let explanation = Some(surrounding.trim().to_string()).filter(|s| !s.is_empty());

        return Some(Extraction {
            command,
            explanation,
        });
    }
    None
}

fn structured_field(raw: &str) -> Option<Extraction> {
    let mut candidates = vec![raw.trim().to_string()];
    if let Some(fence) = fence_regex() {
        candidates.extend(
            fence
                .captures_iter(raw)
                .filter_map(|caps| caps.get(2).map(|m| m.as_str().trim().to_string())),
        );
    }
    if let Some(object) = first_json_object(raw) {
        candidates.push(object);
    }

    candidates
        .iter()
        .filter_map(|text| serde_json::from_str::<Value>(text).ok())
        .find_map(|value| extraction_from_value(&value))
}

fn extraction_from_value(value: &Value) -> Option<Extraction> {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => return items.iter().find_map(extraction_from_value),
        _ => return None,
    };

    let text = |key: &str| {
        object
            .get(key)
            .and_then(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(inner) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
    };

    if let Some(command) = object.get("command").and_then(Value::as_str) {
        return Some(Extraction {
            command: command.to_string(),
            explanation: text("explanation"),
        });
    }

    text("error").map(|reason| Extraction {
        command: String::new(),
        explanation: Some(reason),
    })
}

fn first_line(raw: &str) -> Option<Extraction> {
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        // "Here is the command:" style lead-ins are skipped, not judged.
        if trimmed.ends_with(':') {
            continue;
        }

        let candidate = strip_wrapping(trimmed);
        if candidate.is_empty() {
            continue;
        }
        return looks_like_command(candidate).then(|| Extraction {
            command: candidate.to_string(),
            explanation: None,
        });
    }
    None
}

// ============================================================================
// Helpers
// ============================================================================

const KNOWN_COMMANDS: &[&str] = &[
    "ls", "cd", "grep", "rg", "find", "fd", "docker", "kubectl", "git", "curl", "wget", "ssh",
    "scp", "rsync", "sudo", "cp", "mv", "rm", "mkdir", "touch", "cat", "less", "tail", "head",
    "ps", "kill", "pkill", "top", "htop", "df", "du", "tar", "zip", "unzip", "chmod", "chown",
    "echo", "printf", "awk", "sed", "sort", "uniq", "wc", "xargs", "jq", "npm", "cargo", "pip",
    "python", "python3", "brew", "apt", "apt-get", "dnf", "yum", "pacman", "systemctl",
    "journalctl", "lsof", "netstat", "ss", "ping", "open", "xdg-open", "export", "env", "which",
    "date", "history", "ln", "stat", "file", "dir", "type", "copy", "del", "powershell",
];

/// Plain-text lines are commands only when they read like one: shell syntax
/// or an option, a single program word, or a short known-program invocation.
/// Anything else, lowercase or not, is treated as prose.
fn looks_like_command(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    let (Some(first), Some(last)) = (words.first(), words.last()) else {
        return false;
    };

    let valid_program = first
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./~+=:@$%".contains(c));
    if !valid_program {
        return false;
    }

    let has_shell_syntax = ["|", ">", "<", "&&", "$(", "`", ";", "*", "~", "/", "="]
        .iter()
        .any(|marker| line.contains(marker))
        || words.iter().skip(1).any(|w| w.starts_with('-'));

    // "here." ends a sentence; "." and ".." are paths.
    let ends_with_word_and_period = last
        .strip_suffix('.')
        .is_some_and(|w| !w.is_empty() && w.chars().all(char::is_alphabetic));
    let ends_sentence =
        ends_with_word_and_period || (!has_shell_syntax && line.ends_with(['!', '?']));
    if ends_sentence {
        return false;
    }
    if has_shell_syntax {
        return true;
    }

    let mut chars = first.chars();
    let capitalised_word = chars.next().is_some_and(|c| c.is_uppercase())
        && chars.all(|c| c.is_ascii_lowercase());
    if capitalised_word {
        return false;
    }

    words.len() == 1 || (KNOWN_COMMANDS.contains(first) && words.len() <= 4)
}

/// Removes matching wrapping backticks or quotes, but only when the wrapped
/// text does not itself use that character.
fn strip_wrapping(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        if current.len() >= 6 && current.starts_with("```") && current.ends_with("```") {
            let inner = &current[3..current.len() - 3];
            if !inner.contains("```") {
                current = inner.trim();
                continue;
            }
        }

        let stripped = ['`', '"', '\''].iter().find_map(|&quote| {
            let inner = current.strip_prefix(quote)?.strip_suffix(quote)?;
            (!inner.contains(quote)).then_some(inner)
        });
        match stripped {
            Some(inner) => current = inner.trim(),
            None => return current,
        }
    }
}

fn parses_as_object(text: &str) -> bool {
    let t = text.trim();
    t.starts_with('{') && serde_json::from_str::<Value>(t).is_ok_and(|v| v.is_object())
}

/// First balanced `{...}` in the text, ignoring braces inside JSON strings.
fn first_json_object(raw: &str) -> Option<String> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' if start.is_some() => in_string = !in_string,
            _ if in_string => {}
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|begin| raw[begin..=idx].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
