//! Rule-based automatic replies.
//!
//! Rules are checked in insertion order; the first rule that matches and is
//! not cooling down produces the reply.

use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tokio::time::Instant;

use super::AutomationError;

/// Placeholder replaced with the incoming message text.
const CONTENT_PLACEHOLDER: &str = "{content}";

/// What a message must look like for a rule to fire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Trigger {
    Exact(String),
    Contains(String),
    /// Regular expression; `$1`/`${name}` in the response expand to captures.
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseRule {
    pub trigger: Trigger,
    pub response: String,
    #[serde(default, rename = "cooldownMs", with = "cooldown_millis")]
    pub cooldown: Option<Duration>,
}

impl ResponseRule {
    pub fn new(trigger: Trigger, response: impl Into<String>) -> Self {
        Self {
            trigger,
            response: response.into(),
            cooldown: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }
}

enum Matcher {
    Exact(String),
    Contains(String),
    Regex(Regex),
}

struct CompiledRule {
    matcher: Matcher,
    response: String,
    cooldown: Option<Duration>,
    last_fired: Option<Instant>,
}

impl CompiledRule {
    fn cooling_down(&self, now: Instant) -> bool {
        match (self.cooldown, self.last_fired) {
            (Some(cooldown), Some(fired)) => now.duration_since(fired) < cooldown,
            _ => false,
        }
    }

    fn render(&self, content: &str, normalized: &str) -> Option<String> {
        let reply = match &self.matcher {
            Matcher::Exact(needle) => (normalized == needle.as_str()).then(|| self.response.clone())?,
            Matcher::Contains(needle) => {
                normalized.contains(needle.as_str()).then(|| self.response.clone())?
            }
            Matcher::Regex(regex) => {
                let caps = regex.captures(content)?;
                // `$` in the message must survive capture expansion literally.
                let template = self
                    .response
                    .replace(CONTENT_PLACEHOLDER, &content.replace('$', "$$"));
                let mut expanded = String::new();
                caps.expand(&template, &mut expanded);
                return Some(expanded);
            }
        };
        Some(reply.replace(CONTENT_PLACEHOLDER, content))
    }
}

pub struct AutoResponder {
    case_sensitive: bool,
    rules: Vec<CompiledRule>,
}

impl AutoResponder {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            rules: Vec::new(),
        }
    }

    /// Load rules from a JSON array of rule objects.
    pub fn from_json_str(raw: &str, case_sensitive: bool) -> Result<Self, AutomationError> {
        let rules: Vec<ResponseRule> = serde_json::from_str(raw)?;
        let mut responder = Self::new(case_sensitive);
        for rule in rules {
            responder.add_rule(rule)?;
        }
        Ok(responder)
    }

    pub fn add_rule(&mut self, rule: ResponseRule) -> Result<(), AutomationError> {
        let matcher = match rule.trigger {
            Trigger::Exact(text) => Matcher::Exact(self.normalize(&text)),
            Trigger::Contains(text) => Matcher::Contains(self.normalize(&text)),
            Trigger::Regex(pattern) => {
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(!self.case_sensitive)
                    .build()
                    .map_err(|source| AutomationError::InvalidPattern { pattern, source })?;
                Matcher::Regex(regex)
            }
        };
        self.rules.push(CompiledRule {
            matcher,
            response: rule.response,
            cooldown: rule.cooldown,
            last_fired: None,
        });
        Ok(())
    }

    /// Reply for `content`, if any rule fires.
    pub fn respond(&mut self, content: &str) -> Option<String> {
        let now = Instant::now();
        let normalized = self.normalize(content);
        for rule in &mut self.rules {
            if rule.cooling_down(now) {
                continue;
            }
            if let Some(reply) = rule.render(content, &normalized) {
                rule.last_fired = Some(now);
                return Some(reply);
            }
        }
        None
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    fn normalize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }
}

impl Default for AutoResponder {
    fn default() -> Self {
        Self::new(false)
    }
}

mod cooldown_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_contains_ignore_case_by_default() {
        let mut responder = AutoResponder::default();
        responder
            .add_rule(ResponseRule::new(Trigger::Exact("ping".into()), "pong"))
            .unwrap();
        responder
            .add_rule(ResponseRule::new(Trigger::Contains("hello".into()), "hi there"))
            .unwrap();

        assert_eq!(responder.respond("  PING ").as_deref(), Some("pong"));
        assert_eq!(responder.respond("ping pong").as_deref(), None);
        assert_eq!(responder.respond("well Hello you").as_deref(), Some("hi there"));
    }

    #[test]
    fn case_sensitive_responder_requires_exact_case() {
        let mut responder = AutoResponder::new(true);
        responder
            .add_rule(ResponseRule::new(Trigger::Exact("Ping".into()), "Pong"))
            .unwrap();
        assert!(responder.respond("ping").is_none());
        assert_eq!(responder.respond("Ping").as_deref(), Some("Pong"));
    }

    #[test]
    fn pattern_expands_captures_and_content() {
        let mut responder = AutoResponder::default();
        responder
            .add_rule(ResponseRule::new(
                Trigger::Regex(r"^!echo (?P<text>.+)$".into()),
                "${text} (from: {content})",
            ))
            .unwrap();
        assert_eq!(
            responder.respond("!echo hey").as_deref(),
            Some("hey (from: !echo hey)")
        );
    }

    #[test]
    fn captured_text_is_not_treated_as_placeholder() {
        let mut responder = AutoResponder::default();
        responder
            .add_rule(ResponseRule::new(
                Trigger::Regex(r"^!say (.+)$".into()),
                "$1 / {content}",
            ))
            .unwrap();
        assert_eq!(
            responder.respond("!say {content}").as_deref(),
            Some("{content} / !say {content}")
        );
        assert_eq!(
            responder.respond("!say $1 costs $5").as_deref(),
            Some("$1 costs $5 / !say $1 costs $5")
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut responder = AutoResponder::default();
        let err = responder
            .add_rule(ResponseRule::new(Trigger::Regex("(".into()), "x"))
            .expect_err("should fail");
        assert!(matches!(err, AutomationError::InvalidPattern { .. }));
        assert_eq!(responder.rule_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_falls_through_to_next_rule() {
        let mut responder = AutoResponder::default();
        responder
            .add_rule(
                ResponseRule::new(Trigger::Contains("gm".into()), "good morning!")
                    .with_cooldown(Duration::from_secs(60)),
            )
            .unwrap();
        responder
            .add_rule(ResponseRule::new(Trigger::Contains("gm".into()), "gm"))
            .unwrap();

        assert_eq!(responder.respond("gm all").as_deref(), Some("good morning!"));
        assert_eq!(responder.respond("gm all").as_deref(), Some("gm"));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(responder.respond("gm all").as_deref(), Some("good morning!"));
    }

    #[test]
    fn loads_rules_from_json() {
        let raw = r#"[
            {"trigger": {"type": "exact", "value": "help"}, "response": "see #faq"},
            {"trigger": {"type": "regex", "value": "^roll (\\d+)$"}, "response": "rolling $1", "cooldownMs": 5000}
        ]"#;
        let mut responder = AutoResponder::from_json_str(raw, false).unwrap();
        assert_eq!(responder.rule_count(), 2);
        assert_eq!(responder.respond("roll 20").as_deref(), Some("rolling 20"));
    }
}
