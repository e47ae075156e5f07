use crate::error::EngineError;
use crate::models::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Depleted,
    Stressed,
    Unfocused,
    Sleep,
    General,
}

/// Checked in order; the first topic with a matching keyword wins.
const RULES: &[(Topic, &[&str])] = &[
    (Topic::Depleted, &["tired", "exhausted", "burnt", "burnout", "drained"]),
    (Topic::Stressed, &["stress", "anxious", "overwhelmed", "panic"]),
    (Topic::Unfocused, &["focus", "distracted", "procrastinat"]),
    (Topic::Sleep, &["sleep", "insomnia", "late"]),
];

impl Topic {
    pub fn detect(message: &str) -> Topic {
        let message = message.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|word| message.contains(word)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::General)
    }

    pub fn reply(&self) -> &'static str {
        match self {
            Topic::Depleted => {
                "You sound depleted. Try a 12-18 minute low-stimulus break, then pick one tiny task \
                 to restart momentum. Do you want a breathing or a walk suggestion?"
            }
            Topic::Stressed => {
                "Let's downshift: 60 seconds of box breathing (4-4-4-4), then a 5-minute screen \
                 break. What's the single most urgent task right now?"
            }
            Topic::Unfocused => {
                "Try a 25-minute focus sprint: pick one task, close extra tabs, and set a timer. \
                 Want a 2-minute reset exercise first?"
            }
            Topic::Sleep => {
                "For tonight: dim screens 60 minutes before bed, avoid heavy decisions, and do a \
                 3-minute slow-breath routine. What time do you plan to sleep?"
            }
            Topic::General => {
                "I can help with recovery moves, stress resets, or focus plans. Tell me how you're \
                 feeling or what you need right now."
            }
        }
    }
}

/// Canned supportive reply, prefixed with a nudge when the latest check-in
/// is already High or Critical.
pub fn reply(message: &str, risk: Option<RiskLevel>) -> Result<String, EngineError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(EngineError::validation("message", "message is required"));
    }

    let topic = Topic::detect(message);
    let reply = match risk {
        Some(level) if level >= RiskLevel::High => format!(
            "Your latest check-in reads {level} risk, so keep today light. {}",
            topic.reply()
        ),
        _ => topic.reply().to_string(),
    };
    Ok(reply)
}
