use serde::{Deserialize, Serialize};

/// UI events accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    SetPrivacy { enabled: bool },
    SetHeatmap { enabled: bool },
    /// Presentation only; carried so every viewer agrees on the theme.
    SetDarkMode { enabled: bool },
    /// Pause on a history index (timeline scrubber).
    Scrub { index: usize },
    ResumeLive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_use_snake_case_tags() {
        let scrub: ControlAction = serde_json::from_str(r#"{"action":"scrub","index":7}"#).unwrap();
        assert_eq!(scrub, ControlAction::Scrub { index: 7 });

        let json = serde_json::to_string(&ControlAction::SetHeatmap { enabled: true }).unwrap();
        assert_eq!(json, r#"{"action":"set_heatmap","enabled":true}"#);

        let resume: ControlAction = serde_json::from_str(r#"{"action":"resume_live"}"#).unwrap();
        assert_eq!(resume, ControlAction::ResumeLive);
    }
}
