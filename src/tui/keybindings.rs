use crate::tui::action::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Maps KeyEvents to Actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(rename = "bindings")]
    bindings_list: Vec<KeyBinding>,

    #[serde(skip)]
    bindings_map: HashMap<KeyPattern, Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_list(vec![
            // Navigation
            KeyBinding::new("Up", Action::MoveUp),
            KeyBinding::new("Down", Action::MoveDown),
            KeyBinding::new("Left", Action::MoveLeft),
            KeyBinding::new("Right", Action::MoveRight),
            KeyBinding::new("k", Action::MoveUp),
            KeyBinding::new("j", Action::MoveDown),
            KeyBinding::new("h", Action::MoveLeft),
            KeyBinding::new("l", Action::MoveRight),
            KeyBinding::new("PageUp", Action::PageUp),
            KeyBinding::new("PageDown", Action::PageDown),
            KeyBinding::new("Ctrl+u", Action::PageUp),
            KeyBinding::new("Ctrl+d", Action::PageDown),
            KeyBinding::new("Home", Action::GoToTop),
            KeyBinding::new("End", Action::GoToBottom),
            KeyBinding::new("g", Action::GoToTop),
            KeyBinding::new("G", Action::GoToBottom),
            KeyBinding::new("<", Action::ScrollLeft),
            KeyBinding::new(">", Action::ScrollRight),
            // Table
            KeyBinding::new("f", Action::OpenFilter),
            KeyBinding::new("a", Action::SortAscending),
            KeyBinding::new("d", Action::SortDescending),
            KeyBinding::new("x", Action::HideColumn),
            KeyBinding::new("Enter", Action::OpenDetail),
            // Overlays
            KeyBinding::new("c", Action::OpenColumnSelector),
            KeyBinding::new("u", Action::OpenUpload),
            // Reports
            KeyBinding::new("s", Action::Download),
            KeyBinding::new("S", Action::DownloadSample),
            // Application
            KeyBinding::new("q", Action::Quit),
            KeyBinding::new("Ctrl+c", Action::Quit),
            KeyBinding::new("Esc", Action::Cancel),
            KeyBinding::new("Space", Action::Confirm),
        ])
    }
}

impl KeyBindings {
    fn from_list(bindings_list: Vec<KeyBinding>) -> Self {
        let bindings_map = Self::build_map(&bindings_list);
        Self {
            bindings_list,
            bindings_map,
        }
    }

    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<KeyPattern, Action> {
        bindings
            .iter()
            .filter_map(|b| {
                KeyPattern::from_string(&b.key)
                    .ok()
                    .map(|pattern| (pattern, b.action))
            })
            .collect()
    }

    /// Layer user bindings over these. A user key replaces whatever the key
    /// was bound to; unparsable keys are logged and skipped.
    pub fn with_overrides(mut self, overrides: &HashMap<String, Action>) -> Self {
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();
        for key in keys {
            let action = overrides[key];
            let Ok(pattern) = KeyPattern::from_string(key) else {
                warn!("ignoring invalid key binding '{key}'");
                continue;
            };
            self.bindings_list
                .retain(|b| KeyPattern::from_string(&b.key).ok().as_ref() != Some(&pattern));
            self.bindings_list.push(KeyBinding::new(key, action));
        }
        self.bindings_map = Self::build_map(&self.bindings_list);
        self
    }

    /// Get action for key event
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map.get(&pattern).copied()
    }

    /// Get all bindings for an action (for help display)
    pub fn get_keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.clone())
            .collect()
    }

    /// Key hint line such as "f Filter  c Columns"
    pub fn hints(&self, actions: &[Action]) -> String {
        actions
            .iter()
            .filter_map(|action| {
                self.get_keys_for_action(*action)
                    .first()
                    .map(|key| format!("{key} {}", action.hint()))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Check for actions that don't have any keybindings
    /// Returns Vec of (Action, description) for unbound actions
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen_keys: HashMap<String, Action> = HashMap::new();
        for binding in &self.bindings_list {
            if let Some(existing_action) = seen_keys.get(&binding.key) {
                warnings.push(format!(
                    "Duplicate key '{}': bound to both {:?} and {:?}",
                    binding.key, existing_action, binding.action
                ));
            } else {
                seen_keys.insert(binding.key.clone(), binding.action);
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "Warning: {} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for binding in &self.bindings_list {
            if KeyPattern::from_string(&binding.key).is_err() {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
            }
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Normalized pattern of a key event. Upper-case letters are stored as the
    /// lower-case letter plus Shift, the same way [`KeyPattern::from_string`]
    /// reads them.
    pub fn from_event(event: &KeyEvent) -> Self {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => Self {
                code: KeyCode::Char(c.to_ascii_lowercase()),
                modifiers: event.modifiers | KeyModifiers::SHIFT,
            },
            KeyCode::Char(c) if !c.is_ascii_alphanumeric() && c != ' ' => Self {
                // Terminals disagree on whether punctuation carries Shift
                code: event.code,
                modifiers: event.modifiers.difference(KeyModifiers::SHIFT),
            },
            _ => Self {
                code: event.code,
                modifiers: event.modifiers,
            },
        }
    }

    /// Parse from string (e.g., "Ctrl+C", "G", "PageUp")
    pub fn from_string(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = if s == "+" { vec!["+"] } else { s.split('+').collect() };

        let mut modifiers = KeyModifiers::empty();
        let key_part = if parts.len() > 1 {
            for part in &parts[..parts.len() - 1] {
                match part.to_lowercase().as_str() {
                    "ctrl" => modifiers |= KeyModifiers::CONTROL,
                    "alt" => modifiers |= KeyModifiers::ALT,
                    "shift" => modifiers |= KeyModifiers::SHIFT,
                    _ => return Err(format!("Unknown modifier: {}", part)),
                }
            }
            parts[parts.len() - 1]
        } else {
            parts[0]
        };

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),

            // Single characters (must come before function key check to avoid matching 'f')
            _ if key_part.chars().count() == 1 => {
                let Some(ch) = key_part.chars().next() else {
                    return Err(format!("Unknown key: {}", key_part));
                };
                if ch.is_ascii_uppercase() {
                    modifiers |= KeyModifiers::SHIFT;
                }
                KeyCode::Char(ch.to_ascii_lowercase())
            }

            // Function keys: F1-F12
            s if s.starts_with('f') && (2..=3).contains(&s.len()) => match s[1..].parse::<u8>() {
                Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                _ => return Err(format!("Invalid function key: {}", s)),
            },

            _ => return Err(format!("Unknown key: {}", key_part)),
        };

        Ok(Self { code, modifiers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pattern_parsing() {
        assert!(KeyPattern::from_string("Ctrl+c").is_ok());
        assert!(KeyPattern::from_string("a").is_ok());
        assert!(KeyPattern::from_string("F1").is_ok());
        assert!(KeyPattern::from_string("Up").is_ok());
        assert!(KeyPattern::from_string("Hyper+x").is_err());
        assert!(KeyPattern::from_string("F13").is_err());
    }

    #[test]
    fn test_uppercase_matches_shifted_event() {
        let bindings = KeyBindings::default();
        let shifted = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(bindings.get_action(&shifted), Some(Action::GoToBottom));
        let plain = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::NONE);
        assert_eq!(bindings.get_action(&plain), Some(Action::GoToTop));
        let gt = KeyEvent::new(KeyCode::Char('>'), KeyModifiers::SHIFT);
        assert_eq!(bindings.get_action(&gt), Some(Action::ScrollRight));
    }

    #[test]
    fn test_default_bindings_are_valid() {
        let bindings = KeyBindings::default();
        for warning in bindings.validate() {
            assert!(
                !warning.contains("Invalid key pattern"),
                "Found invalid pattern: {}",
                warning
            );
        }
    }

    #[test]
    fn test_overrides_replace_key() {
        let overrides = HashMap::from([("x".to_string(), Action::OpenFilter)]);
        let bindings = KeyBindings::default().with_overrides(&overrides);
        let x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(bindings.get_action(&x), Some(Action::OpenFilter));
        assert!(bindings.get_keys_for_action(Action::HideColumn).is_empty());
    }
}
