//! Key names to `Input.dispatchKeyEvent` parameters.

use serde_json::{json, Map, Value};

use crate::error::{AdapterError, AdapterErrorKind};

pub const MODIFIER_ALT: u32 = 1;
pub const MODIFIER_CONTROL: u32 = 2;
pub const MODIFIER_META: u32 = 4;
pub const MODIFIER_SHIFT: u32 = 8;

/// Resolved description of a single key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub text: Option<String>,
    /// Modifier bit this key toggles, zero for ordinary keys.
    pub modifier: u32,
}

impl KeyDefinition {
    fn named(key: &str, code: &str, key_code: u32, text: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
            modifier: 0,
        }
    }

    fn modifier(key: &str, code: &str, key_code: u32, bit: u32) -> Self {
        Self {
            modifier: bit,
            ..Self::named(key, code, key_code, None)
        }
    }

    /// Looks a key up by the names used in plans (`Enter`, `Control`, `a`, `F5`).
    pub fn lookup(name: &str) -> Result<Self, AdapterError> {
        let def = match name {
            "Enter" | "Return" => Self::named("Enter", "Enter", 13, Some("\r")),
            "Tab" => Self::named("Tab", "Tab", 9, None),
            "Escape" | "Esc" => Self::named("Escape", "Escape", 27, None),
            "Backspace" => Self::named("Backspace", "Backspace", 8, None),
            "Delete" => Self::named("Delete", "Delete", 46, None),
            "Space" | " " => Self::named(" ", "Space", 32, Some(" ")),
            "ArrowUp" => Self::named("ArrowUp", "ArrowUp", 38, None),
            "ArrowDown" => Self::named("ArrowDown", "ArrowDown", 40, None),
            "ArrowLeft" => Self::named("ArrowLeft", "ArrowLeft", 37, None),
            "ArrowRight" => Self::named("ArrowRight", "ArrowRight", 39, None),
            "Home" => Self::named("Home", "Home", 36, None),
            "End" => Self::named("End", "End", 35, None),
            "PageUp" => Self::named("PageUp", "PageUp", 33, None),
            "PageDown" => Self::named("PageDown", "PageDown", 34, None),
            "Alt" => Self::modifier("Alt", "AltLeft", 18, MODIFIER_ALT),
            "Control" | "Ctrl" => Self::modifier("Control", "ControlLeft", 17, MODIFIER_CONTROL),
            "Meta" | "Command" | "Cmd" => Self::modifier("Meta", "MetaLeft", 91, MODIFIER_META),
            "Shift" => Self::modifier("Shift", "ShiftLeft", 16, MODIFIER_SHIFT),
            other => return Self::lookup_other(other),
        };
        Ok(def)
    }

    fn lookup_other(name: &str) -> Result<Self, AdapterError> {
        if let Some(n) = name
            .strip_prefix('F')
            .and_then(|rest| rest.parse::<u32>().ok())
            .filter(|n| (1..=12).contains(n))
        {
            return Ok(Self::named(name, name, 111 + n, None));
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Self::character(ch)),
            _ => Err(AdapterError::new(AdapterErrorKind::InvalidArgument)
                .with_hint(format!("unknown key '{name}'"))),
        }
    }

    /// Definition for a single printable character.
    pub fn character(ch: char) -> Self {
        let upper = ch.to_ascii_uppercase();
        let (code, key_code) = if ch.is_ascii_alphabetic() {
            (format!("Key{upper}"), upper as u32)
        } else if ch.is_ascii_digit() {
            (format!("Digit{ch}"), ch as u32)
        } else {
            (String::new(), 0)
        };
        Self {
            key: ch.to_string(),
            code,
            key_code,
            text: Some(ch.to_string()),
            modifier: 0,
        }
    }

    pub fn is_modifier(&self) -> bool {
        self.modifier != 0
    }

    /// Builds an `Input.dispatchKeyEvent` payload.
    ///
    /// `held` is the modifier mask active while this event fires. Text is
    /// suppressed under Control, Alt or Meta so shortcuts do not insert
    /// characters.
    pub fn event(&self, event_type: &str, held: u32) -> Value {
        let mut params = Map::new();
        params.insert("type".into(), json!(event_type));
        params.insert("key".into(), json!(self.key));
        params.insert("code".into(), json!(self.code));
        params.insert("windowsVirtualKeyCode".into(), json!(self.key_code));
        params.insert("modifiers".into(), json!(held));
        let suppress_text = held & (MODIFIER_CONTROL | MODIFIER_ALT | MODIFIER_META) != 0;
        if event_type == "keyDown" && !suppress_text {
            if let Some(text) = &self.text {
                params.insert("text".into(), json!(text));
            }
        }
        Value::Object(params)
    }
}

/// Splits `Mod1+Mod2+Key` into its parts. A lone `+` is the plus key.
pub fn split_combo(combo: &str) -> (Vec<&str>, &str) {
    if combo == "+" || !combo.contains('+') {
        return (Vec::new(), combo);
    }
    let (mods, last) = match combo.strip_suffix("++") {
        Some(prefix) => (prefix, "+"),
        None => match combo.rsplit_once('+') {
            Some((prefix, last)) => (prefix, last),
            None => ("", combo),
        },
    };
    let modifiers = mods.split('+').filter(|part| !part.is_empty()).collect();
    (modifiers, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_modifier_combos_in_order() {
        assert_eq!(split_combo("Control+Shift+K"), (vec!["Control", "Shift"], "K"));
        assert_eq!(split_combo("Escape"), (Vec::new(), "Escape"));
        assert_eq!(split_combo("Control++"), (vec!["Control"], "+"));
    }

    #[test]
    fn modifiers_carry_their_bit() {
        let ctrl = KeyDefinition::lookup("Control").unwrap();
        assert!(ctrl.is_modifier());
        assert_eq!(ctrl.modifier, MODIFIER_CONTROL);
        assert!(!KeyDefinition::lookup("Enter").unwrap().is_modifier());
    }

    #[test]
    fn shortcut_key_down_has_no_text() {
        let n = KeyDefinition::lookup("n").unwrap();
        assert_eq!(n.code, "KeyN");
        assert_eq!(n.event("keyDown", 0)["text"], "n");
        assert!(n.event("keyDown", MODIFIER_CONTROL).get("text").is_none());
    }

    #[test]
    fn unknown_multi_char_key_is_rejected() {
        assert!(KeyDefinition::lookup("Hyper").is_err());
        assert_eq!(KeyDefinition::lookup("F5").unwrap().key_code, 116);
    }
}
