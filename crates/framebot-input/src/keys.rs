//! Key names to Windows virtual-key codes.
//!
//! Names follow the lower-case conventions used in action configs
//! (`"ctrl"`, `"f9"`, `"w"`). The table is plain data so it can be checked
//! on every platform.

/// Virtual-key code for `name`, or `None` if the name is unknown.
pub fn virtual_key(name: &str) -> Option<u16> {
    let lower = name.trim().to_ascii_lowercase();

    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_uppercase() as u16);
        }
    }

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u16>().ok()) {
        if (1..=24).contains(&n) {
            return Some(0x70 + n - 1);
        }
    }

    let code = match lower.as_str() {
        "backspace" => 0x08,
        "tab" => 0x09,
        "enter" | "return" => 0x0D,
        "shift" => 0x10,
        "ctrl" | "control" => 0x11,
        "alt" => 0x12,
        "pause" => 0x13,
        "capslock" => 0x14,
        "esc" | "escape" => 0x1B,
        "space" => 0x20,
        "pageup" => 0x21,
        "pagedown" => 0x22,
        "end" => 0x23,
        "home" => 0x24,
        "left" => 0x25,
        "up" => 0x26,
        "right" => 0x27,
        "down" => 0x28,
        "insert" => 0x2D,
        "delete" | "del" => 0x2E,
        "win" | "super" => 0x5B,
        _ => return None,
    };
    Some(code)
}

/// Check a whole chord up front so nothing is pressed if any key is unknown.
pub fn chord(keys: &[&str]) -> Option<Vec<u16>> {
    keys.iter().map(|k| virtual_key(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(virtual_key("w"), Some(0x57));
        assert_eq!(virtual_key("W"), Some(0x57));
        assert_eq!(virtual_key("3"), Some(0x33));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(virtual_key("f1"), Some(0x70));
        assert_eq!(virtual_key("F9"), Some(0x78));
        assert_eq!(virtual_key("f24"), Some(0x87));
        assert_eq!(virtual_key("f25"), None);
        assert_eq!(virtual_key("f0"), None);
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(virtual_key("ctrl"), Some(0x11));
        assert_eq!(virtual_key("control"), Some(0x11));
        assert_eq!(virtual_key("Escape"), Some(0x1B));
        assert_eq!(virtual_key(" space "), Some(0x20));
        assert_eq!(virtual_key("kp_next"), None);
        assert_eq!(virtual_key(""), None);
    }

    #[test]
    fn test_chord_is_all_or_nothing() {
        assert_eq!(chord(&["ctrl", "c"]), Some(vec![0x11, 0x43]));
        assert_eq!(chord(&["ctrl", "nope"]), None);
        assert_eq!(chord(&[]), Some(vec![]));
    }
}
