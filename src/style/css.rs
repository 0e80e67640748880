//! Inline style maps and the helpers that turn them into `style="..."` text.

/// Ordered property map keyed by camelCase (or already kebab-case) names.
///
/// Insertion order is preserved. Setting an existing key replaces its value in
/// place, so merging maps keeps the position of the first occurrence while the
/// later value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    entries: Vec<(String, Option<String>)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.set_opt(key, Some(value.into()))
    }

    /// Record a possibly absent value. Absent values are skipped by [`cssify`]
    /// but still override an earlier value for the same key.
    pub fn set_opt(&mut self, key: &str, value: Option<String>) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    /// Builder form of [`StyleMap::set`].
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    /// Apply `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: &StyleMap) -> &mut Self {
        for (k, v) in &other.entries {
            self.set_opt(k, v.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.as_deref().map_or(true, str::is_empty))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn to_css(&self) -> String {
        cssify(self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (k, v) in iter {
            let key: String = k.into();
            map.set(&key, v);
        }
        map
    }
}

/// Serialize a style map as `prop: value; prop: value`.
///
/// Empty and absent values are dropped and keys are converted to kebab-case.
pub fn cssify(styles: &StyleMap) -> String {
    styles
        .iter()
        .filter_map(|(k, v)| match v {
            Some(v) if !v.is_empty() => Some(format!("{}: {}", kebab_case(k), v)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// `fontSize` -> `font-size`, `mask_size` -> `mask-size`.
///
/// Applying it to its own output returns the same string.
pub fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    let mut in_gap = false;
    for c in key.chars() {
        if c.is_whitespace() || c == '_' {
            if !in_gap {
                out.push('-');
                in_gap = true;
            }
            prev = Some(c);
            continue;
        }
        in_gap = false;
        if c.is_ascii_uppercase() && prev.map_or(false, |p| p.is_ascii_lowercase()) {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
        prev = Some(c);
    }
    out
}

/// Format a CSS number: at most four decimals, no trailing zeros, no `-0`.
pub fn num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

pub fn px(value: f64) -> String {
    format!("{}px", num(value))
}

pub fn percent(value: f64) -> String {
    format!("{}%", num(value))
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cssify_drops_empty_and_kebabs_keys() {
        let mut styles = StyleMap::new();
        styles.set("fontSize", "12px").set_opt("margin", None);
        assert_eq!(cssify(&styles), "font-size: 12px");
    }

    #[test]
    fn cssify_preserves_insertion_order() {
        let styles: StyleMap = [("zIndex", "2"), ("backgroundColor", "red"), ("top", "")]
            .into_iter()
            .collect();
        assert_eq!(cssify(&styles), "z-index: 2; background-color: red");
    }

    #[test]
    fn merge_overrides_in_place() {
        let mut base = StyleMap::new().with("width", "1px").with("height", "2px");
        base.merge(&StyleMap::new().with("width", "3px").with("top", "0"));
        assert_eq!(cssify(&base), "width: 3px; height: 2px; top: 0");
    }

    #[test]
    fn kebab_case_is_idempotent() {
        for key in ["fontSize", "WebkitMaskImage", "-webkit-mask-size", "text shadow", "a__b"] {
            let once = kebab_case(key);
            assert_eq!(kebab_case(&once), once);
        }
        assert_eq!(kebab_case("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(kebab_case("a__b"), "a-b");
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(num(100.0), "100");
        assert_eq!(num(0.1 + 0.2), "0.3");
        assert_eq!(num(-0.00001), "0");
        assert_eq!(num(f64::NAN), "0");
        assert_eq!(px(12.5), "12.5px");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }
}
