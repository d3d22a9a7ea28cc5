// StoreLens - core/ini.rs
//
// Legacy `[Section]` / `key=value` configuration parsing that survives
// repeated section headers.
//
// Two passes:
//   1. `rewrite_sections`: a pure text transform. Prepends a default header
//      when the file starts with bare keys, and renames the 2nd, 3rd, ...
//      occurrence of a section name (compared case-insensitively) to
//      `<name>_2`, `<name>_3`, ... Every other line passes through untouched.
//   2. `parse_rewritten`: a conventional key/value parse of the rewritten
//      text, which can now assume section names are unique.
//
// `parse_ini` never fails: unparseable text yields an empty configuration and
// a logged warning, so every config-derived flag reads "not configured".

use crate::core::reader::TextEncoding;
use crate::util::constants;
use crate::util::error::IniError;
use std::collections::{HashMap, HashSet};

/// One section of a parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
    name: String,
    /// Keys are stored lower-cased, in file order.
    entries: Vec<(String, String)>,
}

impl ConfigSection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A parsed configuration: uniquely named sections in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniConfig {
    sections: Vec<ConfigSection>,
}

impl IniConfig {
    /// Find a section by exact name, falling back to a case-insensitive match.
    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .or_else(|| {
                let folded = name.to_lowercase();
                self.sections.iter().find(|s| s.name.to_lowercase() == folded)
            })
    }

    /// Look up `key` in `section`, then in the `DEFAULT` section.
    ///
    /// A missing section yields `None`; `DEFAULT` only fills gaps in sections
    /// that exist.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let found = self.section(section)?;
        found.get(key).or_else(|| {
            self.sections
                .iter()
                .find(|s| s.name == constants::INI_DEFAULTS_SECTION)
                .and_then(|s| s.get(key))
        })
    }

    /// `get` with a fallback for absent sections or keys.
    pub fn get_or<'a>(&'a self, section: &str, key: &str, fallback: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(fallback)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Options for reading a configuration file.
#[derive(Debug, Clone)]
pub struct IniOptions {
    pub encoding: TextEncoding,
    /// Header prepended when the file starts with bare keys.
    pub default_section: String,
}

impl Default for IniOptions {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::default(),
            default_section: constants::DEFAULT_INI_SECTION.to_string(),
        }
    }
}

// =============================================================================
// Pass 1: duplicate-section rewrite
// =============================================================================

/// Section name of a header line, or `None` for any other line.
///
/// `[]` is a header naming the empty section.
fn header_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}

/// Rewrite `text` so that every section header names a distinct section.
///
/// The first occurrence of a name is kept verbatim. Later occurrences become
/// `<name>_<n>` where `n` is the occurrence count; if that name is already
/// taken (say the file literally contains `[S_2]`), `n` is bumped until it is
/// free. Names are compared case-insensitively. The result is deterministic
/// for a given input.
pub fn rewrite_sections(text: &str, default_section: &str) -> String {
    let first_meaningful = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !is_comment(l));
    let needs_default = matches!(first_meaningful, Some(l) if header_name(l).is_none());

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = String::with_capacity(text.len() + default_section.len() + 3);

    let mut emit_header = |name: &str, out: &mut String| {
        let folded = name.to_lowercase();
        let count = occurrences.entry(folded.clone()).or_insert(0);
        *count += 1;

        let mut n = *count;
        let mut candidate = if n == 1 {
            name.to_string()
        } else {
            format!("{name}_{n}")
        };
        while taken.contains(&candidate.to_lowercase()) {
            n += 1;
            candidate = format!("{name}_{n}");
        }
        if candidate != name {
            tracing::debug!(section = name, renamed = %candidate, "Renamed duplicate section");
        }
        taken.insert(candidate.to_lowercase());
        out.push('[');
        out.push_str(&candidate);
        out.push_str("]\n");
    };

    if needs_default {
        emit_header(default_section, &mut out);
    }

    for line in text.lines() {
        match header_name(line) {
            Some(name) => emit_header(name, &mut out),
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    out
}

// =============================================================================
// Pass 2: key/value parse
// =============================================================================

/// Parse text whose section names are already unique.
///
/// Accepts `key = value` and `key: value` (first delimiter wins), full-line
/// `#` / `;` comments, and continuation lines that extend the previous value.
/// A line continues a value only when it is indented deeper than the line
/// that started the key. A blank line ends a continuation.
pub fn parse_rewritten(text: &str) -> Result<IniConfig, IniError> {
    let mut config = IniConfig::default();
    // Entry index and indent width of the key a continuation would extend.
    let mut last_key: Option<(usize, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            last_key = None;
            continue;
        }
        if is_comment(trimmed) {
            continue;
        }
        if let Some(name) = header_name(trimmed) {
            config.sections.push(ConfigSection {
                name: name.to_string(),
                entries: Vec::new(),
            });
            last_key = None;
            continue;
        }

        if config.sections.is_empty() {
            // Only reachable when the caller skipped the rewrite pass.
            config.sections.push(ConfigSection {
                name: constants::DEFAULT_INI_SECTION.to_string(),
                entries: Vec::new(),
            });
        }
        let section = match config.sections.last_mut() {
            Some(s) => s,
            None => continue,
        };

        let indent = raw.len() - raw.trim_start().len();
        if let Some((key_idx, key_indent)) = last_key {
            if indent > key_indent {
                if let Some((_, value)) = section.entries.get_mut(key_idx) {
                    value.push('\n');
                    value.push_str(trimmed);
                }
                continue;
            }
        }

        let split_at = trimmed.find(['=', ':']).ok_or_else(|| IniError::MissingDelimiter {
            line_number,
            line: trimmed.to_string(),
        })?;
        let key = trimmed[..split_at].trim().to_lowercase();
        let value = trimmed[split_at + 1..].trim().to_string();

        if section.entries.iter().any(|(k, _)| *k == key) {
            return Err(IniError::DuplicateKey {
                section: section.name.clone(),
                key,
                line_number,
            });
        }
        section.entries.push((key, value));
        last_key = Some((section.entries.len() - 1, indent));
    }

    Ok(config)
}

/// Decode, rewrite, and parse, returning the parse error to the caller.
pub fn parse_ini_strict(bytes: &[u8], options: &IniOptions) -> Result<IniConfig, IniError> {
    let text = options.encoding.decode(bytes);
    let rewritten = rewrite_sections(&text, &options.default_section);
    parse_rewritten(&rewritten)
}

/// Decode, rewrite, and parse. Parse failures are logged against `origin`
/// (the object key, in practice) and replaced by an empty configuration.
pub fn parse_ini(bytes: &[u8], options: &IniOptions, origin: &str) -> IniConfig {
    match parse_ini_strict(bytes, options) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                source = origin,
                error = %e,
                "Configuration unparseable; using empty configuration"
            );
            IniConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> IniConfig {
        parse_ini_strict(text.as_bytes(), &IniOptions::default()).unwrap()
    }

    #[test]
    fn test_duplicate_sections_stay_addressable() {
        let cfg = parse("[S]\na=1\n[S]\na=2\n");
        assert_eq!(cfg.get("S", "a"), Some("1"));
        assert_eq!(cfg.get("S_2", "a"), Some("2"));
        assert_eq!(cfg.section_names().collect::<Vec<_>>(), vec!["S", "S_2"]);
    }

    #[test]
    fn test_third_occurrence_uses_count() {
        let cfg = parse("[POS]\nx=1\n[POS]\nx=2\n[POS]\nx=3\n");
        assert_eq!(cfg.get("POS_3", "x"), Some("3"));
    }

    #[test]
    fn test_duplicate_detection_ignores_case() {
        let rewritten = rewrite_sections("[Printer]\n[PRINTER]\n", "S");
        assert_eq!(rewritten, "[Printer]\n[PRINTER_2]\n");
    }

    #[test]
    fn test_rename_skips_names_already_taken() {
        let rewritten = rewrite_sections("[S]\n[S_2]\n[S]\n", "S");
        assert_eq!(rewritten, "[S]\n[S_2]\n[S_3]\n");

        let rewritten = rewrite_sections("[S]\n[S]\n[S_2]\n", "S");
        assert_eq!(rewritten, "[S]\n[S_2]\n[S_2_2]\n");
    }

    #[test]
    fn test_rewrite_is_deterministic() {
        let text = "k=v\n[A]\n[a]\n[]\n[]\n";
        assert_eq!(rewrite_sections(text, "S"), rewrite_sections(text, "S"));
    }

    #[test]
    fn test_bare_keys_get_default_section() {
        let cfg = parse("RtnDeposCode=12345\nStoreNo=7\n");
        assert_eq!(cfg.get("S", "rtndeposcode"), Some("12345"));
        assert_eq!(cfg.get("S", "StoreNo"), Some("7"));
    }

    #[test]
    fn test_default_header_collides_with_later_header() {
        let cfg = parse("a=1\n[S]\na=2\n");
        assert_eq!(cfg.get("S", "a"), Some("1"));
        assert_eq!(cfg.get("S_2", "a"), Some("2"));
    }

    #[test]
    fn test_leading_comment_does_not_force_default_section() {
        let rewritten = rewrite_sections("; exported by POS\n[S]\na=1\n", "S");
        assert_eq!(rewritten, "; exported by POS\n[S]\na=1\n");
    }

    #[test]
    fn test_empty_header_is_empty_named_section() {
        let cfg = parse("[]\na=1\n[]\na=2\n");
        assert_eq!(cfg.get("", "a"), Some("1"));
        assert_eq!(cfg.get("_2", "a"), Some("2"));
    }

    #[test]
    fn test_colon_delimiter_and_whitespace() {
        let cfg = parse("[S]\n  Path : C:\\POS\\DATA  \nName = Main = St\n");
        assert_eq!(cfg.get("S", "path"), Some("C:\\POS\\DATA"));
        assert_eq!(cfg.get("S", "name"), Some("Main = St"));
    }

    #[test]
    fn test_comments_and_continuations() {
        let cfg = parse("[S]\n# comment\n; other\nmotd=hello\n  world\n\nnext=1\n");
        assert_eq!(cfg.get("S", "motd"), Some("hello\nworld"));
        assert_eq!(cfg.get("S", "next"), Some("1"));
    }

    #[test]
    fn test_default_section_supplies_fallbacks() {
        let cfg = parse("[DEFAULT]\ncurrency=USD\n[S]\na=1\n");
        assert_eq!(cfg.get("S", "currency"), Some("USD"));
        assert_eq!(cfg.get("missing", "currency"), None);
    }

    #[test]
    fn test_default_section_does_not_stand_in_for_missing_section() {
        let cfg = parse("[DEFAULT]\nRtnDeposCode=4411\n[Other]\n");
        assert_eq!(cfg.get("S", "rtndeposcode"), None);
        assert_eq!(cfg.get("Other", "rtndeposcode"), Some("4411"));
    }

    #[test]
    fn test_uniformly_indented_keys_are_separate() {
        let cfg = parse("[S]\n  Printer=LPT1\n  RtnDeposCode=4411\n");
        assert_eq!(cfg.get("S", "printer"), Some("LPT1"));
        assert_eq!(cfg.get("S", "rtndeposcode"), Some("4411"));
    }

    #[test]
    fn test_deeper_indent_continues_indented_key() {
        let cfg = parse("[S]\n  motd=hello\n    world\n  next=1\n");
        assert_eq!(cfg.get("S", "motd"), Some("hello\nworld"));
        assert_eq!(cfg.get("S", "next"), Some("1"));
    }

    #[test]
    fn test_section_lookup_falls_back_to_case_insensitive() {
        let cfg = parse("[Store]\nid=9\n");
        assert_eq!(cfg.get("STORE", "ID"), Some("9"));
    }

    #[test]
    fn test_get_or_fallback() {
        let cfg = parse("[S]\na=1\n");
        assert_eq!(cfg.get_or("S", "b", "none"), "none");
        assert_eq!(cfg.get_or("T", "a", ""), "");
    }

    #[test]
    fn test_missing_delimiter_is_error() {
        let err = parse_ini_strict(b"[S]\njust some words\n", &IniOptions::default()).unwrap_err();
        assert!(matches!(err, IniError::MissingDelimiter { line_number: 2, .. }));
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let err = parse_ini_strict(b"[S]\na=1\nA=2\n", &IniOptions::default()).unwrap_err();
        assert!(matches!(err, IniError::DuplicateKey { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_tolerant_parse_returns_empty_config() {
        let cfg = parse_ini(b"[S]\nnot a pair\n", &IniOptions::default(), "test.ini");
        assert!(cfg.is_empty());
        assert_eq!(cfg.get("S", "anything"), None);
    }

    #[test]
    fn test_latin1_bytes_decode() {
        let cfg = parse_ini(b"[S]\nowner=Jos\xe9\n", &IniOptions::default(), "test.ini");
        assert_eq!(cfg.get("S", "owner"), Some("José"));
    }

    #[test]
    fn test_empty_input_is_empty_config() {
        assert!(parse_ini(b"", &IniOptions::default(), "test.ini").is_empty());
    }
}
