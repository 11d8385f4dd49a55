//! Symbol lookup surfaces: completion payloads, hover documentation, and
//! word-boundary extraction. All three are thin, deterministic views over
//! the lexicon; nothing here inspects syntax beyond the word under the
//! cursor.

use crate::lexicon::{BuiltinFunction, Keyword, KeywordKind, Lexicon, LexiconEntry};

/// Completion-item classification, a superset of [`KeywordKind`] with the
/// function and plain-text cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Keyword,
    Type,
    Operator,
    Boolean,
    Function,
    Text,
}

impl From<KeywordKind> for CompletionKind {
    fn from(kind: KeywordKind) -> Self {
        match kind {
            KeywordKind::Keyword => CompletionKind::Keyword,
            KeywordKind::Type => CompletionKind::Type,
            KeywordKind::Operator => CompletionKind::Operator,
            KeywordKind::Boolean => CompletionKind::Boolean,
        }
    }
}

/// One completion candidate, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEntry {
    pub name: &'static str,
    pub kind: CompletionKind,
    pub detail: String,
    pub documentation: String,
}

/// Hover payload; `is_markdown` selects the markup kind on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub content: String,
    pub is_markdown: bool,
}

/// Every lexicon entry as a completion candidate, in lexicon order
/// (keywords first, then built-ins). The list is never filtered by cursor
/// context; clients narrow it themselves.
pub fn all_completion_items(lexicon: &Lexicon) -> Vec<CompletionEntry> {
    lexicon
        .entries()
        .map(|entry| match entry {
            LexiconEntry::Keyword(keyword) => keyword_completion(keyword),
            LexiconEntry::Builtin(builtin) => builtin_completion(builtin),
        })
        .collect()
}

fn keyword_completion(keyword: &Keyword) -> CompletionEntry {
    let documentation = match keyword.usage {
        Some(usage) => format!("{}\n\nUsage: {}", keyword.description, usage),
        None => keyword.description.to_string(),
    };
    CompletionEntry {
        name: keyword.name,
        kind: keyword.kind.into(),
        detail: format!("{}: {}", keyword.kind.as_str(), keyword.name),
        documentation,
    }
}

fn builtin_completion(builtin: &BuiltinFunction) -> CompletionEntry {
    CompletionEntry {
        name: builtin.name,
        kind: CompletionKind::Function,
        detail: builtin_signature(builtin),
        documentation: format!("{}\n\nUsage: {}", builtin.description, builtin.usage),
    }
}

fn builtin_signature(builtin: &BuiltinFunction) -> String {
    format!(
        "{}({}): {}",
        builtin.name,
        builtin.parameters.join(", "),
        builtin.return_type
    )
}

/// Markdown hover content for an exact-match symbol, keywords before
/// built-ins. No fuzzy fallback: a near-miss returns `None`.
pub fn hover_info(lexicon: &Lexicon, symbol: &str) -> Option<HoverInfo> {
    if let Some(keyword) = lexicon.find_keyword(symbol) {
        let mut content = format!(
            "**{}** ({})\n\n{}",
            keyword.name,
            keyword.kind.as_str(),
            keyword.description
        );
        if let Some(usage) = keyword.usage {
            content.push_str(&format!("\n\n**Usage:** `{}`", usage));
        }
        return Some(HoverInfo {
            content,
            is_markdown: true,
        });
    }

    let builtin = lexicon.find_builtin(symbol)?;
    Some(HoverInfo {
        content: format!(
            "**{}**({}): {}\n\n{}\n\n**Usage:** `{}`",
            builtin.name,
            builtin.parameters.join(", "),
            builtin.return_type,
            builtin.description,
            builtin.usage
        ),
        is_markdown: true,
    })
}

/// The identifier under `offset` (a character index into `text`), or `None`
/// when the cursor sits between non-word characters or out of bounds.
/// Expansion is asymmetric on purpose: leftward over `[A-Za-z_]` only,
/// rightward over `[A-Za-z0-9_]`, so a word never starts with a digit.
pub fn word_at_offset(text: &str, offset: usize) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    if offset > chars.len() {
        return None;
    }

    let mut start = offset;
    while start > 0 && (chars[start - 1].is_ascii_alphabetic() || chars[start - 1] == '_') {
        start -= 1;
    }

    let mut end = offset;
    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
        end += 1;
    }

    if start == end {
        return None;
    }
    Some(chars[start..end].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LEXICON;

    #[test]
    fn completion_covers_the_whole_lexicon_in_order() {
        let items = all_completion_items(&LEXICON);
        assert_eq!(items.len(), LEXICON.len());
        assert_eq!(items.len(), 39);
        assert_eq!(items[0].name, "if");
        assert_eq!(items[0].kind, CompletionKind::Keyword);
        assert_eq!(items[15].name, "int");
        assert_eq!(items[15].kind, CompletionKind::Type);
        assert_eq!(items[27].name, "writeInteger");
        assert_eq!(items[27].kind, CompletionKind::Function);
        assert_eq!(items[38].name, "strcat");
    }

    #[test]
    fn completion_is_idempotent() {
        assert_eq!(all_completion_items(&LEXICON), all_completion_items(&LEXICON));
    }

    #[test]
    fn duplicate_booleans_appear_twice_in_completion() {
        let items = all_completion_items(&LEXICON);
        let trues: Vec<_> = items.iter().filter(|item| item.name == "true").collect();
        assert_eq!(trues.len(), 2);
        assert!(trues.iter().all(|item| item.kind == CompletionKind::Boolean));
    }

    #[test]
    fn keyword_details_carry_the_kind_tag() {
        let items = all_completion_items(&LEXICON);
        let find = |name: &str| items.iter().find(|item| item.name == name).unwrap();
        assert_eq!(find("if").detail, "keyword: if");
        assert_eq!(find("int").detail, "type: int");
        assert_eq!(find("and").detail, "operator: and");
        assert_eq!(find("true").detail, "boolean: true");
    }

    #[test]
    fn builtin_details_are_signatures() {
        let items = all_completion_items(&LEXICON);
        let find = |name: &str| items.iter().find(|item| item.name == name).unwrap();
        assert_eq!(find("writeInteger").detail, "writeInteger(value as int): void");
        assert_eq!(find("readInteger").detail, "readInteger(): int");
        assert_eq!(
            find("strcmp").detail,
            "strcmp(str1 as byte[], str2 as byte[]): int"
        );
    }

    #[test]
    fn documentation_appends_usage_when_present() {
        let items = all_completion_items(&LEXICON);
        let find = |name: &str| items.iter().find(|item| item.name == name).unwrap();
        assert_eq!(
            find("var").documentation,
            "Variable declaration\n\nUsage: var name is type"
        );
        assert_eq!(find("end").documentation, "End block");
        assert_eq!(
            find("strlen").documentation,
            "Get the length of a string\n\nUsage: len := strlen(str)"
        );
    }

    #[test]
    fn keyword_hover_includes_kind_and_usage() {
        let info = hover_info(&LEXICON, "def").unwrap();
        assert!(info.is_markdown);
        assert_eq!(
            info.content,
            "**def** (keyword)\n\nFunction/procedure definition\n\n**Usage:** `def name is returnType: params as type`"
        );
    }

    #[test]
    fn keyword_hover_without_usage_stops_at_the_description() {
        let info = hover_info(&LEXICON, "end").unwrap();
        assert_eq!(info.content, "**end** (keyword)\n\nEnd block");
    }

    #[test]
    fn builtin_hover_formats_the_signature() {
        let info = hover_info(&LEXICON, "strlen").unwrap();
        assert!(info.is_markdown);
        assert_eq!(
            info.content,
            "**strlen**(str as byte[]): int\n\nGet the length of a string\n\n**Usage:** `len := strlen(str)`"
        );
    }

    #[test]
    fn hover_is_exact_match_only() {
        assert!(hover_info(&LEXICON, "De").is_none());
        assert!(hover_info(&LEXICON, "Def").is_none());
        assert!(hover_info(&LEXICON, "defx").is_none());
        assert!(hover_info(&LEXICON, "").is_none());
    }

    #[test]
    fn word_extraction_finds_surrounding_identifier() {
        let text = "var counter is int";
        assert_eq!(word_at_offset(text, 0).as_deref(), Some("var"));
        assert_eq!(word_at_offset(text, 2).as_deref(), Some("var"));
        assert_eq!(word_at_offset(text, 7).as_deref(), Some("counter"));
        assert_eq!(word_at_offset(text, 18).as_deref(), Some("int"));
    }

    #[test]
    fn word_extraction_returns_none_between_words() {
        let text = "a + b";
        assert_eq!(word_at_offset(text, 2), None);
        assert_eq!(word_at_offset(text, 3), None);
    }

    #[test]
    fn word_extraction_checks_bounds() {
        assert_eq!(word_at_offset("if", 3), None);
        assert_eq!(word_at_offset("", 0), None);
        assert_eq!(word_at_offset("if", 2).as_deref(), Some("if"));
    }

    #[test]
    fn words_never_start_with_a_digit() {
        assert_eq!(word_at_offset("1abc", 2).as_deref(), Some("abc"));
        assert_eq!(word_at_offset("x1y", 1).as_deref(), Some("x1y"));
    }
}
