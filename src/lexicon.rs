//! Static registry of Dana symbols: keywords (including types, word
//! operators, and boolean literals) and built-in functions. The tables are
//! fixed at compile time; [`LEXICON`] is the shared process-wide instance.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Classification of a keyword-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Keyword,
    Type,
    Operator,
    Boolean,
}

impl KeywordKind {
    /// Lowercase tag used in completion details and hover headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordKind::Keyword => "keyword",
            KeywordKind::Type => "type",
            KeywordKind::Operator => "operator",
            KeywordKind::Boolean => "boolean",
        }
    }
}

/// A keyword, type name, word operator, or boolean literal.
#[derive(Debug, Clone, Copy)]
pub struct Keyword {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: KeywordKind,
    pub usage: Option<&'static str>,
}

/// A built-in function with its signature and a usage example.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
    pub return_type: &'static str,
    pub usage: &'static str,
}

/// A reference into either side of the lexicon.
#[derive(Debug, Clone, Copy)]
pub enum LexiconEntry {
    Keyword(&'static Keyword),
    Builtin(&'static BuiltinFunction),
}

impl LexiconEntry {
    pub fn name(&self) -> &'static str {
        match self {
            LexiconEntry::Keyword(keyword) => keyword.name,
            LexiconEntry::Builtin(builtin) => builtin.name,
        }
    }
}

const KEYWORDS: &[Keyword] = &[
    // Control flow
    Keyword {
        name: "if",
        description: "Conditional statement",
        kind: KeywordKind::Keyword,
        usage: Some("if condition: ... elif condition: ... else: ..."),
    },
    Keyword {
        name: "elif",
        description: "Else-if conditional",
        kind: KeywordKind::Keyword,
        usage: Some("elif condition: ..."),
    },
    Keyword {
        name: "else",
        description: "Else clause",
        kind: KeywordKind::Keyword,
        usage: Some("else: ..."),
    },
    Keyword {
        name: "loop",
        description: "Loop statement",
        kind: KeywordKind::Keyword,
        usage: Some("loop: ... break"),
    },
    Keyword {
        name: "begin",
        description: "Begin block",
        kind: KeywordKind::Keyword,
        usage: Some("begin ... end"),
    },
    Keyword {
        name: "end",
        description: "End block",
        kind: KeywordKind::Keyword,
        usage: None,
    },
    // Statements
    Keyword {
        name: "skip",
        description: "Skip statement (no operation)",
        kind: KeywordKind::Keyword,
        usage: None,
    },
    Keyword {
        name: "exit",
        description: "Exit from procedure",
        kind: KeywordKind::Keyword,
        usage: None,
    },
    Keyword {
        name: "return",
        description: "Return from function",
        kind: KeywordKind::Keyword,
        usage: Some("return: value"),
    },
    Keyword {
        name: "break",
        description: "Break from loop",
        kind: KeywordKind::Keyword,
        usage: Some("break or break: label"),
    },
    Keyword {
        name: "continue",
        description: "Continue to next iteration",
        kind: KeywordKind::Keyword,
        usage: None,
    },
    // Definitions
    Keyword {
        name: "def",
        description: "Function/procedure definition",
        kind: KeywordKind::Keyword,
        usage: Some("def name is returnType: params as type"),
    },
    Keyword {
        name: "var",
        description: "Variable declaration",
        kind: KeywordKind::Keyword,
        usage: Some("var name is type"),
    },
    Keyword {
        name: "is",
        description: "Type declaration keyword",
        kind: KeywordKind::Keyword,
        usage: Some("var x is int"),
    },
    Keyword {
        name: "as",
        description: "Parameter type keyword",
        kind: KeywordKind::Keyword,
        usage: Some("param as type"),
    },
    // Types
    Keyword {
        name: "int",
        description: "Integer type",
        kind: KeywordKind::Type,
        usage: Some("var x is int"),
    },
    Keyword {
        name: "byte",
        description: "Byte type (also used for characters)",
        kind: KeywordKind::Type,
        usage: Some("var x is byte"),
    },
    Keyword {
        name: "ref",
        description: "Reference parameter modifier",
        kind: KeywordKind::Keyword,
        usage: Some("param as ref int"),
    },
    // Operators
    Keyword {
        name: "and",
        description: "Logical AND operator",
        kind: KeywordKind::Operator,
        usage: Some("condition1 and condition2"),
    },
    Keyword {
        name: "or",
        description: "Logical OR operator",
        kind: KeywordKind::Operator,
        usage: Some("condition1 or condition2"),
    },
    Keyword {
        name: "not",
        description: "Logical NOT operator",
        kind: KeywordKind::Operator,
        usage: Some("not condition"),
    },
    Keyword {
        name: "mod",
        description: "Modulo operator",
        kind: KeywordKind::Operator,
        usage: Some("a mod b"),
    },
    // Booleans
    Keyword {
        name: "true",
        description: "Boolean true value",
        kind: KeywordKind::Boolean,
        usage: None,
    },
    Keyword {
        name: "false",
        description: "Boolean false value",
        kind: KeywordKind::Boolean,
        usage: None,
    },
    // Main
    Keyword {
        name: "main",
        description: "Main program entry point",
        kind: KeywordKind::Keyword,
        usage: Some("def main"),
    },
    // NOTE: the upstream keyword catalog registers the boolean literals a
    // second time. Completion-list length and ordering are part of the
    // compatibility contract, so the duplicate block stays.
    Keyword {
        name: "true",
        description: "Boolean true value",
        kind: KeywordKind::Boolean,
        usage: None,
    },
    Keyword {
        name: "false",
        description: "Boolean false value",
        kind: KeywordKind::Boolean,
        usage: None,
    },
];

const BUILTIN_FUNCTIONS: &[BuiltinFunction] = &[
    // I/O
    BuiltinFunction {
        name: "writeInteger",
        description: "Write an integer to output",
        parameters: &["value as int"],
        return_type: "void",
        usage: "writeInteger: 42",
    },
    BuiltinFunction {
        name: "writeByte",
        description: "Write a byte to output",
        parameters: &["value as byte"],
        return_type: "void",
        usage: "writeByte: 65",
    },
    BuiltinFunction {
        name: "writeChar",
        description: "Write a character to output",
        parameters: &["value as byte"],
        return_type: "void",
        usage: "writeChar: 'A'",
    },
    BuiltinFunction {
        name: "writeString",
        description: "Write a string to output",
        parameters: &["str as byte[]"],
        return_type: "void",
        usage: "writeString: \"Hello\"",
    },
    BuiltinFunction {
        name: "readInteger",
        description: "Read an integer from input",
        parameters: &[],
        return_type: "int",
        usage: "x := readInteger()",
    },
    BuiltinFunction {
        name: "readByte",
        description: "Read a byte from input",
        parameters: &[],
        return_type: "byte",
        usage: "b := readByte()",
    },
    BuiltinFunction {
        name: "readChar",
        description: "Read a character from input",
        parameters: &[],
        return_type: "byte",
        usage: "c := readChar()",
    },
    BuiltinFunction {
        name: "readString",
        description: "Read a string from input",
        parameters: &["size as int", "buffer as byte[]"],
        return_type: "void",
        usage: "readString: 100, buffer",
    },
    // Strings
    BuiltinFunction {
        name: "strlen",
        description: "Get the length of a string",
        parameters: &["str as byte[]"],
        return_type: "int",
        usage: "len := strlen(str)",
    },
    BuiltinFunction {
        name: "strcmp",
        description: "Compare two strings",
        parameters: &["str1 as byte[]", "str2 as byte[]"],
        return_type: "int",
        usage: "result := strcmp(s1, s2)",
    },
    BuiltinFunction {
        name: "strcpy",
        description: "Copy a string",
        parameters: &["dest as byte[]", "src as byte[]"],
        return_type: "void",
        usage: "strcpy: dest, src",
    },
    BuiltinFunction {
        name: "strcat",
        description: "Concatenate two strings",
        parameters: &["dest as byte[]", "src as byte[]"],
        return_type: "void",
        usage: "strcat: dest, src",
    },
];

/// Immutable symbol registry. Lookup is case-sensitive exact match; fuzzy
/// suggestions are a separate concern of the diagnostics module.
#[derive(Debug)]
pub struct Lexicon {
    keywords: &'static [Keyword],
    builtins: &'static [BuiltinFunction],
    keyword_index: FxHashMap<&'static str, usize>,
    builtin_index: FxHashMap<&'static str, usize>,
}

/// Shared lexicon instance, built once on first use.
pub static LEXICON: Lazy<Lexicon> = Lazy::new(Lexicon::new);

impl Lexicon {
    fn new() -> Self {
        let mut keyword_index = FxHashMap::default();
        for (position, keyword) in KEYWORDS.iter().enumerate() {
            // First registration wins so duplicated names resolve to their
            // original entry.
            keyword_index.entry(keyword.name).or_insert(position);
        }

        let mut builtin_index = FxHashMap::default();
        for (position, builtin) in BUILTIN_FUNCTIONS.iter().enumerate() {
            builtin_index.entry(builtin.name).or_insert(position);
        }

        Lexicon {
            keywords: KEYWORDS,
            builtins: BUILTIN_FUNCTIONS,
            keyword_index,
            builtin_index,
        }
    }

    /// Keyword table in registration order, duplicate boolean block included.
    pub fn keywords(&self) -> &'static [Keyword] {
        self.keywords
    }

    /// Built-in function table in registration order.
    pub fn builtins(&self) -> &'static [BuiltinFunction] {
        self.builtins
    }

    pub fn find_keyword(&self, name: &str) -> Option<&'static Keyword> {
        self.keyword_index.get(name).map(|&position| &self.keywords[position])
    }

    pub fn find_builtin(&self, name: &str) -> Option<&'static BuiltinFunction> {
        self.builtin_index.get(name).map(|&position| &self.builtins[position])
    }

    /// Exact-match lookup, keywords before built-ins.
    pub fn find_exact(&self, name: &str) -> Option<LexiconEntry> {
        self.find_keyword(name)
            .map(LexiconEntry::Keyword)
            .or_else(|| self.find_builtin(name).map(LexiconEntry::Builtin))
    }

    /// Whether `name` is a known keyword or built-in, case-sensitively.
    pub fn contains(&self, name: &str) -> bool {
        self.keyword_index.contains_key(name) || self.builtin_index.contains_key(name)
    }

    /// All entries in registration order: keywords first, then built-ins.
    pub fn entries(&self) -> impl Iterator<Item = LexiconEntry> {
        self.keywords
            .iter()
            .map(LexiconEntry::Keyword)
            .chain(self.builtins.iter().map(LexiconEntry::Builtin))
    }

    /// Total entry count across both tables.
    pub fn len(&self) -> usize {
        self.keywords.len() + self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
