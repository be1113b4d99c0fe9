//! Static detection of blocking input calls
//!
//! Decides, before running anything, whether a snippet will block waiting on
//! interactive input. Comments are stripped first so commented-out reads do
//! not trigger; tokens inside string literals still match. This is a text
//! heuristic, not a parser.

use std::sync::OnceLock;

use regex::Regex;

use crate::languages::Language;

/// An input-reading construct paired with its user-facing label
struct InputSignature {
    pattern: Regex,
    label: &'static str,
}

fn c_signatures() -> &'static [InputSignature] {
    static SIGNATURES: OnceLock<Vec<InputSignature>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        [
            (r"\bscanf\s*\(", "scanf()"),
            (r"\bgets\s*\(", "gets()"),
            (r"\bfgets\s*\(", "fgets()"),
            (r"\bgetchar\s*\(", "getchar()"),
            (r"\bgetc\s*\(", "getc()"),
        ]
        .into_iter()
        .map(|(pattern, label)| InputSignature {
            pattern: Regex::new(pattern).expect("valid signature regex"),
            label,
        })
        .collect()
    })
}

fn python_signatures() -> &'static [InputSignature] {
    static SIGNATURES: OnceLock<Vec<InputSignature>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        [(r"\binput\s*\(", "input()"), (r"\bsys\.stdin", "sys.stdin")]
            .into_iter()
            .map(|(pattern, label)| InputSignature {
                pattern: Regex::new(pattern).expect("valid signature regex"),
                label,
            })
            .collect()
    })
}

/// Remove comments so commented-out input calls are not counted
fn strip_comments(source: &str, language: Language) -> String {
    static C_LINE: OnceLock<Regex> = OnceLock::new();
    static C_BLOCK: OnceLock<Regex> = OnceLock::new();
    static PY_LINE: OnceLock<Regex> = OnceLock::new();

    match language {
        Language::C => {
            let line = C_LINE.get_or_init(|| Regex::new(r"(?m)//.*$").unwrap());
            let block = C_BLOCK.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
            let without_line = line.replace_all(source, "");
            block.replace_all(&without_line, "").into_owned()
        }
        Language::Python => {
            let line = PY_LINE.get_or_init(|| Regex::new(r"(?m)#.*$").unwrap());
            line.replace_all(source, "").into_owned()
        }
    }
}

/// Detect whether the snippet reads interactive input.
///
/// Returns the label of the first matching construct ("scanf()", "input()",
/// ...) or `None` when nothing matches after comment stripping.
pub fn detect_input_requirement(source: &str, language: Language) -> Option<&'static str> {
    let clean = strip_comments(source, language);

    let signatures = match language {
        Language::C => c_signatures(),
        Language::Python => python_signatures(),
    };

    signatures
        .iter()
        .find(|sig| sig.pattern.is_match(&clean))
        .map(|sig| sig.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_scanf() {
        let source = "int main() { int x; scanf(\"%d\", &x); return 0; }";
        assert_eq!(
            detect_input_requirement(source, Language::C),
            Some("scanf()")
        );
    }

    #[test]
    fn test_detects_python_input() {
        let source = "name = input(\"Name: \")\nprint(name)";
        assert_eq!(
            detect_input_requirement(source, Language::Python),
            Some("input()")
        );
    }

    #[test]
    fn test_detects_sys_stdin() {
        let source = "import sys\nfor line in sys.stdin:\n    print(line)";
        assert_eq!(
            detect_input_requirement(source, Language::Python),
            Some("sys.stdin")
        );
    }

    #[test]
    fn test_first_signature_wins() {
        let source = "scanf(\"%d\", &x); getchar();";
        assert_eq!(
            detect_input_requirement(source, Language::C),
            Some("scanf()")
        );
    }

    #[test]
    fn test_ignores_c_line_comment() {
        let source = "int main() {\n    // scanf(\"%d\", &x);\n    return 0;\n}";
        assert_eq!(detect_input_requirement(source, Language::C), None);
    }

    #[test]
    fn test_ignores_c_block_comment() {
        let source = "int main() {\n/* getchar();\n   scanf(\"%d\", &x); */\nreturn 0;\n}";
        assert_eq!(detect_input_requirement(source, Language::C), None);
    }

    #[test]
    fn test_ignores_python_comment() {
        let source = "# x = input()\nprint(42)";
        assert_eq!(detect_input_requirement(source, Language::Python), None);
    }

    #[test]
    fn test_no_match_for_plain_code() {
        let source = "int main() { printf(\"hi\\n\"); return 0; }";
        assert_eq!(detect_input_requirement(source, Language::C), None);
        assert_eq!(
            detect_input_requirement("print('hi')", Language::Python),
            None
        );
    }

    // Known limitation: the heuristic does not parse string literals, so a
    // construct name inside a string still counts as a match.
    #[test]
    fn test_string_literal_still_matches() {
        let source = "print(\"call input() to read\")";
        assert_eq!(
            detect_input_requirement(source, Language::Python),
            Some("input()")
        );
    }
}
