//! Heuristic error explanations
//!
//! Maps raw compiler/interpreter diagnostics to plain-language explanations
//! for beginners. Each language has an ordered rule table; the first rule
//! whose pattern matches the error text produces the explanation, and no
//! further rules are consulted. A generic fallback covers everything else.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::languages::Language;

/// Plain-language explanation of an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    /// Short classification label, e.g. "Missing Semicolon"
    pub error_type: String,
    /// What went wrong, in plain language
    pub simple_explanation: String,
    /// How to fix it
    pub suggested_fix: String,
    /// Optional corrected example
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_code: Option<String>,
    /// 1-based source line, when the diagnostic names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl Explanation {
    pub fn new(
        error_type: impl Into<String>,
        simple_explanation: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            simple_explanation: simple_explanation.into(),
            suggested_fix: suggested_fix.into(),
            example_code: None,
            line_number: None,
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example_code = Some(example.into());
        self
    }
}

/// One classification rule: diagnostic pattern plus explanation factory.
///
/// The factory receives the regex captures and the original source text, so
/// rules can name the offending identifier or re-scan the source to pick an
/// explanation variant.
struct PatternRule {
    pattern: Regex,
    build: fn(&Captures, &str) -> Explanation,
}

impl PatternRule {
    fn new(pattern: &str, build: fn(&Captures, &str) -> Explanation) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid error pattern"),
            build,
        }
    }
}

fn c_rules() -> &'static [PatternRule] {
    static RULES: OnceLock<Vec<PatternRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            PatternRule::new(r"(?i)undefined reference to ['`]main['`]", |_, _| {
                Explanation::new(
                    "Missing main() Function",
                    "Every C program needs a main() function as its entry point. \
                     This is where your program starts executing.",
                    "Add a main() function to your code. The main function should \
                     return an integer.",
                )
                .with_example(
                    "#include <stdio.h>\n\nint main() {\n    // Your code here\n    \
                     printf(\"Hello, World!\\n\");\n    return 0;\n}",
                )
            }),
            PatternRule::new(r"(?i)segmentation fault|SIGSEGV", segfault_explanation),
            PatternRule::new(r"(?i)expected ['`];['`]|before ['`];['`]", |_, _| {
                Explanation::new(
                    "Missing Semicolon",
                    "In C, every statement must end with a semicolon (;). The \
                     compiler found a statement that is missing this required \
                     punctuation.",
                    "Add a semicolon at the end of the statement. Check the line \
                     indicated or the line just before it.",
                )
                .with_example(
                    "// Correct:\nint x = 10;\nprintf(\"Hello\");  // Don't forget \
                     the semicolon!\nreturn 0;",
                )
            }),
            PatternRule::new(
                r"(?i)undeclared|was not declared|unknown type|use of undeclared identifier",
                |_, _| {
                    Explanation::new(
                        "Undeclared Variable or Type",
                        "You are using a variable or type that hasn't been declared \
                         yet. In C, you must declare variables before using them.",
                        "Declare the variable with its type before using it. If it's \
                         a function, make sure to include the correct header file.",
                    )
                    .with_example(
                        "// Declare before use:\nint count;      // Declaration\n\
                         count = 10;     // Now you can use it\n\n// Or declare and \
                         initialize:\nint count = 10;",
                    )
                },
            ),
            PatternRule::new(
                r"(?i)implicit declaration of function ['`](\w+)['`]",
                |caps, _| {
                    let name = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                    Explanation::new(
                        "Missing Function Declaration",
                        format!(
                            "The function \"{}\" is being called but hasn't been \
                             declared. Either include the header file that declares \
                             it, or add a function prototype.",
                            name
                        ),
                        "Add the appropriate #include directive at the top of your \
                         file, or declare the function before main().",
                    )
                    .with_example(
                        "#include <stdio.h>  // For printf, scanf\n#include \
                         <string.h> // For strcpy, strlen\n#include <stdlib.h> // \
                         For malloc, free\n#include <math.h>   // For sqrt, pow",
                    )
                },
            ),
            PatternRule::new(r"(?i)too few arguments|too many arguments", |_, _| {
                Explanation::new(
                    "Wrong Number of Arguments",
                    "The function was called with a different number of arguments \
                     than it expects. Check the function definition to see how many \
                     parameters it requires.",
                    "Count the parameters in the function definition and make sure \
                     you pass the same number of arguments when calling it.",
                )
                .with_example(
                    "// If function is defined as:\nint add(int a, int b) { return \
                     a + b; }\n\n// Call with exactly 2 arguments:\nint result = \
                     add(5, 3);  // Correct\n// int result = add(5);  // Wrong - \
                     too few arguments",
                )
            }),
            PatternRule::new(r"(?i)expected.*before|expected.*after", |_, _| {
                Explanation::new(
                    "Syntax Error",
                    "The compiler found something unexpected in your code. This is \
                     usually a missing bracket, parenthesis, or incorrect syntax.",
                    "Check for missing brackets {}, parentheses (), or other syntax \
                     elements near the indicated line.",
                )
                .with_example(
                    "// Make sure all brackets match:\nint main() {\n    if (x > 0) \
                     {\n        printf(\"Positive\\n\");\n    }  // Don't forget \
                     closing brackets!\n    return 0;\n}",
                )
            }),
            PatternRule::new(
                r"(?i)incompatible type|cannot convert|invalid conversion",
                |_, _| {
                    Explanation::new(
                        "Type Mismatch",
                        "You're trying to use a value of one type where a different \
                         type is expected. C is strict about types.",
                        "Check that the types of your variables and function \
                         arguments match what's expected. You may need to cast or \
                         convert values.",
                    )
                    .with_example(
                        "// Type casting example:\nint x = 10;\nfloat y = (float)x / \
                         3;  // Cast x to float for division",
                    )
                },
            ),
        ]
    })
}

/// Segfault explanations vary with what the source actually does: pointer
/// dereferences and array indexing get targeted advice.
fn segfault_explanation(_caps: &Captures, source: &str) -> Explanation {
    static ARRAY_ACCESS: OnceLock<Regex> = OnceLock::new();
    static POINTER: OnceLock<Regex> = OnceLock::new();

    let has_array_access = ARRAY_ACCESS
        .get_or_init(|| Regex::new(r"\[\s*\d+\s*\]").unwrap())
        .is_match(source);
    let has_pointer = POINTER
        .get_or_init(|| Regex::new(r"\*\s*\w+").unwrap())
        .is_match(source);

    let (explanation, fix) = if has_pointer {
        (
            "You are trying to access memory through a pointer that points to an \
             invalid location. This often happens when using uninitialized pointers \
             or accessing freed memory.",
            "Make sure to initialize pointers before using them, and verify they \
             point to valid memory addresses.",
        )
    } else if has_array_access {
        (
            "You are trying to access an array index that is outside the valid \
             range. Check if you are accessing elements beyond the array size.",
            "Check your array indices to ensure they are within bounds (0 to \
             size-1).",
        )
    } else {
        (
            "Your program tried to access memory it doesn't have permission to \
             use. This can happen with uninitialized pointers, array out of \
             bounds, or null pointer dereference.",
            "Review your memory access patterns. Initialize all pointers and check \
             array bounds.",
        )
    };

    let example = if has_array_access {
        "// Safe array access\nint arr[5] = {1, 2, 3, 4, 5};\nfor (int i = 0; i < \
         5; i++) { // Use i < 5, not i <= 5\n    printf(\"%d\\n\", arr[i]);\n}"
    } else {
        "// Initialize pointers properly\nint value = 10;\nint *ptr = &value; // \
         Point to a valid address\nprintf(\"%d\\n\", *ptr);"
    };

    Explanation::new("Segmentation Fault", explanation, fix).with_example(example)
}

fn python_rules() -> &'static [PatternRule] {
    static RULES: OnceLock<Vec<PatternRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            PatternRule::new(
                r"(?i)IndentationError|unexpected indent|expected an indented block",
                |_, _| {
                    Explanation::new(
                        "Indentation Error",
                        "Python uses indentation (spaces at the beginning of lines) \
                         to define code blocks. Your code has inconsistent or \
                         incorrect indentation.",
                        "Use consistent indentation throughout your code. Use either \
                         4 spaces or 1 tab for each level of indentation, but don't \
                         mix them.",
                    )
                    .with_example(
                        "# Correct indentation:\nif True:\n    print(\"Inside if\")  \
                         # 4 spaces\n\ndef my_function():\n    print(\"In \
                         function\")  # 4 spaces",
                    )
                },
            ),
            PatternRule::new(r"(?i)NameError.*['`](\w+)['`] is not defined", |caps, _| {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                Explanation::new(
                    "Undefined Variable",
                    format!(
                        "The variable \"{}\" is being used but hasn't been defined \
                         yet. Python requires variables to be assigned a value \
                         before they can be used.",
                        name
                    ),
                    "Make sure to define the variable before using it. Check for \
                     typos in the variable name.",
                )
                .with_example(
                    "# Define before using:\ncount = 0\nprint(count)  # Now it works",
                )
            }),
            PatternRule::new(r"(?i)SyntaxError.*invalid syntax", |_, _| {
                Explanation::new(
                    "Syntax Error",
                    "Python found something in your code that doesn't follow its \
                     grammar rules. This could be a missing colon, parenthesis, or \
                     quote.",
                    "Check for missing colons after if/for/while/def/class \
                     statements, missing parentheses, or unmatched quotes.",
                )
                .with_example(
                    "# Common syntax issues:\nif x == 5:     # Don't forget the \
                     colon\n    print(\"x is 5\")\n\nfor i in range(5):  # Colon \
                     required\n    print(i)",
                )
            }),
            PatternRule::new(r"(?i)SyntaxError.*expected ':'", |_, _| {
                Explanation::new(
                    "Missing Colon",
                    "Python requires a colon (:) after statements like if, for, \
                     while, def, class, try, except, etc.",
                    "Add a colon at the end of the control statement.",
                )
                .with_example(
                    "# Correct:\nif condition:    # Colon here\n    \
                     do_something()\n\ndef function():   # Colon here\n    pass",
                )
            }),
            PatternRule::new(
                r"(?i)TypeError.*'(\w+)' object is not (subscriptable|callable|iterable)",
                |caps, _| {
                    let type_name = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                    Explanation::new(
                        "Type Error",
                        format!(
                            "You're trying to use a {} in a way that's not allowed \
                             for that type. For example, using [] on a number or \
                             calling a string like a function.",
                            type_name
                        ),
                        "Check the type of your variable and make sure you're using \
                         the correct operations for that type.",
                    )
                    .with_example(
                        "# Wrong:\nx = 5\nx[0]  # Error: int is not \
                         subscriptable\n\n# Correct:\nmy_list = [1, 2, \
                         3]\nmy_list[0]  # Works: lists are subscriptable",
                    )
                },
            ),
            PatternRule::new(r"(?i)IndexError.*list index out of range", |_, _| {
                Explanation::new(
                    "List Index Out of Range",
                    "You're trying to access a list element at an index that \
                     doesn't exist. Remember that Python lists are zero-indexed, so \
                     a list with 3 elements has indices 0, 1, and 2.",
                    "Check the length of your list with len() and make sure your \
                     index is within range (0 to len-1).",
                )
                .with_example(
                    "# If your list has 3 elements:\nmy_list = [10, 20, \
                     30]\nprint(my_list[0])  # 10 (first element)\nprint(my_list[2]) \
                     # 30 (last element)\n# print(my_list[3])  # Error! Index 3 \
                     doesn't exist",
                )
            }),
            PatternRule::new(r"(?i)ZeroDivisionError", |_, _| {
                Explanation::new(
                    "Division by Zero",
                    "You're trying to divide a number by zero, which is \
                     mathematically undefined and not allowed.",
                    "Check if the divisor is zero before performing division.",
                )
                .with_example(
                    "# Safe division:\nif divisor != 0:\n    result = 100 / \
                     divisor\nelse:\n    print(\"Cannot divide by zero\")",
                )
            }),
            PatternRule::new(
                r"(?i)ModuleNotFoundError.*No module named ['`](\w+)['`]",
                |caps, _| {
                    let module = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                    Explanation::new(
                        "Module Not Found",
                        format!(
                            "The module \"{}\" is not installed or doesn't exist. \
                             Only the Python standard library and a few common \
                             packages are available in this environment.",
                            module
                        ),
                        "Stick to standard library modules, and check the module \
                         name for typos.",
                    )
                    .with_example(
                        "# Standard library (always available):\nimport \
                         math\nimport json\nimport random\nimport datetime",
                    )
                },
            ),
            PatternRule::new(r"(?i)KeyError.*['`](.+)['`]", |caps, _| {
                let key = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                Explanation::new(
                    "Key Error",
                    format!(
                        "The key \"{}\" does not exist in the dictionary. You're \
                         trying to access a key that hasn't been set.",
                        key
                    ),
                    "Check if the key exists before accessing it, or use the .get() \
                     method which returns None for missing keys.",
                )
                .with_example(
                    "# Safe dictionary access:\nmy_dict = {\"name\": \"Alice\"}\n\n\
                     # Check first:\nif \"email\" in my_dict:\n    \
                     print(my_dict[\"email\"])\n\n# Or use .get():\nemail = \
                     my_dict.get(\"email\", \"Not provided\")",
                )
            }),
            PatternRule::new(r"(?i)ValueError", |_, _| {
                Explanation::new(
                    "Value Error",
                    "A function received an argument with the right type but an \
                     inappropriate value.",
                    "Check that the values you're passing to functions are valid. \
                     For example, int() can't convert \"hello\" to a number.",
                )
                .with_example(
                    "# Safe conversion:\ntry:\n    num = int(user_input)\nexcept \
                     ValueError:\n    print(\"Please enter a valid number\")",
                )
            }),
            PatternRule::new(
                r"(?i)AttributeError.*'(\w+)' object has no attribute '(\w+)'",
                |caps, _| {
                    let type_name = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
                    let attr = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
                    Explanation::new(
                        "Attribute Error",
                        format!(
                            "The {} type doesn't have an attribute or method called \
                             '{}'. You might be calling the wrong method or using \
                             the wrong type.",
                            type_name, attr
                        ),
                        "Check the documentation for the correct method name, or \
                         verify your variable has the type you expect.",
                    )
                    .with_example(
                        "# Check the type:\nmy_var = [1, 2, 3]\nprint(type(my_var)) \
                         # <class 'list'>\n\n# Use correct methods:\nmy_list = [1, \
                         2, 3]\nmy_list.append(4)  # Correct for lists",
                    )
                },
            ),
        ]
    })
}

/// Try to pull a 1-based line number out of the error text.
///
/// Independent of which content rule matched: looks for "line N" first, then
/// a ":N:" location marker.
fn extract_line_number(error: &str) -> Option<u32> {
    static LINE_WORD: OnceLock<Regex> = OnceLock::new();
    static LINE_COLON: OnceLock<Regex> = OnceLock::new();

    let by_word = LINE_WORD.get_or_init(|| Regex::new(r"(?i)line (\d+)").unwrap());
    let by_colon = LINE_COLON.get_or_init(|| Regex::new(r":(\d+):").unwrap());

    by_word
        .captures(error)
        .or_else(|| by_colon.captures(error))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Generic explanation used when no rule matches
fn fallback_explanation(language: Language) -> Explanation {
    let (error_type, who) = match language {
        Language::C => ("Compilation/Runtime Error", "C compiler"),
        Language::Python => ("Python Error", "Python interpreter"),
    };
    Explanation::new(
        error_type,
        format!(
            "The {} encountered an error in your code. Review the error message \
             for details.",
            who
        ),
        "Check your code for syntax errors, missing declarations, or logical \
         mistakes. The error message above should indicate the problem location.",
    )
}

/// Classify raw error text into an [`Explanation`].
///
/// First matching rule wins; rules are never merged. Always returns an
/// explanation - unmatched errors get the generic fallback.
pub fn classify_error(error: &str, source: &str, language: Language) -> Explanation {
    let rules = match language {
        Language::C => c_rules(),
        Language::Python => python_rules(),
    };

    for rule in rules {
        if let Some(caps) = rule.pattern.captures(error) {
            let mut explanation = (rule.build)(&caps, source);
            explanation.line_number = extract_line_number(error);
            return explanation;
        }
    }

    fallback_explanation(language)
}
