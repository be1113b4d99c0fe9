//! Terminal-style input echo
//!
//! Remote sandbox runs consume stdin up front, so the captured stdout never
//! shows what the user typed. This splices each stdin line back in after the
//! nearest prompt-looking delimiter so the transcript reads like an
//! interactive session. Best effort only: a line with no delimiter left to
//! anchor on is dropped.

use std::sync::OnceLock;

use regex::Regex;

/// Prompt delimiters: colon, question mark or right angle bracket,
/// optionally followed by whitespace.
fn prompt_regex() -> &'static Regex {
    static PROMPT: OnceLock<Regex> = OnceLock::new();
    PROMPT.get_or_init(|| Regex::new(r"[:?>]\s*").unwrap())
}

/// Splice stdin lines into captured stdout after prompt delimiters.
///
/// Returns `output` unchanged when `input` is blank.
pub fn simulate_input_echo(output: &str, input: &str) -> String {
    if input.trim().is_empty() {
        return output.to_string();
    }

    let prompt = prompt_regex();
    let mut result = output.to_string();
    let mut search_start = 0;

    for line in input.split('\n') {
        if line.trim().is_empty() {
            continue;
        }

        let Some(m) = prompt.find_at(&result, search_start) else {
            continue;
        };

        let insert_pos = m.end();
        result.insert_str(insert_pos, line);
        result.insert(insert_pos + line.len(), '\n');
        search_start = insert_pos + line.len() + 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_on_empty_input() {
        let output = "Enter a number: \nResult: 42\n";
        assert_eq!(simulate_input_echo(output, ""), output);
        assert_eq!(simulate_input_echo(output, "   \n  "), output);
    }

    #[test]
    fn test_echo_after_colon_prompt() {
        let output = "Enter a number: Result is 10\n";
        let echoed = simulate_input_echo(output, "5");
        assert_eq!(echoed, "Enter a number: 5\nResult is 10\n");
    }

    #[test]
    fn test_echo_multiple_lines() {
        let output = "First: Second: done\n";
        let echoed = simulate_input_echo(output, "a\nb");
        assert_eq!(echoed, "First: a\nSecond: b\ndone\n");
    }

    #[test]
    fn test_echo_after_question_mark() {
        let output = "How many? Thanks\n";
        let echoed = simulate_input_echo(output, "3");
        assert_eq!(echoed, "How many? 3\nThanks\n");
    }

    #[test]
    fn test_echo_after_angle_bracket() {
        let output = "> ok\n";
        let echoed = simulate_input_echo(output, "help");
        assert_eq!(echoed, "> help\nok\n");
    }

    #[test]
    fn test_unplaced_line_is_dropped() {
        // Only one delimiter; the second input line has nowhere to go.
        let output = "Value: end\n";
        let echoed = simulate_input_echo(output, "1\n2");
        assert_eq!(echoed, "Value: 1\nend\n");
    }

    #[test]
    fn test_blank_input_lines_skipped() {
        let output = "A: B: ";
        let echoed = simulate_input_echo(output, "x\n\n\ny");
        assert_eq!(echoed, "A: x\nB: y\n");
    }

    #[test]
    fn test_no_delimiter_at_all() {
        let output = "hello world\n";
        assert_eq!(simulate_input_echo(output, "input"), output);
    }
}
