use pipesh::parser::{self, Scan, SyntaxError};
use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// Feed `input` to the shell binary and collect everything it printed.
fn run_shell(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pipesh"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("start pipesh");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("write input");
    child.wait_with_output().expect("wait for pipesh")
}

macro_rules! syntax_error_test {
    ($name:ident, $line:expr, $err:expr) => {
        #[test]
        fn $name() {
            assert_eq!(parser::scan(&words($line)), Err($err), "line: {}", $line);
        }
    };
}

// ── Scanner rejections ──

syntax_error_test!(reject_word_after_ampersand, "cmd & x", SyntaxError::TrailingAfterBackground);
syntax_error_test!(reject_hash, "echo hi#", SyntaxError::DisallowedCharacter('#'));
syntax_error_test!(reject_dollar, "echo $HOME", SyntaxError::DisallowedCharacter('$'));
syntax_error_test!(reject_quote, "echo 'a'", SyntaxError::DisallowedCharacter('\''));
syntax_error_test!(reject_dangling_output, "ls >", SyntaxError::MissingRedirectTarget('>'));
syntax_error_test!(reject_dangling_input, "sort <", SyntaxError::MissingRedirectTarget('<'));
syntax_error_test!(reject_lone_pipe, "|", SyntaxError::MissingCommand);
syntax_error_test!(reject_trailing_pipe, "ls |", SyntaxError::MissingCommand);

#[test]
fn scanning_is_repeatable() {
    let line = words("grep -v x < a.txt | sort | uniq -c > b.txt &");
    let first = parser::scan(&line);
    assert!(matches!(first, Ok(Scan::Pipeline(_))));
    assert_eq!(first, parser::scan(&line));
}

// ── Whole binary ──

#[test]
fn banner_redirect_and_quit() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let input = format!("echo hi there > {}\nq\necho never\n", out.display());

    let output = run_shell(&[], &input);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Type 'q' to exit"), "stdout: {stdout}");
    assert!(!stdout.contains("never"), "stdout: {stdout}");
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi there\n");
}

#[test]
fn end_of_input_terminates() {
    let output = run_shell(&["--no-banner"], "");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Program terminated"), "stderr: {stderr}");
}

#[test]
fn errors_are_reported_and_the_loop_continues() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let input = format!(
        "no-such-program-4711\necho x#\necho still running > {}\n",
        out.display()
    );

    let output = run_shell(&["--no-banner"], &input);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Command not found: no-such-program-4711"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("# is not an allowed character"), "stderr: {stderr}");
    assert_eq!(fs::read_to_string(&out).unwrap(), "still running\n");
}

#[test]
fn pipeline_output_reaches_terminal_stream() {
    let output = run_shell(&["--no-banner"], "echo b a c | tr a-z A-Z\nq\n");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("B A C\n"));
}

#[test]
fn unknown_flag_is_rejected() {
    let output = run_shell(&["--frobnicate"], "");
    assert!(!output.status.success());
}
