//! Request text for retry attempts.

use crate::process::tail_chars;

/// The task followed by the tail of the failed verification log.
///
/// Feedback is append-only: each retry starts again from `task`, never from
/// the previous retry request.
pub fn retry_request(task: &str, verification_log: &str, tail: usize) -> String {
    let log = tail_chars(verification_log, tail);
    let truncated = if log.len() < verification_log.len() {
        " (truncated)"
    } else {
        ""
    };

    format!(
        "{}\n\nThe previous attempt failed verification. Verification output{}:\n```\n{}\n```\nFix the problems so that verification passes.",
        task,
        truncated,
        log.trim_end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_request_starts_with_task_and_keeps_tail() {
        let log = format!("{}THE END", "x".repeat(5000));
        let request = retry_request("Add /health route", &log, 100);

        assert!(request.starts_with("Add /health route\n\n"));
        assert!(request.contains("(truncated)"));
        assert!(request.contains("THE END"));
        assert!(!request.contains(&"x".repeat(100)));
        assert!(request.contains(&"x".repeat(93)));
    }

    #[test]
    fn test_short_log_is_kept_whole() {
        let request = retry_request("task", "error: expected `;`\n", 2000);
        assert!(!request.contains("(truncated)"));
        assert!(request.contains("```\nerror: expected `;`\n```"));
    }

    #[test]
    fn test_multibyte_log_is_cut_on_char_boundary() {
        let request = retry_request("task", "ééééé", 3);
        assert!(request.contains("```\nééé\n```"));
    }
}
