//! Generation prompt assembly.

use crate::domain::Finding;

/// Build the prompt sent to the generation service.
///
/// Embeds the caller's correction intent, the critique findings in their
/// original order, and the original content verbatim.
pub fn build_generation_prompt(corrections: &str, findings: &[Finding], content: &str) -> String {
    let issues = if findings.is_empty() {
        "- none reported".to_string()
    } else {
        findings
            .iter()
            .map(|f| format!("- {} ({})", f.description, f.category))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Fix this HTML according to these corrections: {corrections}\n\n\
         Current HTML issues identified:\n{issues}\n\n\
         Current HTML:\n{content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_all_parts_in_order() {
        let findings = vec![
            Finding::new("img lacks alt text", "accessibility"),
            Finding::new("duplicate id", "validity"),
        ];
        let content = "<html>\n  <img src=\"a.png\">\n</html>";
        let prompt = build_generation_prompt("make it accessible", &findings, content);

        let intent = prompt.find("make it accessible").unwrap();
        let first = prompt.find("- img lacks alt text (accessibility)").unwrap();
        let second = prompt.find("- duplicate id (validity)").unwrap();
        let body = prompt.find(content).unwrap();
        assert!(intent < first && first < second && second < body);
    }

    #[test]
    fn test_prompt_without_findings() {
        let prompt = build_generation_prompt("tidy", &[], "<p/>");
        assert!(prompt.contains("- none reported"));
        assert!(prompt.ends_with("<p/>"));
    }
}
