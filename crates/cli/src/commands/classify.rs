use unishop_core::classifier::AcademicClassifier;

use crate::commands::CommandResult;

pub fn run(query: &str) -> CommandResult {
    if query.trim().is_empty() {
        return CommandResult::failure("classify", "invalid_argument", "query must not be empty", 7);
    }

    let analysis = AcademicClassifier::new().analyze(query);
    let summary = match analysis.classification.category {
        Some(category) => format!("classified as {}", category.as_str()),
        None => "no academic category matched".to_string(),
    };
    CommandResult::success_with_data("classify", summary, &analysis)
}
