use crate::core::stt::{ResponseBatch, Transcript};

/// Fold one response batch into a transcript.
///
/// Batches flagged as service errors yield `None`. Otherwise the top
/// transcripts of all results are concatenated in order; a final result
/// replaces the accumulated text with its own and ends the fold.
pub fn aggregate(batch: &ResponseBatch) -> Option<Transcript> {
    if batch.is_service_error() {
        return None;
    }

    let mut text = String::new();
    let mut is_final = false;
    for result in &batch.results {
        if result.is_final {
            text.clear();
            text.push_str(&result.transcript);
            is_final = true;
            break;
        }
        text.push_str(&result.transcript);
    }

    Some(Transcript { text, is_final })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stt::RecognitionEntry;

    #[test]
    fn test_interim_results_concatenate() {
        let batch = ResponseBatch::new(vec![
            RecognitionEntry::interim("hey "),
            RecognitionEntry::interim("kit"),
        ]);
        assert_eq!(aggregate(&batch), Some(Transcript::new("hey kit", false)));
    }

    #[test]
    fn test_final_overrides_accumulated_text() {
        let batch = ResponseBatch::new(vec![
            RecognitionEntry::interim("hel"),
            RecognitionEntry::interim("hello"),
            RecognitionEntry::final_result("hello world"),
            RecognitionEntry::interim("ignored"),
        ]);
        assert_eq!(aggregate(&batch), Some(Transcript::new("hello world", true)));
    }

    #[test]
    fn test_service_error_batch_skipped() {
        let mut batch = ResponseBatch::service_error("resource exhausted");
        batch.results.push(RecognitionEntry::final_result("dropped"));
        assert_eq!(aggregate(&batch), None);
    }

    #[test]
    fn test_empty_batch_yields_empty_interim() {
        assert_eq!(
            aggregate(&ResponseBatch::default()),
            Some(Transcript::new("", false))
        );
    }
}
