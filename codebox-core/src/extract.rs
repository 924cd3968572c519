//! Collect text and file ids from remote results
//!
//! Both extractors return `None` when the payload is malformed, which callers
//! report as an empty `(None, None)` result rather than an error.

use serde::Serialize;

use crate::assistants::ThreadMessage;
use crate::responses::ResponseBody;

/// Text and file ids found in a result, files in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Text payload
    pub text: String,
    /// Remote file ids, without duplicates
    pub file_ids: Vec<String>,
}

impl Extracted {
    fn push_file(&mut self, file_id: Option<&str>) {
        if let Some(id) = file_id.filter(|id| !id.is_empty()) {
            if !self.file_ids.iter().any(|known| known == id) {
                self.file_ids.push(id.to_string());
            }
        }
    }
}

/// Result of one `run` call
///
/// Serializes as the pair `[text, file_paths]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Text printed by the run, `None` when nothing could be extracted
    pub text: Option<String>,
    /// Local paths of downloaded files, `None` when nothing could be extracted
    pub file_paths: Option<Vec<String>>,
}

impl RunOutput {
    /// The `(None, None)` result of a malformed payload
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result with text and files
    pub fn new(text: impl Into<String>, file_paths: Vec<String>) -> Self {
        Self {
            text: Some(text.into()),
            file_paths: Some(file_paths),
        }
    }

    /// Whether this is the `(None, None)` result
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.file_paths.is_none()
    }
}

impl Serialize for RunOutput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.text, &self.file_paths).serialize(serializer)
    }
}

/// Walk the last message of a completed run.
///
/// Content blocks come first (text annotations and image blocks, in order),
/// then attachments. The last text block provides the text.
pub fn extract_message(message: Option<&ThreadMessage>) -> Option<Extracted> {
    let message = message?;
    let mut out = Extracted::default();

    for block in message.content.as_ref()? {
        match block.kind.as_deref() {
            Some("text") => {
                let body = block.text.as_ref()?;
                out.text = body.value.clone()?;
                for annotation in body.annotations.as_ref()? {
                    let file_id = annotation
                        .file_path
                        .as_ref()
                        .and_then(|f| f.file_id.as_deref());
                    out.push_file(file_id);
                }
            }
            Some("image_file") => {
                let file_id = block.image_file.as_ref().and_then(|f| f.file_id.as_deref());
                out.push_file(file_id);
            }
            _ => {}
        }
    }

    for attachment in message.attachments.iter().flatten() {
        out.push_file(attachment.file_id.as_deref());
    }

    Some(out)
}

/// Walk the flat output list of a response.
///
/// Text of all `output_text` blocks is concatenated. Files come from
/// container file citations and from code interpreter tool results.
pub fn extract_response(response: &ResponseBody) -> Option<Extracted> {
    let mut out = Extracted::default();

    for item in response.output.as_ref()? {
        match item.kind.as_deref() {
            Some("message") => {
                for content in item.content.iter().flatten() {
                    if content.kind.as_deref() != Some("output_text") {
                        continue;
                    }
                    out.text.push_str(content.text.as_deref()?);
                    for annotation in content.annotations.iter().flatten() {
                        if annotation.kind.as_deref() == Some("container_file_citation") {
                            out.push_file(annotation.file_id.as_deref());
                        }
                    }
                }
            }
            Some("tool_result") if item.tool_name.as_deref() == Some("code_interpreter") => {
                for file in item.files.iter().flatten() {
                    out.push_file(file.file_id.as_deref());
                }
            }
            _ => {}
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: serde_json::Value) -> ThreadMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_only() {
        let msg = message(json!({
            "content": [{"type": "text", "text": {"value": "4\n", "annotations": []}}],
            "attachments": []
        }));
        let out = extract_message(Some(&msg)).unwrap();
        assert_eq!(out.text, "4\n");
        assert!(out.file_ids.is_empty());
    }

    #[test]
    fn test_discovery_order_and_dedup() {
        let msg = message(json!({
            "content": [
                {"type": "image_file", "image_file": {"file_id": "file-img"}},
                {"type": "text", "text": {
                    "value": "done",
                    "annotations": [
                        {"type": "file_path", "file_path": {"file_id": "file-csv"}},
                        {"type": "file_citation"}
                    ]
                }}
            ],
            "attachments": [
                {"file_id": "file-csv"},
                {"file_id": "file-zip"},
                {"file_id": "file-img"}
            ]
        }));
        let out = extract_message(Some(&msg)).unwrap();
        assert_eq!(out.text, "done");
        assert_eq!(out.file_ids, vec!["file-img", "file-csv", "file-zip"]);
    }

    #[test]
    fn test_last_text_block_wins() {
        let msg = message(json!({
            "content": [
                {"type": "text", "text": {"value": "first", "annotations": []}},
                {"type": "text", "text": {"value": "second", "annotations": []}}
            ]
        }));
        assert_eq!(extract_message(Some(&msg)).unwrap().text, "second");
    }

    #[test]
    fn test_missing_attachments_is_fine() {
        let msg = message(json!({
            "content": [{"type": "image_file", "image_file": {}}]
        }));
        let out = extract_message(Some(&msg)).unwrap();
        assert_eq!(out.text, "");
        assert!(out.file_ids.is_empty());
    }

    #[test]
    fn test_malformed_messages() {
        assert_eq!(extract_message(None), None);
        assert_eq!(extract_message(Some(&message(json!({"id": "msg_1"})))), None);
        assert_eq!(
            extract_message(Some(&message(json!({"content": [{"type": "text"}]})))),
            None
        );
        assert_eq!(
            extract_message(Some(&message(json!({
                "content": [{"type": "text", "text": {"annotations": []}}]
            })))),
            None
        );
        assert_eq!(
            extract_message(Some(&message(json!({
                "content": [{"type": "text", "text": {"value": "x"}}]
            })))),
            None
        );
    }

    #[test]
    fn test_response_extraction() {
        let body: ResponseBody = serde_json::from_value(json!({
            "status": "completed",
            "output": [
                {"type": "code_interpreter_call", "id": "ci_1"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "a", "annotations": [
                        {"type": "container_file_citation", "file_id": "cfile_1"},
                        {"type": "url_citation", "url": "https://example.com"}
                    ]},
                    {"type": "output_text", "text": "b"}
                ]},
                {"type": "tool_result", "tool_name": "code_interpreter", "files": [
                    {"file_id": "cfile_1"}, {"file_id": "cfile_2"}
                ]},
                {"type": "tool_result", "tool_name": "web_search", "files": [{"file_id": "other"}]}
            ]
        }))
        .unwrap();

        let out = extract_response(&body).unwrap();
        assert_eq!(out.text, "ab");
        assert_eq!(out.file_ids, vec!["cfile_1", "cfile_2"]);
    }

    #[test]
    fn test_response_without_output_is_malformed() {
        assert_eq!(extract_response(&ResponseBody::default()), None);
    }

    #[test]
    fn test_run_output_serializes_as_pair() {
        let out = RunOutput::new("4\n", vec!["./files/file-abc.png".to_string()]);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"["4\n",["./files/file-abc.png"]]"#
        );
        assert_eq!(serde_json::to_string(&RunOutput::empty()).unwrap(), "[null,null]");
        assert!(RunOutput::empty().is_empty());
    }
}
