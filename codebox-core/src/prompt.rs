//! Prompt templates sent along with the code

/// Name of the remote assistant
pub const ASSISTANT_NAME: &str = "Python Code Runner";

/// Assistant-level instructions
pub const ASSISTANT_INSTRUCTIONS: &str =
    "You are a python code runner. Write and run code to answer questions.";

/// Run-level instructions for the stateful API
pub const RUN_INSTRUCTIONS: &str = "\
Run the provided Python code for data analysis.
Return the result of the execution. Your own analysis is not needed.
Once more: return the result of the execution.
If a file path or similar detail is slightly wrong, fix it as appropriate.
If you changed anything, explain what you changed.
If you created or saved a file, always show its path as a markdown link.
Example: [file name](sandbox:/mnt/data/file name)";

/// Wrap code in the user message sent to the stateful API
pub fn assistants_prompt(code: &str) -> String {
    format!(
        "Run the following code and return the result.
```python
{code}
```
**Important rules**:
- Return the result of running the code
- If you created a file, always mention its sandbox path
- If you created an image, include its path as well (e.g. sandbox:/mnt/data/output.png)"
    )
}

/// Wrap code in the user input sent to the stateless API
pub fn responses_prompt(code: &str) -> String {
    format!(
        "Run the Python code below and return only the result.
Do not add explanations or interpretation.

```python
{code}
```"
    )
}
