//! Run a few snippets through the hosted code interpreter
//!
//! Requires `OPENAI_API_KEY` (a `.env` file works too).
//!
//! ```sh
//! cargo run -p codebox-providers --example run_code
//! cargo run -p codebox-providers --example run_code -- responses
//! ```

use std::sync::Arc;

use codebox_core::logging::init_stdout_logging;
use codebox_core::prelude::*;
use codebox_providers::openai::OpenAI;

const SIMPLE_MATH: &str = "result = 2 + 2\nprint(f'2 + 2 = {result}')";

const CHART: &str = r#"
import matplotlib.pyplot as plt
import numpy as np

x = np.linspace(-2 * np.pi, 2 * np.pi, 200)
plt.plot(x, np.sin(x))
plt.title("y = sin(x)")
plt.savefig("/mnt/data/sine.png")
print("saved")
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_stdout_logging("info")?;

    let config = Config::from_env()?;
    let client: Arc<dyn CodeInterpreter> = match std::env::args().nth(1).as_deref() {
        Some("responses") => {
            let backend = OpenAI::from_config(&config)?;
            Arc::new(ResponsesClient::new(backend, &config).await?) as Arc<dyn CodeInterpreter>
        }
        _ => {
            let backend = OpenAI::from_config(&config)?;
            Arc::new(AssistantsClient::new(backend, &config).await?) as Arc<dyn CodeInterpreter>
        }
    };
    println!("Using the {} client", client.name());

    // 1. Simple math
    let out = client.run(SIMPLE_MATH).await?;
    println!("[text]  {:?}", out.text);
    println!("[files] {:?}", out.file_paths);
    anyhow::ensure!(
        out.text.as_deref().is_some_and(|t| t.contains('4')),
        "expected the result to contain 4"
    );

    // 2. Chart generation and download
    let out = client.run(CHART).await?;
    println!("[text]  {:?}", out.text);
    println!("[files] {:?}", out.file_paths);

    // 3. The same call through the tool, as an agent would make it
    set_active_client(client);
    let tool = CodeInterpreterTool::new();
    let arguments = serde_json::json!({ "code": SIMPLE_MATH }).to_string();
    let json = tool.call(&arguments).await?;
    let parsed: serde_json::Value = serde_json::from_str(&json)?;
    anyhow::ensure!(parsed.is_array(), "tool output should be a JSON pair");
    println!("[tool]  {json}");

    Ok(())
}
