//! cc-repl is an interactive REPL that demonstrates the embedded
//! OpenAI-compatible client agent loop, including tool-call round trips
//! answered from the keyboard.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use cc_proxy::chat::{Client, ClientConfig};
use cc_proxy::oai::{ChatCompletionRequest, ChatMessage, MessageContent, OaiClient, ToolCall};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Parser, Debug)]
#[command(name = "cc-repl")]
#[command(about = "Interactive REPL over the embedded OpenAI-compatible client")]
#[command(version)]
struct Args {
    /// Model name (e.g. sonnet, opus, haiku)
    #[arg(long, default_value = "")]
    model: String,

    /// System prompt
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let client = OaiClient::new(Arc::new(Client::new(ClientConfig {
        max_concurrent: 64,
        ..Default::default()
    })));

    let mut history = vec![ChatMessage::text_message("system", &args.system)];
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt("you> ")?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => return Ok(()),
        };

        match line.trim() {
            "exit" | "quit" => return Ok(()),
            "" => continue,
            text => history.push(ChatMessage::text_message("user", text)),
        }

        // Ctrl+C cancels the in-flight turn and returns to the prompt;
        // dropping the stream kills the subprocess.
        tokio::select! {
            outcome = turn(&client, &args.model, &mut lines, &mut history) => {
                if let Err(e) = outcome {
                    eprintln!("\nerror: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n(interrupted)");
            }
        }
    }
}

/// Send the history, stream the response, and loop on tool calls until the
/// model produces a normal stop.
async fn turn(
    client: &OaiClient,
    model: &str,
    lines: &mut Lines<BufReader<Stdin>>,
    history: &mut Vec<ChatMessage>,
) -> Result<()> {
    loop {
        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: history.clone(),
            ..Default::default()
        };

        let mut stream = client.chat_completion_stream(req).await?;
        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut finish_stop = false;

        prompt("assistant> ")?;
        let outcome = loop {
            match stream.recv().await {
                Ok(Some(chunk)) => {
                    let Some(choice) = chunk.choices.first() else {
                        continue;
                    };
                    if let Some(content) = &choice.delta.content {
                        print!("{content}");
                        std::io::stdout().flush()?;
                        text.push_str(content);
                    }
                    if !choice.delta.tool_calls.is_empty() {
                        merge_tool_call_deltas(&mut tool_calls, &choice.delta.tool_calls);
                    }
                    if let Some(reason) = &choice.finish_reason {
                        finish_stop = reason == "stop";
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        stream.close().await;
        println!();
        outcome?;

        if !tool_calls.is_empty() {
            history.push(ChatMessage {
                role: "assistant".into(),
                content: Some(MessageContent::Text(text)),
                tool_calls: tool_calls.clone(),
                ..Default::default()
            });

            for call in &tool_calls {
                println!(
                    "\n[tool_call] {}({})",
                    call.function.name, call.function.arguments
                );
                prompt(&format!("result for {}> ", call.id))?;
                let Some(line) = lines.next_line().await? else {
                    return Ok(());
                };
                history.push(ChatMessage::tool_result(&call.id, line));
            }
            continue; // auto-send the tool results
        }

        if finish_stop || !text.is_empty() {
            history.push(ChatMessage::text_message("assistant", text));
        }
        return Ok(());
    }
}

/// Accumulate streamed tool-call deltas into complete calls. A delta with
/// an id opens a new call; an id-less delta appends arguments to the last.
fn merge_tool_call_deltas(existing: &mut Vec<ToolCall>, deltas: &[ToolCall]) {
    for delta in deltas {
        if !delta.id.is_empty() {
            existing.push(delta.clone());
        } else if let Some(last) = existing.last_mut() {
            last.function.arguments.push_str(&delta.function.arguments);
        }
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}
