use anyhow::{Context, Result};
use console::style;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::bootstrap::Session;
use crate::cli::output::get_formatter;
use crate::models::OutputFormat;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", ":q"];

/// Line-oriented question loop. Each question is answered on its own; earlier
/// turns are never sent to the model.
pub async fn handle_chat(session: &Session) -> Result<()> {
    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;
    let interactive = session.format == OutputFormat::Text;

    if interactive {
        println!(
            "{}",
            style(format!(
                "Chatting with index '{}'. Type 'exit' to quit.",
                pipeline.config().index_name
            ))
            .dim()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        if interactive {
            stdout
                .write_all(format!("{} ", style(">").cyan().bold()).as_bytes())
                .await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question) {
            break;
        }

        match pipeline.query_with_context(question).await {
            Ok(answer) => {
                print!("{}", formatter.format_answer(&answer, false));
                if interactive {
                    println!();
                }
            }
            Err(e) => eprintln!("{}", formatter.format_error(&e.to_string()).trim_end()),
        }
    }

    Ok(())
}
