use anyhow::{Context, Result};
use clap::Args;

use crate::cli::bootstrap::Session;
use crate::cli::output::get_formatter;
use crate::utils::{RetryPolicy, with_retry};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to answer from the indexed documents")]
    pub question: String,

    #[arg(long, short = 'c', help = "Also print the retrieved chunks")]
    pub show_context: bool,

    #[arg(
        long,
        default_value_t = 0,
        help = "Retry transient provider failures this many times"
    )]
    pub retries: u32,
}

pub async fn handle_ask(args: AskArgs, session: &Session) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let formatter = get_formatter(session.format);
    let pipeline = session.pipeline().await?;

    let policy = RetryPolicy::new(args.retries);
    let outcome = with_retry(&policy, || pipeline.query_with_context(question)).await;

    if session.verbose && outcome.attempts() > 1 {
        eprintln!("Attempts: {}", outcome.attempts());
    }

    let answer = outcome
        .into_result()
        .context("failed to answer question")?;

    print!("{}", formatter.format_answer(&answer, args.show_context));
    Ok(())
}
