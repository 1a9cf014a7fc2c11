use async_trait::async_trait;
use conflusso_core::Operator;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// The terminal: prompts on stdout, lines from stdin.
pub struct StdioOperator {
    lines: Lines<BufReader<Stdin>>,
}

impl StdioOperator {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdioOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for StdioOperator {
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        print!("\n{prompt}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    fn show(&mut self, text: &str) {
        println!("{text}");
    }
}
