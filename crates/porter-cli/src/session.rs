use anyhow::Result;
use cliclack::{input, spinner};
use console::style;
use tracing::error;

use porter::agent::Agent;
use porter::models::tool::Tool;

/// The interactive shell: one query at a time, processed to completion
/// before the next prompt. A failed query is reported and the loop goes on.
pub struct Session {
    agent: Agent,
    tools: Vec<Tool>,
}

impl Session {
    pub fn new(agent: Agent, tools: Vec<Tool>) -> Self {
        Session { agent, tools }
    }

    pub async fn start(&self) -> Result<()> {
        println!(
            "{}",
            style("Type your queries, or \"quit\" to exit.").dim()
        );

        loop {
            let query: String = input("Query:").placeholder("").interact()?;

            if query.trim().eq_ignore_ascii_case("quit") {
                break;
            }

            let spin = spinner();
            spin.start("awaiting reply");

            match self.agent.answer(&query, &self.tools).await {
                Ok(text) => {
                    spin.stop("");
                    println!("\n{}\n", text);
                }
                Err(e) => {
                    spin.stop("");
                    error!(error = %e, "query failed");
                    println!("{}\n", style(format!("Query failed: {e}")).red());
                }
            }
        }

        Ok(())
    }
}
