use crate::app::router::{Command, Router};
use crate::core::session::SessionState;
use crate::utils::error::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const PROMPT: &str = "sdr> ";

/// 互動式 shell：逐行讀取指令，每個指令執行完才讀下一行
pub struct Shell {
    router: Router,
    session: SessionState,
}

impl Shell {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run(stdin, &mut stdout).await
    }

    pub async fn run<R, W>(&mut self, reader: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let app = &self.router.config().app;
        writeln!(out, "🤖 {} v{}", app.title, app.version)?;
        writeln!(out, "Type 'help' for commands, 'quit' to exit.")?;

        let mut lines = reader.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "{}", self.router.error_text(&e))?;
                    continue;
                }
            };
            if command == Command::Quit {
                writeln!(out, "👋 Goodbye")?;
                break;
            }

            match self.router.dispatch(command, &mut self.session).await {
                Ok(text) => writeln!(out, "{}", text)?,
                Err(e) => {
                    tracing::warn!(
                        "Command failed: {} (Category: {:?}, Severity: {:?})",
                        e,
                        e.category(),
                        e.severity()
                    );
                    writeln!(out, "{}", self.router.error_text(&e))?;
                }
            }
        }

        tracing::info!("Shell closed ({} session keys)", self.session.len());
        Ok(())
    }
}
