//! Entry point for the observatory TUI. Parses args and runs the App.

use std::env;
use std::time::Duration;

use observatory::app::App;
use observatory::ws::{connect, next_snapshot, validate_url, DEFAULT_URL};

struct ParsedArgs {
    url: Option<String>,
    once: bool,
}

fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--once] [ws://HOST:PORT/ws]  (default {DEFAULT_URL})")
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "observatory".into());
    let mut url: Option<String> = None;
    let mut once = false;

    for arg in it {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--once" => once = true,
            _ if url.is_none() && !arg.starts_with('-') => url = Some(arg),
            _ => return Err(format!("Unexpected argument '{arg}'. {}", usage(&prog))),
        }
    }
    Ok(ParsedArgs { url, once })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };
    let url = validate_url(parsed.url.as_deref().unwrap_or(DEFAULT_URL))?;

    if parsed.once {
        let mut ws = connect(&url).await?;
        let snapshot = tokio::time::timeout(Duration::from_secs(10), next_snapshot(&mut ws))
            .await
            .map_err(|_| anyhow::anyhow!("no snapshot from {url} within 10s"))?
            .ok_or_else(|| anyhow::anyhow!("{url} closed before sending a snapshot"))?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    App::new().run(&url).await
}
