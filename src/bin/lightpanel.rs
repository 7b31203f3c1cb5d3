use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use rand::Rng;

use lightpanel::args::{PanelArgs, PanelCommand};
use lightpanel::catalog;
use lightpanel::push;
use lightpanel::{build_command, render, CommandInput, CommandKind, ControlClient, Session, TerminalView};

macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Ok(val) => val,
            Err(e) => {
                println!("error: {:#}", e);
                continue;
            }
        }
    };
}

/// Script paths are interpreted by the device, so a pattern we can't
/// find locally is passed through unchanged.
fn resolve_pattern(scripts: &Path, pattern: &str) -> String {
    match catalog::resolve(scripts, pattern) {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            log::debug!("sending '{}' as given: {:#}", pattern, e);
            pattern.to_string()
        }
    }
}

fn dispatch<R: Rng>(
    client: &ControlClient,
    kind: CommandKind,
    input: &CommandInput,
    rng: &mut R,
) -> anyhow::Result<()> {
    let command = build_command(kind, input, rng)?;
    let ack = client.send(&command)?;
    match command.body()? {
        Some(body) => println!("sent {} {}", command.path(), body),
        None => println!("sent {}", command.path()),
    }
    if let Some(ack) = ack {
        if !ack.ok {
            println!(
                "device refused: {}",
                ack.error.as_deref().unwrap_or("no reason given")
            );
        }
    }
    return Ok(());
}

fn watch(client: ControlClient, use_push: bool, period_ms: u64) -> anyhow::Result<()> {
    let session = if use_push {
        let url = push::events_url(client.base_url())?;
        Session::subscribe(&url, TerminalView::new())?
    } else {
        Session::poll(client, TerminalView::new(), Duration::from_millis(period_ms))
    };
    log::info!("watching {:?}, close stdin to quit", session.feed());
    for line in std::io::stdin().lock().lines() {
        if line?.trim() == "q" {
            break;
        }
    }
    session.shutdown();
    return Ok(());
}

fn list(scripts: &Path) -> anyhow::Result<()> {
    for entry in catalog::scan(scripts)? {
        println!("{:<24} {}", entry.name, entry.file.display());
    }
    return Ok(());
}

const SHELL_HELP: &str = "Form fields: color=HEX|random, speed=SECONDS, brightness=0-255.
Actions: start=PATTERN, stop, color, brightness, state, form, help, quit.";

/// Interactive shell. Keeps a form like the web panel did and sends commands from it.
fn shell(client: &ControlClient, scripts: &Path) -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let mut form = CommandInput::default();
    let mut input = String::new();
    loop {
        print!("lightpanel> ");
        std::io::stdout().flush()?;
        input.clear();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
            None => (line, None),
        };
        match (key, value) {
            ("help", None) => println!("{}", SHELL_HELP),
            ("quit", None) | ("exit", None) => break,
            ("form", None) => println!("{:?}", form),
            ("color", Some(value)) => form.color = Some(value),
            ("speed", Some(value)) => form.speed = Some(value),
            ("brightness", Some(value)) => form.brightness = Some(value),
            ("start", Some(pattern)) => {
                form.file = Some(resolve_pattern(scripts, &pattern));
                skip_fail!(dispatch(client, CommandKind::Start, &form, &mut rng));
            }
            ("stop", None) => skip_fail!(dispatch(client, CommandKind::Stop, &form, &mut rng)),
            ("color", None) => skip_fail!(dispatch(client, CommandKind::SetColor, &form, &mut rng)),
            ("brightness", None) => {
                skip_fail!(dispatch(client, CommandKind::SetBrightness, &form, &mut rng))
            }
            ("state", None) => {
                let report = skip_fail!(client.fetch_state());
                println!("{}", TerminalView::line(&render(&report)));
            }
            (key, _) => println!("unknown input '{}', try 'help'", key),
        }
    }
    return Ok(());
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = PanelArgs::parse();
    let client = ControlClient::with_timeout(&args.url, Duration::from_millis(args.timeout_ms))?;
    let mut rng = rand::thread_rng();

    match args.command {
        PanelCommand::Watch { push, period_ms } => watch(client, push, period_ms),
        PanelCommand::Start { pattern, form } => {
            let input = form.to_input(Some(resolve_pattern(&args.scripts, &pattern)));
            dispatch(&client, CommandKind::Start, &input, &mut rng)
        }
        PanelCommand::Stop => dispatch(&client, CommandKind::Stop, &CommandInput::default(), &mut rng),
        PanelCommand::Color { color } => {
            let input = CommandInput {
                color,
                ..CommandInput::default()
            };
            dispatch(&client, CommandKind::SetColor, &input, &mut rng)
        }
        PanelCommand::Brightness { brightness } => {
            let input = CommandInput {
                brightness: Some(brightness),
                ..CommandInput::default()
            };
            dispatch(&client, CommandKind::SetBrightness, &input, &mut rng)
        }
        PanelCommand::List => list(&args.scripts),
        PanelCommand::Shell => shell(&client, &args.scripts),
    }
}
