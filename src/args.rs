use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::DEFAULT_SCRIPTS_DIR;
use crate::command::CommandInput;
use crate::session::DEFAULT_POLL_PERIOD_MS;

/// Control panel for a pattern-driven LED ceiling.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct PanelArgs {
    /// Base url of the device's control api.
    #[clap(short, long, env = "LIGHTPANEL_URL", default_value = "http://localhost:5000")]
    pub url: String,

    /// Directory containing the pattern scripts.
    #[clap(long, parse(from_os_str), default_value = DEFAULT_SCRIPTS_DIR)]
    pub scripts: PathBuf,

    /// Request timeout in milliseconds.
    #[clap(long, default_value = "5000")]
    pub timeout_ms: u64,

    #[clap(subcommand)]
    pub command: PanelCommand,
}

#[derive(Subcommand, Debug)]
pub enum PanelCommand {
    /// Show the device state until stdin is closed.
    Watch {
        /// Subscribe to pushed updates instead of polling.
        #[clap(long)]
        push: bool,

        /// Poll period in milliseconds.
        #[clap(long, default_value_t = DEFAULT_POLL_PERIOD_MS)]
        period_ms: u64,
    },

    /// Start a pattern, given by name or script path.
    Start {
        pattern: String,

        #[clap(flatten)]
        form: FormArgs,
    },

    /// Stop the running pattern.
    Stop,

    /// Change the color of the running pattern. Random if omitted.
    Color { color: Option<String> },

    /// Set the brightness, 0-255.
    Brightness {
        #[clap(allow_hyphen_values = true)]
        brightness: String,
    },

    /// List the available patterns.
    List,

    /// Interactive shell with a persistent form.
    Shell,
}

/// The start form. Everything is optional and defaulted before sending.
#[derive(Args, Debug, Default, Clone)]
pub struct FormArgs {
    /// Hex color, or "random".
    #[clap(short, long)]
    pub color: Option<String>,

    /// Seconds per pattern step.
    #[clap(short, long)]
    pub speed: Option<String>,

    /// Brightness, clamped to 0-255.
    #[clap(short, long, allow_hyphen_values = true)]
    pub brightness: Option<String>,
}

impl FormArgs {
    pub fn to_input(&self, file: Option<String>) -> CommandInput {
        return CommandInput {
            file,
            color: self.color.clone(),
            speed: self.speed.clone(),
            brightness: self.brightness.clone(),
        };
    }
}

/// A stand-in device that serves the control api without any lights attached.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DummyArgs {
    /// The listen address to bind to.
    #[clap(short, long, default_value = "localhost:5000")]
    pub bind: String,
}
