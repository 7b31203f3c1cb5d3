// High-level overview:
//
// Protocol:                      http + json               View trait
// Library Concept:      device <-------------> client <---------------> user
//                              ws (get_state)
//
// Implementing Binary:  lightpanel-dummy      lightpanel (lib)          lightpanel
//                       the real device                                 any View impl

#[macro_use]
extern crate rouille;

pub mod args;
pub mod catalog;
pub mod client;
pub mod color;
pub mod command;
pub mod dummy;
pub mod indicator;
pub mod push;
pub mod session;
pub mod state;
pub mod view;

pub use client::ControlClient;
pub use command::{build_command, Command, CommandInput, CommandKind};
pub use indicator::{render, Frame, Indicator};
pub use session::Session;
pub use state::{DeviceState, StatusReport};
pub use view::{HeaderView, TerminalView, View};
