use std::io;
use std::sync::Mutex;

use clap::Parser;

use lightpanel::args::DummyArgs;
use lightpanel::dummy::{self, DummyDevice};

/// A debug version of the device that only remembers what it was told to do.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = DummyArgs::parse();
    let device = Mutex::new(DummyDevice::new());
    log::info!("dummy device listening on {}", args.bind);

    rouille::start_server(args.bind, move |request| {
        rouille::log(request, io::stdout(), || dummy::handle(&device, request))
    });
}
