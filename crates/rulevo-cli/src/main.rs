mod command;
mod model;
mod report;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
