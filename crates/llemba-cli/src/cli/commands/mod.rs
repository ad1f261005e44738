use super::args::{Cli, Command};

pub mod methods;
pub mod render;
pub mod score;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Score(args) => score::run(args).await,
        Command::Methods => methods::run(),
        Command::Render(args) => render::run(args),
    }
}
