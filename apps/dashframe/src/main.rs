use dashframe_engine::terminal::{app, cli};

fn main() -> anyhow::Result<()> {
    let cli = cli::parse();
    app::run(cli)?;
    Ok(())
}
