fn main() -> anyhow::Result<()> {
    let config = vitalis::Config::load()?;

    let runtime = vitalis::build_runtime(&config)?;

    runtime.block_on(vitalis::run())
}
