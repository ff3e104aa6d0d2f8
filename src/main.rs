fn main() -> anyhow::Result<()> {
    metwrap::run()
}
