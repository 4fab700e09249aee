fn main() -> anyhow::Result<()> {
    constellation::run()
}
