/// Entry point for the `zest-crumble` binary.
fn main() -> anyhow::Result<()> {
    zest_crumble::cli::run()
}
