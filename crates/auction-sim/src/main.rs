fn main() -> anyhow::Result<()> {
    auction_sim::start(std::env::args())
}
